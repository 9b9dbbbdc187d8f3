//! Assignment store abstraction
//!
//! The store persists role assignments and group memberships. The engine only
//! needs upserts, deletes, filtered scans and two scoped reads that observe
//! both relations at a single point in time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rbac_model::{AssignmentKey, GroupMembership, PrivilegeLevel, RoleAssignment, TargetKind};

use crate::error::StoreResult;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "memory")]
pub use memory::MemoryAssignmentStore;

/// Which assignment kinds a subject read should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindScope {
    /// Direct object assignments only.
    Objects,
    /// Group assignments only.
    Groups,
    /// Both kinds.
    All,
}

impl KindScope {
    /// Whether `kind` is covered by this scope.
    pub fn includes(&self, kind: TargetKind) -> bool {
        match self {
            KindScope::Objects => kind == TargetKind::Object,
            KindScope::Groups => kind == TargetKind::Group,
            KindScope::All => true,
        }
    }
}

/// Parameters of a scoped read for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectQuery {
    /// Subject whose assignments are read
    pub subject: String,
    /// Assignment kinds to return
    pub scope: KindScope,
    /// Restrict direct assignments and memberships to this object
    pub object: Option<String>,
    /// Assignments expiring at or before this instant are skipped
    pub as_of: DateTime<Utc>,
}

/// Both relations for one subject, read in a single consistent scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectSnapshot {
    /// Active assignments, ordered by (target, kind)
    pub assignments: Vec<RoleAssignment>,
    /// Memberships of the groups in `assignments`, ordered by (group, object)
    pub memberships: Vec<GroupMembership>,
}

/// Everything granting any subject a level over one object, read in a single
/// consistent scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectSnapshot {
    /// Active direct assignments on the object, ordered by subject
    pub direct: Vec<RoleAssignment>,
    /// Groups that contain the object, ordered by name
    pub groups: Vec<String>,
    /// Active assignments on those groups, ordered by (group, subject)
    pub group_assignments: Vec<RoleAssignment>,
}

/// Storage collaborator for assignments and memberships.
///
/// Implementations must enforce the uniqueness keys: one assignment per
/// (subject, target, kind) and one membership per (group, object). Scans
/// return rows in key order so that resolution is reproducible. Deleting a
/// missing row is not an error.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Insert or replace the assignment for `key`.
    ///
    /// Replacing keeps the row ID and `created_at`, and updates level,
    /// expiry and `updated_at`.
    async fn put_assignment(
        &self,
        key: AssignmentKey,
        level: PrivilegeLevel,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<RoleAssignment>;

    /// Delete the assignment for `key`. Returns whether a row existed.
    async fn delete_assignment(&self, key: &AssignmentKey) -> StoreResult<bool>;

    /// Active assignments held by `subject`, optionally of one kind.
    async fn scan_assignments(
        &self,
        subject: &str,
        kind: Option<TargetKind>,
        as_of: DateTime<Utc>,
    ) -> StoreResult<Vec<RoleAssignment>>;

    /// Active assignments held by any subject on `target`.
    async fn scan_target_assignments(
        &self,
        target: &str,
        kind: TargetKind,
        as_of: DateTime<Utc>,
    ) -> StoreResult<Vec<RoleAssignment>>;

    /// Insert the membership if absent. Returns the stored row.
    async fn put_membership(&self, group: &str, object: &str) -> StoreResult<GroupMembership>;

    /// Delete a membership. Returns whether a row existed.
    async fn delete_membership(&self, group: &str, object: &str) -> StoreResult<bool>;

    /// Memberships of `group`, optionally restricted to one object.
    async fn scan_memberships(
        &self,
        group: &str,
        object: Option<&str>,
    ) -> StoreResult<Vec<GroupMembership>>;

    /// Read a subject's assignments and the memberships of its groups in one
    /// consistent scope.
    async fn read_subject(&self, query: &SubjectQuery) -> StoreResult<SubjectSnapshot>;

    /// Read every assignment reaching `object`, directly or through a group,
    /// in one consistent scope.
    async fn read_object(&self, object: &str, as_of: DateTime<Utc>)
        -> StoreResult<ObjectSnapshot>;

    /// Physically remove assignments expired as of `as_of`. Returns the count.
    async fn purge_expired(&self, as_of: DateTime<Utc>) -> StoreResult<usize>;
}
