//! In-memory assignment store.
//!
//! Suitable for single-process applications and testing. Both relations sit
//! behind one lock, so every scoped read sees a single point in time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rbac_model::{AssignmentKey, GroupMembership, PrivilegeLevel, RoleAssignment, TargetKind};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{AssignmentStore, KindScope, ObjectSnapshot, SubjectQuery, SubjectSnapshot};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct Relations {
    /// Keyed by (subject, target, kind)
    assignments: BTreeMap<AssignmentKey, RoleAssignment>,
    /// Keyed by (group, object)
    memberships: BTreeMap<(String, String), GroupMembership>,
}

impl Relations {
    fn group_members<'a>(
        &'a self,
        group: &'a str,
        object: Option<&'a str>,
    ) -> impl Iterator<Item = &'a GroupMembership> + 'a {
        self.memberships
            .range((group.to_string(), String::new())..)
            .take_while(move |((g, _), _)| g == group)
            .map(|(_, m)| m)
            .filter(move |m| object.map_or(true, |o| m.object == o))
    }
}

/// In-memory assignment store.
#[derive(Clone)]
pub struct MemoryAssignmentStore {
    relations: Arc<RwLock<Relations>>,
    available: Arc<AtomicBool>,
}

impl std::fmt::Debug for MemoryAssignmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAssignmentStore")
            .field("available", &self.available.load(Ordering::Relaxed))
            .finish()
    }
}

impl MemoryAssignmentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            relations: Arc::new(RwLock::new(Relations::default())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate an outage: while unavailable every operation fails with
    /// [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Number of stored assignment rows, expired ones included.
    pub async fn assignment_count(&self) -> usize {
        self.relations.read().await.assignments.len()
    }

    /// Number of stored membership rows.
    pub async fn membership_count(&self) -> usize {
        self.relations.read().await.memberships.len()
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        }
    }
}

impl Default for MemoryAssignmentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssignmentStore for MemoryAssignmentStore {
    async fn put_assignment(
        &self,
        key: AssignmentKey,
        level: PrivilegeLevel,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<RoleAssignment> {
        self.ensure_available()?;
        let mut relations = self.relations.write().await;

        if let Some(existing) = relations.assignments.get_mut(&key) {
            existing.level = level;
            existing.expires_at = expires_at;
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }

        let row = RoleAssignment::new(key.subject.clone(), key.target.clone(), key.kind, level)
            .map_err(|e| StoreError::Conflict(e.to_string()))?
            .with_optional_expiry(expires_at);
        relations.assignments.insert(key, row.clone());
        Ok(row)
    }

    async fn delete_assignment(&self, key: &AssignmentKey) -> StoreResult<bool> {
        self.ensure_available()?;
        Ok(self.relations.write().await.assignments.remove(key).is_some())
    }

    async fn scan_assignments(
        &self,
        subject: &str,
        kind: Option<TargetKind>,
        as_of: DateTime<Utc>,
    ) -> StoreResult<Vec<RoleAssignment>> {
        self.ensure_available()?;
        let relations = self.relations.read().await;
        Ok(relations
            .assignments
            .values()
            .filter(|a| a.subject == subject)
            .filter(|a| kind.map_or(true, |k| a.kind == k))
            .filter(|a| a.is_active(as_of))
            .cloned()
            .collect())
    }

    async fn scan_target_assignments(
        &self,
        target: &str,
        kind: TargetKind,
        as_of: DateTime<Utc>,
    ) -> StoreResult<Vec<RoleAssignment>> {
        self.ensure_available()?;
        let relations = self.relations.read().await;
        Ok(relations
            .assignments
            .values()
            .filter(|a| a.target == target && a.kind == kind && a.is_active(as_of))
            .cloned()
            .collect())
    }

    async fn put_membership(&self, group: &str, object: &str) -> StoreResult<GroupMembership> {
        self.ensure_available()?;
        let membership =
            GroupMembership::new(group, object).map_err(|e| StoreError::Conflict(e.to_string()))?;

        let mut relations = self.relations.write().await;
        let row = relations
            .memberships
            .entry((group.to_string(), object.to_string()))
            .or_insert(membership);
        Ok(row.clone())
    }

    async fn delete_membership(&self, group: &str, object: &str) -> StoreResult<bool> {
        self.ensure_available()?;
        let mut relations = self.relations.write().await;
        Ok(relations
            .memberships
            .remove(&(group.to_string(), object.to_string()))
            .is_some())
    }

    async fn scan_memberships(
        &self,
        group: &str,
        object: Option<&str>,
    ) -> StoreResult<Vec<GroupMembership>> {
        self.ensure_available()?;
        let relations = self.relations.read().await;
        Ok(relations.group_members(group, object).cloned().collect())
    }

    async fn read_subject(&self, query: &SubjectQuery) -> StoreResult<SubjectSnapshot> {
        self.ensure_available()?;
        let relations = self.relations.read().await;
        let object = query.object.as_deref();

        let assignments: Vec<RoleAssignment> = relations
            .assignments
            .values()
            .filter(|a| a.subject == query.subject && query.scope.includes(a.kind))
            .filter(|a| a.is_active(query.as_of))
            .filter(|a| a.kind == TargetKind::Group || object.map_or(true, |o| a.target == o))
            .cloned()
            .collect();

        let memberships = if query.scope == KindScope::Objects {
            Vec::new()
        } else {
            assignments
                .iter()
                .filter(|a| a.is_group())
                .flat_map(|a| relations.group_members(&a.target, object))
                .cloned()
                .collect()
        };

        Ok(SubjectSnapshot {
            assignments,
            memberships,
        })
    }

    async fn read_object(
        &self,
        object: &str,
        as_of: DateTime<Utc>,
    ) -> StoreResult<ObjectSnapshot> {
        self.ensure_available()?;
        let relations = self.relations.read().await;

        let direct = relations
            .assignments
            .values()
            .filter(|a| a.kind == TargetKind::Object && a.target == object)
            .filter(|a| a.is_active(as_of))
            .cloned()
            .collect();

        let groups: Vec<String> = relations
            .memberships
            .values()
            .filter(|m| m.object == object)
            .map(|m| m.group.clone())
            .collect();

        let group_assignments = groups
            .iter()
            .flat_map(|group| {
                relations
                    .assignments
                    .values()
                    .filter(move |a| a.kind == TargetKind::Group && &a.target == group)
            })
            .filter(|a| a.is_active(as_of))
            .cloned()
            .collect();

        Ok(ObjectSnapshot {
            direct,
            groups,
            group_assignments,
        })
    }

    async fn purge_expired(&self, as_of: DateTime<Utc>) -> StoreResult<usize> {
        self.ensure_available()?;
        let mut relations = self.relations.write().await;
        let before = relations.assignments.len();
        relations.assignments.retain(|_, a| a.is_active(as_of));
        let purged = before - relations.assignments.len();
        tracing::debug!(purged, "Purged expired assignments");
        Ok(purged)
    }
}
