//! # Resolution Engine
//!
//! Turns stored assignments into effective roles:
//!
//! ```text
//! snapshot (one consistent read, one clock reading)
//!   -> seed direct roles
//!   -> expand group assignments over group members   (inherited only)
//!   -> merge per object: strictly higher level replaces, ties keep the first
//!   -> project each level through the action policy
//! ```
//!
//! Direct roles are always merged before inherited ones, so a direct role
//! wins a tie against a group, and an earlier group (by name) wins a tie
//! against a later one.
//!
//! The engine holds no mutable state; every call works on its own snapshot
//! and may run concurrently with any other.

use chrono::{DateTime, Utc};
use rbac_model::{ActionPolicy, EffectiveGroupRole, EffectiveObjectRole, RoleFilter, TargetKind};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{RbacError, RbacResult, StoreError};
use crate::store::{AssignmentStore, KindScope, ObjectSnapshot, SubjectQuery, SubjectSnapshot};

/// Fold candidates into one entry per key.
///
/// A later candidate replaces the stored entry only when its level is
/// strictly greater; on equal levels the earlier entry stays. Output keeps
/// first-insertion order of keys.
pub fn merge_roles<K, F>(
    candidates: impl IntoIterator<Item = EffectiveObjectRole>,
    key_of: F,
) -> Vec<EffectiveObjectRole>
where
    K: Eq + Hash,
    F: Fn(&EffectiveObjectRole) -> K,
{
    let mut merged: Vec<EffectiveObjectRole> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();

    for candidate in candidates {
        let key = key_of(&candidate);
        if let Some(&slot) = index.get(&key) {
            if candidate.level > merged[slot].level {
                merged[slot] = candidate;
            }
        } else {
            index.insert(key, merged.len());
            merged.push(candidate);
        }
    }

    merged
}

/// Build the merged (not yet projected) roles of one subject from a snapshot.
///
/// `object` restricts the output to one object; `include_inherited` turns on
/// group expansion. Assignments are assumed active as of the snapshot time.
pub fn resolve_subject_snapshot(
    snapshot: &SubjectSnapshot,
    object: Option<&str>,
    include_inherited: bool,
) -> Vec<EffectiveObjectRole> {
    let object_matches = |name: &str| object.map_or(true, |o| o == name);

    let direct = snapshot
        .assignments
        .iter()
        .filter(|a| a.kind == TargetKind::Object && object_matches(&a.target))
        .map(EffectiveObjectRole::direct);

    let inherited = snapshot
        .assignments
        .iter()
        .filter(move |a| include_inherited && a.is_group())
        .flat_map(move |grant| {
            snapshot
                .memberships
                .iter()
                .filter(move |m| m.group == grant.target && object_matches(&m.object))
                .map(move |m| EffectiveObjectRole::inherited(grant, m.object.as_str()))
        });

    merge_roles(direct.chain(inherited), |role| role.object.clone())
}

/// Build the merged roles every subject holds over one object.
///
/// Per subject: the direct assignment first, then group assignments in the
/// snapshot's (group, subject) order.
pub fn resolve_object_snapshot(
    snapshot: &ObjectSnapshot,
    object: &str,
) -> Vec<EffectiveObjectRole> {
    let direct = snapshot.direct.iter().map(EffectiveObjectRole::direct);
    let inherited = snapshot
        .group_assignments
        .iter()
        .map(|grant| EffectiveObjectRole::inherited(grant, object));

    let mut merged = merge_roles(direct.chain(inherited), |role| role.subject.clone());
    merged.sort_by(|a, b| a.subject.cmp(&b.subject));
    merged
}

/// Effective role resolution over an assignment store.
#[derive(Clone)]
pub struct ResolutionEngine {
    store: Arc<dyn AssignmentStore>,
    policy: Arc<ActionPolicy>,
}

impl std::fmt::Debug for ResolutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionEngine")
            .field("actions", &self.policy.len())
            .finish()
    }
}

impl ResolutionEngine {
    /// Create an engine over `store` with a fixed action policy.
    pub fn new(store: Arc<dyn AssignmentStore>, policy: ActionPolicy) -> Self {
        Self {
            store,
            policy: Arc::new(policy),
        }
    }

    /// The action policy used for projection.
    pub fn policy(&self) -> &ActionPolicy {
        &self.policy
    }

    /// Resolve the roles `subject` holds over objects.
    ///
    /// # Arguments
    ///
    /// * `subject` - Subject to resolve (must not be empty)
    /// * `object` - Restrict the result to this object
    /// * `include_inherited` - Also consider group assignments
    ///
    /// # Returns
    ///
    /// At most one role per object, actions filled in. Empty when the
    /// subject holds nothing.
    #[instrument(skip(self))]
    pub async fn resolve_object_roles(
        &self,
        subject: &str,
        object: Option<&str>,
        include_inherited: bool,
    ) -> RbacResult<Vec<EffectiveObjectRole>> {
        self.resolve_object_roles_as_of(subject, object, include_inherited, Utc::now())
            .await
    }

    /// [`Self::resolve_object_roles`] against an explicit clock reading.
    pub async fn resolve_object_roles_as_of(
        &self,
        subject: &str,
        object: Option<&str>,
        include_inherited: bool,
        as_of: DateTime<Utc>,
    ) -> RbacResult<Vec<EffectiveObjectRole>> {
        require("subject", subject)?;
        if let Some(object) = object {
            require("object", object)?;
        }

        let query = SubjectQuery {
            subject: subject.to_string(),
            scope: if include_inherited {
                KindScope::All
            } else {
                KindScope::Objects
            },
            object: object.map(str::to_string),
            as_of,
        };

        let snapshot = self
            .store
            .read_subject(&query)
            .await
            .map_err(|e| store_failure("read_subject", e))?;

        let mut roles = resolve_subject_snapshot(&snapshot, object, include_inherited);
        for role in &mut roles {
            role.project(&self.policy);
        }

        debug!(
            assignments = snapshot.assignments.len(),
            memberships = snapshot.memberships.len(),
            roles = roles.len(),
            "Resolved object roles"
        );
        Ok(roles)
    }

    /// Resolve the roles `subject` holds over groups themselves.
    ///
    /// Groups do not nest, so there is no expansion step.
    #[instrument(skip(self))]
    pub async fn resolve_group_roles(
        &self,
        subject: &str,
        group: Option<&str>,
    ) -> RbacResult<Vec<EffectiveGroupRole>> {
        self.resolve_group_roles_as_of(subject, group, Utc::now()).await
    }

    /// [`Self::resolve_group_roles`] against an explicit clock reading.
    pub async fn resolve_group_roles_as_of(
        &self,
        subject: &str,
        group: Option<&str>,
        as_of: DateTime<Utc>,
    ) -> RbacResult<Vec<EffectiveGroupRole>> {
        require("subject", subject)?;
        if let Some(group) = group {
            require("group", group)?;
        }

        let assignments = self
            .store
            .scan_assignments(subject, Some(TargetKind::Group), as_of)
            .await
            .map_err(|e| store_failure("scan_assignments", e))?;

        let roles: Vec<EffectiveGroupRole> = assignments
            .iter()
            .filter(|a| group.map_or(true, |g| a.target == g))
            .map(|a| EffectiveGroupRole::from_assignment(a, &self.policy))
            .collect();

        debug!(roles = roles.len(), "Resolved group roles");
        Ok(roles)
    }

    /// Roles every subject holds over `object`, direct and inherited,
    /// filtered and sorted by subject.
    #[instrument(skip(self))]
    pub async fn object_roles(
        &self,
        object: &str,
        filter: &RoleFilter,
    ) -> RbacResult<Vec<EffectiveObjectRole>> {
        require("object", object)?;

        let snapshot = self
            .store
            .read_object(object, Utc::now())
            .await
            .map_err(|e| store_failure("read_object", e))?;

        let roles: Vec<EffectiveObjectRole> = resolve_object_snapshot(&snapshot, object)
            .into_iter()
            .filter(|role| filter.matches(role))
            .map(|mut role| {
                role.project(&self.policy);
                role
            })
            .collect();

        debug!(
            groups = snapshot.groups.len(),
            roles = roles.len(),
            "Resolved object holders"
        );
        Ok(roles)
    }

    /// Roles every subject holds over `group`, sorted by subject.
    #[instrument(skip(self))]
    pub async fn group_roles(&self, group: &str) -> RbacResult<Vec<EffectiveGroupRole>> {
        require("group", group)?;

        let mut roles: Vec<EffectiveGroupRole> = self
            .store
            .scan_target_assignments(group, TargetKind::Group, Utc::now())
            .await
            .map_err(|e| store_failure("scan_target_assignments", e))?
            .iter()
            .map(|a| EffectiveGroupRole::from_assignment(a, &self.policy))
            .collect();
        roles.sort_by(|a, b| a.subject.cmp(&b.subject));
        Ok(roles)
    }

    /// Member objects of `group`, sorted by name.
    pub async fn group_objects(&self, group: &str) -> RbacResult<Vec<String>> {
        require("group", group)?;

        let memberships = self
            .store
            .scan_memberships(group, None)
            .await
            .map_err(|e| store_failure("scan_memberships", e))?;
        let mut objects: Vec<String> = memberships.into_iter().map(|m| m.object).collect();
        objects.sort();
        Ok(objects)
    }
}

fn require(what: &str, value: &str) -> RbacResult<()> {
    if value.is_empty() {
        return Err(RbacError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(())
}

fn store_failure(operation: &'static str, err: StoreError) -> RbacError {
    warn!(operation, error = %err, "Assignment store read failed");
    err.into()
}
