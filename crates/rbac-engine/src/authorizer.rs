//! # Authorizer
//!
//! Public entry point: grant and revoke roles, manage group membership,
//! list effective roles and answer `is_allowed` questions.
//!
//! Mutations are single upserts or deletes, each atomic on its own. There
//! are no compound transactions across grants.

use chrono::{DateTime, Utc};
use rbac_model::{
    ActionPolicy, AssignmentKey, EffectiveGroupRole, EffectiveObjectRole, GroupMembership,
    LevelSet, PrivilegeLevel, RoleAssignment, RoleFilter, TargetKind,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::config::RbacConfig;
use crate::error::RbacResult;
use crate::resolver::ResolutionEngine;
use crate::store::AssignmentStore;

/// Authorization facade over a [`ResolutionEngine`] and its store.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use rbac_engine::{Authorizer, MemoryAssignmentStore, RbacConfig};
/// use rbac_model::ActionPolicy;
///
/// # async fn example() -> rbac_engine::RbacResult<()> {
/// let policy = ActionPolicy::from_json(r#"{"read": 1, "write": 5, "admin": 10}"#)?;
/// let rbac = Authorizer::new(
///     RbacConfig::new("docs", policy),
///     Arc::new(MemoryAssignmentStore::new()),
/// )?;
///
/// rbac.grant_object_role("u1", "doc1", 3, None).await?;
/// rbac.grant_group_role("u1", "team1", 8, None).await?;
/// rbac.add_group_object("team1", "doc1").await?;
///
/// assert!(rbac.is_allowed("u1", "doc1", "write").await?);
/// assert!(!rbac.is_allowed("u1", "doc1", "admin").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Authorizer {
    name: String,
    levels: LevelSet,
    engine: ResolutionEngine,
    store: Arc<dyn AssignmentStore>,
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("name", &self.name)
            .field("levels", &self.levels)
            .field("engine", &self.engine)
            .finish()
    }
}

impl Authorizer {
    /// Create an authorizer from validated configuration.
    pub fn new(config: RbacConfig, store: Arc<dyn AssignmentStore>) -> RbacResult<Self> {
        config.validate()?;
        Ok(Self {
            engine: ResolutionEngine::new(store.clone(), config.actions),
            name: config.name,
            levels: config.levels,
            store,
        })
    }

    /// Namespace of this instance.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The action policy.
    pub fn policy(&self) -> &ActionPolicy {
        self.engine.policy()
    }

    /// The underlying resolution engine.
    pub fn engine(&self) -> &ResolutionEngine {
        &self.engine
    }

    // ------------------------------------------------------------------
    // Authorization
    // ------------------------------------------------------------------

    /// Whether `subject` may perform `action` on `object`.
    ///
    /// Resolves with inheritance. No role, a role below the action's
    /// threshold, or an action unknown to the policy all answer `false`.
    /// Errors only mean the answer could not be determined.
    #[instrument(skip(self))]
    pub async fn is_allowed(&self, subject: &str, object: &str, action: &str) -> RbacResult<bool> {
        let roles = self
            .engine
            .resolve_object_roles(subject, Some(object), true)
            .await?;

        let allowed = roles
            .iter()
            .find(|role| role.object == object)
            .is_some_and(|role| role.allows(action));

        debug!(allowed, "Authorization decided");
        Ok(allowed)
    }

    /// See [`ResolutionEngine::resolve_object_roles`].
    pub async fn resolve_object_roles(
        &self,
        subject: &str,
        object: Option<&str>,
        include_inherited: bool,
    ) -> RbacResult<Vec<EffectiveObjectRole>> {
        self.engine
            .resolve_object_roles(subject, object, include_inherited)
            .await
    }

    /// See [`ResolutionEngine::resolve_group_roles`].
    pub async fn resolve_group_roles(
        &self,
        subject: &str,
        group: Option<&str>,
    ) -> RbacResult<Vec<EffectiveGroupRole>> {
        self.engine.resolve_group_roles(subject, group).await
    }

    // ------------------------------------------------------------------
    // Listing
    // ------------------------------------------------------------------

    /// All object roles of `subject`, inheritance included, narrowed by `filter`.
    pub async fn list_user_object_roles(
        &self,
        subject: &str,
        filter: &RoleFilter,
    ) -> RbacResult<Vec<EffectiveObjectRole>> {
        let roles = self.engine.resolve_object_roles(subject, None, true).await?;
        Ok(roles.into_iter().filter(|r| filter.matches(r)).collect())
    }

    /// All group roles of `subject`.
    pub async fn list_user_group_roles(&self, subject: &str) -> RbacResult<Vec<EffectiveGroupRole>> {
        self.engine.resolve_group_roles(subject, None).await
    }

    /// Roles every subject holds over `object`, narrowed by `filter`.
    pub async fn list_object_roles(
        &self,
        object: &str,
        filter: &RoleFilter,
    ) -> RbacResult<Vec<EffectiveObjectRole>> {
        self.engine.object_roles(object, filter).await
    }

    /// Roles every subject holds over `group`.
    pub async fn list_group_roles(&self, group: &str) -> RbacResult<Vec<EffectiveGroupRole>> {
        self.engine.group_roles(group).await
    }

    /// Member objects of `group`.
    pub async fn list_group_objects(&self, group: &str) -> RbacResult<Vec<String>> {
        self.engine.group_objects(group).await
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Grant `subject` a level over `object`, replacing any existing grant.
    ///
    /// # Arguments
    ///
    /// * `subject` - Subject receiving the level
    /// * `object` - Target object
    /// * `level` - Level to grant; must be positive and in the level set
    /// * `expires_at` - Optional absolute expiry
    pub async fn grant_object_role(
        &self,
        subject: &str,
        object: &str,
        level: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> RbacResult<RoleAssignment> {
        self.grant(subject, object, TargetKind::Object, level, expires_at)
            .await
    }

    /// Remove `subject`'s direct role on `object`. Missing roles are a no-op.
    pub async fn revoke_object_role(&self, subject: &str, object: &str) -> RbacResult<bool> {
        self.revoke(subject, object, TargetKind::Object).await
    }

    /// Grant `subject` a level over `group`, inherited by every member object.
    pub async fn grant_group_role(
        &self,
        subject: &str,
        group: &str,
        level: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> RbacResult<RoleAssignment> {
        self.grant(subject, group, TargetKind::Group, level, expires_at)
            .await
    }

    /// Remove `subject`'s role on `group`. Missing roles are a no-op.
    pub async fn revoke_group_role(&self, subject: &str, group: &str) -> RbacResult<bool> {
        self.revoke(subject, group, TargetKind::Group).await
    }

    /// Add `object` to `group`. Adding twice keeps one membership.
    #[instrument(skip(self))]
    pub async fn add_group_object(&self, group: &str, object: &str) -> RbacResult<GroupMembership> {
        GroupMembership::new(group, object)?;
        let membership = self.store.put_membership(group, object).await?;
        info!("Group membership added");
        Ok(membership)
    }

    /// Remove `object` from `group`. Missing memberships are a no-op.
    #[instrument(skip(self))]
    pub async fn remove_group_object(&self, group: &str, object: &str) -> RbacResult<bool> {
        GroupMembership::new(group, object)?;
        let removed = self.store.delete_membership(group, object).await?;
        info!(removed, "Group membership removed");
        Ok(removed)
    }

    /// Physically delete assignments that have expired. Resolution already
    /// ignores them; this only reclaims storage.
    pub async fn purge_expired(&self) -> RbacResult<usize> {
        let purged = self.store.purge_expired(Utc::now()).await?;
        info!(purged, "Expired assignments purged");
        Ok(purged)
    }

    #[instrument(skip(self))]
    async fn grant(
        &self,
        subject: &str,
        target: &str,
        kind: TargetKind,
        level: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> RbacResult<RoleAssignment> {
        let key = AssignmentKey::new(subject, target, kind)?;
        let level = PrivilegeLevel::new(level)?;
        self.levels.check(level)?;

        let assignment = self.store.put_assignment(key, level, expires_at).await?;
        info!(assignment_id = %assignment.id, "Role granted");
        Ok(assignment)
    }

    #[instrument(skip(self))]
    async fn revoke(&self, subject: &str, target: &str, kind: TargetKind) -> RbacResult<bool> {
        let key = AssignmentKey::new(subject, target, kind)?;
        let removed = self.store.delete_assignment(&key).await?;
        info!(removed, "Role revoked");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RbacError;
    use crate::store::MemoryAssignmentStore;

    fn authorizer() -> (Authorizer, MemoryAssignmentStore) {
        let store = MemoryAssignmentStore::new();
        let policy = ActionPolicy::from_json(r#"{"read": 1, "write": 5, "admin": 10}"#).unwrap();
        let config = RbacConfig::new("test", policy);
        let rbac = Authorizer::new(config, Arc::new(store.clone())).unwrap();
        (rbac, store)
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_store() {
        let (rbac, store) = authorizer();
        store.set_available(false);

        assert!(matches!(
            rbac.grant_object_role("", "doc1", 3, None).await,
            Err(RbacError::InvalidInput(_))
        ));
        assert!(matches!(
            rbac.grant_object_role("u1", "doc1", 0, None).await,
            Err(RbacError::InvalidInput(_))
        ));
        assert!(matches!(
            rbac.grant_group_role("u1", "team1", -2, None).await,
            Err(RbacError::InvalidInput(_))
        ));
        assert!(matches!(
            rbac.resolve_object_roles("", None, true).await,
            Err(RbacError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_level_set_enforced() {
        let store = MemoryAssignmentStore::new();
        let policy = ActionPolicy::from_json(r#"{"read": 1}"#).unwrap();
        let config =
            RbacConfig::new("test", policy).with_levels(LevelSet::from_values([1, 5]).unwrap());
        let rbac = Authorizer::new(config, Arc::new(store)).unwrap();

        assert!(rbac.grant_object_role("u1", "doc1", 5, None).await.is_ok());
        assert!(matches!(
            rbac.grant_object_role("u1", "doc1", 3, None).await,
            Err(RbacError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_revoke_missing_is_noop() {
        let (rbac, _) = authorizer();
        assert!(!rbac.revoke_object_role("u1", "doc1").await.unwrap());
        assert!(!rbac.revoke_group_role("u1", "team1").await.unwrap());
        assert!(!rbac.remove_group_object("team1", "doc1").await.unwrap());
    }

    #[tokio::test]
    async fn test_grant_then_revoke() {
        let (rbac, store) = authorizer();
        rbac.grant_object_role("u1", "doc1", 5, None).await.unwrap();
        assert!(rbac.is_allowed("u1", "doc1", "write").await.unwrap());

        assert!(rbac.revoke_object_role("u1", "doc1").await.unwrap());
        assert_eq!(store.assignment_count().await, 0);
        assert!(!rbac.is_allowed("u1", "doc1", "read").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_action_is_denied() {
        let (rbac, _) = authorizer();
        rbac.grant_object_role("u1", "doc1", 10, None).await.unwrap();
        assert!(!rbac.is_allowed("u1", "doc1", "delete").await.unwrap());
        assert!(!rbac.is_allowed("u1", "missing", "read").await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let config = RbacConfig::new("", ActionPolicy::new());
        let result = Authorizer::new(config, Arc::new(MemoryAssignmentStore::new()));
        assert!(matches!(result, Err(RbacError::Config(_))));
    }
}
