//! Effective roles
//!
//! Derived, never-persisted views of what a subject can do. They are rebuilt
//! on every resolution so they always reflect the current expiry state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assignment::RoleAssignment;
use crate::level::PrivilegeLevel;
use crate::policy::ActionPolicy;

/// A subject's resolved level over one object, with its allowed actions.
///
/// `group` is set exactly when `inherited` is true and names the group whose
/// assignment supplied the level.
///
/// # Examples
///
/// ```
/// use rbac_model::{ActionPolicy, EffectiveObjectRole, PrivilegeLevel, RoleAssignment, TargetKind};
///
/// let policy = ActionPolicy::builder().action("read", 1).action("write", 5).build().unwrap();
/// let grant = RoleAssignment::new("u1", "doc1", TargetKind::Object, PrivilegeLevel::new(3).unwrap()).unwrap();
///
/// let mut role = EffectiveObjectRole::direct(&grant);
/// role.project(&policy);
/// assert!(!role.inherited);
/// assert!(role.allows("read"));
/// assert!(!role.allows("write"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveObjectRole {
    /// Subject holding the role
    pub subject: String,

    /// Object the role applies to
    pub object: String,

    /// Resolved level
    pub level: PrivilegeLevel,

    /// Expiry of the backing assignment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Whether the level came from a group assignment
    pub inherited: bool,

    /// Originating group for inherited roles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Allowed actions, sorted by name
    #[serde(default)]
    pub actions: Vec<String>,
}

impl EffectiveObjectRole {
    /// Seed a role from a direct object assignment.
    pub fn direct(assignment: &RoleAssignment) -> Self {
        Self {
            subject: assignment.subject.clone(),
            object: assignment.target.clone(),
            level: assignment.level,
            expires_at: assignment.expires_at,
            inherited: false,
            group: None,
            actions: Vec::new(),
        }
    }

    /// Candidate role over `object` inherited from a group assignment.
    pub fn inherited(group_assignment: &RoleAssignment, object: impl Into<String>) -> Self {
        Self {
            subject: group_assignment.subject.clone(),
            object: object.into(),
            level: group_assignment.level,
            expires_at: group_assignment.expires_at,
            inherited: true,
            group: Some(group_assignment.target.clone()),
            actions: Vec::new(),
        }
    }

    /// Fill `actions` from the policy.
    pub fn project(&mut self, policy: &ActionPolicy) {
        self.actions = policy.actions_for(self.level);
    }

    /// Whether `action` is in the resolved action set.
    pub fn allows(&self, action: &str) -> bool {
        self.actions
            .binary_search_by(|a| a.as_str().cmp(action))
            .is_ok()
    }

    /// Originating group name, or `""` for direct roles.
    pub fn group_name(&self) -> &str {
        self.group.as_deref().unwrap_or("")
    }
}

/// A subject's level over a group itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveGroupRole {
    /// Subject holding the role
    pub subject: String,

    /// Group the role applies to
    pub group: String,

    /// Granted level
    pub level: PrivilegeLevel,

    /// Expiry of the group assignment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Allowed actions, sorted by name
    #[serde(default)]
    pub actions: Vec<String>,
}

impl EffectiveGroupRole {
    /// Build from a group assignment and project its actions.
    pub fn from_assignment(assignment: &RoleAssignment, policy: &ActionPolicy) -> Self {
        Self {
            subject: assignment.subject.clone(),
            group: assignment.target.clone(),
            level: assignment.level,
            expires_at: assignment.expires_at,
            actions: policy.actions_for(assignment.level),
        }
    }

    /// Whether `action` is in the resolved action set.
    pub fn allows(&self, action: &str) -> bool {
        self.actions
            .binary_search_by(|a| a.as_str().cmp(action))
            .is_ok()
    }
}

/// Post-resolution filter for listing object roles.
///
/// `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFilter {
    /// Keep only roles inherited from this group
    pub group: Option<String>,
    /// Keep only inherited (`true`) or direct (`false`) roles
    pub inherited: Option<bool>,
}

impl RoleFilter {
    /// Match everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Only roles inherited through `group`.
    pub fn from_group(group: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            inherited: None,
        }
    }

    /// Only direct (`false`) or inherited (`true`) roles.
    pub fn inherited(mut self, inherited: bool) -> Self {
        self.inherited = Some(inherited);
        self
    }

    /// Whether `role` passes this filter.
    pub fn matches(&self, role: &EffectiveObjectRole) -> bool {
        if let Some(group) = &self.group {
            if role.group.as_deref() != Some(group.as_str()) {
                return false;
            }
        }
        self.inherited.map_or(true, |flag| role.inherited == flag)
    }
}
