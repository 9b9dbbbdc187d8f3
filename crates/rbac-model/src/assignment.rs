//! Assignment domain models
//!
//! This module provides the two persisted relations: role assignments, which
//! grant a subject a level over an object or a group, and group memberships,
//! which place an object inside a group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{require_name, ModelResult};
use crate::level::PrivilegeLevel;

/// What kind of entity a role assignment targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A concrete object.
    Object,
    /// A group of objects; the level is inherited by every member.
    Group,
}

impl TargetKind {
    /// Get the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Object => "object",
            TargetKind::Group => "group",
        }
    }

    /// Parse kind from string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "object" => Some(TargetKind::Object),
            "group" => Some(TargetKind::Group),
            _ => None,
        }
    }
}

/// Uniqueness key of a role assignment: at most one row per key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssignmentKey {
    /// Subject the level is granted to
    pub subject: String,
    /// Object or group name
    pub target: String,
    /// Whether `target` names an object or a group
    pub kind: TargetKind,
}

impl AssignmentKey {
    /// Create a key, rejecting empty subject or target names.
    pub fn new(
        subject: impl Into<String>,
        target: impl Into<String>,
        kind: TargetKind,
    ) -> ModelResult<Self> {
        let key = Self {
            subject: subject.into(),
            target: target.into(),
            kind,
        };
        require_name(&key.subject, "subject")?;
        require_name(&key.target, "target")?;
        Ok(key)
    }
}

/// A grant of a privilege level to a subject over an object or a group.
///
/// Assignments with an expiry are logically inactive once the expiry is
/// reached; they stay in storage until revoked or purged.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use rbac_model::{PrivilegeLevel, RoleAssignment, TargetKind};
///
/// let level = PrivilegeLevel::new(5).unwrap();
/// let grant = RoleAssignment::new("u1", "team1", TargetKind::Group, level)
///     .unwrap()
///     .with_expiry(Utc::now() + Duration::hours(1));
/// assert!(grant.is_active(Utc::now()));
/// assert!(!grant.is_active(Utc::now() + Duration::hours(2)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Row ID (stable across upserts of the same key)
    pub id: Uuid,

    /// Subject the level is granted to
    pub subject: String,

    /// Object or group name
    pub target: String,

    /// Whether `target` names an object or a group
    pub kind: TargetKind,

    /// Granted level
    pub level: PrivilegeLevel,

    /// Absolute expiry; `None` never expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// When the key was first granted
    pub created_at: DateTime<Utc>,

    /// When the level or expiry last changed
    pub updated_at: DateTime<Utc>,
}

impl RoleAssignment {
    /// Creates a new non-expiring assignment.
    ///
    /// # Arguments
    ///
    /// * `subject` - The subject receiving the level
    /// * `target` - The object or group name
    /// * `kind` - Whether `target` is an object or a group
    /// * `level` - The granted level
    pub fn new(
        subject: impl Into<String>,
        target: impl Into<String>,
        kind: TargetKind,
        level: PrivilegeLevel,
    ) -> ModelResult<Self> {
        let key = AssignmentKey::new(subject, target, kind)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            subject: key.subject,
            target: key.target,
            kind,
            level,
            expires_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Set an absolute expiry.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set an optional expiry.
    pub fn with_optional_expiry(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Active means no expiry, or an expiry strictly after `as_of`.
    pub fn is_active(&self, as_of: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| at > as_of)
    }

    /// Whether this assignment targets a group.
    pub fn is_group(&self) -> bool {
        self.kind == TargetKind::Group
    }

    /// Uniqueness key of this row.
    pub fn key(&self) -> AssignmentKey {
        AssignmentKey {
            subject: self.subject.clone(),
            target: self.target.clone(),
            kind: self.kind,
        }
    }
}

/// Membership of an object in a group. Memberships never expire.
///
/// # Examples
///
/// ```
/// use rbac_model::GroupMembership;
///
/// let membership = GroupMembership::new("team1", "doc1").unwrap();
/// assert_eq!(membership.group, "team1");
/// assert!(GroupMembership::new("", "doc1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    /// Group name
    pub group: String,

    /// Member object name
    pub object: String,

    /// When the object was added
    pub created_at: DateTime<Utc>,
}

impl GroupMembership {
    /// Creates a membership, rejecting empty names.
    pub fn new(group: impl Into<String>, object: impl Into<String>) -> ModelResult<Self> {
        let membership = Self {
            group: group.into(),
            object: object.into(),
            created_at: Utc::now(),
        };
        require_name(&membership.group, "group")?;
        require_name(&membership.object, "object")?;
        Ok(membership)
    }
}
