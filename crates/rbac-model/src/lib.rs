//! # RBAC Model
//!
//! Data model for level-based role assignments.
//!
//! ## Overview
//!
//! The rbac-model crate handles:
//! - **Levels**: Positive privilege levels and the configured level set
//! - **Action Policy**: Minimum level required per action
//! - **Assignments**: Subject grants over objects or groups, with optional expiry
//! - **Memberships**: Which objects belong to which groups
//! - **Effective Roles**: Resolved, action-annotated views built by `rbac-engine`
//!
//! ## Architecture
//!
//! ```text
//! RoleAssignment (subject -> object | group, level, expiry?)
//! GroupMembership (group -> object)
//!
//! EffectiveObjectRole = max level over direct + inherited assignments
//!                       + ActionPolicy::actions_for(level)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use rbac_model::{ActionPolicy, PrivilegeLevel};
//!
//! let policy = ActionPolicy::from_json(r#"{"read": 1, "write": 5, "admin": 10}"#).unwrap();
//! let level = PrivilegeLevel::new(5).unwrap();
//! assert_eq!(policy.actions_for(level), vec!["read", "write"]);
//! ```
//!
//! Groups do not nest: a group can contain objects but not other groups.

pub mod assignment;
pub mod error;
pub mod level;
pub mod policy;
pub mod roles;

// Re-export main types for convenience
pub use assignment::{AssignmentKey, GroupMembership, RoleAssignment, TargetKind};
pub use error::{ModelError, ModelResult};
pub use level::{LevelSet, PrivilegeLevel};
pub use policy::{ActionPolicy, ActionPolicyBuilder};
pub use roles::{EffectiveGroupRole, EffectiveObjectRole, RoleFilter};
