//! Engine configuration.
//!
//! Loaded from environment variables with defaults suitable for local
//! development, or built directly in code and tests.

use rbac_model::{ActionPolicy, LevelSet};
use serde::{Deserialize, Serialize};

use crate::error::{RbacError, RbacResult};

/// Namespace, allowed levels and action policy for one RBAC instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbacConfig {
    /// Namespace used to derive storage relation names.
    pub name: String,

    /// Levels grants may use; empty accepts any positive level.
    #[serde(default)]
    pub levels: LevelSet,

    /// Minimum level per action.
    #[serde(default)]
    pub actions: ActionPolicy,
}

impl Default for RbacConfig {
    /// Default namespace, open level set, empty policy.
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME, ActionPolicy::new())
    }
}

impl RbacConfig {
    /// Default namespace.
    pub const DEFAULT_NAME: &'static str = "rbac";

    /// Create a config with an open level set.
    pub fn new(name: impl Into<String>, actions: ActionPolicy) -> Self {
        Self {
            name: name.into(),
            levels: LevelSet::any(),
            actions,
        }
    }

    /// Restrict grants to `levels`.
    pub fn with_levels(mut self, levels: LevelSet) -> Self {
        self.levels = levels;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RBAC_NAME`: Namespace (default: rbac)
    /// - `RBAC_ROLE_LEVELS`: Comma-separated allowed levels (default: any)
    /// - `RBAC_ACTION_LEVELS`: JSON object of action thresholds (default: `{}`)
    pub fn from_env() -> RbacResult<Self> {
        let name = std::env::var("RBAC_NAME").unwrap_or_else(|_| Self::DEFAULT_NAME.to_string());

        let levels = match std::env::var("RBAC_ROLE_LEVELS") {
            Ok(raw) => LevelSet::parse_list(&raw)
                .map_err(|e| RbacError::Config(format!("RBAC_ROLE_LEVELS: {e}")))?,
            Err(_) => LevelSet::any(),
        };

        let actions = match std::env::var("RBAC_ACTION_LEVELS") {
            Ok(raw) => ActionPolicy::from_json(&raw)
                .map_err(|e| RbacError::Config(format!("RBAC_ACTION_LEVELS: {e}")))?,
            Err(_) => ActionPolicy::new(),
        };

        let config = Self {
            name,
            levels,
            actions,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency.
    ///
    /// With a restricted level set, every action threshold must be reachable
    /// by at least one allowed level.
    pub fn validate(&self) -> RbacResult<()> {
        if self.name.trim().is_empty() {
            return Err(RbacError::Config("name must not be empty".to_string()));
        }
        if let Some(top) = self.levels.iter().last() {
            for (action, min) in self.actions.iter() {
                if min > top {
                    return Err(RbacError::Config(format!(
                        "action '{action}' requires level {min}, above the highest configured level {top}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Storage relation names: `[<name>_object_roles, <name>_group_objects]`.
    pub fn relation_names(&self) -> [String; 2] {
        [
            format!("{}_object_roles", self.name),
            format!("{}_group_objects", self.name),
        ]
    }
}
