//! # Action Policy
//!
//! Maps action names to the minimum privilege level required to perform them.
//! A policy is built once and then only read; resolution projects every
//! effective level through it to get the allowed action set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{require_name, ModelError, ModelResult};
use crate::level::PrivilegeLevel;

/// Static mapping from action name to its minimum required level.
///
/// Actions are kept in a sorted map, so every derived action list comes out
/// in lexicographic order regardless of how the policy was built.
///
/// # Example
///
/// ```
/// use rbac_model::{ActionPolicy, PrivilegeLevel};
///
/// let policy = ActionPolicy::builder()
///     .action("read", 1)
///     .action("write", 5)
///     .action("admin", 10)
///     .build()
///     .unwrap();
///
/// let level = PrivilegeLevel::new(8).unwrap();
/// assert_eq!(policy.actions_for(level), vec!["read", "write"]);
/// assert!(policy.allows(level, "write"));
/// assert!(!policy.allows(level, "admin"));
/// assert!(!policy.allows(level, "unknown"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionPolicy {
    thresholds: BTreeMap<String, PrivilegeLevel>,
}

impl ActionPolicy {
    /// Create an empty policy (no action is ever allowed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a policy from raw thresholds.
    pub fn builder() -> ActionPolicyBuilder {
        ActionPolicyBuilder::default()
    }

    /// Build from already-validated thresholds.
    pub fn from_thresholds<I, S>(thresholds: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = (S, PrivilegeLevel)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (action, level) in thresholds {
            let action = action.into();
            require_name(&action, "action name")?;
            map.insert(action, level);
        }
        Ok(Self { thresholds: map })
    }

    /// Parse a JSON object such as `{"read": 1, "write": 5}`.
    ///
    /// Non-positive thresholds and empty action names are rejected.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let raw: BTreeMap<String, i64> =
            serde_json::from_str(json).map_err(|e| ModelError::InvalidPolicy(e.to_string()))?;
        let mut builder = Self::builder();
        for (action, level) in raw {
            builder = builder.action(action, level);
        }
        builder.build()
    }

    /// Minimum level required for `action`, if the action is known.
    pub fn threshold(&self, action: &str) -> Option<PrivilegeLevel> {
        self.thresholds.get(action).copied()
    }

    /// Whether `level` meets the threshold for `action`.
    ///
    /// Unknown actions are never allowed.
    pub fn allows(&self, level: PrivilegeLevel, action: &str) -> bool {
        self.threshold(action).is_some_and(|min| min <= level)
    }

    /// Every action whose threshold is at or below `level`, sorted by name.
    pub fn actions_for(&self, level: PrivilegeLevel) -> Vec<String> {
        self.thresholds
            .iter()
            .filter(|(_, min)| **min <= level)
            .map(|(action, _)| action.clone())
            .collect()
    }

    /// Number of actions in the policy.
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    /// Whether the policy defines no actions.
    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Iterate actions and thresholds in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, PrivilegeLevel)> {
        self.thresholds.iter().map(|(a, l)| (a.as_str(), *l))
    }
}

/// Builder collecting raw `(action, level)` pairs; validation happens in `build`.
#[derive(Debug, Default)]
pub struct ActionPolicyBuilder {
    entries: Vec<(String, i64)>,
}

impl ActionPolicyBuilder {
    /// Add or replace an action threshold.
    pub fn action(mut self, name: impl Into<String>, level: i64) -> Self {
        self.entries.push((name.into(), level));
        self
    }

    /// Validate and freeze the policy. Later duplicates override earlier ones.
    pub fn build(self) -> ModelResult<ActionPolicy> {
        let thresholds = self
            .entries
            .into_iter()
            .map(|(name, level)| Ok((name, PrivilegeLevel::new(level)?)))
            .collect::<ModelResult<Vec<_>>>()?;
        ActionPolicy::from_thresholds(thresholds)
    }
}
