//! # Privilege Levels
//!
//! A privilege level is a positive integer; a higher value grants more.
//! Levels are compared with ordinary integer ordering, which is what lets an
//! action policy express "at least level N" thresholds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{ModelError, ModelResult};

/// A validated, strictly positive privilege level.
///
/// # Example
///
/// ```
/// use rbac_model::PrivilegeLevel;
///
/// let reader = PrivilegeLevel::new(1).unwrap();
/// let admin = PrivilegeLevel::new(10).unwrap();
/// assert!(admin > reader);
/// assert!(PrivilegeLevel::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct PrivilegeLevel(u32);

impl PrivilegeLevel {
    /// Create a level, rejecting zero, negatives and values above `u32::MAX`.
    pub fn new(value: i64) -> ModelResult<Self> {
        if value <= 0 || value > i64::from(u32::MAX) {
            return Err(ModelError::InvalidLevel(value));
        }
        Ok(Self(value as u32))
    }

    /// Get the raw numeric level.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for PrivilegeLevel {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PrivilegeLevel> for u32 {
    fn from(level: PrivilegeLevel) -> Self {
        level.0
    }
}

impl fmt::Display for PrivilegeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The set of levels a deployment allows grants to use.
///
/// An empty set accepts any positive level.
///
/// # Example
///
/// ```
/// use rbac_model::{LevelSet, PrivilegeLevel};
///
/// let levels = LevelSet::parse_list("1, 5, 10").unwrap();
/// assert!(levels.check(PrivilegeLevel::new(5).unwrap()).is_ok());
/// assert!(levels.check(PrivilegeLevel::new(7).unwrap()).is_err());
///
/// let open = LevelSet::any();
/// assert!(open.check(PrivilegeLevel::new(7).unwrap()).is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSet {
    levels: BTreeSet<PrivilegeLevel>,
}

impl LevelSet {
    /// A set that accepts every positive level.
    pub fn any() -> Self {
        Self::default()
    }

    /// Build from raw values, validating each one.
    pub fn from_values<I>(values: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = i64>,
    {
        let levels = values
            .into_iter()
            .map(PrivilegeLevel::new)
            .collect::<ModelResult<BTreeSet<_>>>()?;
        Ok(Self { levels })
    }

    /// Parse a comma-separated list such as `"1,5,10"`. Blank input yields `any()`.
    pub fn parse_list(s: &str) -> ModelResult<Self> {
        let values = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i64>()
                    .map_err(|_| ModelError::InvalidPolicy(format!("not a level: {part}")))
            })
            .collect::<ModelResult<Vec<_>>>()?;
        Self::from_values(values)
    }

    /// Whether grants are restricted to an explicit list.
    pub fn is_restricted(&self) -> bool {
        !self.levels.is_empty()
    }

    /// Accept `level` if the set is open or contains it.
    pub fn check(&self, level: PrivilegeLevel) -> ModelResult<()> {
        if self.is_restricted() && !self.levels.contains(&level) {
            return Err(ModelError::UnknownLevel(level.value()));
        }
        Ok(())
    }

    /// Levels in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = PrivilegeLevel> + '_ {
        self.levels.iter().copied()
    }
}
