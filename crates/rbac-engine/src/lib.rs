//! # RBAC Engine
//!
//! Resolves what a subject may do on an object from level-based role
//! assignments, inheriting levels granted on groups the object belongs to.
//!
//! ## Overview
//!
//! The rbac-engine crate handles:
//! - **Store**: The [`AssignmentStore`] trait and an in-memory backend
//! - **Resolution**: Expiry filtering, group expansion, max-level merge and
//!   action projection ([`ResolutionEngine`])
//! - **Authorization**: [`Authorizer::is_allowed`], listings and grant/revoke
//! - **Configuration**: [`RbacConfig`] loaded from the environment
//!
//! ## Architecture
//!
//! ```text
//! AssignmentStore --(consistent snapshot)--> ResolutionEngine --> Authorizer
//!   assignments                               merge + project       is_allowed
//!   memberships
//! ```
//!
//! ## Features
//!
//! - `memory` (default): [`MemoryAssignmentStore`]
//!
//! ## Logging
//!
//! Operations emit `tracing` spans and events; installing a subscriber is
//! left to the application.

pub mod authorizer;
pub mod config;
pub mod error;
pub mod resolver;
pub mod store;

// Re-export main types
pub use authorizer::Authorizer;
pub use config::RbacConfig;
pub use error::{RbacError, RbacResult, StoreError, StoreResult};
pub use resolver::{merge_roles, ResolutionEngine};
pub use store::{AssignmentStore, KindScope, ObjectSnapshot, SubjectQuery, SubjectSnapshot};

#[cfg(feature = "memory")]
pub use store::MemoryAssignmentStore;
