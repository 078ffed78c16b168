//! `registry-core` — identifiers and resource vocabulary shared by every crate.
//!
//! This crate contains **pure domain** primitives (no storage, no transport).

pub mod error;
pub mod id;
pub mod resource;

pub use error::{CoreError, CoreResult};
pub use id::{InstitutionId, ResourceId, UserId};
pub use resource::{Ownership, ResourceType};
