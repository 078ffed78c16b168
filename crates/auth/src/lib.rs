//! `registry-auth` — role grants and tenant-scoped permission checks.
//!
//! This crate is intentionally decoupled from HTTP and storage: it answers
//! "may this subject do this to a resource owned by that institution".

pub mod authorize;
pub mod grants;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthorizationExplanation, AuthzError, DenialKind};
pub use grants::PermissionTable;
pub use permissions::{Permission, UnknownPermission, Verb, FORBIDDEN_TO_ALL};
pub use principal::AuthorizationSubject;
pub use roles::Role;
