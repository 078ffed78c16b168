//! `registry-api`: the request-facing side of authorization and list views.
//!
//! - [`authz`] runs the per-request resource authorization pipeline.
//! - [`actions`] maps handler names to the permission they require.
//! - [`resolver`] finds the institution that owns a resource row.
//! - [`listing`] compiles and runs filtered, tenant-scoped list queries.
//! - [`errors`] maps every failure to an HTTP status.

pub mod actions;
pub mod authz;
pub mod config;
pub mod context;
pub mod errors;
pub mod listing;
pub mod resolver;

pub use actions::{ActionMap, ActionMeta, ActionScope, dispatch_key};
pub use authz::{AuthorizationError, AuthorizationGate, AuthorizationOutcome, ResourceAuthorization};
pub use config::GateConfig;
pub use context::RouteParams;
pub use errors::{Classify, ErrorClass, json_error};
pub use listing::{ListError, ListPage, ListRequest};
pub use resolver::{InMemoryResourceStore, ResolveError, ResourceTenantResolver};
