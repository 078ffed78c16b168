//! `registry-infra`: Postgres adapters for the query and resolver seams.
//!
//! Nothing here decides access; the adapters only run statements that the
//! query compiler and the authorization gate have already built.

pub mod config;
pub mod postgres;

pub use config::DatabaseConfig;
pub use postgres::{PgQueryExecutor, PgTenantResolver, connect};
