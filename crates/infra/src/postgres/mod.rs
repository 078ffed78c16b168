//! Postgres adapters.
//!
//! ## Error Mapping
//!
//! | SQLx Error | Code | Result |
//! |------------|------|--------|
//! | Database (undefined column) | `42703` | backend error naming the column problem |
//! | Database (invalid text representation) | `22P02` | backend error naming the bad value |
//! | Database (other) | any | backend error |
//! | PoolClosed | N/A | backend error |
//! | RowNotFound | N/A | not found |
//! | Other | N/A | backend error |
//!
//! Messages keep the operation name so logs show which statement failed.
//! They are never shown to API clients.

mod executor;
mod resolver;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use registry_query::ExecutorError;

use crate::DatabaseConfig;

pub use executor::PgQueryExecutor;
pub use resolver::PgTenantResolver;

/// Open a pool using `config`.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> ExecutorError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("42703") => ExecutorError::Backend(format!("{msg} (undefined column)")),
                Some("22P02") => ExecutorError::Backend(format!("{msg} (bad parameter value)")),
                _ => ExecutorError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            ExecutorError::Backend(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::RowNotFound => ExecutorError::NotFound,
        _ => ExecutorError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
