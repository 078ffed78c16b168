//! Runs compiled list queries against Postgres, one JSON object per row.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::Query as SqlxQuery;
use sqlx::{PgPool, Postgres, Row};
use tracing::instrument;

use registry_query::{ExecutorError, Param, QueryExecutor, SelectStatement};

use super::map_sqlx_error;

#[derive(Debug, Clone)]
pub struct PgQueryExecutor {
    pool: Arc<PgPool>,
}

impl PgQueryExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

/// Rewrite `?` placeholders as `$1, $2, ...`.
///
/// Compiled statements never carry literals, so every `?` is a placeholder.
fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0;
    for c in sql.chars() {
        if c == '?' {
            n += 1;
            out.push('$');
            out.push_str(&n.to_string());
        } else {
            out.push(c);
        }
    }
    out
}

/// Wrap a select so each row comes back as a single `json` column.
fn row_json_sql(stmt: &SelectStatement) -> String {
    number_placeholders(&format!(
        "SELECT row_to_json(t) AS row FROM ({}) t",
        stmt.to_sql()
    ))
}

fn bind_all<'q>(
    mut query: SqlxQuery<'q, Postgres, PgArguments>,
    params: &[Param],
) -> SqlxQuery<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            Param::Int(v) => query.bind(*v),
            Param::Text(v) => query.bind(v.clone()),
            Param::Bool(v) => query.bind(*v),
            Param::Timestamp(v) => query.bind(*v),
        };
    }
    query
}

#[async_trait]
impl QueryExecutor for PgQueryExecutor {
    type Row = serde_json::Value;

    #[instrument(
        skip(self, stmt),
        fields(source = %stmt.source, params = stmt.params.len()),
        err
    )]
    async fn select(&self, stmt: &SelectStatement) -> Result<Vec<Self::Row>, ExecutorError> {
        let sql = row_json_sql(stmt);
        let rows = bind_all(sqlx::query(&sql), &stmt.params)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("select", e))?;

        rows.iter()
            .map(|row| {
                row.try_get::<serde_json::Value, _>("row")
                    .map_err(|e| map_sqlx_error("select", e))
            })
            .collect()
    }

    #[instrument(
        skip(self, stmt),
        fields(source = %stmt.source, params = stmt.params.len()),
        err
    )]
    async fn count(&self, stmt: &SelectStatement) -> Result<u64, ExecutorError> {
        let sql = number_placeholders(&stmt.to_count_sql());
        let row = bind_all(sqlx::query(&sql), &stmt.params)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;
        let total: i64 = row.try_get(0).map_err(|e| map_sqlx_error("count", e))?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}
