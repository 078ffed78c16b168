//! The seam between a compiled [`Query`](crate::Query) and whatever runs it.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Serialize;

use crate::{ExecutorError, Param};

/// Everything an executor needs to run one compiled query.
///
/// `where_clause` uses `?` placeholders; `params` holds their values in order.
/// Drivers with numbered placeholders rewrite them before binding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectStatement {
    /// Table or view name, chosen by code.
    pub source: String,
    pub where_clause: String,
    pub params: Vec<Param>,
    pub columns: Vec<String>,
    pub relations: Vec<String>,
    /// Rendered `column direction` entries.
    pub order_by: Vec<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectStatement {
    /// Render the statement as SQL with `?` placeholders.
    pub fn to_sql(&self) -> String {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };
        let mut sql = format!("SELECT {columns} FROM {}", self.source);
        self.push_tail(&mut sql);
        sql
    }

    /// Render a `SELECT COUNT(*)` over the same conditions.
    pub fn to_count_sql(&self) -> String {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.source);
        if !self.where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clause);
        }
        sql
    }

    fn push_tail(&self, sql: &mut String) {
        if !self.where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clause);
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
    }
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    type Row: Send;

    async fn select(&self, stmt: &SelectStatement) -> Result<Vec<Self::Row>, ExecutorError>;

    async fn count(&self, stmt: &SelectStatement) -> Result<u64, ExecutorError>;
}

#[async_trait]
impl<E> QueryExecutor for Arc<E>
where
    E: QueryExecutor + ?Sized,
{
    type Row = E::Row;

    async fn select(&self, stmt: &SelectStatement) -> Result<Vec<Self::Row>, ExecutorError> {
        (**self).select(stmt).await
    }

    async fn count(&self, stmt: &SelectStatement) -> Result<u64, ExecutorError> {
        (**self).count(stmt).await
    }
}

/// In-memory executor for tests/dev.
///
/// Returns canned rows and records every statement it is handed.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    rows: RwLock<Vec<serde_json::Value>>,
    total: RwLock<Option<u64>>,
    failure: RwLock<Option<ExecutorError>>,
    seen: RwLock<Vec<SelectStatement>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<serde_json::Value>) -> Self {
        let exec = Self::new();
        exec.set_rows(rows);
        exec
    }

    pub fn set_rows(&self, rows: Vec<serde_json::Value>) {
        if let Ok(mut guard) = self.rows.write() {
            *guard = rows;
        }
    }

    /// Override the value `count` returns. Defaults to the number of canned rows.
    pub fn set_total(&self, total: u64) {
        if let Ok(mut guard) = self.total.write() {
            *guard = Some(total);
        }
    }

    /// Make every subsequent call fail with `err`.
    pub fn fail_with(&self, err: ExecutorError) {
        if let Ok(mut guard) = self.failure.write() {
            *guard = Some(err);
        }
    }

    pub fn statements(&self) -> Vec<SelectStatement> {
        self.seen.read().map(|s| s.clone()).unwrap_or_default()
    }

    fn record(&self, stmt: &SelectStatement) -> Result<(), ExecutorError> {
        if let Ok(mut seen) = self.seen.write() {
            seen.push(stmt.clone());
        }
        match self.failure.read() {
            Ok(guard) => guard.clone().map_or(Ok(()), Err),
            Err(_) => Err(ExecutorError::Backend("executor lock poisoned".into())),
        }
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    type Row = serde_json::Value;

    async fn select(&self, stmt: &SelectStatement) -> Result<Vec<Self::Row>, ExecutorError> {
        self.record(stmt)?;
        let rows = self
            .rows
            .read()
            .map_err(|_| ExecutorError::Backend("executor lock poisoned".into()))?;
        let start = stmt.offset.unwrap_or(0) as usize;
        let end = match stmt.limit {
            Some(limit) => start.saturating_add(limit as usize).min(rows.len()),
            None => rows.len(),
        };
        Ok(rows.get(start..end).map(<[_]>::to_vec).unwrap_or_default())
    }

    async fn count(&self, stmt: &SelectStatement) -> Result<u64, ExecutorError> {
        self.record(stmt)?;
        let total = self.total.read().ok().and_then(|t| *t);
        match total {
            Some(total) => Ok(total),
            None => Ok(self.rows.read().map(|r| r.len() as u64).unwrap_or(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::CompareOp;
    use crate::{Query, SortDirection};
    use serde_json::json;

    #[test]
    fn statement_renders_full_select() {
        let mut q = Query::new();
        q.and_where("institution_id", CompareOp::Eq, 3i64)
            .order_by("updated_at", SortDirection::Desc)
            .limit(10)
            .offset(20);
        let stmt = q.statement("generic_files");
        assert_eq!(
            stmt.to_sql(),
            "SELECT * FROM generic_files WHERE (institution_id = ?) ORDER BY updated_at desc LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            stmt.to_count_sql(),
            "SELECT COUNT(*) FROM generic_files WHERE (institution_id = ?)"
        );
    }

    #[tokio::test]
    async fn select_one_reports_not_found_on_empty_result() {
        let exec = RecordingExecutor::new();
        let q = Query::new();
        assert_eq!(
            q.select_one(&exec, "users").await,
            Err(ExecutorError::NotFound)
        );
        assert_eq!(exec.statements()[0].limit, Some(1));
    }

    #[tokio::test]
    async fn select_applies_limit_and_offset_to_canned_rows() {
        let exec = RecordingExecutor::with_rows((0..5).map(|i| json!({ "id": i })).collect());
        let mut q = Query::new();
        q.limit(2).offset(1);
        let rows = q.select(&exec, "alerts").await.unwrap();
        assert_eq!(rows, vec![json!({ "id": 1 }), json!({ "id": 2 })]);
        assert_eq!(q.count(&exec, "alerts").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn count_ignores_paging_and_ordering() {
        let exec = RecordingExecutor::new();
        exec.set_total(42);
        let mut q = Query::new();
        q.is_null("deactivated_at")
            .order_by("name", SortDirection::Asc)
            .limit(5);
        assert_eq!(q.count(&exec, "users").await.unwrap(), 42);
        let stmt = &exec.statements()[0];
        assert!(stmt.order_by.is_empty());
        assert_eq!(stmt.limit, None);
        assert_eq!(stmt.where_clause, "(deactivated_at IS NULL)");
    }

    #[tokio::test]
    async fn backend_failures_propagate() {
        let exec = RecordingExecutor::new();
        exec.fail_with(ExecutorError::Backend("down".into()));
        assert!(matches!(
            Query::new().select(&exec, "users").await,
            Err(ExecutorError::Backend(_))
        ));
    }
}
