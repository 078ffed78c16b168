use thiserror::Error;

/// A client-supplied filter or sort parameter was rejected.
///
/// Every variant is a 400-class error. The caller decides whether to reject
/// the whole request or just the offending parameter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid query string param '{key}': unknown operator '{operator}'")]
    UnknownOperator { key: String, operator: String },

    #[error("invalid query string param '{key}': missing column name")]
    MalformedKey { key: String },

    #[error("query string param '{key}' is not a permitted filter")]
    DisallowedFilter { key: String },

    #[error("cannot sort on column '{column}'")]
    DisallowedSort { column: String },

    #[error("invalid value '{value}' for query string param '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("query string param '{key}' requires a value")]
    MissingValue { key: String },

    #[error("invalid sort direction '{0}': expected asc or desc")]
    InvalidDirection(String),

    #[error("invalid query params: {}", .0.join(", "))]
    UnknownParams(Vec<String>),

    #[error("invalid paging value '{0}'")]
    InvalidPage(String),
}

/// Failure reported by a [`QueryExecutor`](crate::QueryExecutor).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("no rows matched")]
    NotFound,

    #[error("query execution failed: {0}")]
    Backend(String),
}
