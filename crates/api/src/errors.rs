//! Error classification and HTTP mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;

use registry_query::{ExecutorError, FilterError};

use crate::authz::AuthorizationError;
use crate::listing::ListError;
use crate::resolver::ResolveError;

/// Coarse class of an error, one per HTTP status family the API emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    BadRequest,
    Forbidden,
    NotFound,
    Internal,
}

impl ErrorClass {
    pub fn http_status(self) -> StatusCode {
        match self {
            ErrorClass::BadRequest => StatusCode::BAD_REQUEST,
            ErrorClass::Forbidden => StatusCode::FORBIDDEN,
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors that know their [`ErrorClass`] and a stable machine-readable code.
pub trait Classify {
    fn class(&self) -> ErrorClass;

    fn code(&self) -> &'static str;

    fn http_status(&self) -> StatusCode {
        self.class().http_status()
    }
}

impl Classify for FilterError {
    fn class(&self) -> ErrorClass {
        ErrorClass::BadRequest
    }

    fn code(&self) -> &'static str {
        "invalid_filter"
    }
}

impl Classify for ExecutorError {
    fn class(&self) -> ErrorClass {
        match self {
            ExecutorError::NotFound => ErrorClass::NotFound,
            ExecutorError::Backend(_) => ErrorClass::Internal,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ExecutorError::NotFound => "not_found",
            ExecutorError::Backend(_) => "store_error",
        }
    }
}

impl Classify for ResolveError {
    fn class(&self) -> ErrorClass {
        match self {
            ResolveError::NotFound { .. } => ErrorClass::NotFound,
            ResolveError::ParentNotFound { .. }
            | ResolveError::Unsupported(_)
            | ResolveError::Storage(_) => ErrorClass::Internal,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ResolveError::NotFound { .. } => "not_found",
            ResolveError::ParentNotFound { .. } => "orphaned_resource",
            ResolveError::Unsupported(_) => "unsupported_resource",
            ResolveError::Storage(_) => "store_error",
        }
    }
}

impl Classify for AuthorizationError {
    fn class(&self) -> ErrorClass {
        match self {
            AuthorizationError::MalformedRoute { .. } => ErrorClass::BadRequest,
            AuthorizationError::MissingPermissionMapping { .. } => ErrorClass::Internal,
            AuthorizationError::ResourceLookup(e) => e.class(),
            AuthorizationError::PermissionDenied { .. } => ErrorClass::Forbidden,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AuthorizationError::MalformedRoute { .. } => "malformed_route",
            AuthorizationError::MissingPermissionMapping { .. } => "missing_permission_mapping",
            AuthorizationError::ResourceLookup(e) => e.code(),
            AuthorizationError::PermissionDenied { .. } => "permission_denied",
        }
    }
}

impl Classify for ListError {
    fn class(&self) -> ErrorClass {
        match self {
            ListError::Filter(e) => e.class(),
            ListError::Executor(e) => e.class(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ListError::Filter(e) => e.code(),
            ListError::Executor(e) => e.code(),
        }
    }
}

/// Internal details stay in the logs; clients get a generic message.
fn client_message<E: Classify + std::fmt::Display>(err: &E) -> String {
    match err.class() {
        ErrorClass::Internal => "internal server error".to_string(),
        _ => err.to_string(),
    }
}

impl IntoResponse for AuthorizationError {
    fn into_response(self) -> axum::response::Response {
        json_error(self.http_status(), self.code(), client_message(&self))
    }
}

impl IntoResponse for ListError {
    fn into_response(self) -> axum::response::Response {
        json_error(self.http_status(), self.code(), client_message(&self))
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
