use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::db::DbError;

/// Errors surfaced by the schema services
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Payload rejected; carries every accumulated message
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// A referenced id (field type, asset type) does not resolve
    #[error("{0}")]
    InvalidReference(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

pub type SchemaResult<T> = Result<T, SchemaError>;

impl SchemaError {
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        SchemaError::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        SchemaError::NotFound(what.into())
    }

    /// True when a unique index rejected the write; such failures are retried
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, SchemaError::Database(err) if err.is_unique_violation())
    }

    /// Messages suitable for a per-item failure report
    pub fn messages(&self) -> Vec<String> {
        match self {
            SchemaError::Validation(errors) => errors.clone(),
            other => vec![other.to_string()],
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SchemaError::Validation(_) | SchemaError::InvalidReference(_) => {
                StatusCode::BAD_REQUEST
            }
            SchemaError::NotFound(_) => StatusCode::NOT_FOUND,
            SchemaError::Conflict { .. } => StatusCode::CONFLICT,
            SchemaError::Database(DbError::UniqueViolation(_))
            | SchemaError::Database(DbError::ForeignKeyViolation(_)) => StatusCode::CONFLICT,
            SchemaError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SchemaError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            SchemaError::Validation(errors) => json!({
                "error": "Validation failed",
                "errors": errors,
            }),
            SchemaError::Conflict { message, details } => json!({
                "error": message,
                "details": details,
            }),
            SchemaError::Database(err) => {
                tracing::error!("Database failure: {}", err);
                json!({ "error": err.to_string() })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
