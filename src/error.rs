//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Entity declarations that cannot be provisioned. Fatal at startup.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    #[error("entity declaration has an empty name")]
    EmptyEntityName,
    #[error("duplicate entity name: {0}")]
    DuplicateEntity(String),
    #[error("duplicate path segment: {0}")]
    DuplicatePathSegment(String),
    #[error("invalid path segment '{path}' for entity {entity}")]
    InvalidPathSegment { entity: String, path: String },
    #[error("entity {entity}: duplicate field '{field}'")]
    DuplicateField { entity: String, field: String },
    #[error("entity {entity}: field '{field}' has unrecognized type '{type_name}'")]
    UnknownFieldType {
        entity: String,
        field: String,
        type_name: String,
    },
    #[error("entity {entity}: invalid identity field '{field}': {reason}")]
    InvalidIdentity {
        entity: String,
        field: String,
        reason: &'static str,
    },
    #[error("entity {entity}: '{name}' is reserved for the self link")]
    ReservedName { entity: String, name: String },
    #[error("entity {entity}: reference field '{field}' has no target")]
    MissingReferenceTarget { entity: String, field: String },
    #[error("entity {entity}: reference field '{field}' targets unknown entity '{target}'")]
    UnknownReferenceTarget {
        entity: String,
        field: String,
        target: String,
    },
}

/// Startup configuration failures: settings and declaration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("invalid base path '{path}': {reason}")]
    InvalidBasePath { path: String, reason: &'static str },
    #[error("invalid setting {key}='{value}': {reason}")]
    InvalidSetting {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("entity path '{path}' collides with the operational route /{path} when mounted at root")]
    ReservedPath { path: String },
    #[error("config load: {0}")]
    Load(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable kind used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Internal(message) = &self {
            tracing::error!(%message, "internal error");
        }
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
