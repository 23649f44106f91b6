use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::document::PersistenceError;
use crate::editor::{EditorError, ValidationReport};
use crate::registry::RegistryError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid fields")]
    InvalidFields(ValidationReport),

    #[error("Registry integrity error: {0}")]
    RegistryIntegrity(String),

    #[error("Section conflict: {0}")]
    SectionConflict(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Persistence(inner) => AppError::Persistence(inner),
            other => AppError::RegistryIntegrity(other.to_string()),
        }
    }
}

impl From<EditorError> for AppError {
    fn from(e: EditorError) -> Self {
        match e {
            EditorError::Invalid(report) => AppError::InvalidFields(report),
            EditorError::UnknownItem(id) => AppError::NotFound(format!("Item {id} not found")),
            shape @ EditorError::Shape { .. } => AppError::SectionConflict(shape.to_string()),
            EditorError::Encode(e) => AppError::Internal(e.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InvalidFields(report) => {
                let body = Json(json!({
                    "error": {
                        "code": "VALIDATION_ERROR",
                        "message": "One or more fields are invalid",
                        "fieldErrors": report.field_errors,
                    }
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::RegistryIntegrity(msg) => (
                StatusCode::CONFLICT,
                "REGISTRY_INTEGRITY_ERROR",
                msg.clone(),
            ),
            AppError::SectionConflict(msg) => {
                (StatusCode::CONFLICT, "SECTION_CONFLICT", msg.clone())
            }
            AppError::Persistence(e) => {
                tracing::warn!("Persistence error: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PERSISTENCE_ERROR",
                    "Could not save changes. Try again.".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
