//! Error types for the thesis formatting API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Conversion timed out after {0} seconds")]
    ConversionTimeout(u64),

    #[error("Converter not available: {0}")]
    ConverterMissing(&'static str),

    #[error("Engine error: {0}")]
    Engine(#[from] template_engine::EngineError),

    #[error("Document error: {0}")]
    Package(#[from] docx_package::PackageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::TemplateNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Template not found: {}", id))
            }
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conversion(msg) => {
                tracing::error!("Conversion failed: {}", msg);
                (StatusCode::BAD_GATEWAY, format!("Conversion failed: {}", msg))
            }
            ApiError::ConversionTimeout(secs) => (
                StatusCode::GATEWAY_TIMEOUT,
                format!("Conversion timed out after {} seconds", secs),
            ),
            ApiError::ConverterMissing(name) => (
                StatusCode::BAD_GATEWAY,
                format!("Converter not available: {}", name),
            ),
            ApiError::Engine(e) => {
                tracing::error!("Engine error: {}", e);
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            ApiError::Package(e) => {
                tracing::error!("Document error: {}", e);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("Document error: {}", e),
                )
            }
            ApiError::Io(e) => {
                tracing::error!("I/O error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
