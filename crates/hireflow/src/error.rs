use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::hiring::HiringServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Top-level error for binaries composing the hiring workflows.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("hiring workflow error: {0}")]
    Hiring(#[from] HiringServiceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // The workflow error carries its own status mapping.
            AppError::Hiring(err) => err.into_response(),
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) | AppError::Server(_) => {
                let body = Json(json!({ "error": self.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
