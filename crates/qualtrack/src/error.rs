use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::accounts::service::AccountError;
use crate::assist::AssistError;
use crate::config::ConfigError;
use crate::qualifications::service::ServiceError;
use crate::telemetry::TelemetryError;

/// Top-level error for startup and request handling.
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
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Assist(#[from] AssistError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Service(ServiceError::Validation { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Service(ServiceError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Service(ServiceError::CompanyInUse { .. }) => StatusCode::CONFLICT,
            AppError::Service(ServiceError::ImportUnreadable(_)) => StatusCode::BAD_REQUEST,
            AppError::Account(AccountError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            AppError::Account(AccountError::NotAdmin) => StatusCode::FORBIDDEN,
            AppError::Account(AccountError::DuplicateUsername) => StatusCode::CONFLICT,
            AppError::Account(AccountError::Validation { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            // External-dependency failures are downgraded, never fatal.
            AppError::Assist(AssistError::MissingCredential) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Assist(AssistError::EmptyQuestion) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Assist(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
