use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Error code returned when one of the required request fields is empty.
pub const MISSING_FIELDS_CODE: &str = "faltan_campos";

/// Error code returned when a structured request body cannot be decoded.
pub const INVALID_BODY_CODE: &str = "invalid_body";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("Missing fields: {0}")]
    MissingFields(String),

    #[error("Invalid body: {0}")]
    InvalidBody(String),

    #[error("{0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::MissingFields(_) | AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::InternalError(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            detail: Option<String>,
        }

        let status = self.status_code();
        let (error, detail) = match self {
            AppError::Unauthorized => ("unauthorized".to_string(), None),
            AppError::MissingFields(detail) => (MISSING_FIELDS_CODE.to_string(), Some(detail)),
            AppError::InvalidBody(detail) => (INVALID_BODY_CODE.to_string(), Some(detail)),
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "Request failed");
                (err.to_string(), None)
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error");
                (format!("Configuration error: {}", err), None)
            }
        };

        (status, Json(ErrorResponse { error, detail })).into_response()
    }
}
