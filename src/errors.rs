use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::guard::GuardRejection;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid refresh token")]
    InvalidRefresh,

    #[error("Credential rejected: {0}")]
    Credential(GuardRejection),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found")]
    NotFound,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::Persistence(e.to_string())
    }
}

impl From<GuardRejection> for AppError {
    fn from(r: GuardRejection) -> Self {
        AppError::Credential(r)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidRefresh | AppError::Credential(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Persistence(_) | AppError::Signing(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_failed",
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidRefresh => "invalid_refresh",
            AppError::Credential(r) => r.code(),
            AppError::Conflict(_) => "conflict",
            AppError::NotFound => "not_found",
            AppError::Persistence(_) | AppError::Signing(_) | AppError::Internal(_) => {
                "internal_error"
            }
        }
    }

    fn is_internal(&self) -> bool {
        self.status() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        if self.is_internal() {
            tracing::error!(error = %self, "request failed with internal fault");
        }

        let msg = match &self {
            AppError::Validation(s) | AppError::Conflict(s) => s.clone(),
            AppError::Unauthorized => "unauthorized".into(),
            AppError::InvalidRefresh => "invalid refresh token".into(),
            AppError::Credential(r) => r.to_string(),
            AppError::NotFound => "not found".into(),
            // details only leave the process in diagnostic builds
            _ if cfg!(debug_assertions) => self.to_string(),
            _ => "internal error".into(),
        };

        (status, Json(json!({ "error": msg, "code": code }))).into_response()
    }
}
