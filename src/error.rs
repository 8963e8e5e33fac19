/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - AuthError を HTTP の意味 (401 / 403 / 500) に変換
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::AuthError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized: {code}")]
    Unauthorized { code: &'static str },
    #[error("forbidden: {code}")]
    Forbidden { code: &'static str },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn unauthorized(code: &'static str) -> Self {
        Self::Unauthorized { code }
    }

    pub fn forbidden(code: &'static str) -> Self {
        Self::Forbidden { code }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Unauthorized { code } => {
                (StatusCode::UNAUTHORIZED, code, "unauthorized".into())
            }
            AppError::Forbidden { code } => (StatusCode::FORBIDDEN, code, "forbidden".into()),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match &e {
            // Server-side config / backend problems: do not blame the client.
            AuthError::MissingVerificationKey | AuthError::UserLookupFailed(_) => {
                AppError::Internal
            }
            AuthError::ResourceNotAuthorized => AppError::forbidden(e.code()),
            _ => AppError::unauthorized(e.code()),
        }
    }
}
