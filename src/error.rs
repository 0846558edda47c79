use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// RepoError
///
/// Failures raised by the record access layer.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("database error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("encoding error: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// AppError
///
/// The caller-facing error taxonomy. Authentication and authorization failures map to
/// 401/403 with the legacy `{ message }` bodies the frontend already understands.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("unauthorized access")]
    Unauthenticated,

    #[error("forbidden access")]
    Forbidden,

    #[error("bad input: {0}")]
    BadInput(String),

    #[error(transparent)]
    Store(#[from] RepoError),

    #[error("payment provider error: {0}")]
    Payment(String),

    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadInput(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Payment(_) => StatusCode::BAD_GATEWAY,
            AppError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Store(e) => {
                tracing::error!(error = %e, "store operation failed");
                "internal server error".to_string()
            }
            AppError::Payment(e) => {
                tracing::error!(error = %e, "payment provider call failed");
                "payment provider unavailable".to_string()
            }
            AppError::Token(e) => {
                tracing::error!(error = %e, "token signing failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::Store(RepoError::Mongo(e))
    }
}

/// A body the `Json` extractor could not parse (bad syntax, wrong content type,
/// missing or mistyped fields) is reported like any other bad input.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadInput(rejection.body_text())
    }
}
