use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use gacha_application::AppError;
use gacha_domain::ErrorCategory;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    App(#[from] AppError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    category: ErrorCategory,
}

pub fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::FormatInvalid => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCategory::IdentityMismatch => StatusCode::CONFLICT,
        ErrorCategory::AlreadyImportedByOtherProvider => StatusCode::CONFLICT,
        ErrorCategory::NoHistory => StatusCode::NOT_FOUND,
        ErrorCategory::PartialMigrationFailure => StatusCode::MULTI_STATUS,
        ErrorCategory::TransientStorage => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCategory::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCategory::Unauthorized => StatusCode::UNAUTHORIZED,
    }
}

impl HttpError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            HttpError::Unauthorized => ErrorCategory::Unauthorized,
            HttpError::BadRequest(_) => ErrorCategory::InvalidRequest,
            HttpError::App(err) => err.category(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let category = self.category();
        let status = status_for(category);
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
                category,
            }),
        )
            .into_response()
    }
}
