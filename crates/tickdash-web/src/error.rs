use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Request-level errors mapped to HTTP statuses.
#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Validation(#[from] tickdash_core::ValidationError),

    #[error("nothing to refresh, load a symbol first")]
    NothingToRefresh,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

impl WebError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NothingToRefresh => StatusCode::CONFLICT,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "input.invalid",
            Self::NothingToRefresh => "input.missing",
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            error: ErrorBody {
                code: self.code(),
                message: self.to_string(),
            },
        };
        (self.status(), Json(body)).into_response()
    }
}
