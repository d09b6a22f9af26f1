use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bookshelf_core::BookshelfError;
use bookshelf_lookup::LookupError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by HTTP handlers, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Book not found: {0}")]
    NotFound(i64),

    #[error("Catalog lookup failed: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<BookshelfError> for ApiError {
    fn from(err: BookshelfError) -> Self {
        match err {
            BookshelfError::BookNotFound(id) => Self::NotFound(id),
            BookshelfError::ValidationError(msg) => Self::BadRequest(msg),
            BookshelfError::InvalidStatus(status) => {
                Self::BadRequest(format!("invalid status: {status}"))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::EmptyQuery => Self::BadRequest("Query parameter \"q\" is required".into()),
            other => Self::Upstream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::NotFound(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Upstream("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_from_core_errors() {
        let err: ApiError = BookshelfError::BookNotFound(5).into();
        assert!(matches!(err, ApiError::NotFound(5)));

        let err: ApiError = BookshelfError::ValidationError("title is required".into()).into();
        assert_eq!(err.to_string(), "title is required");

        let err: ApiError = LookupError::EmptyQuery.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
