//! Error wrappers shared by JSON endpoints and HTML pages.

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::{AppError, QueryError};

use super::render::ErrorPage;

/// Result type for JSON endpoints.
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Result type for HTML pages; `T` is a page template.
pub type PageResult<T> = Result<T, PageError>;

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human readable message.
    pub error: String,
}

/// Error returned by a JSON endpoint.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Create an error with an explicit status.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Status code the error maps to.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Query(query) => query.into(),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, "Endpoint failed: {}", self.message);
        } else {
            warn!(status = %self.status, "Endpoint rejected request: {}", self.message);
        }

        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Error returned by an HTML page.
#[derive(Debug)]
pub struct PageError {
    status: StatusCode,
    message: String,
}

impl PageError {
    /// Create an error with an explicit status.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<QueryError> for PageError {
    // Pages build their own queries, so a bad one is a server fault.
    fn from(err: QueryError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        error!(status = %self.status, "Page failed: {}", self.message);

        // Internal detail stays in the log.
        let public = if self.status.is_server_error() {
            "Something went wrong while building this page."
        } else {
            self.message.as_str()
        };

        (self.status, ErrorPage::new(self.status, public)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_errors_are_bad_requests() {
        let err: ApiError = QueryError::UnknownLocation("Atlantis".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = AppError::Query(QueryError::InvalidDateFormat("%Q".to_string())).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_errors_are_internal() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: ApiError = AppError::Io(io).into();

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn page_error_renders_html() {
        let response = PageError::new(StatusCode::INTERNAL_SERVER_ERROR, "secret detail").into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()["content-type"],
            "text/html; charset=utf-8"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("500 Internal Server Error"));
        assert!(!html.contains("secret detail"));
    }
}
