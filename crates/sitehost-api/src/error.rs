//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sitehost_core::CoreError;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Bodies stay generic; details only go to the log
        let message = match &self {
            ApiError::Core(CoreError::DatabaseUnavailable(_)) => "Server configuration error",
            ApiError::Core(CoreError::Storage(_)) | ApiError::Internal(_) => {
                "Internal Server Error"
            }
        };

        error!("Request failed: {}", self);

        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_status() {
        let response =
            ApiError::Core(CoreError::DatabaseUnavailable("bad json".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
