use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use charm_types::CounterKeyError;
use tracing::{debug, error};

use super::dto::ErrorResponse;
use crate::storage::StorageError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Forbidden(String),
    /// Logged where it is raised; no detail reaches the client.
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", Some(msg)),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", Some(msg)),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        if err.is_not_found() {
            debug!("{err}");
            ApiError::NotFound(err.to_string())
        } else {
            error!(error = %err, "store request failed");
            ApiError::Internal
        }
    }
}

impl From<CounterKeyError> for ApiError {
    fn from(err: CounterKeyError) -> Self {
        debug!("rejected counter key: {err}");
        match err {
            CounterKeyError::Separator(_) => ApiError::NotFound(err.to_string()),
            CounterKeyError::Empty
            | CounterKeyError::UnconstrainedPrefix
            | CounterKeyError::InvalidSegment(_) => ApiError::Forbidden(err.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use axum::body::to_bytes;

    async fn error_body(response: Response) -> ErrorResponse {
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_api_error_not_found() {
        let error = ApiError::NotFound("charm not found: cs:precise/foo".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let error_response = error_body(response).await;
        assert_eq!(error_response.error, "Not Found");
        assert_eq!(
            error_response.details,
            Some("charm not found: cs:precise/foo".to_string())
        );
    }

    #[tokio::test]
    async fn test_api_error_forbidden() {
        let response = ApiError::Forbidden("counter key is empty".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let error_response = error_body(response).await;
        assert_eq!(error_response.error, "Forbidden");
        assert_eq!(error_response.details, Some("counter key is empty".to_string()));
    }

    #[tokio::test]
    async fn test_api_error_internal_hides_details() {
        let response = ApiError::Internal.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let error_response = error_body(response).await;
        assert_eq!(error_response.error, "Internal Server Error");
        assert_eq!(error_response.details, None);
    }

    #[test]
    fn test_storage_error_conversion() {
        let api_err: ApiError = StorageError::NotFound("cs:precise/foo".to_string()).into();
        assert!(matches!(api_err, ApiError::NotFound(_)));

        let api_err: ApiError = StorageError::AlreadyExists("cs:precise/foo-1".to_string()).into();
        assert!(matches!(api_err, ApiError::Internal));
    }

    #[test]
    fn test_counter_key_error_conversion() {
        let api_err: ApiError = CounterKeyError::Separator("a/b".to_string()).into();
        assert!(matches!(api_err, ApiError::NotFound(_)));

        for err in [
            CounterKeyError::Empty,
            CounterKeyError::UnconstrainedPrefix,
            CounterKeyError::InvalidSegment("*".to_string()),
        ] {
            let api_err: ApiError = err.into();
            assert!(matches!(api_err, ApiError::Forbidden(_)));
        }
    }
}
