//! Mapping of domain errors onto HTTP responses.

use authcore_core::{AuthcoreError, ErrorKind};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{debug, error};

/// Error returned by handlers and middleware.
///
/// The response carries only a generic message per error kind; the
/// detailed reason is logged.
#[derive(Debug)]
pub struct ApiError(pub AuthcoreError);

impl From<AuthcoreError> for ApiError {
    fn from(err: AuthcoreError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn code_and_message(kind: ErrorKind) -> (&'static str, &'static str) {
    match kind {
        ErrorKind::Unauthenticated => ("unauthenticated", "authentication is required"),
        ErrorKind::PermissionDenied => ("permission_denied", "permission denied"),
        ErrorKind::InvalidArgument => ("invalid_argument", "invalid argument"),
        ErrorKind::NotFound => ("not_found", "not found"),
        ErrorKind::Unknown => ("unknown", "internal error"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        if kind == ErrorKind::Unknown {
            error!(error = %self.0, "request failed");
        } else {
            debug!(error = %self.0, "request rejected");
        }
        let (code, message) = code_and_message(kind);
        (
            self.status(),
            Json(json!({
                "error": code,
                "message": message,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn kinds_map_to_statuses() {
        let cases = [
            (AuthcoreError::unauthenticated("x"), StatusCode::UNAUTHORIZED),
            (AuthcoreError::permission_denied("x"), StatusCode::FORBIDDEN),
            (AuthcoreError::invalid_argument("x"), StatusCode::BAD_REQUEST),
            (
                AuthcoreError::NotFound {
                    entity: "session".into(),
                    id: "1".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (AuthcoreError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AuthcoreError::DeadlineExceeded, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[tokio::test]
    async fn body_does_not_leak_the_reason() {
        let response =
            ApiError(AuthcoreError::unauthenticated("signature mismatch for kid abc")).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(!body.contains("signature"));
        assert!(body.contains("unauthenticated"));
    }
}
