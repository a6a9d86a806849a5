//! Mapping of service errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use paperkg_core::KgError;
use serde_json::json;
use tracing::{debug, error};

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Error returned by every handler; rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    /// Map a service error. Internal details only leave the process when
    /// `debug` is set.
    pub fn from_kg(err: KgError, debug: bool) -> Self {
        match err {
            KgError::NotFound(_) => {
                debug!(error = %err, "Not found");
                Self::not_found(err.to_string())
            }
            KgError::ValidationError(msg) => Self::bad_request(msg),
            KgError::StoreUnavailable(_) | KgError::Json(_) => {
                error!(error = %err, "Request failed");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: if debug {
                        err.to_string()
                    } else {
                        INTERNAL_MESSAGE.to_string()
                    },
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from_kg(KgError::not_found("x"), false).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from_kg(KgError::validation("bad"), false).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from_kg(KgError::unavailable("down"), false).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_message_hidden_unless_debug() {
        let hidden = ApiError::from_kg(KgError::unavailable("bolt://secret"), false);
        assert_eq!(hidden.message, INTERNAL_MESSAGE);

        let shown = ApiError::from_kg(KgError::unavailable("bolt://secret"), true);
        assert!(shown.message.contains("bolt://secret"));
    }
}
