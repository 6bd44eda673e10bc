use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use letterpress_export::ExportError;
use letterpress_orchestrator::OrchestratorError;
use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(error: OrchestratorError) -> Self {
        match error {
            OrchestratorError::Validation(message) => {
                warn!(%message, "rejected document request");
                Self::bad_request(message)
            }
            other => {
                error!(error = ?other, "orchestrator error");
                // Upstream details stay in the log.
                Self::internal_server_error("document generation failed")
            }
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(error: ExportError) -> Self {
        match error {
            ExportError::UnsupportedFormat(_) => {
                warn!(error = %error, "rejected export request");
                Self::bad_request(error.to_string())
            }
            other => {
                error!(error = ?other, "export error");
                Self::internal_server_error("document export failed")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(reason = %rejection.body_text(), "malformed request body");
        Self::new(rejection.status(), rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use letterpress_orchestrator::UpstreamError;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let error = ApiError::from(OrchestratorError::validation("prompt must not be empty"));
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.message, "prompt must not be empty");
    }

    #[test]
    fn upstream_errors_are_generic() {
        let error = ApiError::from(OrchestratorError::Upstream(UpstreamError::EmptyResponse));
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message, "document generation failed");
    }

    #[test]
    fn unsupported_formats_map_to_bad_request() {
        let error = ApiError::from(ExportError::UnsupportedFormat("rtf".into()));
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert!(error.message.contains("rtf"));
    }
}
