use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use grid_client::{IdentifierError, SourceError};
use serde_json::json;

use crate::pipeline::PipelineError;

/// Error body returned by the API: `{"error": ..., "retryable": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub retryable: bool,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            status,
            message: message.into(),
            retryable,
        }
    }
}

impl From<SourceError> for ApiError {
    fn from(e: SourceError) -> Self {
        let retryable = e.is_retryable();
        let status = match &e {
            SourceError::Network(_) | SourceError::MalformedBody { .. } => StatusCode::BAD_GATEWAY,
            SourceError::InvalidQuery(_) | SourceError::Identifier(_) => StatusCode::BAD_REQUEST,
            SourceError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string(), retryable)
    }
}

impl From<IdentifierError> for ApiError {
    fn from(e: IdentifierError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, e.to_string(), false)
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Source(source) => source.into(),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string(), false),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), error = %self.message, "request failed");
        } else if self.retryable || self.status == StatusCode::BAD_GATEWAY {
            tracing::warn!(status = self.status.as_u16(), error = %self.message, "upstream lookup failed");
        }

        let body = Json(json!({
            "error": self.message,
            "retryable": self.retryable,
        }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_upstream_body_is_bad_gateway_and_not_retryable() {
        let e = SourceError::MalformedBody {
            reason: "expected value".into(),
            preview: "<html>".into(),
        };
        let api: ApiError = PipelineError::from(e).into();
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
        assert!(!api.retryable);
        assert!(api.message.contains("<html>"));
    }

    #[test]
    fn bad_identifiers_are_client_errors() {
        let api: ApiError = IdentifierError::Empty.into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);

        let api: ApiError = SourceError::InvalidQuery("no city".into()).into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
    }
}
