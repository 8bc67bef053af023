use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gatebridge_core::ExchangeError;
use std::time::Duration;

/// Error returned by a route handler.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub label: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, label: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError {
            status,
            label: label.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, label, message)
    }

    pub fn rate_limited(retry_after: Duration) -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "TOO_MANY_REQUESTS",
            format!("Too many requests; retry after {}ms", retry_after.as_millis()),
        )
    }
}

impl From<ExchangeError> for ApiError {
    fn from(err: ExchangeError) -> Self {
        let message = err.to_string();
        match err {
            ExchangeError::MissingCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, "MISSING_CREDENTIALS", message)
            }
            ExchangeError::Transport(_) => {
                Self::new(StatusCode::BAD_GATEWAY, "EXCHANGE_UNAVAILABLE", message)
            }
            ExchangeError::Timeout(_) => {
                Self::new(StatusCode::GATEWAY_TIMEOUT, "EXCHANGE_TIMEOUT", message)
            }
            ExchangeError::Api {
                status,
                label,
                message,
            } => {
                // Client errors are the caller's to fix; anything else is ours.
                let status = StatusCode::from_u16(status)
                    .ok()
                    .filter(StatusCode::is_client_error)
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                Self::new(status, label, message)
            }
            ExchangeError::Payload(_) => {
                Self::new(StatusCode::BAD_GATEWAY, "INVALID_PAYLOAD_SHAPE", message)
            }
            ExchangeError::Config(_) => Self::bad_request("INVALID_CONFIGURATION", message),
            ExchangeError::InvalidInput(_) => Self::bad_request("INVALID_REQUEST", message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(status = self.status.as_u16(), label = %self.label, "{}", self.message);
        }
        let body = Json(serde_json::json!({
            "error": self.label,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.status.as_u16(), self.label, self.message)
    }
}

impl std::error::Error for ApiError {}
