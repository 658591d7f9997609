//! Request-level proxy failures.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// A failure while forwarding one request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream URL '{url}' is malformed: {reason}")]
    MalformedTarget { url: String, reason: String },

    #[error("failed to build the upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Send(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MalformedTarget { .. } | ProxyError::Request(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Send(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Short label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::MalformedTarget { .. } => "malformed_target",
            ProxyError::Request(_) => "request",
            ProxyError::Send(_) => "send",
            ProxyError::Timeout(_) => "timeout",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match status {
            StatusCode::BAD_GATEWAY => "Upstream request failed",
            StatusCode::GATEWAY_TIMEOUT => "Upstream request timed out",
            _ => "Failed to proxy the request",
        };
        (status, message).into_response()
    }
}
