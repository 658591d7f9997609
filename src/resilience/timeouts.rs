//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound the upstream exchange up to the response head
//! - Report timeouts separately from other send failures
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timed-out requests return 504 Gateway Timeout
//! - Dropping the send future cancels the upstream request

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::body::Incoming;

use crate::http::client::UpstreamClient;
use crate::http::error::ProxyError;

/// Send `request`, failing with `ProxyError::Timeout` after `timeout`.
pub async fn send_with_timeout(
    client: &UpstreamClient,
    request: Request<Body>,
    timeout: Duration,
) -> Result<Response<Incoming>, ProxyError> {
    match tokio::time::timeout(timeout, client.request(request)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(ProxyError::Timeout(timeout)),
    }
}
