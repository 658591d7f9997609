//! HTTP proxy pipeline.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → server.rs (route lookup, 404 when nothing matches)
//!     → context.rs (ProxyContext: request head, addresses, route, memoized ids)
//!     → request.rs (method, version, URL, headers, body)
//!     → client.rs + resilience::timeouts (send on the named client)
//!     → response.rs + cookies.rs (status, headers, cookies, streamed body)
//!     → Downstream response
//!
//! Failures become ProxyError (error.rs): 500 malformed target,
//! 502 send failure, 504 timeout.
//! ```
//!
//! # Design Decisions
//! - Bodies are streamed in both directions, never buffered
//! - Header policy never fails a request; bad headers are dropped and logged
//! - A request keeps the settings snapshot it started with

pub mod client;
pub mod context;
pub mod cookies;
pub mod error;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use context::{ConnectionInfo, ProxyContext};
pub use error::ProxyError;
pub use server::{AppState, GatewayServer};
