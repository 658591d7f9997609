//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream request
//!     → timeouts.rs (per-route deadline on the exchange)
//!     → response head, or ProxyError::Timeout (504)
//! ```
//!
//! # Design Decisions
//! - No retries: request bodies are streamed and cannot be replayed
//! - The deadline covers connect and response head, not body streaming

pub mod timeouts;
