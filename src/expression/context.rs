//! The data an expression can read.

use std::net::SocketAddr;

/// Request state exposed to expressions.
///
/// Implemented by the per-request proxy context; tests provide their own.
pub trait ExpressionContext {
    fn content_length(&self) -> Option<u64>;
    fn content_type(&self) -> Option<&str>;
    /// Host header (or HTTP/2 authority), including the port if present.
    fn host(&self) -> Option<&str>;
    fn method(&self) -> &str;
    fn scheme(&self) -> &str;
    fn path_base(&self) -> &str;
    fn path(&self) -> &str;
    /// Raw query string without the leading `?`.
    fn query(&self) -> Option<&str>;
    fn remote_addr(&self) -> Option<SocketAddr>;
    fn local_addr(&self) -> Option<SocketAddr>;
    /// Protocol of the inbound request, e.g. `HTTP/1.1`.
    fn protocol(&self) -> &str;
    /// Value captured for a route variable in the current request.
    fn route_variable(&self, name: &str) -> Option<&str>;
}
