//! Per-request proxy context.
//!
//! Holds everything the request and response pipelines read: the inbound
//! request head, connection addresses, the matched route and its settings.
//! Values derived from configuration expressions are computed on first use
//! and kept for the rest of the request.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use axum::extract::connect_info::Connected;
use axum::http::{header, request::Parts, HeaderName, Version};
use axum::serve::IncomingStream;
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::expression::ExpressionContext;
use crate::routing::Route;
use crate::settings::proxy::{DEFAULT_CORRELATION_ID_HEADER, DEFAULT_PROXY_NAME};
use crate::settings::ProxySettings;

/// Addresses of the downstream connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub remote_addr: Option<SocketAddr>,
    pub local_addr: Option<SocketAddr>,
}

impl Connected<IncomingStream<'_, TcpListener>> for ConnectionInfo {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        Self {
            remote_addr: Some(*stream.remote_addr()),
            local_addr: stream.io().local_addr().ok(),
        }
    }
}

/// Protocol name as it appears on the request line, e.g. `HTTP/1.1`.
pub fn protocol_name(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/1.1",
    }
}

#[derive(Debug)]
pub struct ProxyContext {
    request: Parts,
    connection: ConnectionInfo,
    route: Route,
    proxy: Arc<ProxySettings>,
    host: Option<String>,
    path_base: String,
    content_length: Option<u64>,

    proxy_name: OnceLock<String>,
    correlation_id_header: OnceLock<HeaderName>,
    correlation_id: OnceLock<String>,
    call_id: OnceLock<String>,
}

impl ProxyContext {
    /// `original_path` is the path before any router nesting stripped a
    /// prefix; the stripped part becomes the path base.
    pub fn new(
        request: Parts,
        connection: ConnectionInfo,
        route: Route,
        proxy: Arc<ProxySettings>,
        original_path: Option<&str>,
    ) -> Self {
        let host = request
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| request.uri.authority().map(|a| a.as_str().to_string()));

        let path = request.uri.path();
        let path_base = original_path
            .filter(|original| original.len() > path.len())
            .and_then(|original| original.strip_suffix(path))
            .unwrap_or_default()
            .to_string();

        let content_length = request
            .headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());

        Self {
            request,
            connection,
            route,
            proxy,
            host,
            path_base,
            content_length,
            proxy_name: OnceLock::new(),
            correlation_id_header: OnceLock::new(),
            correlation_id: OnceLock::new(),
            call_id: OnceLock::new(),
        }
    }

    pub fn request(&self) -> &Parts {
        &self.request
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn proxy(&self) -> &ProxySettings {
        &self.proxy
    }

    /// Evaluate an expression in the scope of the matched route.
    pub fn evaluate(&self, expression: &str) -> String {
        self.route.settings.evaluate(self, expression)
    }

    pub fn proxy_name(&self) -> &str {
        self.proxy_name.get_or_init(|| {
            self.proxy
                .proxy_name
                .as_deref()
                .map(|expression| self.evaluate(expression).trim().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_PROXY_NAME.to_string())
        })
    }

    pub fn correlation_id_header(&self) -> &HeaderName {
        self.correlation_id_header.get_or_init(|| {
            let default = HeaderName::from_static(DEFAULT_CORRELATION_ID_HEADER);
            let Some(expression) = self.proxy.correlation_id_header.as_deref() else {
                return default;
            };

            let name = self.evaluate(expression);
            let name = name.trim();
            if name.is_empty() {
                return default;
            }
            match HeaderName::from_bytes(name.as_bytes()) {
                Ok(name) => name,
                Err(_) => {
                    tracing::warn!(
                        route = %self.route.settings.route(),
                        header = %name,
                        "Correlation id header name is invalid, using the default"
                    );
                    default
                }
            }
        })
    }

    /// Inbound correlation id, or a new one if the request has none.
    pub fn correlation_id(&self) -> &str {
        self.correlation_id.get_or_init(|| {
            self.request
                .headers
                .get(self.correlation_id_header())
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string())
        })
    }

    /// Identifies this hop; fresh for every request.
    pub fn call_id(&self) -> &str {
        self.call_id
            .get_or_init(|| Uuid::new_v4().simple().to_string())
    }

    /// `x-<proxy name>-external-address`
    pub fn external_address_header(&self) -> HeaderName {
        let name = format!("x-{}-external-address", self.proxy_name().to_ascii_lowercase());
        HeaderName::from_bytes(name.as_bytes())
            .unwrap_or_else(|_| HeaderName::from_static("x-gwcore-external-address"))
    }

    pub fn version(&self) -> Version {
        self.request.version
    }
}

impl ExpressionContext for ProxyContext {
    fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    fn content_type(&self) -> Option<&str> {
        self.request
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    fn method(&self) -> &str {
        self.request.method.as_str()
    }

    fn scheme(&self) -> &str {
        self.request.uri.scheme_str().unwrap_or("http")
    }

    fn path_base(&self) -> &str {
        &self.path_base
    }

    fn path(&self) -> &str {
        self.request.uri.path()
    }

    fn query(&self) -> Option<&str> {
        self.request.uri.query()
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        self.connection.remote_addr
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.connection.local_addr
    }

    fn protocol(&self) -> &str {
        protocol_name(self.request.version)
    }

    fn route_variable(&self, name: &str) -> Option<&str> {
        self.route.variable(name)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::loader::parse_options;
    use crate::routing::resolve_in;
    use crate::settings::create_settings;
    use axum::http::Request;

    /// Build a context for `request` against a single-route configuration.
    pub(crate) fn context_for(config_json: &str, request: Request<()>) -> ProxyContext {
        let settings = create_settings(&parse_options(config_json, false).unwrap());
        let route = resolve_in(&settings, request.uri().path()).expect("route should match");
        let proxy = Arc::clone(route.settings.proxy().expect("route should proxy"));
        let (parts, ()) = request.into_parts();
        let connection = ConnectionInfo {
            remote_addr: Some("10.0.0.7:52000".parse().unwrap()),
            local_addr: Some("127.0.0.1:8080".parse().unwrap()),
        };
        ProxyContext::new(parts, connection, route, proxy, None)
    }

    #[test]
    fn test_defaults_and_memoization() {
        let context = context_for(
            r#"{ "routes": { "/api": { "proxy": { "to": "http://upstream" } } } }"#,
            Request::get("/api/items").header("host", "gw.local").body(()).unwrap(),
        );

        assert_eq!(context.proxy_name(), "gwcore");
        assert_eq!(context.correlation_id_header().as_str(), "x-correlation-id");
        assert_eq!(context.host(), Some("gw.local"));
        assert_eq!(context.protocol(), "HTTP/1.1");

        let correlation_id = context.correlation_id().to_string();
        assert_eq!(correlation_id.len(), 32);
        assert_eq!(context.correlation_id(), correlation_id);

        let call_id = context.call_id().to_string();
        assert_eq!(context.call_id(), call_id);
        assert_ne!(call_id, correlation_id);
    }

    #[test]
    fn test_configured_names_and_inbound_correlation_id() {
        let context = context_for(
            r#"{ "routes": { "/api": { "proxy": {
                "to": "http://upstream",
                "proxyName": "edge-$request_method",
                "correlationIdHeader": "x-request-id"
            } } } }"#,
            Request::post("/api").header("x-request-id", "abc-123").body(()).unwrap(),
        );

        assert_eq!(context.proxy_name(), "edge-POST");
        assert_eq!(context.correlation_id_header().as_str(), "x-request-id");
        assert_eq!(context.correlation_id(), "abc-123");
        assert_eq!(context.external_address_header().as_str(), "x-edge-post-external-address");
    }

    #[test]
    fn test_path_base_from_original_path() {
        let settings = create_settings(
            &parse_options(r#"{ "routes": { "/repos": { "proxy": { "to": "http://x" } } } }"#, false).unwrap(),
        );
        let route = resolve_in(&settings, "/repos").unwrap();
        let proxy = Arc::clone(route.settings.proxy().unwrap());
        let (parts, ()) = Request::get("/repos?a=1").body(()).unwrap().into_parts();

        let context = ProxyContext::new(parts, ConnectionInfo::default(), route, proxy, Some("/api/repos"));
        assert_eq!(context.path_base(), "/api");
        assert_eq!(context.path(), "/repos");
        assert_eq!(context.query(), Some("a=1"));
    }
}
