//! Configuration schema definitions.
//!
//! These are the raw options as written in the configuration file. They are
//! turned into validated, immutable settings by `crate::settings`.
//! Fields holding expressions keep their source text.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct GatewayOptions {
    /// Process-level settings.
    pub system: SystemOptions,

    /// Routes keyed by pattern, in the order they appear in the file.
    pub routes: IndexMap<String, RouteOptions>,

    /// Listener, logging and metrics settings for the binary.
    pub server: ServerOptions,
}

/// Process-level settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SystemOptions {
    /// Maximum number of resolved paths kept in the route cache (0 disables it).
    pub route_cache_max_count: usize,
}

impl Default for SystemOptions {
    fn default() -> Self {
        Self {
            route_cache_max_count: 10_000,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerOptions {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Prometheus scrape endpoint; disabled when absent.
    pub metrics_address: Option<String>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            metrics_address: None,
        }
    }
}

/// One route. A route without `proxy` matches but is not proxied.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteOptions {
    pub proxy: Option<ProxyOptions>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ProxyOptions {
    /// Upstream URL expression. Required.
    pub to: Option<String>,

    /// Name of this proxy as it appears in `Via`, `Server` and the external
    /// address header. Expression.
    pub proxy_name: Option<String>,

    /// Name of the correlation id header. Expression.
    pub correlation_id_header: Option<String>,

    pub upstream_request: UpstreamRequestOptions,

    pub downstream_response: DownstreamResponseOptions,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UpstreamRequestOptions {
    /// HTTP version of the upstream request ("1.0", "1.1", "2"). Expression.
    pub http_version: Option<String>,

    pub headers: UpstreamRequestHeadersOptions,

    pub sender: UpstreamRequestSenderOptions,
}

/// Header values: a single expression or a list of them.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum HeaderValuesOptions {
    One(String),
    Many(Vec<String>),
}

impl HeaderValuesOptions {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            HeaderValuesOptions::One(value) => vec![value],
            HeaderValuesOptions::Many(values) => values,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpstreamRequestHeadersOptions {
    pub allow_headers_with_empty_value: bool,
    pub allow_headers_with_underscore_in_name: bool,
    pub include_external_address: bool,
    pub ignore_all_downstream_headers: bool,
    pub ignore_host: bool,
    pub ignore_forwarded_for: bool,
    pub ignore_forwarded_protocol: bool,
    pub ignore_forwarded_host: bool,
    pub ignore_correlation_id: bool,
    pub ignore_call_id: bool,

    /// Emit `x-forwarded-*` headers; when false, a single RFC 7239
    /// `Forwarded` header is emitted instead.
    pub use_x_forwarded: bool,

    /// Host header used when the downstream request carries none.
    pub default_host: Option<String>,

    /// Headers replacing whatever the downstream request sent.
    pub overrides: IndexMap<String, HeaderValuesOptions>,

    /// Headers added on top of the copied ones.
    pub appends: IndexMap<String, HeaderValuesOptions>,
}

impl Default for UpstreamRequestHeadersOptions {
    fn default() -> Self {
        Self {
            allow_headers_with_empty_value: false,
            allow_headers_with_underscore_in_name: false,
            include_external_address: false,
            ignore_all_downstream_headers: false,
            ignore_host: false,
            ignore_forwarded_for: false,
            ignore_forwarded_protocol: false,
            ignore_forwarded_host: false,
            ignore_correlation_id: false,
            ignore_call_id: false,
            use_x_forwarded: true,
            default_host: None,
            overrides: IndexMap::new(),
            appends: IndexMap::new(),
        }
    }
}

/// Upstream HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UpstreamRequestSenderOptions {
    /// Routes with the same client name share a connection pool.
    pub http_client_name: Option<String>,
    pub timeout_in_milliseconds: Option<u64>,
    pub connect_timeout_in_milliseconds: Option<u64>,
    pub pooled_connection_idle_timeout_in_milliseconds: Option<u64>,
    pub pooled_connection_lifetime_in_milliseconds: Option<u64>,
    pub max_automatic_redirections: Option<u32>,
    pub max_connections_per_server: Option<usize>,
    pub allow_auto_redirect: bool,
    pub use_cookies: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct DownstreamResponseOptions {
    pub headers: DownstreamResponseHeadersOptions,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DownstreamResponseHeadersOptions {
    /// Drop every header sent by the upstream.
    pub discard_inbound_headers: bool,
    pub discard_empty: bool,
    pub discard_underscore: bool,
    pub add_server: bool,
    pub add_via: bool,
    pub add_correlation_id: bool,
    pub add_call_id: bool,

    /// `Set-Cookie` rewrites keyed by cookie name, `*` for any cookie.
    pub cookies: IndexMap<String, CookieOptions>,

    pub overrides: IndexMap<String, HeaderValuesOptions>,
    pub appends: IndexMap<String, HeaderValuesOptions>,

    /// Upstream headers that never reach the client.
    pub discards: Vec<String>,
}

impl Default for DownstreamResponseHeadersOptions {
    fn default() -> Self {
        Self {
            discard_inbound_headers: false,
            discard_empty: false,
            discard_underscore: false,
            add_server: false,
            add_via: true,
            add_correlation_id: false,
            add_call_id: false,
            cookies: IndexMap::new(),
            overrides: IndexMap::new(),
            appends: IndexMap::new(),
            discards: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CookieOptions {
    pub secure: Option<bool>,
    pub http_only: Option<bool>,
    /// "none", "lax", "strict" or "unspecified".
    pub same_site: Option<String>,
    /// Domain expression; an empty result removes the attribute.
    pub domain: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = GatewayOptions::default();
        assert!(options.routes.is_empty());
        assert_eq!(options.system.route_cache_max_count, 10_000);
        assert!(UpstreamRequestHeadersOptions::default().use_x_forwarded);
        assert!(DownstreamResponseHeadersOptions::default().add_via);
    }

    #[test]
    fn test_json_binding_keeps_route_order() {
        let json = r#"{
            "routes": {
                "/z/:id": { "proxy": { "to": "http://z/$id" } },
                "/a": {
                    "proxy": {
                        "to": "http://a",
                        "proxyName": "edge",
                        "upstreamRequest": {
                            "httpVersion": "2",
                            "headers": {
                                "allowHeadersWithUnderscoreInName": true,
                                "useXForwarded": false,
                                "overrides": { "x-one": "1", "x-many": ["a", "b"] }
                            },
                            "sender": { "httpClientName": "shared", "timeoutInMilliseconds": 500 }
                        },
                        "downstreamResponse": {
                            "headers": {
                                "addServer": true,
                                "cookies": { "sessionId": { "domain": "", "sameSite": "lax" } },
                                "discards": ["x-internal"]
                            }
                        }
                    }
                },
                "/m": {}
            },
            "system": { "routeCacheMaxCount": 5 }
        }"#;

        let options: GatewayOptions = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = options.routes.keys().map(String::as_str).collect();
        assert_eq!(keys, ["/z/:id", "/a", "/m"]);
        assert_eq!(options.system.route_cache_max_count, 5);

        let proxy = options.routes["/a"].proxy.as_ref().unwrap();
        assert_eq!(proxy.proxy_name.as_deref(), Some("edge"));
        assert_eq!(proxy.upstream_request.http_version.as_deref(), Some("2"));

        let headers = &proxy.upstream_request.headers;
        assert!(headers.allow_headers_with_underscore_in_name);
        assert!(!headers.use_x_forwarded);
        assert_eq!(headers.overrides["x-one"], HeaderValuesOptions::One("1".into()));
        assert_eq!(
            headers.overrides["x-many"].clone().into_vec(),
            vec!["a".to_string(), "b".to_string()]
        );

        let sender = &proxy.upstream_request.sender;
        assert_eq!(sender.http_client_name.as_deref(), Some("shared"));
        assert_eq!(sender.timeout_in_milliseconds, Some(500));

        let downstream = &proxy.downstream_response.headers;
        assert!(downstream.add_server);
        assert!(downstream.add_via);
        assert_eq!(downstream.cookies["sessionId"].domain.as_deref(), Some(""));
        assert_eq!(downstream.discards, vec!["x-internal".to_string()]);

        assert!(options.routes["/m"].proxy.is_none());
    }

    #[test]
    fn test_toml_binding() {
        let text = r#"
            [server]
            bindAddress = "127.0.0.1:9000"

            [routes."/api".proxy]
            to = "http://backend:8080"
        "#;
        let options: GatewayOptions = toml::from_str(text).unwrap();
        assert_eq!(options.server.bind_address, "127.0.0.1:9000");
        assert_eq!(
            options.routes["/api"].proxy.as_ref().unwrap().to.as_deref(),
            Some("http://backend:8080")
        );
    }
}
