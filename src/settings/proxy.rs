//! Per-route proxy settings.
//!
//! Expression-valued fields hold source text and are evaluated per request
//! through the owning route's evaluator.

use std::collections::HashSet;
use std::time::Duration;

use axum::http::HeaderName;
use indexmap::IndexMap;

pub const DEFAULT_PROXY_NAME: &str = "gwcore";
pub const DEFAULT_CORRELATION_ID_HEADER: &str = "x-correlation-id";
pub const CALL_ID_HEADER: &str = "x-call-id";
pub const PROXY_NAME_HEADER: &str = "x-gwcore-proxy-name";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(240);

#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Upstream URL expression.
    pub to: String,
    pub proxy_name: Option<String>,
    pub correlation_id_header: Option<String>,
    pub upstream_request: UpstreamRequestSettings,
    pub downstream_response: DownstreamResponseSettings,
}

#[derive(Debug, Clone, Default)]
pub struct UpstreamRequestSettings {
    pub http_version: Option<String>,
    pub headers: UpstreamRequestHeadersSettings,
    pub sender: UpstreamRequestSenderSettings,
}

/// A header set from configuration, each value an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderOverride {
    pub name: HeaderName,
    pub values: Vec<String>,
}

/// Ordered header overrides, at most one entry per name.
#[derive(Debug, Clone, Default)]
pub struct HeaderOverrides {
    entries: IndexMap<HeaderName, HeaderOverride>,
}

impl HeaderOverrides {
    pub fn insert(&mut self, header: HeaderOverride) {
        self.entries.insert(header.name.clone(), header);
    }

    pub fn contains(&self, name: &HeaderName) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderOverride> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamRequestHeadersSettings {
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
    pub use_x_forwarded: bool,
    pub default_host: Option<String>,
    pub overrides: HeaderOverrides,
    pub appends: HeaderOverrides,
}

impl Default for UpstreamRequestHeadersSettings {
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
            overrides: HeaderOverrides::default(),
            appends: HeaderOverrides::default(),
        }
    }
}

/// Settings that shape the pooled upstream client itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientSettings {
    pub connect_timeout: Option<Duration>,
    pub pool_idle_timeout: Option<Duration>,
    pub max_connections_per_server: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct UpstreamRequestSenderSettings {
    /// Clients are cached under this name.
    pub http_client_name: String,
    /// Upper bound on the upstream exchange up to the response head.
    pub timeout: Duration,
    pub client: ClientSettings,
    pub pooled_connection_lifetime: Option<Duration>,
    pub max_automatic_redirections: Option<u32>,
    pub allow_auto_redirect: bool,
    pub use_cookies: bool,
}

impl Default for UpstreamRequestSenderSettings {
    fn default() -> Self {
        Self {
            http_client_name: String::new(),
            timeout: DEFAULT_TIMEOUT,
            client: ClientSettings::default(),
            pooled_connection_lifetime: None,
            max_automatic_redirections: None,
            allow_auto_redirect: false,
            use_cookies: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DownstreamResponseSettings {
    pub headers: DownstreamResponseHeadersSettings,
}

#[derive(Debug, Clone)]
pub struct DownstreamResponseHeadersSettings {
    pub discard_inbound_headers: bool,
    pub discard_empty: bool,
    pub discard_underscore: bool,
    pub add_server: bool,
    pub add_via: bool,
    pub add_correlation_id: bool,
    pub add_call_id: bool,
    /// Keyed by cookie name; `*` applies to any cookie without its own entry.
    pub cookies: IndexMap<String, CookieSettings>,
    pub overrides: HeaderOverrides,
    pub appends: HeaderOverrides,
    pub discards: HashSet<HeaderName>,
}

impl Default for DownstreamResponseHeadersSettings {
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
            overrides: HeaderOverrides::default(),
            appends: HeaderOverrides::default(),
            discards: HashSet::new(),
        }
    }
}

impl DownstreamResponseHeadersSettings {
    /// Cookie rewrite for `name`, falling back to the `*` entry.
    pub fn cookie(&self, name: &str) -> Option<&CookieSettings> {
        self.cookies.get(name).or_else(|| self.cookies.get("*"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSiteMode {
    /// Removes the attribute.
    Unspecified,
    None,
    Lax,
    Strict,
}

impl SameSiteMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unspecified" => Some(SameSiteMode::Unspecified),
            "none" => Some(SameSiteMode::None),
            "lax" => Some(SameSiteMode::Lax),
            "strict" => Some(SameSiteMode::Strict),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub name: String,
    pub secure: Option<bool>,
    pub http_only: Option<bool>,
    pub same_site: Option<SameSiteMode>,
    /// Domain expression; evaluating to an empty string removes the attribute.
    pub domain: Option<String>,
}
