//! Materializes raw options into validated settings.
//!
//! Nothing here fails: an invalid route, header or cookie entry is logged and
//! left out, and everything else keeps working.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use indexmap::IndexMap;

use crate::config::schema::{
    CookieOptions, DownstreamResponseHeadersOptions, GatewayOptions, HeaderValuesOptions,
    ProxyOptions, UpstreamRequestHeadersOptions, UpstreamRequestSenderOptions,
};
use crate::pattern;
use crate::settings::gateway::{GatewaySettings, RouteSettings, SystemSettings};
use crate::settings::proxy::{
    ClientSettings, CookieSettings, DownstreamResponseHeadersSettings, DownstreamResponseSettings,
    HeaderOverride, HeaderOverrides, ProxySettings, SameSiteMode, UpstreamRequestHeadersSettings,
    UpstreamRequestSenderSettings, UpstreamRequestSettings, DEFAULT_TIMEOUT,
};

/// Build a settings snapshot from options.
pub fn create_settings(options: &GatewayOptions) -> GatewaySettings {
    let system = SystemSettings {
        route_cache_max_count: options.system.route_cache_max_count,
    };

    let mut routes = Vec::with_capacity(options.routes.len());
    for (route, route_options) in &options.routes {
        let compiled = match pattern::compile(route) {
            Ok(compiled) => compiled,
            Err(errors) => {
                tracing::error!(route = %route, errors = %errors, "Invalid route pattern, route ignored");
                continue;
            }
        };

        let proxy = match &route_options.proxy {
            Some(proxy_options) => match create_proxy(route, proxy_options) {
                Some(proxy) => Some(proxy),
                None => continue,
            },
            None => None,
        };

        routes.push(Arc::new(RouteSettings::new(route.clone(), compiled, proxy)));
    }

    if routes.is_empty() {
        tracing::error!("No routes are configured; every request will be rejected with 404");
    } else {
        tracing::info!(routes = routes.len(), "Gateway settings created");
    }

    GatewaySettings { system, routes }
}

fn create_proxy(route: &str, options: &ProxyOptions) -> Option<ProxySettings> {
    let to = match options.to.as_deref().map(str::trim) {
        Some(to) if !to.is_empty() => to.to_string(),
        _ => {
            tracing::error!(route = %route, "Proxy 'to' is missing, route ignored");
            return None;
        }
    };

    let upstream = &options.upstream_request;
    let downstream = &options.downstream_response;

    Some(ProxySettings {
        to,
        proxy_name: non_empty(options.proxy_name.as_deref()),
        correlation_id_header: non_empty(options.correlation_id_header.as_deref()),
        upstream_request: UpstreamRequestSettings {
            http_version: non_empty(upstream.http_version.as_deref()),
            headers: create_upstream_headers(route, &upstream.headers),
            sender: create_sender(route, &upstream.sender),
        },
        downstream_response: DownstreamResponseSettings {
            headers: create_downstream_headers(route, &downstream.headers),
        },
    })
}

fn create_upstream_headers(
    route: &str,
    options: &UpstreamRequestHeadersOptions,
) -> UpstreamRequestHeadersSettings {
    UpstreamRequestHeadersSettings {
        allow_headers_with_empty_value: options.allow_headers_with_empty_value,
        allow_headers_with_underscore_in_name: options.allow_headers_with_underscore_in_name,
        include_external_address: options.include_external_address,
        ignore_all_downstream_headers: options.ignore_all_downstream_headers,
        ignore_host: options.ignore_host,
        ignore_forwarded_for: options.ignore_forwarded_for,
        ignore_forwarded_protocol: options.ignore_forwarded_protocol,
        ignore_forwarded_host: options.ignore_forwarded_host,
        ignore_correlation_id: options.ignore_correlation_id,
        ignore_call_id: options.ignore_call_id,
        use_x_forwarded: options.use_x_forwarded,
        default_host: non_empty(options.default_host.as_deref()),
        overrides: create_overrides(route, &options.overrides),
        appends: create_overrides(route, &options.appends),
    }
}

fn create_sender(route: &str, options: &UpstreamRequestSenderOptions) -> UpstreamRequestSenderSettings {
    let http_client_name =
        non_empty(options.http_client_name.as_deref()).unwrap_or_else(|| format!("route:{route}"));

    if options.allow_auto_redirect || options.max_automatic_redirections.is_some() {
        tracing::warn!(route = %route, "Automatic redirects are not supported, upstream redirects are returned to the client");
    }
    if options.use_cookies {
        tracing::warn!(route = %route, "Upstream cookie containers are not supported, cookies pass through untouched");
    }
    if options.pooled_connection_lifetime_in_milliseconds.is_some() {
        tracing::warn!(route = %route, "Pooled connection lifetime is not supported, only the idle timeout applies");
    }

    UpstreamRequestSenderSettings {
        http_client_name,
        timeout: options
            .timeout_in_milliseconds
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT),
        client: ClientSettings {
            connect_timeout: options.connect_timeout_in_milliseconds.map(Duration::from_millis),
            pool_idle_timeout: options
                .pooled_connection_idle_timeout_in_milliseconds
                .map(Duration::from_millis),
            max_connections_per_server: options.max_connections_per_server,
        },
        pooled_connection_lifetime: options
            .pooled_connection_lifetime_in_milliseconds
            .map(Duration::from_millis),
        max_automatic_redirections: options.max_automatic_redirections,
        allow_auto_redirect: options.allow_auto_redirect,
        use_cookies: options.use_cookies,
    }
}

fn create_downstream_headers(
    route: &str,
    options: &DownstreamResponseHeadersOptions,
) -> DownstreamResponseHeadersSettings {
    let mut cookies = IndexMap::new();
    for (name, cookie) in &options.cookies {
        if let Some(settings) = create_cookie(route, name, cookie) {
            cookies.insert(settings.name.clone(), settings);
        }
    }

    let mut discards = HashSet::new();
    for name in &options.discards {
        match parse_header_name(route, name) {
            Some(name) => {
                discards.insert(name);
            }
            None => continue,
        }
    }

    DownstreamResponseHeadersSettings {
        discard_inbound_headers: options.discard_inbound_headers,
        discard_empty: options.discard_empty,
        discard_underscore: options.discard_underscore,
        add_server: options.add_server,
        add_via: options.add_via,
        add_correlation_id: options.add_correlation_id,
        add_call_id: options.add_call_id,
        cookies,
        overrides: create_overrides(route, &options.overrides),
        appends: create_overrides(route, &options.appends),
        discards,
    }
}

fn create_cookie(route: &str, name: &str, options: &CookieOptions) -> Option<CookieSettings> {
    let name = name.trim();
    if name.is_empty() {
        tracing::error!(route = %route, "Cookie name is empty, cookie settings ignored");
        return None;
    }

    let same_site = match options.same_site.as_deref() {
        None => None,
        Some(value) => match SameSiteMode::parse(value) {
            Some(mode) => Some(mode),
            None => {
                tracing::error!(
                    route = %route,
                    cookie = %name,
                    same_site = %value,
                    "Invalid SameSite value, attribute left unchanged"
                );
                None
            }
        },
    };

    Some(CookieSettings {
        name: name.to_string(),
        secure: options.secure,
        http_only: options.http_only,
        same_site,
        domain: options.domain.clone(),
    })
}

fn create_overrides(route: &str, options: &IndexMap<String, HeaderValuesOptions>) -> HeaderOverrides {
    let mut overrides = HeaderOverrides::default();
    for (name, values) in options {
        let Some(name) = parse_header_name(route, name) else {
            continue;
        };
        overrides.insert(HeaderOverride {
            name,
            values: values.clone().into_vec(),
        });
    }
    overrides
}

fn parse_header_name(route: &str, name: &str) -> Option<HeaderName> {
    match HeaderName::from_bytes(name.trim().as_bytes()) {
        Ok(name) => Some(name),
        Err(e) => {
            tracing::error!(route = %route, header = %name, error = %e, "Invalid header name, header ignored");
            None
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_options;

    fn settings(json: &str) -> GatewaySettings {
        create_settings(&parse_options(json, false).unwrap())
    }

    #[test]
    fn test_invalid_routes_are_dropped() {
        let settings = settings(
            r#"{ "routes": {
                "/a//b": { "proxy": { "to": "http://x" } },
                "/missing-to": { "proxy": { } },
                "/blank-to": { "proxy": { "to": "  " } },
                "/ok/:id": { "proxy": { "to": "http://x/$id" } },
                "/no-proxy": { }
            } }"#,
        );

        let routes: Vec<&str> = settings.routes.iter().map(|r| r.route()).collect();
        assert_eq!(routes, ["/ok/:id", "/no-proxy"]);
        assert!(settings.routes[1].proxy().is_none());
        assert_eq!(settings.routes[0].proxy().unwrap().to, "http://x/$id");
    }

    #[test]
    fn test_empty_config() {
        let settings = settings("{}");
        assert!(settings.routes.is_empty());
        assert_eq!(settings.system.route_cache_max_count, 10_000);
    }

    #[test]
    fn test_invalid_headers_and_cookies_are_dropped() {
        let settings = settings(
            r#"{ "routes": { "/a": { "proxy": {
                "to": "http://x",
                "upstreamRequest": { "headers": {
                    "overrides": { "x-good": "1", "bad header": "2" },
                    "appends": { "x-extra": ["a", "b"] }
                } },
                "downstreamResponse": { "headers": {
                    "cookies": {
                        "sessionId": { "sameSite": "sometimes", "secure": true },
                        " ": { "secure": true }
                    },
                    "discards": ["x-internal", "not valid"]
                } }
            } } } }"#,
        );

        let proxy = settings.routes[0].proxy().unwrap();
        let upstream = &proxy.upstream_request.headers;
        assert_eq!(upstream.overrides.len(), 1);
        assert!(upstream.overrides.contains(&HeaderName::from_static("x-good")));
        assert_eq!(
            upstream.appends.iter().next().unwrap().values,
            vec!["a".to_string(), "b".to_string()]
        );

        let downstream = &proxy.downstream_response.headers;
        assert_eq!(downstream.cookies.len(), 1);
        let cookie = &downstream.cookies["sessionId"];
        assert_eq!(cookie.same_site, None);
        assert_eq!(cookie.secure, Some(true));
        assert_eq!(downstream.discards.len(), 1);
        assert!(downstream.discards.contains(&HeaderName::from_static("x-internal")));
    }

    #[test]
    fn test_sender_defaults() {
        let settings = settings(
            r#"{ "routes": {
                "/a": { "proxy": { "to": "http://x" } },
                "/b": { "proxy": { "to": "http://x", "upstreamRequest": { "sender": {
                    "httpClientName": "shared",
                    "timeoutInMilliseconds": 1500,
                    "connectTimeoutInMilliseconds": 200,
                    "maxConnectionsPerServer": 4
                } } } }
            } }"#,
        );

        let a = &settings.routes[0].proxy().unwrap().upstream_request.sender;
        assert_eq!(a.http_client_name, "route:/a");
        assert_eq!(a.timeout, DEFAULT_TIMEOUT);
        assert_eq!(a.client, ClientSettings::default());

        let b = &settings.routes[1].proxy().unwrap().upstream_request.sender;
        assert_eq!(b.http_client_name, "shared");
        assert_eq!(b.timeout, Duration::from_millis(1500));
        assert_eq!(b.client.connect_timeout, Some(Duration::from_millis(200)));
        assert_eq!(b.client.max_connections_per_server, Some(4));
    }

    #[test]
    fn test_route_evaluator_knows_pattern_variables() {
        let settings = settings(r#"{ "routes": { "/product/:id": { "proxy": { "to": "http://x/$id" } } } }"#);
        let parsed = settings.routes[0].evaluator().parse("http://x/$id");
        assert!(!parsed.is_constant());
    }
}
