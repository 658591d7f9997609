//! Upstream request construction.
//!
//! # Responsibilities
//! - Map the inbound method and pick the upstream HTTP version
//! - Rewrite the target URL from the route's `to` expression
//! - Copy inbound headers through the route's policy, then add the
//!   gateway's own headers and configured overrides
//! - Pass the inbound body stream through untouched

use std::net::IpAddr;

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName};
use axum::http::{Method, Request, Uri, Version};
use hyper::body::Body as HttpBody;
use url::{Position, Url};

use crate::expression::ExpressionContext;
use crate::http::context::ProxyContext;
use crate::http::error::ProxyError;
use crate::http::headers::{
    self, connection_tokens, insert_value, is_allowed, is_content_header, is_hop_by_hop,
    X_FORWARDED_FOR, X_FORWARDED_HOST, X_FORWARDED_PROTO,
};
use crate::settings::proxy::{CALL_ID_HEADER, PROXY_NAME_HEADER};
use crate::settings::UpstreamRequestHeadersSettings;

const STANDARD_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
    Method::PATCH,
    Method::TRACE,
    Method::CONNECT,
];

/// Build the request sent to the upstream.
pub fn build_upstream_request(context: &ProxyContext, body: Body) -> Result<Request<Body>, ProxyError> {
    let uri = upstream_uri(context)?;
    let body = upstream_body(context, body);

    let mut request = Request::builder()
        .method(upstream_method(&context.request().method))
        .version(upstream_version(context))
        .uri(uri)
        .body(body)?;
    *request.headers_mut() = upstream_headers(context);

    tracing::debug!(
        route = %context.route().settings.route(),
        method = %request.method(),
        uri = %request.uri(),
        version = ?request.version(),
        "Upstream request built"
    );

    Ok(request)
}

/// Standard methods are matched case-insensitively; anything else is kept
/// as an extension method.
pub fn upstream_method(method: &Method) -> Method {
    STANDARD_METHODS
        .iter()
        .find(|standard| standard.as_str().eq_ignore_ascii_case(method.as_str()))
        .cloned()
        .unwrap_or_else(|| method.clone())
}

/// Parse a configured HTTP version such as `1.1`, `2` or `HTTP/2.0`.
pub fn parse_version(value: &str) -> Option<Version> {
    let value = value.trim();
    let value = match value.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("http/") => &value[5..],
        _ => value,
    };

    match value {
        "1.0" => Some(Version::HTTP_10),
        "1" | "1.1" => Some(Version::HTTP_11),
        "2" | "2.0" => Some(Version::HTTP_2),
        _ => None,
    }
}

fn upstream_version(context: &ProxyContext) -> Version {
    let Some(expression) = context.proxy().upstream_request.http_version.as_deref() else {
        return Version::HTTP_11;
    };

    let value = context.evaluate(expression);
    parse_version(&value).unwrap_or_else(|| {
        tracing::warn!(
            route = %context.route().settings.route(),
            version = %value,
            "Unsupported upstream HTTP version, using HTTP/1.1"
        );
        Version::HTTP_11
    })
}

/// Evaluate `to`, append the unmatched path suffix and merge query strings.
pub fn upstream_uri(context: &ProxyContext) -> Result<Uri, ProxyError> {
    let to = context.evaluate(&context.proxy().to);
    let to = to.trim();
    let malformed = |reason: String| ProxyError::MalformedTarget {
        url: to.to_string(),
        reason,
    };

    let target = Url::parse(to).map_err(|e| malformed(e.to_string()))?;
    if !matches!(target.scheme(), "http" | "https") {
        return Err(malformed(format!("unsupported scheme '{}'", target.scheme())));
    }
    if !matches!(target.host_str(), Some(host) if !host.is_empty()) {
        return Err(malformed("missing host".to_string()));
    }

    let mut suffix = context.route().path_suffix.clone();
    if !suffix.is_empty() && context.path().ends_with('/') {
        suffix.push('/');
    }
    let path = join_path(target.path(), &suffix);
    let query = merge_query(target.query(), context.query());

    let mut uri = format!(
        "{}://{}{}",
        target.scheme(),
        &target[Position::BeforeHost..Position::AfterPort],
        path
    );
    if let Some(query) = query {
        uri.push('?');
        uri.push_str(&query);
    }

    Uri::try_from(uri.as_str()).map_err(|e| ProxyError::MalformedTarget {
        url: uri.clone(),
        reason: e.to_string(),
    })
}

/// Join two path parts with exactly one `/` between them.
pub fn join_path(base: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        return base.to_string();
    }

    let mut path = base.to_string();
    match (path.ends_with('/'), suffix.starts_with('/')) {
        (true, true) => {
            path.pop();
        }
        (false, false) => path.push('/'),
        _ => {}
    }
    path.push_str(suffix);
    path
}

/// Combine the target's query with the inbound one.
pub fn merge_query(target: Option<&str>, inbound: Option<&str>) -> Option<String> {
    let target = target.filter(|q| !q.is_empty());
    let inbound = inbound.filter(|q| !q.is_empty());
    match (target, inbound) {
        (Some(target), Some(inbound)) => Some(format!("{target}&{inbound}")),
        (Some(query), None) | (None, Some(query)) => Some(query.to_string()),
        (None, None) => None,
    }
}

fn upstream_body(context: &ProxyContext, body: Body) -> Body {
    if HttpBody::is_end_stream(&body) || context.content_length() == Some(0) {
        Body::empty()
    } else {
        body
    }
}

fn upstream_headers(context: &ProxyContext) -> HeaderMap {
    let settings = &context.proxy().upstream_request.headers;
    let mut headers = HeaderMap::new();

    copy_inbound_headers(context, settings, &mut headers);

    add_host(context, settings, &mut headers);
    add_external_address(context, settings, &mut headers);
    if settings.use_x_forwarded {
        add_x_forwarded(context, settings, &mut headers);
    } else {
        add_forwarded(context, settings, &mut headers);
    }

    if !settings.ignore_correlation_id {
        insert_value(&mut headers, context.correlation_id_header(), context.correlation_id(), false);
    }
    if !settings.ignore_call_id {
        insert_value(&mut headers, &HeaderName::from_static(CALL_ID_HEADER), context.call_id(), false);
    }
    if context.proxy().proxy_name.is_some() {
        insert_value(&mut headers, &HeaderName::from_static(PROXY_NAME_HEADER), context.proxy_name(), false);
    }

    let allow_empty = settings.allow_headers_with_empty_value;
    headers::apply(context, &mut headers, &settings.overrides, true, allow_empty);
    headers::apply(context, &mut headers, &settings.appends, false, allow_empty);

    headers
}

fn copy_inbound_headers(
    context: &ProxyContext,
    settings: &UpstreamRequestHeadersSettings,
    headers: &mut HeaderMap,
) {
    let inbound = &context.request().headers;
    let hop_tokens = connection_tokens(inbound);
    let correlation_id_header = context.correlation_id_header();
    let external_address_header = context.external_address_header();

    for (name, value) in inbound {
        // Content headers go wherever the body goes
        if settings.ignore_all_downstream_headers && !is_content_header(name) {
            continue;
        }

        let skip = is_hop_by_hop(name)
            || hop_tokens.contains(name)
            || *name == header::HOST
            || *name == header::FORWARDED
            || *name == X_FORWARDED_FOR
            || *name == X_FORWARDED_PROTO
            || *name == X_FORWARDED_HOST
            || name == correlation_id_header
            || name.as_str() == CALL_ID_HEADER
            || name.as_str() == PROXY_NAME_HEADER
            || *name == external_address_header
            || settings.overrides.contains(name);
        if skip {
            continue;
        }

        if !is_allowed(
            name,
            value,
            settings.allow_headers_with_empty_value,
            settings.allow_headers_with_underscore_in_name,
        ) {
            continue;
        }

        headers.append(name.clone(), value.clone());
    }
}

fn add_host(context: &ProxyContext, settings: &UpstreamRequestHeadersSettings, headers: &mut HeaderMap) {
    if settings.ignore_host {
        return;
    }

    let host = context.host().map(str::to_string).or_else(|| {
        settings
            .default_host
            .as_deref()
            .map(|expression| context.evaluate(expression))
    });
    if let Some(host) = host.filter(|h| !h.trim().is_empty()) {
        insert_value(headers, &header::HOST, host.trim(), false);
    }
}

fn add_external_address(
    context: &ProxyContext,
    settings: &UpstreamRequestHeadersSettings,
    headers: &mut HeaderMap,
) {
    if !settings.include_external_address {
        return;
    }
    if let Some(addr) = context.remote_addr() {
        insert_value(headers, &context.external_address_header(), &addr.ip().to_string(), false);
    }
}

fn inbound_values(
    context: &ProxyContext,
    settings: &UpstreamRequestHeadersSettings,
    name: &HeaderName,
) -> Vec<String> {
    if settings.ignore_all_downstream_headers {
        return Vec::new();
    }
    context
        .request()
        .headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn add_x_forwarded(context: &ProxyContext, settings: &UpstreamRequestHeadersSettings, headers: &mut HeaderMap) {
    if !settings.ignore_forwarded_for {
        let mut values = inbound_values(context, settings, &X_FORWARDED_FOR);
        if let Some(addr) = context.remote_addr() {
            values.push(addr.ip().to_string());
        }
        if !values.is_empty() {
            insert_value(headers, &X_FORWARDED_FOR, &values.join(", "), false);
        }
    }

    if !settings.ignore_forwarded_protocol {
        let proto = inbound_values(context, settings, &X_FORWARDED_PROTO)
            .into_iter()
            .next()
            .unwrap_or_else(|| context.scheme().to_string());
        insert_value(headers, &X_FORWARDED_PROTO, &proto, false);
    }

    if !settings.ignore_forwarded_host {
        let host = inbound_values(context, settings, &X_FORWARDED_HOST)
            .into_iter()
            .next()
            .or_else(|| context.host().map(str::to_string));
        if let Some(host) = host {
            insert_value(headers, &X_FORWARDED_HOST, &host, false);
        }
    }
}

/// RFC 7239 `Forwarded`, keeping elements added by earlier proxies.
fn add_forwarded(context: &ProxyContext, settings: &UpstreamRequestHeadersSettings, headers: &mut HeaderMap) {
    let mut pairs = Vec::new();
    if !settings.ignore_forwarded_for {
        if let Some(addr) = context.remote_addr() {
            pairs.push(format!("for={}", forwarded_node(addr.ip())));
        }
    }
    if !settings.ignore_forwarded_host {
        if let Some(host) = context.host() {
            pairs.push(format!("host={}", quote_if_needed(host)));
        }
    }
    if !settings.ignore_forwarded_protocol {
        pairs.push(format!("proto={}", quote_if_needed(context.scheme())));
    }
    if pairs.is_empty() {
        return;
    }

    let mut elements = inbound_values(context, settings, &header::FORWARDED);
    elements.push(pairs.join(";"));
    insert_value(headers, &header::FORWARDED, &elements.join(", "), false);
}

fn forwarded_node(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(ip) => ip.to_string(),
        IpAddr::V6(ip) => format!("\"[{ip}]\""),
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

fn quote_if_needed(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_token_char) {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
