//! Downstream response construction.
//!
//! # Responsibilities
//! - Copy status, and the reason phrase when both sides speak HTTP/1.x
//! - Copy upstream headers through the route's policy, rewriting cookies
//! - Add `Via`, `Server` and id headers, then configured overrides
//! - Stream the upstream body, sanitizing trailers with the same rules

use std::collections::HashSet;

use axum::body::{Body, Bytes};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Response, Version};
use http_body_util::BodyExt;
use hyper::body::{Body as HttpBody, Frame};
use hyper::ext::ReasonPhrase;

use crate::http::context::ProxyContext;
use crate::http::cookies::rewrite_set_cookie;
use crate::http::headers::{
    self, connection_tokens, insert_value, is_allowed, is_content_header, is_hop_by_hop,
};
use crate::settings::proxy::CALL_ID_HEADER;
use crate::settings::DownstreamResponseHeadersSettings;

/// `Via` protocol version, e.g. `1.1` or `2`.
fn via_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

fn is_http1(version: Version) -> bool {
    matches!(version, Version::HTTP_09 | Version::HTTP_10 | Version::HTTP_11)
}

/// Build the response returned to the client.
pub fn build_downstream_response<B>(context: &ProxyContext, upstream: Response<B>) -> Response<Body>
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<axum::BoxError>,
{
    let (parts, body) = upstream.into_parts();
    let settings = &context.proxy().downstream_response.headers;

    let mut response = Response::new(downstream_body(context, body, parts.headers.get(header::CONTENT_LENGTH)));
    *response.status_mut() = parts.status;

    if is_http1(context.version()) && is_http1(parts.version) {
        if let Some(reason) = parts.extensions.get::<ReasonPhrase>() {
            response.extensions_mut().insert(reason.clone());
        }
    }

    let mut headers = HeaderMap::new();
    copy_upstream_headers(context, settings, &parts.headers, &mut headers);
    add_gateway_headers(context, settings, parts.version, &mut headers);

    headers::apply(context, &mut headers, &settings.overrides, true, !settings.discard_empty);
    headers::apply(context, &mut headers, &settings.appends, false, !settings.discard_empty);

    *response.headers_mut() = headers;
    response
}

fn copy_upstream_headers(
    context: &ProxyContext,
    settings: &DownstreamResponseHeadersSettings,
    upstream: &HeaderMap,
    headers: &mut HeaderMap,
) {
    let hop_tokens = connection_tokens(upstream);

    for (name, value) in upstream {
        if settings.discard_inbound_headers && !is_content_header(name) {
            continue;
        }
        if is_hop_by_hop(name)
            || hop_tokens.contains(name)
            || settings.discards.contains(name)
            || settings.overrides.contains(name)
        {
            continue;
        }
        if !is_allowed(name, value, !settings.discard_empty, !settings.discard_underscore) {
            continue;
        }

        if *name == header::SET_COOKIE {
            let rewritten = value
                .to_str()
                .ok()
                .and_then(|v| rewrite_set_cookie(v, settings, |expression| context.evaluate(expression)));
            if let Some(rewritten) = rewritten {
                insert_value(headers, name, &rewritten, true);
                continue;
            }
        }

        headers.append(name.clone(), value.clone());
    }
}

fn add_gateway_headers(
    context: &ProxyContext,
    settings: &DownstreamResponseHeadersSettings,
    upstream_version: Version,
    headers: &mut HeaderMap,
) {
    if settings.add_via {
        let via = format!("{} {}", via_version(upstream_version), context.proxy_name());
        insert_value(headers, &header::VIA, &via, true);
    }
    if settings.add_server {
        insert_value(headers, &header::SERVER, context.proxy_name(), false);
    }
    if settings.add_correlation_id {
        insert_value(headers, context.correlation_id_header(), context.correlation_id(), false);
    }
    if settings.add_call_id {
        insert_value(headers, &HeaderName::from_static(CALL_ID_HEADER), context.call_id(), false);
    }
}

fn downstream_body<B>(context: &ProxyContext, body: B, content_length: Option<&HeaderValue>) -> Body
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<axum::BoxError>,
{
    let empty_length = content_length
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        == Some(0);
    if empty_length || body.is_end_stream() {
        return Body::empty();
    }

    let policy = TrailerPolicy::new(&context.proxy().downstream_response.headers);
    Body::new(body.map_frame(move |frame| match frame.into_trailers() {
        Ok(trailers) => Frame::trailers(policy.sanitize(trailers)),
        Err(frame) => frame,
    }))
}

/// Trailer filtering with the response header rules.
struct TrailerPolicy {
    discard_empty: bool,
    discard_underscore: bool,
    excluded: HashSet<HeaderName>,
}

impl TrailerPolicy {
    fn new(settings: &DownstreamResponseHeadersSettings) -> Self {
        let mut excluded = settings.discards.clone();
        excluded.extend(settings.overrides.iter().map(|h| h.name.clone()));
        Self {
            discard_empty: settings.discard_empty,
            discard_underscore: settings.discard_underscore,
            excluded,
        }
    }

    fn sanitize(&self, trailers: HeaderMap) -> HeaderMap {
        let mut sanitized = HeaderMap::with_capacity(trailers.len());
        for (name, value) in &trailers {
            if is_hop_by_hop(name) || self.excluded.contains(name) {
                continue;
            }
            if !is_allowed(name, value, !self.discard_empty, !self.discard_underscore) {
                continue;
            }
            sanitized.append(name.clone(), value.clone());
        }
        sanitized
    }
}
