//! Header policy shared by the request and response pipelines.

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::http::context::ProxyContext;
use crate::settings::HeaderOverrides;

pub const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");
pub const PROXY_CONNECTION: HeaderName = HeaderName::from_static("proxy-connection");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const CONTENT_MD5: HeaderName = HeaderName::from_static("content-md5");

/// Headers that only apply to a single connection and are never forwarded.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    *name == header::CONNECTION
        || *name == KEEP_ALIVE
        || *name == PROXY_CONNECTION
        || *name == header::PROXY_AUTHENTICATE
        || *name == header::PROXY_AUTHORIZATION
        || *name == header::TE
        || *name == header::TRAILER
        || *name == header::TRANSFER_ENCODING
        || *name == header::UPGRADE
}

/// Headers that describe the body. They travel with it even when the
/// route discards the rest of the inbound headers.
pub fn is_content_header(name: &HeaderName) -> bool {
    *name == header::CONTENT_TYPE
        || *name == header::CONTENT_LENGTH
        || *name == header::CONTENT_ENCODING
        || *name == header::CONTENT_LANGUAGE
        || *name == header::CONTENT_LOCATION
        || *name == header::CONTENT_RANGE
        || *name == header::CONTENT_DISPOSITION
        || *name == CONTENT_MD5
        || *name == header::EXPIRES
        || *name == header::LAST_MODIFIED
}

/// Extra hop-by-hop headers named by the `Connection` header.
pub fn connection_tokens(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect()
}

/// Whether a header passes the empty-value and underscore policies.
///
/// Rejected headers are dropped with an info log; this never fails the request.
pub fn is_allowed(name: &HeaderName, value: &HeaderValue, allow_empty: bool, allow_underscore: bool) -> bool {
    if !allow_empty && value.as_bytes().iter().all(u8::is_ascii_whitespace) {
        tracing::info!(header = %name, "Header has an empty value and was dropped");
        return false;
    }

    if !allow_underscore && name.as_str().contains('_') {
        tracing::info!(header = %name, "Header name contains an underscore and was dropped");
        return false;
    }

    true
}

/// Evaluate override or append expressions into `headers`.
///
/// With `replace`, any existing values for the name are removed first.
pub fn apply(
    context: &ProxyContext,
    headers: &mut HeaderMap,
    overrides: &HeaderOverrides,
    replace: bool,
    allow_empty: bool,
) {
    for header in overrides.iter() {
        if replace {
            headers.remove(&header.name);
        }

        for expression in &header.values {
            let value = context.evaluate(expression);
            if value.trim().is_empty() && !allow_empty {
                continue;
            }
            insert_value(headers, &header.name, &value, true);
        }
    }
}

/// Add `value` under `name`, dropping it with an info log if it is not a
/// valid header value.
pub fn insert_value(headers: &mut HeaderMap, name: &HeaderName, value: &str, append: bool) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            if append {
                headers.append(name.clone(), value);
            } else {
                headers.insert(name.clone(), value);
            }
        }
        Err(_) => {
            tracing::info!(header = %name, "Header value is not valid and was dropped");
        }
    }
}
