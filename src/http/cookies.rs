//! `Set-Cookie` rewriting.

use cookie::{Cookie, SameSite};

use crate::settings::{CookieSettings, DownstreamResponseHeadersSettings, SameSiteMode};

/// Rewrite a `Set-Cookie` value using the route's cookie settings.
///
/// Returns `None` when no setting applies or the value cannot be parsed; the
/// original header is then forwarded as is. `evaluate` resolves the domain
/// expression.
pub fn rewrite_set_cookie<F>(
    value: &str,
    settings: &DownstreamResponseHeadersSettings,
    evaluate: F,
) -> Option<String>
where
    F: FnOnce(&str) -> String,
{
    if settings.cookies.is_empty() {
        return None;
    }

    let mut cookie = match Cookie::parse(value) {
        Ok(cookie) => cookie,
        Err(e) => {
            tracing::debug!(error = %e, "Set-Cookie value could not be parsed, forwarded unchanged");
            return None;
        }
    };

    let rule = settings.cookie(cookie.name())?;
    apply(&mut cookie, rule, evaluate);
    Some(cookie.to_string())
}

fn apply<F>(cookie: &mut Cookie<'_>, rule: &CookieSettings, evaluate: F)
where
    F: FnOnce(&str) -> String,
{
    if let Some(secure) = rule.secure {
        cookie.set_secure(secure);
    }
    if let Some(http_only) = rule.http_only {
        cookie.set_http_only(http_only);
    }
    if let Some(mode) = rule.same_site {
        cookie.set_same_site(match mode {
            SameSiteMode::Unspecified => None,
            SameSiteMode::None => Some(SameSite::None),
            SameSiteMode::Lax => Some(SameSite::Lax),
            SameSiteMode::Strict => Some(SameSite::Strict),
        });
    }
    if let Some(expression) = rule.domain.as_deref() {
        let domain = evaluate(expression);
        let domain = domain.trim();
        if domain.is_empty() {
            cookie.unset_domain();
        } else {
            cookie.set_domain(domain.to_string());
        }
    }
}
