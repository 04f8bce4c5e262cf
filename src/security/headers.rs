//! Security response headers.
//!
//! # Responsibilities
//! - Compute the static security header set attached to every response,
//!   admitted or rejected
//! - Assemble the Content-Security-Policy from the configured backend
//!   origins, with dev/prod differences
//!
//! # Design Decisions
//! - Pure function of the dev flag and the CSP origin config
//! - Headers are an ordered list so tests can pin the exact set
//! - Cross-Origin-Embedder-Policy is deliberately absent: `require-corp`
//!   would break calls to the managed backend's third-party APIs

use axum::http::header::{HeaderName, HeaderValue};

use crate::config::CspConfig;

/// Ordered header name/value pairs, ready to merge into a response.
pub type SecurityHeaderSet = Vec<(HeaderName, HeaderValue)>;

/// Compute the full security header set.
///
/// `is_dev` loosens the CSP for local tooling (eval, localhost connects)
/// and drops `upgrade-insecure-requests`.
pub fn security_headers(is_dev: bool, csp: &CspConfig) -> SecurityHeaderSet {
    let mut headers: SecurityHeaderSet = Vec::with_capacity(11);

    headers.push((
        HeaderName::from_static("strict-transport-security"),
        HeaderValue::from_static("max-age=63072000; includeSubDomains; preload"),
    ));

    let policy = content_security_policy(is_dev, csp);
    headers.push((
        HeaderName::from_static("content-security-policy"),
        // A syntactically invalid configured origin falls back to the
        // most restrictive policy rather than shipping no CSP at all.
        HeaderValue::from_str(&policy)
            .unwrap_or_else(|_| HeaderValue::from_static("default-src 'self'")),
    ));

    headers.push((
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    ));
    headers.push((
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    ));
    headers.push((
        HeaderName::from_static("x-xss-protection"),
        HeaderValue::from_static("1; mode=block"),
    ));
    headers.push((
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    ));
    headers.push((
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), microphone=(), geolocation=(), payment=(), usb=(), \
             magnetometer=(), gyroscope=(), accelerometer=()",
        ),
    ));
    headers.push((
        HeaderName::from_static("x-robots-tag"),
        HeaderValue::from_static("noindex, nofollow"),
    ));
    headers.push((
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    ));
    headers.push((
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("cross-origin"),
    ));

    headers
}

/// Assemble the CSP directive list.
fn content_security_policy(is_dev: bool, csp: &CspConfig) -> String {
    let mut directives: Vec<String> = Vec::with_capacity(12);

    directives.push("default-src 'self'".into());

    if is_dev {
        directives.push("script-src 'self' 'unsafe-inline' 'unsafe-eval'".into());
    } else {
        directives.push("script-src 'self' 'unsafe-inline'".into());
    }

    directives.push("style-src 'self' 'unsafe-inline'".into());
    directives.push(format!("img-src 'self' data: blob: {}", csp.storage_origin));
    directives.push(format!("font-src 'self' data: {}", csp.font_cdn));

    let mut connect = format!(
        "connect-src 'self' {} {} {}",
        csp.api_origin, csp.ws_origin, csp.auth_origin
    );
    for origin in &csp.telemetry_origins {
        connect.push(' ');
        connect.push_str(origin);
    }
    if is_dev {
        connect.push_str(" http://localhost:* ws://localhost:*");
    }
    directives.push(connect);

    directives.push("frame-src 'none'".into());
    directives.push("frame-ancestors 'none'".into());
    directives.push("object-src 'none'".into());
    directives.push("base-uri 'self'".into());
    directives.push(format!("form-action 'self' {}", csp.auth_origin));

    if !is_dev {
        directives.push("upgrade-insecure-requests".into());
    }

    directives.join("; ")
}
