//! Cross-site request forgery validation for mutating requests.
//!
//! # Responsibilities
//! - Verify the declared Origin/Referer of mutating requests against the
//!   set of origins allowed to submit forms and API calls
//! - Stay correct behind a reverse proxy (X-Forwarded-Host / -Proto)
//!
//! # Design Decisions
//! - Safe methods (GET/HEAD/OPTIONS) are never checked
//! - The allow-set is built per request: own origin, configured origins,
//!   forwarded origin
//! - Rejection reasons carry the offending origin for audit logs
//! - Pure function: no I/O, no shared state

use axum::http::header::{HeaderMap, ORIGIN, REFERER};
use axum::http::Method;
use url::Url;

/// Outcome of validating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfDecision {
    pub valid: bool,
    pub reason: String,
}

impl CsrfDecision {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: String::new(),
        }
    }

    fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
        }
    }
}

/// Validate a request's declared origin against the allowed set.
pub fn validate(method: &Method, headers: &HeaderMap, allowed_origins: &[String]) -> CsrfDecision {
    // Safe methods carry no CSRF risk.
    if matches!(method.as_str(), "GET" | "HEAD" | "OPTIONS") {
        return CsrfDecision::ok();
    }

    let origin = header_str(headers, ORIGIN.as_str());
    let referer = header_str(headers, REFERER.as_str());

    if origin.is_none() && referer.is_none() {
        return CsrfDecision::invalid("missing-origin-and-referer");
    }

    let allowed = allow_set(headers, allowed_origins);

    if let Some(origin) = origin {
        return if allowed.contains(&normalize_origin(origin)) {
            CsrfDecision::ok()
        } else {
            CsrfDecision::invalid(format!("origin-mismatch:{origin}"))
        };
    }

    if let Some(referer) = referer {
        let parsed = match Url::parse(referer) {
            Ok(url) => url,
            Err(_) => return CsrfDecision::invalid("invalid-referer-url"),
        };
        let referer_origin = parsed.origin().ascii_serialization();
        return if allowed.contains(&normalize_origin(&referer_origin)) {
            CsrfDecision::ok()
        } else {
            CsrfDecision::invalid(format!("referer-mismatch:{referer_origin}"))
        };
    }

    // Reached when a header exists but holds no usable value.
    CsrfDecision::invalid("no-origin-header")
}

/// Build the set of origins this request may legitimately come from:
/// the request's own origin, the configured allow-list, and the origin
/// the reverse proxy says it is serving.
fn allow_set(headers: &HeaderMap, allowed_origins: &[String]) -> Vec<String> {
    let mut allowed: Vec<String> = allowed_origins.iter().map(|o| normalize_origin(o)).collect();

    let proto = header_str(headers, "x-forwarded-proto").unwrap_or("https");

    if let Some(host) = header_str(headers, "host") {
        allowed.push(normalize_origin(&format!("{proto}://{host}")));
    }
    if let Some(fwd_host) = header_str(headers, "x-forwarded-host") {
        allowed.push(normalize_origin(&format!("{proto}://{fwd_host}")));
    }

    allowed
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_lowercase()
}
