//! The admission pipeline: ordered gate chain run on every request.
//!
//! # Data Flow
//! ```text
//! Request received
//!     → bot gate        (403 on match)
//!     → csrf gate       (403, mutating methods only)
//!     → rate-limit gate (429 + Retry-After)
//!     → auth gate       (401/403, protected route classes only)
//!     → forward to upstream
//! Security headers are merged into every outcome, rejected or forwarded.
//! ```
//!
//! # Design Decisions
//! - Linear state machine: first failing gate terminates the request
//! - No retries or backoff at this layer
//! - The synchronous gates run before the suspending auth gate, so slow
//!   collaborators never delay other requests' bot or rate-limit checks
//! - No lock is held across an await point

use std::net::SocketAddr;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::header::{HeaderMap, USER_AGENT};
use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::request::{request_id, session_credentials};
use crate::http::response::{apply_security_headers, json_error};
use crate::http::server::{AppState, RuntimeState};
use crate::observability::metrics;
use crate::routing::{AccessPolicy, RouteClass};
use crate::security::auth::auth_error_response;
use crate::security::{bot, csrf};

/// Run the gate chain for one request, short-circuiting on the first
/// rejection, then forward and stamp the response.
pub async fn admission(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let snapshot = state.inner.load_full();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let url = full_url(&request);
    let id = request_id(&request).to_string();
    let class = snapshot.routes.classify(&path);

    if class != RouteClass::Health {
        // Gate 1: bot/attack classification.
        let user_agent = request
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok());
        let decision = bot::classify(user_agent, &path, &url);
        if decision.is_bot {
            tracing::warn!(
                request_id = %id,
                path = %path,
                reason = %decision.reason,
                "Request blocked as bot traffic"
            );
            return rejected(
                &snapshot,
                "bot",
                StatusCode::FORBIDDEN,
                "Access denied",
                &method,
                start,
            );
        }

        // Gate 2: CSRF origin validation for mutating methods.
        let decision = csrf::validate(
            &method,
            request.headers(),
            &snapshot.config.security.allowed_origins,
        );
        if !decision.valid {
            tracing::warn!(
                request_id = %id,
                path = %path,
                reason = %decision.reason,
                "Request blocked by CSRF validation"
            );
            return rejected(
                &snapshot,
                "csrf",
                StatusCode::FORBIDDEN,
                "Invalid request origin",
                &method,
                start,
            );
        }

        // Gate 3: rate limiting keyed by client identity and route tier.
        let tier = class.tier();
        let key = format!(
            "{}:{}",
            client_key(
                &addr,
                request.headers(),
                &snapshot.config.security.trusted_proxies
            ),
            tier.name
        );
        let verdict = state.limiter.check(&key, tier);
        if !verdict.allowed {
            tracing::warn!(
                request_id = %id,
                key = %key,
                retry_after = verdict.retry_after_secs,
                "Rate limit exceeded"
            );
            let mut response = rejected(
                &snapshot,
                "rate_limit",
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests",
                &method,
                start,
            );
            if let Ok(value) = verdict.retry_after_secs.to_string().parse() {
                response.headers_mut().insert("retry-after", value);
            }
            return response;
        }

        // Gate 4: server-verified authorization for protected classes.
        match class.access() {
            AccessPolicy::Public => {}
            AccessPolicy::Authenticated | AccessPolicy::Admin => {
                let credentials = session_credentials(&request);
                let decision = if class.access() == AccessPolicy::Admin {
                    state.auth.require_admin(&credentials).await
                } else {
                    state.auth.require_auth(&credentials).await
                };
                if !decision.authorized {
                    tracing::warn!(
                        request_id = %id,
                        path = %path,
                        error = decision.error,
                        "Request blocked by auth guard"
                    );
                    let status = if decision.error == Some("Not authenticated") {
                        StatusCode::UNAUTHORIZED
                    } else {
                        StatusCode::FORBIDDEN
                    };
                    let mut response = auth_error_response(&decision, Some(status));
                    apply_security_headers(&mut response, &snapshot.headers);
                    metrics::record_rejection("auth");
                    metrics::record_request(method.as_str(), status.as_u16(), start);
                    return response;
                }
            }
        }
    }

    // Terminal state: forwarded.
    let mut response = next.run(request).await;
    apply_security_headers(&mut response, &snapshot.headers);
    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

/// Build a terminal rejection response with security headers attached.
fn rejected(
    snapshot: &RuntimeState,
    gate: &'static str,
    status: StatusCode,
    message: &str,
    method: &Method,
    start: Instant,
) -> Response {
    let mut response = json_error(status, message);
    apply_security_headers(&mut response, &snapshot.headers);
    metrics::record_rejection(gate);
    metrics::record_request(method.as_str(), status.as_u16(), start);
    response
}

/// Reconstruct the full request URL for the heuristic scanners.
fn full_url(request: &Request<Body>) -> String {
    let uri = request.uri();
    if uri.scheme().is_some() {
        return uri.to_string();
    }
    match request.headers().get("host").and_then(|v| v.to_str().ok()) {
        Some(host) => format!("https://{host}{uri}"),
        None => uri.to_string(),
    }
}

/// Identity string used as the rate-limit key prefix.
///
/// The X-Forwarded-For first hop is only believed when the direct peer
/// is a configured trusted proxy.
fn client_key(addr: &SocketAddr, headers: &HeaderMap, trusted_proxies: &[String]) -> String {
    let peer = addr.ip().to_string();
    if trusted_proxies.iter().any(|proxy| proxy == &peer) {
        if let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
        {
            let first_hop = forwarded.trim();
            if !first_hop.is_empty() {
                return first_hop.to_string();
            }
        }
    }
    peer
}
