//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID as early as possible for tracing
//! - Extract the credential material the auth guard consumes
//!
//! # Design Decisions
//! - An existing X-Request-ID from the client is kept, so upstream
//!   callers can correlate across hops
//! - Only the session cookie is treated as credential material; claims
//!   in other headers or the body are never extracted

use axum::body::Body;
use axum::http::header::{HeaderValue, COOKIE};
use axum::http::Request;
use tower::{Layer, Service};
use uuid::Uuid;

use crate::security::auth::SessionCredentials;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer that stamps every request with an `X-Request-ID`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestIdService<S>
where
    S: Service<Request<Body>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        if !request.headers().contains_key(X_REQUEST_ID) {
            let id = Uuid::new_v4().to_string();
            if let Ok(value) = HeaderValue::from_str(&id) {
                request.headers_mut().insert(X_REQUEST_ID, value);
            }
        }
        self.inner.call(request)
    }
}

/// The request ID stamped by [`RequestIdLayer`], for log correlation.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Extract the credential material the session verifier consumes.
pub fn session_credentials<B>(request: &Request<B>) -> SessionCredentials {
    SessionCredentials {
        cookie: request
            .headers()
            .get(COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}
