//! Server-verified authorization for privileged routes.
//!
//! # Responsibilities
//! - Resolve a request's credential material to a verified identity via
//!   the external session verifier
//! - Resolve that identity to its canonical role/status record via the
//!   external role directory
//! - Produce a fail-closed decision; collaborator failures never leak
//!
//! # Design Decisions
//! - Client-supplied claims are never trusted: identity is re-derived from
//!   a fresh verification plus a fresh directory lookup on every request
//! - Both collaborator calls run under an explicit timeout; expiry denies
//! - Decisions are plain values, not exceptions, threaded back to the
//!   pipeline

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use thiserror::Error;

use crate::http::response::json_error;

/// Credential material carried by the request, typically the session cookie.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentials {
    pub cookie: Option<String>,
}

/// Canonical record the role directory holds for a verified identity.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub role: String,
    pub status: String,
}

/// Failure talking to a collaborator. Mapped to a generic denial at the
/// guard boundary, never surfaced to clients.
#[derive(Debug, Error)]
pub enum AuthBackendError {
    #[error("collaborator call failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("collaborator returned status {0}")]
    Status(u16),
}

/// External session verifier: credential material to verified identity.
///
/// `Ok(None)` means cleanly unauthenticated; `Err` means the verifier
/// itself failed and the guard must fail closed.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, credentials: &SessionCredentials)
        -> Result<Option<String>, AuthBackendError>;
}

/// External role directory: verified identity to `{id, role, status}`.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn lookup(&self, email: &str) -> Result<Option<UserRecord>, AuthBackendError>;
}

/// Authorization outcome for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    pub authorized: bool,
    pub user_id: Option<String>,
    pub role: Option<String>,
    pub error: Option<&'static str>,
}

impl AuthDecision {
    fn denied(error: &'static str) -> Self {
        Self {
            authorized: false,
            user_id: None,
            role: None,
            error: Some(error),
        }
    }
}

/// JSON error response for an auth denial: `{"error": message}` with the
/// caller-specified status (403 when unspecified).
pub fn auth_error_response(decision: &AuthDecision, status: Option<StatusCode>) -> Response {
    let message = decision.error.unwrap_or("Forbidden");
    json_error(status.unwrap_or(StatusCode::FORBIDDEN), message)
}

/// Two-stage fail-closed authorization guard.
pub struct AuthGuard {
    verifier: Arc<dyn SessionVerifier>,
    directory: Arc<dyn RoleDirectory>,
    call_timeout: Duration,
}

impl AuthGuard {
    pub fn new(
        verifier: Arc<dyn SessionVerifier>,
        directory: Arc<dyn RoleDirectory>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            verifier,
            directory,
            call_timeout,
        }
    }

    /// Require a verified, active account.
    pub async fn require_auth(&self, credentials: &SessionCredentials) -> AuthDecision {
        self.resolve(credentials, false).await
    }

    /// Require a verified, active account with the `admin` role.
    pub async fn require_admin(&self, credentials: &SessionCredentials) -> AuthDecision {
        self.resolve(credentials, true).await
    }

    async fn resolve(&self, credentials: &SessionCredentials, need_admin: bool) -> AuthDecision {
        // Stage 1: verify the session server-side.
        let verified = tokio::time::timeout(self.call_timeout, self.verifier.verify(credentials));
        let email = match verified.await {
            Ok(Ok(Some(email))) => email,
            Ok(Ok(None)) => return AuthDecision::denied("Not authenticated"),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "Session verifier failed");
                return AuthDecision::denied("Auth verification failed");
            }
            Err(_) => {
                tracing::warn!("Session verifier timed out");
                return AuthDecision::denied("Auth verification failed");
            }
        };

        // Stage 2: fresh directory lookup, never cached.
        let looked_up = tokio::time::timeout(self.call_timeout, self.directory.lookup(&email));
        let record = match looked_up.await {
            Ok(Ok(Some(record))) => record,
            Ok(Ok(None)) => return AuthDecision::denied("User profile not found"),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "Role directory lookup failed");
                return AuthDecision::denied("Auth verification failed");
            }
            Err(_) => {
                tracing::warn!("Role directory lookup timed out");
                return AuthDecision::denied("Auth verification failed");
            }
        };

        if need_admin && record.role != "admin" {
            return AuthDecision {
                authorized: false,
                user_id: Some(record.id),
                role: Some(record.role),
                error: Some("Admin access required"),
            };
        }

        if record.status != "active" {
            return AuthDecision {
                authorized: false,
                user_id: Some(record.id),
                role: Some(record.role),
                error: Some("Account is inactive"),
            };
        }

        AuthDecision {
            authorized: true,
            user_id: Some(record.id),
            role: Some(record.role),
            error: None,
        }
    }
}

/// Session verifier backed by the ERP auth service over HTTP.
///
/// The service receives the raw session cookie and answers with the
/// verified subject, or 401 when the session is absent/expired.
pub struct HttpSessionVerifier {
    client: reqwest::Client,
    verify_url: String,
}

impl HttpSessionVerifier {
    pub fn new(client: reqwest::Client, verify_url: String) -> Self {
        Self { client, verify_url }
    }
}

#[derive(Deserialize)]
struct VerifyResponse {
    email: String,
}

#[async_trait]
impl SessionVerifier for HttpSessionVerifier {
    async fn verify(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Option<String>, AuthBackendError> {
        let cookie = match &credentials.cookie {
            Some(cookie) => cookie,
            None => return Ok(None),
        };

        let response = self
            .client
            .get(&self.verify_url)
            .header("cookie", cookie)
            .send()
            .await?;

        match response.status().as_u16() {
            200 => {
                let body: VerifyResponse = response.json().await?;
                Ok(Some(body.email))
            }
            401 | 403 => Ok(None),
            status => Err(AuthBackendError::Status(status)),
        }
    }
}

/// Role directory backed by the ERP user service over HTTP.
pub struct HttpRoleDirectory {
    client: reqwest::Client,
    directory_url: String,
    service_key: Option<String>,
}

impl HttpRoleDirectory {
    pub fn new(client: reqwest::Client, directory_url: String, service_key: Option<String>) -> Self {
        Self {
            client,
            directory_url,
            service_key,
        }
    }
}

#[async_trait]
impl RoleDirectory for HttpRoleDirectory {
    async fn lookup(&self, email: &str) -> Result<Option<UserRecord>, AuthBackendError> {
        let mut request = self
            .client
            .get(&self.directory_url)
            .query(&[("email", email)]);
        if let Some(key) = &self.service_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        match response.status().as_u16() {
            200 => Ok(Some(response.json().await?)),
            404 => Ok(None),
            status => Err(AuthBackendError::Status(status)),
        }
    }
}
