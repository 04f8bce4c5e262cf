//! Shared utilities for integration testing the gateway.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use unicore_gateway::{GatewayConfig, GatewayServer, Shutdown};

/// A user-agent long enough and clean enough to pass the bot gate.
pub const BROWSER_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 Chrome/120.0";

/// Start a stand-in ERP application that answers every route with 200.
pub async fn spawn_upstream() -> SocketAddr {
    // The body is consumed so aborted uploads fail at the gateway, not here.
    let app = Router::new().fallback(|_body: axum::body::Bytes| async { "erp-ok" });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Start a stand-in auth backend exposing the session verifier and the
/// role directory the gateway's auth guard calls.
///
/// Sessions: `session=admin`, `session=student`, `session=inactive`
/// verify to known identities; `session=ghost` verifies but has no
/// directory record; anything else is unauthenticated.
pub async fn spawn_auth_backend() -> SocketAddr {
    let app = Router::new()
        .route("/verify", get(verify_session))
        .route("/users", get(lookup_user));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn verify_session(headers: HeaderMap) -> Response {
    let cookie = headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let email = if cookie.contains("session=admin") {
        "registrar@unicore.edu"
    } else if cookie.contains("session=student") {
        "s.okafor@unicore.edu"
    } else if cookie.contains("session=inactive") {
        "dormant@unicore.edu"
    } else if cookie.contains("session=ghost") {
        "ghost@unicore.edu"
    } else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    Json(json!({ "email": email })).into_response()
}

async fn lookup_user(Query(params): Query<HashMap<String, String>>) -> Response {
    let record = match params.get("email").map(String::as_str) {
        Some("registrar@unicore.edu") => json!({ "id": "u-1", "role": "admin", "status": "active" }),
        Some("s.okafor@unicore.edu") => {
            json!({ "id": "u-2", "role": "student", "status": "active" })
        }
        Some("dormant@unicore.edu") => {
            json!({ "id": "u-3", "role": "student", "status": "inactive" })
        }
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    Json(record).into_response()
}

/// Base config wired to the given upstream and auth backend.
pub fn gateway_config(upstream: SocketAddr, auth: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.address = upstream.to_string();
    config.security.allowed_origins = vec!["https://unicore.edu".to_string()];
    config.auth.session_verify_url = format!("http://{auth}/verify");
    config.auth.directory_url = format!("http://{auth}/users");
    config.timeouts.auth_call_secs = 2;
    config.observability.metrics_enabled = false;
    config
}

/// Start the gateway on an ephemeral port.
///
/// The returned `Shutdown` must be kept alive for the duration of the
/// test; dropping it stops the server.
pub async fn spawn_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let (addr, shutdown, _updates) = spawn_gateway_with_updates(config).await;
    (addr, shutdown)
}

/// Start the gateway and keep the config-update channel, for tests that
/// push a reload the way the file watcher would.
pub async fn spawn_gateway_with_updates(
    config: GatewayConfig,
) -> (
    SocketAddr,
    Shutdown,
    mpsc::UnboundedSender<GatewayConfig>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (updates_tx, updates) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let server = GatewayServer::new(config);
        server.run(listener, updates, server_shutdown).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(150)).await;
    (addr, shutdown, updates_tx)
}

/// HTTP client presenting a plausible browser user-agent.
pub fn browser_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(BROWSER_UA)
        .no_proxy()
        .build()
        .unwrap()
}

/// HTTP client with no user-agent at all.
pub fn bare_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
