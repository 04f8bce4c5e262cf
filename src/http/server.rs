//! HTTP server setup and upstream forwarding.
//!
//! # Responsibilities
//! - Create the Axum router with the admission pipeline wired in
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Forward admitted requests to the upstream ERP application
//! - Apply validated config reloads atomically
//! - Run lifecycle-managed background tasks (rate-limit sweeper)

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::extract::State;
use axum::http::uri::{Authority, Scheme};
use axum::http::{Request, StatusCode, Uri};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::http::request::{request_id, RequestIdLayer};
use crate::http::response::json_error;
use crate::pipeline;
use crate::routing::RoutingTable;
use crate::security::auth::{AuthGuard, HttpRoleDirectory, HttpSessionVerifier};
use crate::security::headers::{security_headers, SecurityHeaderSet};
use crate::security::rate_limit::{spawn_sweeper, InMemoryStore, RateLimiter};

/// The reload-swappable view of the configuration: the config itself plus
/// everything derived from it.
pub struct RuntimeState {
    pub config: GatewayConfig,
    pub headers: SecurityHeaderSet,
    pub routes: RoutingTable,
}

impl RuntimeState {
    pub fn from_config(config: GatewayConfig) -> Self {
        let headers = security_headers(config.security.dev_mode, &config.csp);
        Self {
            config,
            headers,
            routes: RoutingTable::erp_default(),
        }
    }
}

/// Application state injected into the pipeline and handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<RuntimeState>>,
    pub limiter: Arc<RateLimiter>,
    pub auth: Arc<AuthGuard>,
    pub client: Client<HttpConnector, Body>,
}

/// The security gateway's HTTP server.
pub struct GatewayServer {
    router: Router,
    state: AppState,
    sweep_interval: Duration,
}

impl GatewayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let auth_timeout = Duration::from_secs(config.timeouts.auth_call_secs);

        // Collaborator endpoints are fixed at startup; reloads only touch
        // the swappable runtime view.
        let http = reqwest::Client::builder()
            .timeout(auth_timeout)
            .build()
            .expect("failed to build auth collaborator client");
        let verifier = Arc::new(HttpSessionVerifier::new(
            http.clone(),
            config.auth.session_verify_url.clone(),
        ));
        let directory = Arc::new(HttpRoleDirectory::new(
            http,
            config.auth.directory_url.clone(),
            config.auth.service_key.clone(),
        ));
        let auth = Arc::new(AuthGuard::new(verifier, directory, auth_timeout));

        let limiter = Arc::new(RateLimiter::new(Arc::new(InMemoryStore::new())));
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let sweep_interval = Duration::from_secs(config.security.sweep_interval_secs);
        let state = AppState {
            inner: Arc::new(ArcSwap::from_pointee(RuntimeState::from_config(
                config.clone(),
            ))),
            limiter,
            auth,
            client,
        };

        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            state,
            sweep_interval,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layer order (outermost first): trace, request ID, timeout,
    /// admission pipeline, body limit, then the handlers. The body limit
    /// sits inside the admission layer so oversized-body rejections pass
    /// back through it and carry the security header set like every
    /// other outcome.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/healthz", get(health_handler))
            .route("/{*path}", any(forward_handler))
            .route("/", any(forward_handler))
            .with_state(state.clone())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_bytes))
            .layer(middleware::from_fn_with_state(state, pipeline::admission))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown channel fires.
    ///
    /// Spawns the rate-limit sweeper and the config-reload applier as
    /// lifecycle-managed background tasks.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Security gateway starting");

        spawn_sweeper(
            self.state.limiter.store(),
            self.sweep_interval,
            shutdown.resubscribe(),
        );

        let reload_state = self.state.inner.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => {
                            reload_state.store(Arc::new(RuntimeState::from_config(config)));
                            tracing::info!("Configuration reload applied");
                        }
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("Security gateway stopped");
        Ok(())
    }
}

/// Liveness probe served by the gateway itself.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Forward an admitted request to the upstream ERP application.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let snapshot = state.inner.load_full();
    let request_id = request_id(&request).to_string();
    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = match Authority::from_str(&snapshot.config.upstream.address) {
        Ok(authority) => Some(authority),
        Err(err) => {
            tracing::error!(
                request_id = %request_id,
                upstream = %snapshot.config.upstream.address,
                error = %err,
                "Invalid upstream address"
            );
            return json_error(StatusCode::BAD_GATEWAY, "Upstream unavailable");
        }
    };
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(_) => return json_error(StatusCode::BAD_GATEWAY, "Upstream unavailable"),
    };

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        uri = %parts.uri,
        "Forwarding admitted request"
    );

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body)).into_response()
        }
        Err(err) => {
            tracing::error!(request_id = %request_id, error = %err, "Upstream request failed");
            json_error(StatusCode::BAD_GATEWAY, "Upstream request failed")
        }
    }
}
