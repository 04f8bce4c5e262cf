//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gateway. All types derive Serde traits for deserialization from config
//! files, and every section has defaults so a minimal config works.

use serde::{Deserialize, Serialize};

/// Root configuration for the security gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Upstream ERP application the gateway fronts.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Admission-control settings (origins, dev flag, limits).
    pub security: SecurityConfig,

    /// Content-Security-Policy backend origins.
    pub csp: CspConfig,

    /// Auth collaborator endpoints (session verifier, role directory).
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Upstream application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Address of the ERP application server (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Timeout for each auth collaborator call in seconds.
    /// Expiry is treated as an auth failure, never as a pass.
    pub auth_call_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            auth_call_secs: 5,
        }
    }
}

/// Admission-control settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Development mode: loosens the CSP and drops HTTPS upgrades.
    pub dev_mode: bool,

    /// Origins allowed to submit mutating requests, in addition to the
    /// request's own origin (e.g., "https://unicore.edu").
    pub allowed_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Peers whose X-Forwarded-For first hop is trusted as the client
    /// identity for rate limiting.
    pub trusted_proxies: Vec<String>,

    /// Cadence of the expired-entry sweep in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            allowed_origins: Vec::new(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            trusted_proxies: Vec::new(),
            sweep_interval_secs: 300,
        }
    }
}

/// Backend origins embedded in the Content-Security-Policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CspConfig {
    /// Object-storage origin allowed in img-src.
    pub storage_origin: String,

    /// Backend API origin allowed in connect-src.
    pub api_origin: String,

    /// Backend WebSocket origin allowed in connect-src.
    pub ws_origin: String,

    /// Auth service origin allowed in connect-src and form-action.
    pub auth_origin: String,

    /// Telemetry collectors allowed in connect-src.
    pub telemetry_origins: Vec<String>,

    /// Font CDN allowed in font-src.
    pub font_cdn: String,
}

impl Default for CspConfig {
    fn default() -> Self {
        Self {
            storage_origin: "https://storage.unicore-cloud.com".to_string(),
            api_origin: "https://api.unicore-cloud.com".to_string(),
            ws_origin: "wss://api.unicore-cloud.com".to_string(),
            auth_origin: "https://auth.unicore-cloud.com".to_string(),
            telemetry_origins: vec!["https://telemetry.unicore-cloud.com".to_string()],
            font_cdn: "https://fonts.gstatic.com".to_string(),
        }
    }
}

/// Auth collaborator endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Session verifier endpoint: receives the session cookie, answers
    /// with the verified subject.
    pub session_verify_url: String,

    /// Role directory endpoint: maps a verified email to `{id, role, status}`.
    pub directory_url: String,

    /// Service key sent as a bearer token on directory lookups.
    pub service_key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_verify_url: "https://auth.unicore-cloud.com/v1/session/verify".to_string(),
            directory_url: "https://api.unicore-cloud.com/v1/users/by-email".to_string(),
            service_key: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
