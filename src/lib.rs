//! UniCore Security Gateway Library
//!
//! Request admission control for the UniCore ERP: every inbound request
//! passes an ordered gate chain (bot classification, CSRF validation,
//! rate limiting, server-verified authorization) before it is forwarded
//! to the application, and every response carries the security header set.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
