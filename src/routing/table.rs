//! Static route-class table.
//!
//! Maps a request path to a route class, which fixes the rate-limit tier,
//! the rate-limit key suffix, and the authorization requirement the
//! admission pipeline enforces.

use crate::security::rate_limit::RateLimitTier;

/// Authorization a route class demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    Public,
    Authenticated,
    Admin,
}

/// Classes of routes the gateway distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Gateway's own liveness probe; bypasses every gate except headers.
    Health,
    /// Login/logout/session endpoints: tight window, public.
    Auth,
    /// Account creation: tightest window, public.
    Signup,
    /// Administrative API: admin role required.
    AdminApi,
    /// Application API: verified active account required.
    Api,
    /// Everything else: page rendering, public.
    Page,
}

impl RouteClass {
    pub fn tier(&self) -> &'static RateLimitTier {
        match self {
            RouteClass::Auth => &RateLimitTier::AUTH,
            RouteClass::Signup => &RateLimitTier::SIGNUP,
            RouteClass::AdminApi | RouteClass::Api => &RateLimitTier::API,
            RouteClass::Health | RouteClass::Page => &RateLimitTier::PAGE,
        }
    }

    pub fn access(&self) -> AccessPolicy {
        match self {
            RouteClass::AdminApi => AccessPolicy::Admin,
            RouteClass::Api => AccessPolicy::Authenticated,
            _ => AccessPolicy::Public,
        }
    }
}

/// Ordered prefix → class table; first match wins.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    rules: Vec<(&'static str, RouteClass)>,
}

impl RoutingTable {
    /// The table for the university ERP deployment.
    ///
    /// Order matters: `/api/auth` and `/api/admin` must be listed before
    /// the `/api` catch-all.
    pub fn erp_default() -> Self {
        Self {
            rules: vec![
                ("/healthz", RouteClass::Health),
                ("/api/auth", RouteClass::Auth),
                ("/login", RouteClass::Auth),
                ("/signup", RouteClass::Signup),
                ("/api/admin", RouteClass::AdminApi),
                ("/api", RouteClass::Api),
            ],
        }
    }

    /// Classify a path; unmatched paths are page routes.
    pub fn classify(&self, path: &str) -> RouteClass {
        for (prefix, class) in &self.rules {
            if path.starts_with(prefix) {
                return *class;
            }
        }
        RouteClass::Page
    }
}
