//! Security subsystem: the admission-control gates.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → bot.rs (classify user-agent, path, URL)
//!     → csrf.rs (validate declared origin on mutating methods)
//!     → rate_limit.rs (count against the route tier's window)
//!     → auth.rs (verify session + role for protected routes)
//!     → headers.rs (security headers merged into every response)
//! ```
//!
//! # Design Decisions
//! - Gates run in a fixed order; the first rejection short-circuits
//! - Fail closed: any ambiguity or upstream failure denies
//! - No trust in client input: identity is always re-verified server-side

pub mod auth;
pub mod bot;
pub mod csrf;
pub mod headers;
pub mod rate_limit;
