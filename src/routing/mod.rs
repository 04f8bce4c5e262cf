//! Route classification subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → table.rs (ordered prefix scan)
//!     → RouteClass (tier + access policy for the admission pipeline)
//! ```
//!
//! # Design Decisions
//! - Static table compiled at startup, immutable at runtime
//! - No regex: ordered prefix matching only, first match wins
//! - Unmatched paths fall back to the page class (public, widest tier)

pub mod table;

pub use table::{AccessPolicy, RouteClass, RoutingTable};
