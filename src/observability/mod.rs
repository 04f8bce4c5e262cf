//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gates and forwarder produce:
//!     → structured log events (tracing, request ID attached)
//!     → counters and histograms (metrics.rs)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Metric updates are cheap atomic increments, safe on the hot path
//! - Rejections are labelled by gate so dashboards can tell bot traffic
//!   from rate-limit pressure
//! - Log init lives in main; this module only records

pub mod metrics;
