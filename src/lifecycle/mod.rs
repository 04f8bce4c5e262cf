//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init metrics → Spawn sweeper/watcher → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → broadcast → server drains, sweeper and watcher stop
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then background tasks, listener last
//! - One broadcast channel fans the shutdown signal out to every task

pub mod shutdown;

pub use shutdown::Shutdown;
