//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, credential extraction)
//!     → [admission pipeline decides: reject or forward]
//!     → server.rs (forward to upstream ERP application)
//!     → response.rs (security headers, JSON rejections)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, GatewayServer, RuntimeState};
