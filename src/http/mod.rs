//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, timeout/body-limit/trace layers)
//!     → request.rs (add or propagate request ID)
//!     → controller routers (dispatch chain per method + path)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::HttpServer;
