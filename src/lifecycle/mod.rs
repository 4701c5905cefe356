//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Init logging/metrics → Assemble controllers → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C or trigger() → Stop accepting → Drain in-flight requests → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: a configuration error aborts startup before binding
//! - Listener binds last (traffic only when routers are assembled)

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
