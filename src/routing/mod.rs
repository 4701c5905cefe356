//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Controller instance (Arc<C>) + MetadataRegistry
//!     → assembler.rs (controller prefix, enumerate handlers)
//!     → builder.rs (RouteUnit per handler with route metadata)
//!     → router.rs (ordered entries: controller before, route before,
//!                  action, route after, controller after)
//!     → into_axum() (one axum route per path shape, or ConfigurationError)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Handlers without route metadata are skipped silently
//! - Entry order is registration order; it is part of the contract

pub mod assembler;
pub mod builder;
pub mod middleware;
pub mod router;

pub use assembler::{AssemblerOptions, RouterAssembler};
pub use builder::{mount_path, RouteAction, RouteBuilder, RouteMiddleware, RouteUnit};
pub use middleware::{from_fn, Flow, Middleware};
pub use router::{ControllerRouter, LayerKind};
