//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! axum request
//!     → context.rs (RequestContext: path params, query, headers, body)
//!     → [route middleware chain]
//!     → resolver.rs (ParamMetadata[] → Arguments, or ClientError)
//!     → controller handler (Reply | HandlerError)
//!     → translator.rs (ResponseState, or DispatchError)
//!     → rendered response
//! ```
//!
//! # Design Decisions
//! - A handler never runs with a partial argument list
//! - Handler outcomes are a tagged union, not runtime type inspection
//! - A context argument shares the route's response state; edits made through
//!   it are merged back before the handler's reply is applied
//! - Unclassified handler failures pass through unchanged; the mount adapter
//!   renders them as 500

pub mod context;
pub mod error;
pub mod reply;
pub mod resolver;
pub mod translator;

pub use context::{Exchange, HandlerContext, RequestContext, ResponseHandle, ResponseState};
pub use error::{BoxError, ClientError, DispatchError};
pub use reply::{HandlerError, HttpError, Reply, StatusResult};
pub use resolver::{Argument, Arguments, ParamResolver, ResolveOptions};
