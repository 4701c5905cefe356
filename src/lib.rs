//! Controller-based HTTP routing.
//!
//! Controllers list their handlers; a [`MetadataRegistry`] records where each
//! handler is mounted, which request values feed its parameters, and which
//! middlewares surround it. A [`RouterAssembler`] turns a controller instance
//! plus its metadata into a [`ControllerRouter`], which mounts into axum.

// Core subsystems
pub mod controller;
pub mod dispatch;
pub mod metadata;
pub mod routing;

// Hosting
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::RouterConfig;
pub use controller::{Controller, HandlerTable};
pub use dispatch::{
    Arguments, DispatchError, Exchange, HandlerContext, HandlerError, HttpError, Reply, RequestContext, StatusResult,
};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use metadata::{ConfigurationError, ControllerManifest, MetadataRegistry, ParamMetadata, RouteMetadata};
pub use routing::{from_fn, ControllerRouter, Flow, Middleware, RouterAssembler};
