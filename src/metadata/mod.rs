//! Controller metadata subsystem.
//!
//! # Data Flow
//! ```text
//! Declaration (at startup):
//!     registry.controller::<C>(base_path)      (builder API)
//!     ControllerManifest::declare::<C>()       (TOML manifest)
//!     → MetadataRegistry side table keyed by (TypeId, handler)
//!     → frozen behind Arc, read-only from here on
//!
//! Assembly / request time:
//!     routing::assembler reads ControllerMetadata
//!     routing::builder reads RouteMetadata + ParamMetadata per handler
//! ```
//!
//! # Design Decisions
//! - Metadata is immutable once assembly starts
//! - Missing route metadata means "not a route", never an error
//! - Parameter sources are a closed enum; textual tags are parsed at
//!   declaration time so a bad tag fails at startup

pub mod error;
pub mod manifest;
pub mod model;
pub mod registry;
pub mod validator;

pub use error::ConfigurationError;
pub use manifest::ControllerManifest;
pub use model::{ControllerMetadata, HttpVerb, ParamMetadata, ParamSource, RouteMetadata, SchemaType};
pub use registry::{ControllerDeclaration, MetadataRegistry};
pub use validator::{JsonSchemaValidator, TypedValidator, Validator};
