//! Configuration errors raised while declaring or assembling controllers.

use thiserror::Error;

/// Malformed controller metadata.
///
/// These are never request-time conditions: they surface while a controller is
/// declared or assembled and abort startup.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Parameter source tag outside {query, path, body, header, context}.
    #[error("Invalid source: {0}")]
    UnknownSource(String),

    /// HTTP verb tag the router does not support.
    #[error("Invalid HTTP method: {0}")]
    UnknownVerb(String),

    /// Schema `type` tag that does not name a supported type.
    #[error("Invalid schema type for parameter \"{param}\": {tag}")]
    UnknownSchemaType { param: String, tag: String },

    /// Assembly was asked for a controller that was never declared.
    #[error("Controller {0} has no controller metadata")]
    UndeclaredController(&'static str),

    /// An object-typed parameter has no validator attached.
    #[error("Parameter \"{param}\" of handler \"{handler}\" has an object schema but no validator")]
    MissingValidator { handler: String, param: String },

    /// An object schema could not be compiled into a validator.
    #[error("Invalid schema for parameter \"{param}\": {reason}")]
    InvalidSchema { param: String, reason: String },

    /// The metadata manifest could not be parsed.
    #[error("Manifest parse error: {0}")]
    Manifest(#[from] toml::de::Error),

    /// The metadata manifest could not be read.
    #[error("Manifest read error: {0}")]
    Io(#[from] std::io::Error),

    /// A route path the router cannot mount.
    #[error("Invalid route path \"{path}\": {reason}")]
    InvalidRoutePath { path: String, reason: String },

    /// Two routes would be served by the same method and path.
    #[error("Route {path} conflicts with {existing}")]
    RouteConflict { path: String, existing: String },
}
