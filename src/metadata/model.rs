//! Metadata descriptors for controllers, routes and parameters.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::routing::MethodFilter;

use crate::metadata::error::ConfigurationError;
use crate::metadata::validator::Validator;

/// Metadata attached once per controller type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerMetadata {
    /// Path prefix every route of the controller is mounted under. May be empty.
    pub base_path: String,
}

impl ControllerMetadata {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

/// HTTP verbs a route can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpVerb {
    /// Lower-cased verb name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "get",
            HttpVerb::Post => "post",
            HttpVerb::Put => "put",
            HttpVerb::Patch => "patch",
            HttpVerb::Delete => "delete",
            HttpVerb::Head => "head",
            HttpVerb::Options => "options",
        }
    }

    pub(crate) fn method_filter(&self) -> MethodFilter {
        match self {
            HttpVerb::Get => MethodFilter::GET,
            HttpVerb::Post => MethodFilter::POST,
            HttpVerb::Put => MethodFilter::PUT,
            HttpVerb::Patch => MethodFilter::PATCH,
            HttpVerb::Delete => MethodFilter::DELETE,
            HttpVerb::Head => MethodFilter::HEAD,
            HttpVerb::Options => MethodFilter::OPTIONS,
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpVerb {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(HttpVerb::Get),
            "post" => Ok(HttpVerb::Post),
            "put" => Ok(HttpVerb::Put),
            "patch" => Ok(HttpVerb::Patch),
            "delete" => Ok(HttpVerb::Delete),
            "head" => Ok(HttpVerb::Head),
            "options" => Ok(HttpVerb::Options),
            _ => Err(ConfigurationError::UnknownVerb(s.to_string())),
        }
    }
}

/// Route metadata attached per handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMetadata {
    pub method: HttpVerb,
    /// Path relative to the controller base path.
    pub path: String,
}

impl RouteMetadata {
    pub fn new(method: HttpVerb, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpVerb::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpVerb::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpVerb::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpVerb::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpVerb::Delete, path)
    }
}

/// Where a parameter's raw value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamSource {
    Query,
    Path,
    Body,
    Header,
    /// The request context itself.
    Context,
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Path => write!(f, "path"),
            Self::Body => write!(f, "body"),
            Self::Header => write!(f, "header"),
            Self::Context => write!(f, "context"),
        }
    }
}

impl FromStr for ParamSource {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Self::Query),
            "path" => Ok(Self::Path),
            "body" => Ok(Self::Body),
            "header" => Ok(Self::Header),
            "context" => Ok(Self::Context),
            other => Err(ConfigurationError::UnknownSource(other.to_string())),
        }
    }
}

/// Declared type of a parameter.
///
/// Anything but `String` makes textual raw values go through JSON
/// deserialization; `Object` additionally runs the attached validator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl SchemaType {
    /// Parse a schema `type` tag for the named parameter.
    pub fn parse(tag: &str, param: &str) -> Result<Self, ConfigurationError> {
        match tag {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "integer" => Ok(Self::Integer),
            "boolean" => Ok(Self::Boolean),
            "array" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            _ => Err(ConfigurationError::UnknownSchemaType {
                param: param.to_string(),
                tag: tag.to_string(),
            }),
        }
    }

    pub fn is_structured(&self) -> bool {
        *self != SchemaType::String
    }
}

/// Declarative description of one handler argument.
#[derive(Clone)]
pub struct ParamMetadata {
    pub source: ParamSource,
    pub name: String,
    pub required: bool,
    pub schema: SchemaType,
    pub validator: Option<Arc<dyn Validator>>,
}

impl ParamMetadata {
    pub fn new(source: ParamSource, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
            required: false,
            schema: SchemaType::String,
            validator: None,
        }
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(ParamSource::Query, name)
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self::new(ParamSource::Path, name)
    }

    pub fn body(name: impl Into<String>) -> Self {
        Self::new(ParamSource::Body, name)
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::new(ParamSource::Header, name)
    }

    /// Yields the request context; name, schema and validator are ignored.
    pub fn context() -> Self {
        Self::new(ParamSource::Context, "")
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn schema(mut self, schema: SchemaType) -> Self {
        self.schema = schema;
        self
    }

    /// Declare an object schema checked by `validator`.
    pub fn validated(mut self, validator: impl Validator) -> Self {
        self.schema = SchemaType::Object;
        self.validator = Some(Arc::new(validator));
        self
    }
}

impl fmt::Debug for ParamMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamMetadata")
            .field("source", &self.source)
            .field("name", &self.name)
            .field("required", &self.required)
            .field("schema", &self.schema)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}
