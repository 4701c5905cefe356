//! Declarative controller metadata loaded from TOML.
//!
//! ```toml
//! base_path = "/users"
//!
//! [[route]]
//! handler = "get_user"
//! method = "GET"
//! path = "/:id"
//!
//! [[route.param]]
//! source = "path"
//! name = "id"
//! required = true
//! schema = { type = "number" }
//! ```
//!
//! Tags are kept as strings while deserializing and parsed by
//! [`ControllerManifest::declare`], so an unknown source, method or schema type
//! is reported as a [`ConfigurationError`] before anything is registered.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::metadata::error::ConfigurationError;
use crate::metadata::model::{HttpVerb, ParamMetadata, ParamSource, RouteMetadata, SchemaType};
use crate::metadata::registry::MetadataRegistry;
use crate::metadata::validator::JsonSchemaValidator;

#[derive(Debug, Clone, Deserialize)]
pub struct ControllerManifest {
    #[serde(default)]
    pub base_path: String,

    #[serde(default, rename = "route")]
    pub routes: Vec<RouteManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteManifest {
    pub handler: String,
    pub method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, rename = "param")]
    pub params: Vec<ParamManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParamManifest {
    pub source: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub required: bool,
    /// JSON-Schema-shaped table; only `type` is interpreted here.
    #[serde(default)]
    pub schema: Option<Value>,
}

impl ControllerManifest {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigurationError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Register this manifest as the metadata of controller `C`.
    ///
    /// Every tag is checked first; the registry is untouched on error.
    pub fn declare<C: 'static>(&self, registry: &mut MetadataRegistry) -> Result<(), ConfigurationError> {
        let mut routes = Vec::with_capacity(self.routes.len());
        for route in &self.routes {
            let method: HttpVerb = route.method.parse()?;
            let params = route
                .params
                .iter()
                .map(ParamManifest::to_metadata)
                .collect::<Result<Vec<_>, _>>()?;
            routes.push((route.handler.as_str(), RouteMetadata::new(method, route.path.clone()), params));
        }

        let mut declaration = registry.controller::<C>(self.base_path.clone());
        for (handler, route, params) in routes {
            declaration = declaration.route(handler, route);
            for param in params {
                declaration = declaration.param(handler, param);
            }
        }
        Ok(())
    }
}

impl ParamManifest {
    fn to_metadata(&self) -> Result<ParamMetadata, ConfigurationError> {
        let source: ParamSource = self.source.parse()?;
        let mut param = ParamMetadata::new(source, self.name.clone());
        param.required = self.required;

        let Some(schema) = &self.schema else {
            return Ok(param);
        };
        let tag = schema
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("<missing>");
        param.schema = SchemaType::parse(tag, &self.name)?;

        if param.schema == SchemaType::Object {
            let validator = JsonSchemaValidator::compile(schema).map_err(|reason| {
                ConfigurationError::InvalidSchema {
                    param: self.name.clone(),
                    reason,
                }
            })?;
            param = param.validated(validator);
        }
        Ok(param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Users;

    const MANIFEST: &str = r#"
base_path = "/users"

[[route]]
handler = "get_user"
method = "GET"
path = "/:id"

[[route.param]]
source = "path"
name = "id"
required = true
schema = { type = "number" }

[[route]]
handler = "search"
method = "post"
path = "/search"

[[route.param]]
source = "query"
name = "filter"
schema = { type = "object", required = ["a"] }

[[route.param]]
source = "context"
"#;

    #[test]
    fn test_declare_from_manifest() {
        let manifest = ControllerManifest::from_toml_str(MANIFEST).unwrap();
        let mut registry = MetadataRegistry::new();
        manifest.declare::<Users>(&mut registry).unwrap();

        assert_eq!(registry.controller_metadata::<Users>().unwrap().base_path, "/users");
        let route = registry.route_metadata::<Users>("search").unwrap();
        assert_eq!(route.method, HttpVerb::Post);

        let params = registry.param_metadata::<Users>("get_user");
        assert_eq!(params[0].schema, SchemaType::Number);
        assert!(params[0].required);

        let params = registry.param_metadata::<Users>("search");
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].schema, SchemaType::Object);
        assert!(params[0].validator.is_some());
        assert_eq!(params[1].source, ParamSource::Context);
    }

    #[test]
    fn test_unknown_source_rejected_before_registration() {
        let manifest = ControllerManifest::from_toml_str(
            r#"
[[route]]
handler = "h"
method = "GET"

[[route.param]]
source = "cookie"
name = "session"
"#,
        )
        .unwrap();
        let mut registry = MetadataRegistry::new();
        let err = manifest.declare::<Users>(&mut registry).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownSource(s) if s == "cookie"));
        assert!(registry.controller_metadata::<Users>().is_none());
    }

    #[test]
    fn test_unknown_schema_type_rejected() {
        let manifest = ControllerManifest::from_toml_str(
            r#"
[[route]]
handler = "h"
method = "GET"

[[route.param]]
source = "query"
name = "q"
schema = { type = "float" }
"#,
        )
        .unwrap();
        let err = manifest.declare::<Users>(&mut MetadataRegistry::new()).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownSchemaType { .. }));
    }

    #[test]
    fn test_load_reports_read_and_parse_failures() {
        let err = ControllerManifest::load(Path::new("/nonexistent/users.toml")).unwrap_err();
        assert!(matches!(err, ConfigurationError::Io(e) if e.kind() == std::io::ErrorKind::NotFound));

        let path = std::env::temp_dir().join(format!("manifest-{}.toml", std::process::id()));
        std::fs::write(&path, "[[route]\nhandler = ").unwrap();
        let err = ControllerManifest::load(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ConfigurationError::Manifest(_)));
    }
}
