//! Side table holding controller, route and parameter metadata.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::metadata::model::{ControllerMetadata, ParamMetadata, RouteMetadata};
use crate::routing::middleware::Middleware;

/// Lookup key: controller type plus an optional handler name.
///
/// `handler: None` addresses the controller itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MetadataKey {
    controller: TypeId,
    handler: Option<String>,
}

impl MetadataKey {
    fn of<C: 'static>(handler: Option<&str>) -> Self {
        Self {
            controller: TypeId::of::<C>(),
            handler: handler.map(str::to_string),
        }
    }
}

#[derive(Default)]
struct MetadataEntry {
    controller: Option<ControllerMetadata>,
    route: Option<RouteMetadata>,
    params: Vec<ParamMetadata>,
    before: Vec<Arc<dyn Middleware>>,
    after: Vec<Arc<dyn Middleware>>,
}

/// Metadata side table.
///
/// Populated through [`ControllerDeclaration`] before assembly and only read
/// afterwards; share it behind an `Arc` once declaration is done.
#[derive(Default)]
pub struct MetadataRegistry {
    entries: HashMap<MetadataKey, MetadataEntry>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start declaring controller `C` mounted under `base_path`.
    pub fn controller<C: 'static>(&mut self, base_path: impl Into<String>) -> ControllerDeclaration<'_, C> {
        let metadata = ControllerMetadata::new(base_path);
        tracing::debug!(
            controller = type_name::<C>(),
            base_path = %metadata.base_path,
            "Declared controller"
        );
        self.entry::<C>(None).controller = Some(metadata);
        ControllerDeclaration {
            registry: self,
            _marker: PhantomData,
        }
    }

    fn entry<C: 'static>(&mut self, handler: Option<&str>) -> &mut MetadataEntry {
        self.entries.entry(MetadataKey::of::<C>(handler)).or_default()
    }

    fn get<C: 'static>(&self, handler: Option<&str>) -> Option<&MetadataEntry> {
        self.entries.get(&MetadataKey::of::<C>(handler))
    }

    pub fn controller_metadata<C: 'static>(&self) -> Option<&ControllerMetadata> {
        self.get::<C>(None).and_then(|e| e.controller.as_ref())
    }

    pub fn route_metadata<C: 'static>(&self, handler: &str) -> Option<&RouteMetadata> {
        self.get::<C>(Some(handler)).and_then(|e| e.route.as_ref())
    }

    /// Parameters of `handler` in positional order. Empty when none were declared.
    pub fn param_metadata<C: 'static>(&self, handler: &str) -> &[ParamMetadata] {
        self.get::<C>(Some(handler))
            .map(|e| e.params.as_slice())
            .unwrap_or(&[])
    }

    /// Before middlewares of the controller (`None`) or of one of its routes.
    pub fn before_middlewares<C: 'static>(&self, handler: Option<&str>) -> &[Arc<dyn Middleware>] {
        self.get::<C>(handler)
            .map(|e| e.before.as_slice())
            .unwrap_or(&[])
    }

    /// After middlewares of the controller (`None`) or of one of its routes.
    pub fn after_middlewares<C: 'static>(&self, handler: Option<&str>) -> &[Arc<dyn Middleware>] {
        self.get::<C>(handler)
            .map(|e| e.after.as_slice())
            .unwrap_or(&[])
    }
}

/// Builder writing the metadata of one controller type into the registry.
pub struct ControllerDeclaration<'r, C> {
    registry: &'r mut MetadataRegistry,
    _marker: PhantomData<fn() -> C>,
}

impl<'r, C: 'static> ControllerDeclaration<'r, C> {
    /// Attach route metadata to `handler`, replacing any earlier declaration.
    pub fn route(self, handler: &str, route: RouteMetadata) -> Self {
        tracing::debug!(
            controller = type_name::<C>(),
            handler,
            method = %route.method,
            path = %route.path,
            "Declared route"
        );
        self.registry.entry::<C>(Some(handler)).route = Some(route);
        self
    }

    /// Append the next positional parameter of `handler`.
    pub fn param(self, handler: &str, param: ParamMetadata) -> Self {
        self.registry.entry::<C>(Some(handler)).params.push(param);
        self
    }

    /// Controller-level middleware run before every route of the controller.
    pub fn before(self, middleware: impl Middleware) -> Self {
        self.registry.entry::<C>(None).before.push(Arc::new(middleware));
        self
    }

    /// Controller-level middleware run after every route of the controller.
    pub fn after(self, middleware: impl Middleware) -> Self {
        self.registry.entry::<C>(None).after.push(Arc::new(middleware));
        self
    }

    pub fn route_before(self, handler: &str, middleware: impl Middleware) -> Self {
        self.registry
            .entry::<C>(Some(handler))
            .before
            .push(Arc::new(middleware));
        self
    }

    pub fn route_after(self, handler: &str, middleware: impl Middleware) -> Self {
        self.registry
            .entry::<C>(Some(handler))
            .after
            .push(Arc::new(middleware));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::model::HttpVerb;

    struct Users;
    struct Orders;

    #[test]
    fn test_lookup_by_type_and_handler() {
        let mut registry = MetadataRegistry::new();
        registry
            .controller::<Users>("/users")
            .route("get_user", RouteMetadata::get("/:id"))
            .param("get_user", ParamMetadata::path("id").required())
            .param("get_user", ParamMetadata::context());

        assert_eq!(registry.controller_metadata::<Users>().unwrap().base_path, "/users");
        assert!(registry.controller_metadata::<Orders>().is_none());

        let route = registry.route_metadata::<Users>("get_user").unwrap();
        assert_eq!(route.method, HttpVerb::Get);
        assert!(registry.route_metadata::<Users>("helper").is_none());
        assert!(registry.route_metadata::<Orders>("get_user").is_none());

        let params = registry.param_metadata::<Users>("get_user");
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "id");
        assert!(registry.param_metadata::<Users>("helper").is_empty());
    }

    #[test]
    fn test_middleware_hooks_default_empty() {
        let mut registry = MetadataRegistry::new();
        registry.controller::<Users>("");
        assert!(registry.before_middlewares::<Users>(None).is_empty());
        assert!(registry.after_middlewares::<Users>(None).is_empty());
        assert!(registry.before_middlewares::<Users>(Some("x")).is_empty());
    }
}
