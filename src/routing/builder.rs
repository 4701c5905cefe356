//! Route construction for a single handler.
//!
//! # Responsibilities
//! - Look up the handler's route metadata (none → not a route)
//! - Normalize the mount path under the controller prefix
//! - Compose parameter resolution and outcome translation into one action
//!
//! # Design Decisions
//! - Middleware lists start empty; the assembler fills them
//! - Parameter metadata is checked here, so a bad declaration fails at startup

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::controller::{Controller, HandlerTable, Invoker};
use crate::dispatch::context::Exchange;
use crate::dispatch::error::DispatchError;
use crate::dispatch::resolver::{ParamResolver, ResolveOptions};
use crate::dispatch::translator;
use crate::metadata::{ConfigurationError, HttpVerb, MetadataRegistry};
use crate::routing::middleware::{Flow, Middleware};

/// Resolve parameters, invoke the handler, translate the outcome.
pub struct RouteAction {
    handler: String,
    resolver: ParamResolver,
    invoker: Invoker,
}

impl RouteAction {
    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn resolver(&self) -> &ParamResolver {
        &self.resolver
    }
}

impl Middleware for RouteAction {
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a, Result<Flow, DispatchError>> {
        Box::pin(async move {
            translator::invoke(exchange, &self.resolver, &self.invoker).await?;
            Ok(Flow::Next)
        })
    }
}

impl fmt::Debug for RouteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteAction")
            .field("handler", &self.handler)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

/// Route-level middleware, run before and after the action.
#[derive(Clone, Default)]
pub struct RouteMiddleware {
    pub before: Vec<Arc<dyn Middleware>>,
    pub after: Vec<Arc<dyn Middleware>>,
}

/// Assembled routable entry.
pub struct RouteUnit {
    pub method: HttpVerb,
    /// Mount path relative to the controller prefix; `""` is the prefix root.
    pub path: String,
    pub action: Arc<RouteAction>,
    pub middleware: RouteMiddleware,
}

impl fmt::Debug for RouteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteUnit")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("action", &self.action)
            .field("before", &self.middleware.before.len())
            .field("after", &self.middleware.after.len())
            .finish()
    }
}

/// Builds [`RouteUnit`]s for handlers of controller `C`.
pub struct RouteBuilder<'a, C> {
    registry: &'a MetadataRegistry,
    table: &'a HandlerTable<C>,
    options: ResolveOptions,
}

impl<'a, C: Controller> RouteBuilder<'a, C> {
    pub fn new(registry: &'a MetadataRegistry, table: &'a HandlerTable<C>, options: ResolveOptions) -> Self {
        Self {
            registry,
            table,
            options,
        }
    }

    /// `Ok(None)` when `handler` has no route metadata or is not in the table.
    pub fn build(&self, controller: &Arc<C>, handler: &str) -> Result<Option<RouteUnit>, ConfigurationError> {
        let Some(route) = self.registry.route_metadata::<C>(handler) else {
            return Ok(None);
        };
        let Some(invoker) = self.table.bind(handler, controller) else {
            return Ok(None);
        };

        let params = self.registry.param_metadata::<C>(handler).to_vec();
        let resolver = ParamResolver::new(handler, params, self.options)?;

        Ok(Some(RouteUnit {
            method: route.method,
            path: mount_path(&route.path),
            action: Arc::new(RouteAction {
                handler: handler.to_string(),
                resolver,
                invoker,
            }),
            middleware: RouteMiddleware::default(),
        }))
    }
}

/// Join `path` under `/`, resolving `.`/`..` and duplicate slashes.
/// An empty path stays empty so it maps onto the prefix itself.
pub fn mount_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    let mut joined = format!("/{}", segments.join("/"));
    if path.ends_with('/') && joined != "/" {
        joined.push('/');
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::reply::{HandlerError, Reply};
    use crate::metadata::{ParamMetadata, RouteMetadata, SchemaType};

    struct Users;

    impl Users {
        async fn get_user(&self, id: u64) -> Result<Reply, HandlerError> {
            Ok(Reply::from(format!("user {}", id)))
        }
    }

    impl Controller for Users {
        fn handlers(table: &mut HandlerTable<Self>) {
            table
                .handler("get_user", |this, args| async move {
                    let id = args.get::<u64>(0)?;
                    this.get_user(id).await
                })
                .handler("helper", |_this, _args| async move { Ok::<_, HandlerError>(Reply::empty()) });
        }
    }

    fn registry() -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        registry
            .controller::<Users>("/prefix")
            .route("get_user", RouteMetadata::get("users/:id"))
            .param("get_user", ParamMetadata::path("id").required().schema(SchemaType::Number));
        registry
    }

    #[test]
    fn test_mount_path() {
        assert_eq!(mount_path(""), "");
        assert_eq!(mount_path("/"), "/");
        assert_eq!(mount_path("users/:id"), "/users/:id");
        assert_eq!(mount_path("//a/./b/../c"), "/a/c");
        assert_eq!(mount_path("list/"), "/list/");
    }

    #[test]
    fn test_build_route_unit() {
        let registry = registry();
        let table = HandlerTable::<Users>::of_controller();
        let builder = RouteBuilder::new(&registry, &table, ResolveOptions::default());
        let controller = Arc::new(Users);

        let unit = builder.build(&controller, "get_user").unwrap().unwrap();
        assert_eq!(unit.method, HttpVerb::Get);
        assert_eq!(unit.method.as_str(), "get");
        assert_eq!(unit.path, "/users/:id");
        assert_eq!(unit.action.handler(), "get_user");
        assert_eq!(unit.action.resolver().params().len(), 1);
        assert!(unit.middleware.before.is_empty());
        assert!(unit.middleware.after.is_empty());
    }

    #[test]
    fn test_handler_without_route_is_skipped() {
        let registry = registry();
        let table = HandlerTable::<Users>::of_controller();
        let builder = RouteBuilder::new(&registry, &table, ResolveOptions::default());
        assert!(builder.build(&Arc::new(Users), "helper").unwrap().is_none());
    }

    #[test]
    fn test_object_param_without_validator_fails_build() {
        let mut registry = registry();
        registry
            .controller::<Users>("/prefix")
            .route("helper", RouteMetadata::post("/helper"))
            .param("helper", ParamMetadata::body("payload").schema(SchemaType::Object));
        let table = HandlerTable::<Users>::of_controller();
        let builder = RouteBuilder::new(&registry, &table, ResolveOptions::default());
        let err = builder.build(&Arc::new(Users), "helper").unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingValidator { .. }));
    }
}
