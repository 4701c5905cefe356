//! Router assembly for a controller instance.

use std::any::type_name;
use std::sync::Arc;

use crate::config::DispatchConfig;
use crate::controller::{Controller, HandlerTable};
use crate::dispatch::resolver::ResolveOptions;
use crate::metadata::{ConfigurationError, MetadataRegistry};
use crate::routing::builder::{RouteBuilder, RouteUnit};
use crate::routing::middleware::Middleware;
use crate::routing::router::{ControllerRouter, LayerKind, DEFAULT_BODY_LIMIT};

/// Options applied to every router the assembler produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerOptions {
    pub resolve: ResolveOptions,
    pub body_limit: usize,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self {
            resolve: ResolveOptions::default(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl From<&DispatchConfig> for AssemblerOptions {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            resolve: ResolveOptions {
                malformed_argument_status: config.malformed_status(),
            },
            body_limit: config.body_limit_bytes,
        }
    }
}

/// Turns controller instances into routers using declared metadata.
pub struct RouterAssembler {
    registry: Arc<MetadataRegistry>,
    options: AssemblerOptions,
}

impl RouterAssembler {
    pub fn new(registry: Arc<MetadataRegistry>) -> Self {
        Self {
            registry,
            options: AssemblerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AssemblerOptions) -> Self {
        self.options = options;
        self
    }

    /// Assemble the router of `controller`.
    ///
    /// Entries are registered as: controller before middlewares, then per
    /// route (in handler declaration order) its before middlewares, its
    /// action and its after middlewares, then controller after middlewares.
    /// The controller instance is shared by all concurrent requests.
    pub fn assemble<C: Controller>(&self, controller: Arc<C>) -> Result<ControllerRouter, ConfigurationError> {
        let registry = self.registry.as_ref();
        let metadata = registry
            .controller_metadata::<C>()
            .ok_or(ConfigurationError::UndeclaredController(type_name::<C>()))?;

        let mut router = ControllerRouter::new(&metadata.base_path).with_body_limit(self.options.body_limit);

        for middleware in registry.before_middlewares::<C>(None) {
            router.use_middleware(LayerKind::ControllerBefore, middleware.clone());
        }

        let table = HandlerTable::<C>::of_controller();
        let builder = RouteBuilder::new(registry, &table, self.options.resolve);
        let mut units: Vec<RouteUnit> = Vec::new();
        for name in table.names() {
            match builder.build(&controller, name)? {
                Some(mut unit) => {
                    unit.middleware
                        .before
                        .extend(registry.before_middlewares::<C>(Some(name)).iter().cloned());
                    unit.middleware
                        .after
                        .extend(registry.after_middlewares::<C>(Some(name)).iter().cloned());
                    units.push(unit);
                }
                None => tracing::trace!(handler = name, "No route metadata, skipping"),
            }
        }

        let route_count = units.len();
        for unit in units {
            for middleware in unit.middleware.before {
                router.register(unit.method, &unit.path, LayerKind::Before, middleware);
            }
            let action: Arc<dyn Middleware> = unit.action;
            router.register(unit.method, &unit.path, LayerKind::Action, action);
            for middleware in unit.middleware.after {
                router.register(unit.method, &unit.path, LayerKind::After, middleware);
            }
        }

        for middleware in registry.after_middlewares::<C>(None) {
            router.use_middleware(LayerKind::ControllerAfter, middleware.clone());
        }

        tracing::info!(
            controller = type_name::<C>(),
            prefix = %router.prefix(),
            routes = route_count,
            "Assembled controller router"
        );
        Ok(router)
    }
}
