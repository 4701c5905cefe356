//! Composed controller router.
//!
//! # Responsibilities
//! - Keep every registered entry in registration order, scoped to a
//!   method+path or global to the controller
//! - Run the entries matching a route as one chain
//! - Mount the result into an axum router under the controller prefix
//!
//! # Design Decisions
//! - Immutable once mounted (shared behind `Arc`, no locking)
//! - One axum route per distinct method+path; the chain inside it preserves
//!   registration order
//! - `:name` / `*name` segments are mounted under positional names (`{p1}`,
//!   `{*p2}`) so `/:id` and `/:itemId` share one axum route; each chain maps
//!   the captures back to its own declared names
//! - A route and its trailing-slash twin both match, unless the twin is
//!   declared separately
//! - Mount conflicts are reported as `ConfigurationError`, never a panic

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
    routing::MethodRouter,
};

use crate::dispatch::context::{Exchange, RequestContext};
use crate::dispatch::error::DispatchError;
use crate::metadata::{ConfigurationError, HttpVerb};
use crate::observability::metrics;
use crate::routing::middleware::{Flow, Middleware};

/// Default cap on buffered request bodies (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Role of a registered entry, kept for introspection and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Controller-level middleware registered before the routes.
    ControllerBefore,
    /// Route-level middleware registered before the action.
    Before,
    Action,
    /// Route-level middleware registered after the action.
    After,
    /// Controller-level middleware registered after the routes.
    ControllerAfter,
}

struct Layer {
    /// `None` for controller-level entries.
    scope: Option<(HttpVerb, String)>,
    kind: LayerKind,
    handler: Arc<dyn Middleware>,
}

impl Layer {
    fn matches(&self, method: HttpVerb, path: &str) -> bool {
        match &self.scope {
            None => true,
            Some((m, p)) => *m == method && p == path,
        }
    }
}

/// Router scoped under one controller prefix.
pub struct ControllerRouter {
    prefix: String,
    layers: Vec<Layer>,
    body_limit: usize,
}

impl std::fmt::Debug for ControllerRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerRouter")
            .field("prefix", &self.prefix)
            .field("layers", &self.layers.len())
            .field("body_limit", &self.body_limit)
            .finish()
    }
}

impl ControllerRouter {
    pub fn new(prefix: &str) -> Self {
        let trimmed = prefix.trim_end_matches('/');
        let prefix = if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };
        Self {
            prefix,
            layers: Vec::new(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register a controller-level entry that applies to every route.
    pub fn use_middleware(&mut self, kind: LayerKind, handler: Arc<dyn Middleware>) {
        self.layers.push(Layer {
            scope: None,
            kind,
            handler,
        });
    }

    /// Register an entry bound to `method` + `path`.
    pub fn register(&mut self, method: HttpVerb, path: &str, kind: LayerKind, handler: Arc<dyn Middleware>) {
        tracing::debug!(
            method = %method,
            path = %self.full_path(path),
            kind = ?kind,
            "Registered route entry"
        );
        self.layers.push(Layer {
            scope: Some((method, path.to_string())),
            kind,
            handler,
        });
    }

    /// Distinct method+path pairs in first-registration order.
    pub fn routes(&self) -> Vec<(HttpVerb, String)> {
        let mut routes: Vec<(HttpVerb, String)> = Vec::new();
        for layer in &self.layers {
            if let Some((method, path)) = &layer.scope {
                if !routes.iter().any(|(m, p)| m == method && p == path) {
                    routes.push((*method, path.clone()));
                }
            }
        }
        routes
    }

    /// Entries registered at exactly `method` + `path`, in order.
    pub fn entries_at(&self, method: HttpVerb, path: &str) -> Vec<LayerKind> {
        self.layers
            .iter()
            .filter(|l| l.scope.is_some() && l.matches(method, path))
            .map(|l| l.kind)
            .collect()
    }

    /// Every entry a request to `method` + `path` runs through, in order.
    pub fn chain(&self, method: HttpVerb, path: &str) -> Vec<LayerKind> {
        self.layers
            .iter()
            .filter(|l| l.matches(method, path))
            .map(|l| l.kind)
            .collect()
    }

    /// Absolute path of a route, still in `:name` syntax. The route `/` under
    /// a prefix is the prefix itself.
    pub fn full_path(&self, path: &str) -> String {
        if !self.prefix.is_empty() && path == "/" {
            return self.prefix.clone();
        }
        let full = format!("{}{}", self.prefix, path);
        if full.is_empty() {
            "/".to_string()
        } else {
            full
        }
    }

    fn route_chain(&self, method: HttpVerb, path: &str, params: Vec<(String, String)>) -> RouteChain {
        RouteChain {
            method,
            path: self.full_path(path),
            params,
            entries: self
                .layers
                .iter()
                .filter(|l| l.matches(method, path))
                .map(|l| l.handler.clone())
                .collect(),
            body_limit: self.body_limit,
        }
    }

    /// Mount every route into an axum router.
    ///
    /// Fails when two routes claim the same method on the same path shape, or
    /// when a path cannot be expressed as an axum route.
    pub fn into_axum(self) -> Result<axum::Router, ConfigurationError> {
        let mut mounts: Vec<Mount> = Vec::new();
        for (method, path) in self.routes() {
            let declared = self.full_path(&path);
            let pattern = MountPattern::parse(&declared)?;
            let axum_path = pattern.axum_path();
            let params = pattern.param_names();

            let index = match mounts.iter().position(|m| m.path == axum_path) {
                Some(index) => index,
                None => {
                    if let Some(other) = mounts.iter().find(|m| m.pattern.wildcard_clash(&pattern)) {
                        return Err(ConfigurationError::RouteConflict {
                            path: declared,
                            existing: other.declared.clone(),
                        });
                    }
                    mounts.push(Mount {
                        path: axum_path,
                        declared: declared.clone(),
                        pattern,
                        methods: Vec::new(),
                        router: MethodRouter::new(),
                    });
                    mounts.len() - 1
                }
            };

            let mount = &mut mounts[index];
            if let Some((_, existing)) = mount.methods.iter().find(|(m, _)| *m == method) {
                let verb = method.as_str().to_uppercase();
                return Err(ConfigurationError::RouteConflict {
                    path: format!("{} {}", verb, declared),
                    existing: format!("{} {}", verb, existing),
                });
            }
            mount.methods.push((method, declared));

            let chain = Arc::new(self.route_chain(method, &path, params));
            let handler = move |request: Request| {
                let chain = chain.clone();
                async move { chain.dispatch(request).await }
            };
            let existing = std::mem::take(&mut mount.router);
            mount.router = existing.on(method.method_filter(), handler);
        }

        let mut router = axum::Router::new();
        for mount in &mounts {
            let twin = mount.pattern.trailing_slash_twin().filter(|twin| {
                let path = twin.axum_path();
                !mounts.iter().any(|m| m.path == path || m.pattern.wildcard_clash(twin))
            });
            if let Some(twin) = twin {
                router = router.route(&twin.axum_path(), mount.router.clone());
            }
            router = router.route(&mount.path, mount.router.clone());
        }
        Ok(router)
    }
}

/// Routes sharing one axum path.
struct Mount {
    path: String,
    /// First declared path mounted here, for conflict reports.
    declared: String,
    pattern: MountPattern,
    methods: Vec<(HttpVerb, String)>,
    router: MethodRouter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

/// A declared path split into segments.
#[derive(Debug, Clone)]
struct MountPattern {
    segments: Vec<Segment>,
}

impl MountPattern {
    fn parse(path: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidRoutePath {
            path: path.to_string(),
            reason: reason.to_string(),
        };
        let Some(rest) = path.strip_prefix('/') else {
            return Err(invalid("must start with '/'"));
        };

        let raw: Vec<&str> = rest.split('/').collect();
        let mut segments = Vec::with_capacity(raw.len());
        for (i, text) in raw.iter().enumerate() {
            let segment = if let Some(name) = text.strip_prefix(':') {
                Segment::Param(name.to_string())
            } else if let Some(name) = text.strip_prefix('*') {
                if i + 1 != raw.len() {
                    return Err(invalid("wildcard must be the last segment"));
                }
                Segment::CatchAll(name.to_string())
            } else {
                Segment::Literal(text.to_string())
            };
            if matches!(&segment, Segment::Param(name) | Segment::CatchAll(name) if name.is_empty()) {
                return Err(invalid("parameter without a name"));
            }
            segments.push(segment);
        }
        Ok(Self { segments })
    }

    /// axum path with positional parameter names.
    fn axum_path(&self) -> String {
        let mut path = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            path.push('/');
            match segment {
                Segment::Literal(text) => path.push_str(&text.replace('{', "{{").replace('}', "}}")),
                Segment::Param(_) => path.push_str(&format!("{{p{}}}", i)),
                Segment::CatchAll(_) => path.push_str(&format!("{{*p{}}}", i)),
            }
        }
        path
    }

    /// `(mounted, declared)` name pairs.
    fn param_names(&self) -> Vec<(String, String)> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(i, segment)| match segment {
                Segment::Param(name) | Segment::CatchAll(name) => Some((format!("p{}", i), name.clone())),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// The same path with the trailing slash toggled; `None` for `/` and wildcard tails.
    fn trailing_slash_twin(&self) -> Option<MountPattern> {
        let mut segments = self.segments.clone();
        match segments.last()? {
            Segment::CatchAll(_) => return None,
            Segment::Literal(text) if text.is_empty() => {
                if segments.len() == 1 {
                    return None;
                }
                segments.pop();
            }
            _ => segments.push(Segment::Literal(String::new())),
        }
        Some(MountPattern { segments })
    }

    /// A parameter and a wildcard at the same position behind an equal prefix.
    fn wildcard_clash(&self, other: &MountPattern) -> bool {
        for (a, b) in self.segments.iter().zip(&other.segments) {
            match (a, b) {
                (Segment::Param(_), Segment::CatchAll(_)) | (Segment::CatchAll(_), Segment::Param(_)) => return true,
                (Segment::Param(_), Segment::Param(_)) => {}
                (Segment::Literal(x), Segment::Literal(y)) if x == y => {}
                _ => return false,
            }
        }
        false
    }
}

/// Entries run for one method+path.
struct RouteChain {
    method: HttpVerb,
    path: String,
    /// Mounted capture name → declared parameter name.
    params: Vec<(String, String)>,
    entries: Vec<Arc<dyn Middleware>>,
    body_limit: usize,
}

impl RouteChain {
    async fn dispatch(&self, request: Request) -> Response {
        let start = Instant::now();
        let response = match self.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                if e.is_classified() {
                    tracing::debug!(
                        method = %self.method,
                        route = %self.path,
                        status = e.status().as_u16(),
                        error = %e,
                        "Request rejected"
                    );
                }
                e.into_response()
            }
        };
        metrics::record_dispatch(self.method.as_str(), &self.path, response.status().as_u16(), start);
        response
    }

    async fn execute(&self, request: Request) -> Result<Response, DispatchError> {
        let mut ctx = RequestContext::from_request(request, self.body_limit).await?;
        ctx.rename_path_params(&self.params);
        let mut exchange = Exchange::new(ctx);
        for entry in &self.entries {
            if entry.handle(&mut exchange).await? == Flow::Halt {
                break;
            }
        }
        Ok(exchange.response.into_response())
    }
}
