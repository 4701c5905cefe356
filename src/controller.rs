//! Controllers and their handler tables.
//!
//! A controller groups handlers under one path prefix. Its metadata lives in
//! the [`MetadataRegistry`](crate::metadata::MetadataRegistry); the controller
//! itself only lists its handlers, in declaration order.
//!
//! # Concurrency
//! One controller instance is shared (behind an `Arc`) by every request routed
//! to it, without any synchronization added by the router. Controllers must be
//! stateless or guard their own state.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::dispatch::reply::{HandlerError, Reply};
use crate::dispatch::resolver::Arguments;

/// Future returned by a handler invocation.
pub type HandlerFuture = BoxFuture<'static, Result<Reply, HandlerError>>;

/// Unbound handler: takes the controller instance and the resolved arguments.
pub type HandlerFn<C> = Arc<dyn Fn(Arc<C>, Arguments) -> HandlerFuture + Send + Sync>;

/// Handler bound to one controller instance.
pub type Invoker = Arc<dyn Fn(Arguments) -> HandlerFuture + Send + Sync>;

/// An object exposing named request handlers.
pub trait Controller: Send + Sync + Sized + 'static {
    /// Register the handlers this controller declares, in declaration order.
    fn handlers(table: &mut HandlerTable<Self>);
}

/// Ordered handler list of one controller type.
pub struct HandlerTable<C> {
    handlers: Vec<(&'static str, HandlerFn<C>)>,
}

impl<C: Controller> HandlerTable<C> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Table filled by `C::handlers`.
    pub fn of_controller() -> Self {
        let mut table = Self::new();
        C::handlers(&mut table);
        table
    }

    /// Register `name`; re-registering a name replaces it in place.
    pub fn handler<F, Fut>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        F: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, HandlerError>> + Send + 'static,
    {
        let handler: HandlerFn<C> =
            Arc::new(move |controller: Arc<C>, args: Arguments| -> HandlerFuture { Box::pin(f(controller, args)) });
        match self.handlers.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = handler,
            None => self.handlers.push((name, handler)),
        }
        self
    }

    /// Handler names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Bind `name` to `controller`.
    pub fn bind(&self, name: &str, controller: &Arc<C>) -> Option<Invoker> {
        let handler = self
            .handlers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, h)| h.clone())?;
        let controller = controller.clone();
        Some(Arc::new(move |args: Arguments| handler(controller.clone(), args)))
    }
}

impl<C: Controller> Default for HandlerTable<C> {
    fn default() -> Self {
        Self::new()
    }
}
