//! Middleware run around route actions.
//!
//! A chain entry inspects or mutates the [`Exchange`] and decides whether the
//! rest of the chain runs. Returning an error aborts the chain and renders the
//! error instead.

use futures_util::future::BoxFuture;

use crate::dispatch::context::Exchange;
use crate::dispatch::error::DispatchError;

/// Whether the chain continues after an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Next,
    /// Stop here; the response state is rendered as it is.
    Halt,
}

/// One entry of a route chain.
pub trait Middleware: Send + Sync + 'static {
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a, Result<Flow, DispatchError>>;
}

/// Middleware built from a synchronous closure.
pub struct FromFn<F> {
    f: F,
}

/// Wrap a synchronous closure as a [`Middleware`].
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&mut Exchange) -> Result<Flow, DispatchError> + Send + Sync + 'static,
{
    FromFn { f }
}

impl<F> Middleware for FromFn<F>
where
    F: Fn(&mut Exchange) -> Result<Flow, DispatchError> + Send + Sync + 'static,
{
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a, Result<Flow, DispatchError>> {
        Box::pin(std::future::ready((self.f)(exchange)))
    }
}
