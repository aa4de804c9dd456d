//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that every named middleware
//! implements. Middleware runs after a route matched and before its handler
//! is dispatched; it may rewrite the context (parameters, query, response
//! headers) or abort the chain.
//!
//! # Example
//!
//! ```
//! use ivy_core::RouteContext;
//! use ivy_middleware::{BoxFuture, Middleware, MiddlewareError, Next};
//!
//! struct RequireQuery;
//!
//! impl Middleware for RequireQuery {
//!     fn name(&self) -> &str {
//!         "require-query"
//!     }
//!
//!     fn handle<'a>(
//!         &'a self,
//!         ctx: &'a mut RouteContext<'_>,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Result<(), MiddlewareError>> {
//!         Box::pin(async move {
//!             if ctx.query.is_empty() {
//!                 return Err(MiddlewareError::rejected("query required"));
//!             }
//!             next.run(ctx).await
//!         })
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ivy_core::RouteContext;

use crate::error::MiddlewareError;

pub use ivy_core::BoxFuture;

/// A type-erased middleware that can be stored in a chain.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The core middleware trait.
///
/// Middleware receives the mutable route context and a [`Next`]
/// continuation.
///
/// # Invariants
///
/// - Returning `Err` aborts the remainder of the chain; the handler never runs
/// - Returning `Ok` without calling `next.run()` also stops the chain, and
///   the pipeline reports it as [`MiddlewareError::Halted`]
/// - The chain cannot be resumed once aborted
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name this middleware is registered under.
    fn name(&self) -> &str;

    /// Processes the context and continues (or aborts) the chain.
    fn handle<'a>(
        &'a self,
        ctx: &'a mut RouteContext<'_>,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), MiddlewareError>>;
}

/// Continuation to the rest of the chain.
///
/// Consumed by [`Next::run`], so it can only be invoked once.
pub struct Next<'a> {
    chain: &'a [BoxedMiddleware],
    position: usize,
    progress: &'a AtomicUsize,
}

impl<'a> Next<'a> {
    /// Creates a continuation at the start of `chain`.
    ///
    /// `progress` records the furthest position reached, so the runner can
    /// tell a completed chain from one a middleware stopped.
    pub fn new(chain: &'a [BoxedMiddleware], progress: &'a AtomicUsize) -> Self {
        Self {
            chain,
            position: 0,
            progress,
        }
    }

    /// Invokes the next middleware, or finishes if none remain.
    pub fn run(self, ctx: &'a mut RouteContext<'_>) -> BoxFuture<'a, Result<(), MiddlewareError>> {
        self.progress.fetch_max(self.position, Ordering::AcqRel);

        let Some(middleware) = self.chain.get(self.position) else {
            return Box::pin(std::future::ready(Ok(())));
        };

        tracing::debug!(
            middleware = middleware.name(),
            position = self.position,
            "Running middleware"
        );

        let next = Self {
            chain: self.chain,
            position: self.position + 1,
            progress: self.progress,
        };
        middleware.handle(ctx, next)
    }
}

type SyncFn = dyn Fn(&mut RouteContext<'_>) -> Result<(), MiddlewareError> + Send + Sync;

/// A middleware built from a synchronous function.
///
/// The function inspects or rewrites the context; on `Ok` the chain
/// continues automatically, on `Err` it aborts.
///
/// # Example
///
/// ```
/// use ivy_middleware::FnMiddleware;
///
/// let middleware = FnMiddleware::new("override-id", |ctx| {
///     ctx.params_mut().insert("id", "33");
///     Ok(())
/// });
/// ```
pub struct FnMiddleware {
    name: String,
    func: Box<SyncFn>,
}

impl FnMiddleware {
    /// Creates a new function-based middleware.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut RouteContext<'_>) -> Result<(), MiddlewareError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

impl std::fmt::Debug for FnMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Middleware for FnMiddleware {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RouteContext<'_>,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<(), MiddlewareError>> {
        Box::pin(async move {
            (self.func)(&mut *ctx)?;
            next.run(ctx).await
        })
    }
}
