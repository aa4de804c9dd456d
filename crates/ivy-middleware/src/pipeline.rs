//! Sequential middleware chain execution.
//!
//! A [`PipelineRunner`] drives a resolved chain against the route context.
//! The default [`Pipeline`] runs it in declared order and fails fast: the
//! first middleware to return an error (or to stop without continuing)
//! decides the outcome.

use std::sync::atomic::{AtomicUsize, Ordering};

use ivy_core::RouteContext;

use crate::error::MiddlewareError;
use crate::middleware::{BoxFuture, BoxedMiddleware, Next};

/// Runs a middleware chain.
pub trait PipelineRunner: Send + Sync + 'static {
    /// Runs `chain` against `ctx`.
    ///
    /// Resolves to `Ok(())` only if every middleware continued the chain.
    fn run<'a>(
        &'a self,
        ctx: &'a mut RouteContext<'_>,
        chain: &'a [BoxedMiddleware],
    ) -> BoxFuture<'a, Result<(), MiddlewareError>>;
}

/// The default sequential [`PipelineRunner`].
///
/// # Example
///
/// ```ignore
/// use ivy_middleware::{Pipeline, PipelineRunner};
///
/// let pipeline = Pipeline::new();
/// pipeline.run(&mut ctx, &chain).await?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Pipeline;

impl Pipeline {
    /// Creates a pipeline.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PipelineRunner for Pipeline {
    fn run<'a>(
        &'a self,
        ctx: &'a mut RouteContext<'_>,
        chain: &'a [BoxedMiddleware],
    ) -> BoxFuture<'a, Result<(), MiddlewareError>> {
        Box::pin(async move {
            let progress = AtomicUsize::new(0);
            let outcome = Next::new(chain, &progress).run(ctx).await;

            if let Err(err) = outcome {
                tracing::debug!(error = %err, "Middleware chain aborted");
                return Err(err);
            }

            let reached = progress.load(Ordering::Acquire);
            match chain.get(reached) {
                Some(stopped) => Err(MiddlewareError::halted(stopped.name())),
                None => Ok(()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FnMiddleware, Middleware};
    use ivy_core::{
        fixtures, BufferedResponse, Handler, MatchedRoute, Params, Query, RouteEntry,
        RouteOptions,
    };
    use std::sync::Arc;

    fn context(response: &mut BufferedResponse) -> RouteContext<'_> {
        let entry = Arc::new(RouteEntry::new(
            "GET",
            "/",
            Handler::sync(|_, _| ()),
            RouteOptions::new(),
        ));
        RouteContext::new(
            MatchedRoute::new(entry, Params::new()),
            Query::new(),
            fixtures::request("GET", "/"),
            response,
        )
    }

    struct Stop;

    impl Middleware for Stop {
        fn name(&self) -> &str {
            "stop"
        }

        fn handle<'a>(
            &'a self,
            _ctx: &'a mut RouteContext<'_>,
            _next: Next<'a>,
        ) -> BoxFuture<'a, Result<(), MiddlewareError>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn test_pipeline_executes_all() {
        let chain: Vec<BoxedMiddleware> = vec![
            Arc::new(FnMiddleware::new("one", |ctx| {
                ctx.params_mut().insert("one", "1");
                Ok(())
            })),
            Arc::new(FnMiddleware::new("two", |ctx| {
                let one = ctx.params().get("one").unwrap_or_default().to_string();
                ctx.params_mut().insert("two", format!("{one}2"));
                Ok(())
            })),
        ];
        let mut response = BufferedResponse::new();
        let mut ctx = context(&mut response);

        Pipeline::new().run(&mut ctx, &chain).await.unwrap();
        assert_eq!(ctx.params().get("two"), Some("12"));
    }

    #[tokio::test]
    async fn test_empty_pipeline() {
        let mut response = BufferedResponse::new();
        let mut ctx = context(&mut response);
        assert!(Pipeline::new().run(&mut ctx, &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_pipeline_reports_halt() {
        let chain: Vec<BoxedMiddleware> = vec![
            Arc::new(FnMiddleware::new("first", |_| Ok(()))),
            Arc::new(Stop),
            Arc::new(FnMiddleware::new("last", |_| Ok(()))),
        ];
        let mut response = BufferedResponse::new();
        let mut ctx = context(&mut response);

        let err = Pipeline::new().run(&mut ctx, &chain).await.unwrap_err();
        assert_eq!(err, MiddlewareError::halted("stop"));
    }

    #[tokio::test]
    async fn test_pipeline_fails_fast() {
        let chain: Vec<BoxedMiddleware> = vec![
            Arc::new(FnMiddleware::new("deny", |_| Err("Cant go through!".into()))),
            Arc::new(FnMiddleware::new("after", |ctx| {
                ctx.params_mut().insert("after", "ran");
                Ok(())
            })),
        ];
        let mut response = BufferedResponse::new();
        let mut ctx = context(&mut response);

        let err = Pipeline::new().run(&mut ctx, &chain).await.unwrap_err();
        assert_eq!(err.to_string(), "Cant go through!");
        assert_eq!(ctx.params().get("after"), None);
    }
}
