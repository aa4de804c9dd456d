//! # Ivy
//!
//! **An embeddable HTTP routing engine with named middleware**
//!
//! Ivy maps `(method, path)` pairs to handlers and runs each request
//! through the middleware named on its route:
//!
//! - **Pattern routing** - Literal, `:param` and `*wildcard` segments with
//!   literal-first precedence
//! - **Named middleware** - Routes reference middleware by name; names are
//!   resolved against a registry at request time
//! - **Flexible handlers** - Closures, async closures or `Controller@action`
//!   references
//! - **Declarative trees** - Nested route trees compiled into flat routes
//! - **Structured logging** - `tracing` subscriber configured from TOML or
//!   the environment
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ivy::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let middleware = Arc::new(MiddlewareContainer::new());
//!     middleware.register(FnMiddleware::new("auth", |ctx| {
//!         ctx.params_mut().insert("user", "alice");
//!         Ok(())
//!     }));
//!
//!     let mut router = Router::builder().middleware(middleware).build();
//!     router
//!         .get("/", Handler::sync(|_, _| "ok"), None)?
//!         .get(
//!             "/me",
//!             Handler::sync(|params: Params, _| {
//!                 Json(serde_json::json!({ "user": params.get("user") }))
//!             }),
//!             RouteOptions::new().middleware("auth"),
//!         )?;
//!
//!     Server::builder().router(router).port(8080).build().run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Request Flow
//!
//! ```text
//! Request → RouteTable lookup ──no match──→ 404 "Route not found"
//!               │
//!               ▼
//!         named middleware ──error──→ 500 "Error piping through middleware. ..."
//!               │
//!               ▼
//!          Dispatcher ──error/panic──→ 500 "Server error."
//!               │
//!               ▼
//!        ResponseWriter → Response
//! ```

#![doc(html_root_url = "https://docs.rs/ivy/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use ivy_core as core;

// Re-export pattern matching
pub use ivy_router as router;

// Re-export middleware types
pub use ivy_middleware as middleware;

// Re-export configuration
pub use ivy_config as config;

// Re-export the router and transport
pub use ivy_server as server;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use ivy::prelude::*;
///
/// let mut router = Router::new();
/// router.get("/", Handler::sync(|_, _| "ok"), None).unwrap();
/// assert_eq!(router.routes().len(), 1);
/// ```
pub mod prelude {
    pub use ivy_core::{
        BufferedResponse, Diagnostics, Handler, IntoReply, IvyError, IvyResult, Json, Params,
        Query, QueryValue, Reply, Request, ResponseSink, RouteConfigError, RouteContext,
        RouteOptions,
    };

    pub use ivy_middleware::{
        FnMiddleware, Middleware, MiddlewareContainer, MiddlewareError, MiddlewareRegistry, Next,
    };

    pub use ivy_config::{ConfigLoader, IvyConfig};

    pub use ivy_server::tree::route;
    pub use ivy_server::{
        ControllerRegistry, Router, RouteLeaf, RouteSpec, RouteTree, Server, ServerError,
        ShutdownSignal,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use ivy_core::fixtures;

    #[tokio::test]
    async fn test_prelude_round_trip() {
        let mut router = Router::new();
        router
            .get(
                "/hello/:name",
                Handler::sync(|params: Params, _| {
                    format!("hello {}", params.get("name").unwrap_or_default())
                }),
                None,
            )
            .unwrap();

        let mut res = BufferedResponse::new();
        router
            .resolve_route(fixtures::request("GET", "/hello/ivy"), &mut res)
            .await;

        assert_eq!(res.status(), 200);
        assert_eq!(res.body_text(), "hello ivy");
    }

    #[tokio::test]
    async fn test_prelude_not_found() {
        let router = Router::new();
        let mut res = BufferedResponse::new();
        router
            .resolve_route(fixtures::request("GET", "/missing"), &mut res)
            .await;

        assert_eq!(res.status(), 404);
        assert_eq!(res.body_text(), ivy_server::NOT_FOUND_BODY);
    }
}
