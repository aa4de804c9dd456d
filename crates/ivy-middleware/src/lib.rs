//! # Ivy Middleware
//!
//! Named middleware for the Ivy routing engine.
//!
//! Routes opt into middleware through their `middleware` option. After a
//! route matches, the resolver asks a [`MiddlewareRegistry`] for the named
//! chain and hands it to a [`PipelineRunner`]. Only a chain that runs to
//! completion reaches the handler.
//!
//! ```text
//! Matched → registry.parse(options.middleware) → runner.run(ctx, chain) → Dispatch
//!                        ↓                                 ↓
//!                  Unregistered                  Rejected | Halted → 500
//! ```
//!
//! ## Key Features
//!
//! - **Declared Order**: Middleware runs in the order the route names it
//! - **Fail Fast**: The first error aborts the rest of the chain
//! - **Mutable Context**: Middleware may rewrite parameters before dispatch
//! - **Pluggable**: Registry and runner are traits injected into the router
//!
//! ## Example
//!
//! ```
//! use ivy_core::MiddlewareSpec;
//! use ivy_middleware::{FnMiddleware, MiddlewareContainer, MiddlewareRegistry};
//!
//! let container = MiddlewareContainer::new();
//! container.register(FnMiddleware::new("deny", |_| Err("Cant go through!".into())));
//!
//! let chain = container.parse(&MiddlewareSpec::from("deny")).unwrap();
//! assert_eq!(chain[0].name(), "deny");
//! ```

#![doc(html_root_url = "https://docs.rs/ivy-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod registry;

// Re-export main types at crate root
pub use error::MiddlewareError;
pub use middleware::{BoxFuture, BoxedMiddleware, FnMiddleware, Middleware, Next};
pub use pipeline::{Pipeline, PipelineRunner};
pub use registry::{MiddlewareContainer, MiddlewareRegistry};
