//! # Ivy Server
//!
//! The request router and its HTTP transport.
//!
//! - [`Router`] - Route registration and per-request resolution
//! - [`tree`] - Declarative route trees compiled into flat routes
//! - [`Dispatcher`] / [`ControllerRegistry`] - Handler invocation
//! - [`ResponseWriter`] - Reply serialization
//! - [`Server`] - HTTP/1.1 bootstrap with port discovery and graceful shutdown
//! - [`logging`] - `tracing` subscriber setup
//!
//! ## Example
//!
//! ```rust,no_run
//! use ivy_core::{Handler, Query};
//! use ivy_server::{Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::new();
//!     router
//!         .get("/", Handler::sync(|_, _| "ok"), None)?
//!         .get("/query-test", Handler::sync(|_, query: Query| {
//!             query.get("q").unwrap_or_default().to_string()
//!         }), None)?;
//!
//!     Server::builder().router(router).port(8080).build().run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/ivy-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dispatcher;
mod error;
pub mod logging;
mod router;
mod server;
pub mod shutdown;
pub mod tree;
mod writer;

pub use dispatcher::{ControllerRegistry, Dispatcher};
pub use error::ServerError;
pub use router::{
    Router, RouterBuilder, DEFAULT_METHODS, MIDDLEWARE_ERROR_PREFIX, NOT_FOUND_BODY,
};
pub use server::{Server, ServerBuilder, DEFAULT_MAX_BODY_SIZE, DEFAULT_SHUTDOWN_TIMEOUT};
pub use shutdown::ShutdownSignal;
pub use tree::{RouteLeaf, RouteSpec, RouteTree, RouteTuple};
pub use writer::{ResponseWriter, SERVER_ERROR_BODY};
