//! # Ivy Core
//!
//! Core types and traits for the Ivy routing engine.
//!
//! This crate provides the vocabulary shared by the other Ivy crates:
//!
//! - [`Handler`] - What runs when a route matches (inline callable or `Name@action`)
//! - [`Reply`] / [`IntoReply`] - Normalized handler results
//! - [`ResponseSink`] / [`BufferedResponse`] - The writable response
//! - [`RouteEntry`] / [`RouteOptions`] / [`RouteRecord`] - Registered routes
//! - [`RouteContext`] - Per-request state seen by middleware
//! - [`Query`] - Parsed query string
//! - [`IvyError`] / [`RouteConfigError`] - Error types

#![doc(html_root_url = "https://docs.rs/ivy-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod diagnostics;
mod error;
pub mod fixtures;
mod handler;
mod query;
mod reply;
mod response;
mod route;

pub use context::{MatchedRoute, Request, RouteContext};
pub use diagnostics::{Diagnostics, TracingDiagnostics};
pub use error::{IvyError, IvyResult, RouteConfigError};
pub use handler::{
    BoxFuture, ControllerAction, ControllerDispatcher, DirectHandler, Handler, HandlerFuture,
};
pub use ivy_router::Params;
pub use query::{Query, QueryValue};
pub use reply::{IntoReply, Json, Reply, RespondFn, StructuredBody};
pub use response::{BufferedResponse, ResponseSink};
pub use route::{MiddlewareSpec, RouteEntry, RouteOptions, RouteRecord};
