//! Per-request context.
//!
//! The [`RouteContext`] is what middleware sees: the matched route with its
//! parameters, the parsed query, the request itself and the response. Any
//! change middleware makes to the parameters is what the handler receives.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use ivy_router::Params;

use crate::query::Query;
use crate::response::ResponseSink;
use crate::route::RouteEntry;

/// An incoming request with a fully buffered body.
pub type Request = http::Request<Bytes>;

/// The route a request resolved to, with its extracted parameters.
#[derive(Debug, Clone)]
pub struct MatchedRoute {
    /// The registered route.
    pub entry: Arc<RouteEntry>,
    /// Parameters extracted from the path.
    pub params: Params,
}

impl MatchedRoute {
    /// Creates a matched route.
    #[must_use]
    pub const fn new(entry: Arc<RouteEntry>, params: Params) -> Self {
        Self { entry, params }
    }
}

/// State threaded through middleware and into dispatch.
pub struct RouteContext<'a> {
    /// The matched route; `route.params` is mutable by middleware.
    pub route: MatchedRoute,
    /// Parsed query parameters (empty for non-GET requests).
    pub query: Query,
    /// The request being served.
    pub request: Request,
    /// The response being built.
    pub response: &'a mut dyn ResponseSink,
}

impl<'a> RouteContext<'a> {
    /// Creates a context.
    pub fn new(
        route: MatchedRoute,
        query: Query,
        request: Request,
        response: &'a mut dyn ResponseSink,
    ) -> Self {
        Self {
            route,
            query,
            request,
            response,
        }
    }

    /// Returns the route parameters.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.route.params
    }

    /// Returns the route parameters for modification.
    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.route.params
    }

    /// Returns the canonical request method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.route.entry.method
    }

    /// Returns the request path without its query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }
}

impl fmt::Debug for RouteContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteContext")
            .field("route", &self.route)
            .field("query", &self.query)
            .field("request", &self.request)
            .field("response_ended", &self.response.is_ended())
            .finish()
    }
}
