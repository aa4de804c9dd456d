//! The request router.
//!
//! A [`Router`] owns one [`RouteTable`] per supported method and the
//! append-only log of every registration. At request time
//! [`Router::resolve_route`] walks a fixed sequence:
//!
//! ```text
//! match ──► middleware (if declared) ──► dispatch ──► write
//!   │            │
//!   └─► 404      └─► 500 "Error piping through middleware. ..."
//! ```
//!
//! Every path ends the response; nothing escapes `resolve_route`.
//!
//! # Example
//!
//! ```
//! use ivy_core::{fixtures, BufferedResponse, Handler};
//! use ivy_server::Router;
//!
//! # tokio_test::block_on(async {
//! let mut router = Router::new();
//! router.get("/users/:id", Handler::sync(|params, _| {
//!     format!("user {}", params.get("id").unwrap_or_default())
//! }), None)?;
//!
//! let mut res = BufferedResponse::new();
//! router.resolve_route(fixtures::request("GET", "/users/7"), &mut res).await;
//! assert_eq!(res.body_text(), "user 7");
//! # Ok::<(), ivy_core::RouteConfigError>(())
//! # }).unwrap();
//! ```

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::FutureExt;
use http::StatusCode;
use indexmap::IndexMap;
use ivy_core::{
    ControllerDispatcher, Diagnostics, Handler, MatchedRoute, Query, Request, ResponseSink,
    RouteConfigError, RouteContext, RouteEntry, RouteOptions, RouteRecord, TracingDiagnostics,
};
use ivy_middleware::{
    MiddlewareContainer, MiddlewareError, MiddlewareRegistry, Pipeline, PipelineRunner,
};
use ivy_router::RouteTable;

use crate::dispatcher::{panic_message, ControllerRegistry, Dispatcher};
use crate::tree::RouteSpec;
use crate::writer::ResponseWriter;

/// Methods every router supports.
pub const DEFAULT_METHODS: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];

/// Body of the `404` response.
pub const NOT_FOUND_BODY: &str = "Route not found";

/// Prefix of the body written when the middleware chain fails.
pub const MIDDLEWARE_ERROR_PREFIX: &str = "Error piping through middleware. ";

type Tables = IndexMap<String, RouteTable<Arc<RouteEntry>>>;

/// Routes requests to handlers.
///
/// Register routes during startup, then share the router (typically behind
/// an [`Arc`]) with the transport. Registration takes `&mut self`, so it
/// cannot race with resolution.
pub struct Router {
    tables: Tables,
    routes: Vec<RouteRecord>,
    middleware: Arc<dyn MiddlewareRegistry>,
    pipeline: Arc<dyn PipelineRunner>,
    dispatcher: Dispatcher,
    writer: ResponseWriter,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Router {
    /// Creates a router with the default methods and collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a router.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use ivy_middleware::MiddlewareContainer;
    /// use ivy_server::Router;
    ///
    /// let router = Router::builder()
    ///     .methods(["patch", "GET"])
    ///     .middleware(Arc::new(MiddlewareContainer::new()))
    ///     .build();
    ///
    /// let methods: Vec<&str> = router.methods().collect();
    /// assert_eq!(methods, ["GET", "POST", "PUT", "DELETE", "PATCH"]);
    /// ```
    #[must_use]
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Returns the supported methods, in the order they were added.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Returns true if `method` is supported (case-insensitive).
    #[must_use]
    pub fn has_method(&self, method: &str) -> bool {
        self.tables.contains_key(&method.to_ascii_uppercase())
    }

    /// Adds a method and its table. Adding a known method does nothing.
    pub fn add_method(&mut self, method: &str) -> &mut Self {
        let method = method.trim().to_ascii_uppercase();
        if method.is_empty() {
            return self;
        }
        if !self.tables.contains_key(&method) {
            tracing::debug!(method = %method, "Adding method");
            self.tables.insert(method, RouteTable::new());
        }
        self
    }

    /// Returns every registration so far, in order.
    ///
    /// Re-registering a pattern replaces what matches but both registrations
    /// stay in this log.
    #[must_use]
    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    /// Registers a `GET` route.
    pub fn get(
        &mut self,
        path: &str,
        handler: impl Into<Handler>,
        options: impl Into<Option<RouteOptions>>,
    ) -> Result<&mut Self, RouteConfigError> {
        self.route("GET", path, handler, options)
    }

    /// Registers a `POST` route.
    pub fn post(
        &mut self,
        path: &str,
        handler: impl Into<Handler>,
        options: impl Into<Option<RouteOptions>>,
    ) -> Result<&mut Self, RouteConfigError> {
        self.route("POST", path, handler, options)
    }

    /// Registers a `PUT` route.
    pub fn put(
        &mut self,
        path: &str,
        handler: impl Into<Handler>,
        options: impl Into<Option<RouteOptions>>,
    ) -> Result<&mut Self, RouteConfigError> {
        self.route("PUT", path, handler, options)
    }

    /// Registers a `DELETE` route.
    pub fn delete(
        &mut self,
        path: &str,
        handler: impl Into<Handler>,
        options: impl Into<Option<RouteOptions>>,
    ) -> Result<&mut Self, RouteConfigError> {
        self.route("DELETE", path, handler, options)
    }

    /// Registers a route for any supported method.
    ///
    /// # Errors
    ///
    /// - [`RouteConfigError::UnsupportedMethod`] if `method` was never added
    /// - [`RouteConfigError::InvalidPattern`] if the table rejects `path`
    pub fn route(
        &mut self,
        method: &str,
        path: &str,
        handler: impl Into<Handler>,
        options: impl Into<Option<RouteOptions>>,
    ) -> Result<&mut Self, RouteConfigError> {
        let entry = RouteEntry::new(
            method,
            path,
            handler.into(),
            options.into().unwrap_or_default(),
        );
        self.register_all(vec![entry])?;
        Ok(self)
    }

    /// Registers a flat list or a declarative tree.
    ///
    /// Either every route is registered or none is.
    ///
    /// # Example
    ///
    /// ```
    /// use ivy_core::Handler;
    /// use ivy_server::tree::{RouteLeaf, RouteSpec, RouteTree};
    /// use ivy_server::Router;
    ///
    /// let mut router = Router::new();
    /// router.register_routes(RouteSpec::tree(|route| {
    ///     RouteTree::new()
    ///         .branch("/", route("GET", Handler::sync(|_, _| "home"), None))
    ///         .branch("/users/:id", RouteLeaf::param(move |_names| {
    ///             route("GET", Handler::controller("Users@show").unwrap(), None).into()
    ///         }))
    /// })).unwrap();
    ///
    /// assert_eq!(router.routes().len(), 2);
    /// assert_eq!(router.routes()[1].handler, "Users@show");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the first [`RouteConfigError`] of the tree or of any entry.
    pub fn register_routes(
        &mut self,
        spec: impl Into<RouteSpec>,
    ) -> Result<&mut Self, RouteConfigError> {
        let entries = spec.into().into_entries()?;
        self.register_all(entries)?;
        Ok(self)
    }

    /// Registers the five REST routes of a resource, bound to
    /// `controller@index|show|create|update|remove`.
    ///
    /// | Method | Path | Action |
    /// |---|---|---|
    /// | GET | `/name` | index |
    /// | GET | `/name/:id` | show |
    /// | POST | `/name` | create |
    /// | PUT | `/name/:id` | update |
    /// | DELETE | `/name/:id` | remove |
    ///
    /// # Errors
    ///
    /// Returns [`RouteConfigError::InvalidControllerReference`] if
    /// `controller` cannot form a `Name@action` reference.
    pub fn resource(
        &mut self,
        name: &str,
        controller: &str,
        options: impl Into<Option<RouteOptions>>,
    ) -> Result<&mut Self, RouteConfigError> {
        let options = options.into().unwrap_or_default();
        let collection = format!("/{}", name.trim_matches('/'));
        let member = format!("{collection}/:id");

        let actions = [
            ("GET", &collection, "index"),
            ("GET", &member, "show"),
            ("POST", &collection, "create"),
            ("PUT", &member, "update"),
            ("DELETE", &member, "remove"),
        ];
        let entries = actions
            .into_iter()
            .map(|(method, path, action)| {
                let handler = Handler::controller(&format!("{controller}@{action}"))?;
                Ok(RouteEntry::new(method, path.as_str(), handler, options.clone()))
            })
            .collect::<Result<Vec<_>, RouteConfigError>>()?;

        self.register_all(entries)?;
        Ok(self)
    }

    fn register_all(&mut self, entries: Vec<RouteEntry>) -> Result<(), RouteConfigError> {
        // A single insert is validated before its table changes.
        if entries.len() == 1 {
            for entry in entries {
                let record = insert_entry(&mut self.tables, entry)?;
                self.routes.push(record);
            }
            return Ok(());
        }

        let mut tables = self.tables.clone();
        let records = entries
            .into_iter()
            .map(|entry| insert_entry(&mut tables, entry))
            .collect::<Result<Vec<_>, _>>()?;

        self.tables = tables;
        self.routes.extend(records);
        Ok(())
    }

    /// Looks up the route for a method and path.
    #[must_use]
    pub fn find(&self, method: &str, path: &str) -> Option<MatchedRoute> {
        let table = self.tables.get(&method.to_ascii_uppercase())?;
        let found = table.get(path)?;
        Some(MatchedRoute::new(Arc::clone(found.value), found.params))
    }

    /// Serves one request, always ending `response`.
    ///
    /// - unmatched method and path: `404 Route not found`
    /// - middleware failure: `500 Error piping through middleware. <error>`
    /// - handler failure or unserializable reply: `500 Server error.`
    pub async fn resolve_route(&self, request: Request, response: &mut dyn ResponseSink) {
        let method = request.method().as_str().to_ascii_uppercase();
        let path = request.uri().path().to_string();

        let query = if method == "GET" {
            Query::from_uri(request.uri())
        } else {
            Query::new()
        };

        let Some(route) = self.find(&method, &path) else {
            tracing::debug!(method = %method, path = %path, "Route not found");
            response.write_head(StatusCode::NOT_FOUND);
            response.end(Bytes::from_static(NOT_FOUND_BODY.as_bytes()));
            return;
        };

        let mut ctx = RouteContext::new(route, query, request, response);

        let piped = AssertUnwindSafe(self.go_through_middleware(&mut ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(MiddlewareError::panicked(panic_message(payload.as_ref())))
            });

        if let Err(err) = piped {
            let message = format!("{MIDDLEWARE_ERROR_PREFIX}{err}");
            self.diagnostics.error(&message);
            if !ctx.response.is_ended() {
                ctx.response.write_head(StatusCode::INTERNAL_SERVER_ERROR);
                ctx.response.end(Bytes::from(message));
            }
            return;
        }

        let RouteContext {
            route,
            query,
            response,
            ..
        } = ctx;
        let result = self
            .dispatcher
            .dispatch(&route.entry.handler, route.params, query)
            .await;
        self.writer.write(result, response);
    }

    async fn go_through_middleware(
        &self,
        ctx: &mut RouteContext<'_>,
    ) -> Result<(), MiddlewareError> {
        let entry = Arc::clone(&ctx.route.entry);
        let Some(spec) = entry
            .options
            .middleware
            .as_ref()
            .filter(|spec| !spec.is_empty())
        else {
            return Ok(());
        };

        let chain = self.middleware.parse(spec)?;
        tracing::debug!(
            method = %entry.method,
            path = %entry.path,
            middleware = chain.len(),
            "Piping through middleware"
        );
        self.pipeline.run(ctx, &chain).await
    }
}

fn insert_entry(
    tables: &mut IndexMap<String, RouteTable<Arc<RouteEntry>>>,
    entry: RouteEntry,
) -> Result<RouteRecord, RouteConfigError> {
    let table = tables
        .get_mut(&entry.method)
        .ok_or_else(|| RouteConfigError::unsupported_method(&entry.method))?;
    let entry = Arc::new(entry);
    table
        .set(&entry.path, Arc::clone(&entry))
        .map_err(|source| RouteConfigError::InvalidPattern {
            pattern: entry.path.clone(),
            source,
        })?;
    tracing::debug!(
        method = %entry.method,
        path = %entry.path,
        handler = %entry.handler.identity(),
        "Registered route"
    );
    Ok(entry.record())
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("methods", &self.tables.keys().collect::<Vec<_>>())
            .field("routes", &self.routes.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Router`].
///
/// Collaborators left unset fall back to an empty [`MiddlewareContainer`],
/// the sequential [`Pipeline`], an empty [`ControllerRegistry`] and
/// [`TracingDiagnostics`].
#[derive(Default)]
pub struct RouterBuilder {
    methods: Vec<String>,
    middleware: Option<Arc<dyn MiddlewareRegistry>>,
    pipeline: Option<Arc<dyn PipelineRunner>>,
    controllers: Option<Arc<dyn ControllerDispatcher>>,
    diagnostics: Option<Arc<dyn Diagnostics>>,
}

impl RouterBuilder {
    /// Creates a builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds methods beyond the defaults. Duplicates are ignored.
    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.methods
            .extend(methods.into_iter().map(|m| m.as_ref().to_string()));
        self
    }

    /// Sets the middleware registry.
    pub fn middleware(mut self, registry: Arc<dyn MiddlewareRegistry>) -> Self {
        self.middleware = Some(registry);
        self
    }

    /// Sets the pipeline runner.
    pub fn pipeline(mut self, pipeline: Arc<dyn PipelineRunner>) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Sets the controller dispatcher.
    pub fn controllers(mut self, controllers: Arc<dyn ControllerDispatcher>) -> Self {
        self.controllers = Some(controllers);
        self
    }

    /// Sets the diagnostics sink.
    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Builds the router.
    #[must_use]
    pub fn build(self) -> Router {
        let diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Arc::new(TracingDiagnostics));
        let controllers = self
            .controllers
            .unwrap_or_else(|| Arc::new(ControllerRegistry::new()));

        let mut router = Router {
            tables: IndexMap::new(),
            routes: Vec::new(),
            middleware: self
                .middleware
                .unwrap_or_else(|| Arc::new(MiddlewareContainer::new())),
            pipeline: self.pipeline.unwrap_or_else(|| Arc::new(Pipeline::new())),
            dispatcher: Dispatcher::new(controllers),
            writer: ResponseWriter::new(Arc::clone(&diagnostics)),
            diagnostics,
        };
        for method in DEFAULT_METHODS {
            router.add_method(method);
        }
        for method in &self.methods {
            router.add_method(method);
        }
        router
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}
