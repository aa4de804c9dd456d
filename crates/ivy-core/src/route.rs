//! Route entries, their options, and the registration log.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::handler::Handler;

/// Names of the middleware a route must pass through, in order.
///
/// Accepts either a single name or a list of names, matching the two shapes
/// the `middleware` route option may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MiddlewareSpec {
    /// A single middleware name.
    One(String),
    /// An ordered list of middleware names.
    Many(Vec<String>),
}

impl MiddlewareSpec {
    /// Returns the declared names in order, skipping blanks.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::One(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        }
        .into_iter()
        .filter(|name| !name.trim().is_empty())
        .collect()
    }

    /// Returns true if no middleware is actually named.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }
}

impl From<&str> for MiddlewareSpec {
    fn from(name: &str) -> Self {
        Self::One(name.to_string())
    }
}

impl From<String> for MiddlewareSpec {
    fn from(name: String) -> Self {
        Self::One(name)
    }
}

impl From<Vec<String>> for MiddlewareSpec {
    fn from(names: Vec<String>) -> Self {
        Self::Many(names)
    }
}

impl From<Vec<&str>> for MiddlewareSpec {
    fn from(names: Vec<&str>) -> Self {
        Self::Many(names.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for MiddlewareSpec {
    fn from(names: [&str; N]) -> Self {
        Self::Many(names.into_iter().map(String::from).collect())
    }
}

/// Open configuration attached to a route.
///
/// Only `middleware` is interpreted by the router; every other key is kept
/// verbatim for introspection and for the application's own use.
///
/// # Example
///
/// ```
/// use ivy_core::RouteOptions;
///
/// let options = RouteOptions::new()
///     .middleware(["auth", "audit"])
///     .with("cache", 60);
///
/// assert!(options.has_middleware());
/// assert_eq!(options.get("cache"), Some(&serde_json::json!(60)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteOptions {
    /// Middleware to run before dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middleware: Option<MiddlewareSpec>,

    /// Any other option, untouched by the router.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RouteOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the middleware for the route.
    #[must_use]
    pub fn middleware(mut self, spec: impl Into<MiddlewareSpec>) -> Self {
        self.middleware = Some(spec.into());
        self
    }

    /// Sets an arbitrary option.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Returns an arbitrary option.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Returns true if at least one middleware is named.
    #[must_use]
    pub fn has_middleware(&self) -> bool {
        self.middleware.as_ref().is_some_and(|spec| !spec.is_empty())
    }
}

/// A registered route: method, pattern, handler and options.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    /// Canonical (uppercase) HTTP method.
    pub method: String,
    /// Pattern as registered.
    pub path: String,
    /// What to run when the route matches.
    pub handler: Handler,
    /// Route options.
    pub options: RouteOptions,
}

impl RouteEntry {
    /// Creates an entry, canonicalizing the method to uppercase.
    #[must_use]
    pub fn new(
        method: impl AsRef<str>,
        path: impl Into<String>,
        handler: Handler,
        options: RouteOptions,
    ) -> Self {
        Self {
            method: method.as_ref().to_ascii_uppercase(),
            path: path.into(),
            handler,
            options,
        }
    }

    /// Returns the introspection record for this entry.
    #[must_use]
    pub fn record(&self) -> RouteRecord {
        RouteRecord {
            method: self.method.clone(),
            path: self.path.clone(),
            options: self.options.clone(),
            handler: self.handler.identity(),
        }
    }
}

/// One line of the append-only registration log.
///
/// `handler` is `"Function"` for direct handlers and `"Name@action"` for
/// controller references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRecord {
    /// Canonical HTTP method.
    pub method: String,
    /// Pattern as registered.
    pub path: String,
    /// Route options.
    pub options: RouteOptions,
    /// Handler identity.
    pub handler: String,
}
