//! Route handlers.
//!
//! A route is served either by a [`DirectHandler`] (a callable registered
//! inline) or by a [`ControllerAction`], a `Name@action` reference resolved
//! at dispatch time by a [`ControllerDispatcher`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use ivy_router::Params;

use crate::error::{IvyResult, RouteConfigError};
use crate::query::Query;
use crate::reply::{IntoReply, Reply};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The future every handler produces.
pub type HandlerFuture = BoxFuture<'static, IvyResult<Reply>>;

type HandlerFn = dyn Fn(Params, Query) -> HandlerFuture + Send + Sync;

/// A callable registered directly on a route.
#[derive(Clone)]
pub struct DirectHandler(Arc<HandlerFn>);

impl DirectHandler {
    /// Invokes the handler with the route parameters and parsed query.
    pub fn call(&self, params: Params, query: Query) -> HandlerFuture {
        (self.0)(params, query)
    }
}

impl fmt::Debug for DirectHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DirectHandler")
    }
}

/// A `Name@action` controller reference.
///
/// # Example
///
/// ```
/// use ivy_core::ControllerAction;
///
/// let action: ControllerAction = "Users@show".parse().unwrap();
/// assert_eq!(action.controller, "Users");
/// assert_eq!(action.action, "show");
/// assert_eq!(action.to_string(), "Users@show");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControllerAction {
    /// Controller name.
    pub controller: String,
    /// Action name within the controller.
    pub action: String,
}

impl ControllerAction {
    /// Creates a reference from its two parts.
    #[must_use]
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
        }
    }
}

impl FromStr for ControllerAction {
    type Err = RouteConfigError;

    fn from_str(reference: &str) -> Result<Self, Self::Err> {
        match reference.split_once('@') {
            Some((controller, action))
                if !controller.is_empty() && !action.is_empty() && !action.contains('@') =>
            {
                Ok(Self::new(controller, action))
            }
            _ => Err(RouteConfigError::InvalidControllerReference {
                reference: reference.to_string(),
            }),
        }
    }
}

impl fmt::Display for ControllerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.controller, self.action)
    }
}

/// What runs when a route matches.
#[derive(Debug, Clone)]
pub enum Handler {
    /// A callable registered inline.
    Direct(DirectHandler),
    /// A controller action resolved at dispatch time.
    Controller(ControllerAction),
}

impl Handler {
    /// Wraps a synchronous callable.
    ///
    /// The callable runs inside the returned future, so a panic surfaces
    /// when the future is polled rather than when it is created.
    ///
    /// # Example
    ///
    /// ```
    /// use ivy_core::Handler;
    ///
    /// let handler = Handler::sync(|params, _query| {
    ///     format!("user {}", params.get("id").unwrap_or("?"))
    /// });
    /// assert_eq!(handler.identity(), "Function");
    /// ```
    pub fn sync<F, R>(f: F) -> Self
    where
        F: Fn(Params, Query) -> R + Send + Sync + 'static,
        R: IntoReply + 'static,
    {
        let f = Arc::new(f);
        Self::Direct(DirectHandler(Arc::new(
            move |params: Params, query: Query| -> HandlerFuture {
                let f = Arc::clone(&f);
                Box::pin(async move { f(params, query).into_reply() })
            },
        )))
    }

    /// Wraps an asynchronous callable.
    pub fn future<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Params, Query) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        Self::Direct(DirectHandler(Arc::new(
            move |params: Params, query: Query| -> HandlerFuture {
                let fut = f(params, query);
                Box::pin(async move { fut.await.into_reply() })
            },
        )))
    }

    /// Parses a `Name@action` controller reference.
    ///
    /// # Errors
    ///
    /// Returns [`RouteConfigError::InvalidControllerReference`] if the
    /// reference is not of that form.
    pub fn controller(reference: &str) -> Result<Self, RouteConfigError> {
        reference.parse().map(Self::Controller)
    }

    /// Builds a controller reference from its two parts.
    #[must_use]
    pub fn action(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self::Controller(ControllerAction::new(controller, action))
    }

    /// Returns the identity recorded in the route log: `"Function"` for
    /// direct handlers, the `Name@action` string for controller references.
    #[must_use]
    pub fn identity(&self) -> String {
        match self {
            Self::Direct(_) => "Function".to_string(),
            Self::Controller(action) => action.to_string(),
        }
    }
}

impl From<ControllerAction> for Handler {
    fn from(action: ControllerAction) -> Self {
        Self::Controller(action)
    }
}

impl From<DirectHandler> for Handler {
    fn from(handler: DirectHandler) -> Self {
        Self::Direct(handler)
    }
}

/// Resolves controller actions at dispatch time.
pub trait ControllerDispatcher: Send + Sync + 'static {
    /// Runs the named action.
    ///
    /// Implementations return [`crate::IvyError::UnknownAction`] for actions
    /// they do not know.
    fn dispatch(&self, action: &ControllerAction, params: Params, query: Query) -> HandlerFuture;
}
