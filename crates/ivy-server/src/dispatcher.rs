//! Handler dispatch.
//!
//! The [`Dispatcher`] turns either kind of [`Handler`] into one awaited
//! [`IvyResult<Reply>`]. Panics inside a handler are caught here and come
//! back as [`IvyError::Panicked`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use ivy_core::{
    ControllerAction, ControllerDispatcher, DirectHandler, Handler, HandlerFuture, IvyError,
    IvyResult, Params, Query, Reply, RouteConfigError,
};
use parking_lot::RwLock;

/// Invokes route handlers.
#[derive(Clone)]
pub struct Dispatcher {
    controllers: Arc<dyn ControllerDispatcher>,
}

impl Dispatcher {
    /// Creates a dispatcher that resolves controller references through
    /// `controllers`.
    pub fn new(controllers: Arc<dyn ControllerDispatcher>) -> Self {
        Self { controllers }
    }

    /// Runs `handler` to completion.
    pub async fn dispatch(
        &self,
        handler: &Handler,
        params: Params,
        query: Query,
    ) -> IvyResult<Reply> {
        let invocation = async {
            match handler {
                Handler::Direct(direct) => direct.call(params, query).await,
                Handler::Controller(action) => {
                    tracing::debug!(action = %action, "Dispatching controller action");
                    self.controllers.dispatch(action, params, query).await
                }
            }
        };

        match AssertUnwindSafe(invocation).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(IvyError::Panicked {
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// An in-process [`ControllerDispatcher`] keyed by `Name@action`.
///
/// # Example
///
/// ```
/// use ivy_core::Handler;
/// use ivy_server::ControllerRegistry;
///
/// let controllers = ControllerRegistry::new();
/// controllers
///     .register("Users@index", Handler::sync(|_, _| "all users"))
///     .unwrap();
/// assert!(controllers.contains("Users@index"));
/// ```
#[derive(Default)]
pub struct ControllerRegistry {
    actions: RwLock<HashMap<ControllerAction, DirectHandler>>,
}

impl ControllerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `reference` to a direct handler, replacing any previous binding.
    ///
    /// # Errors
    ///
    /// Returns [`RouteConfigError::InvalidControllerReference`] if the
    /// reference is not `Name@action`, or if `handler` is itself a controller
    /// reference.
    pub fn register(&self, reference: &str, handler: Handler) -> Result<(), RouteConfigError> {
        let action: ControllerAction = reference.parse()?;
        let Handler::Direct(direct) = handler else {
            return Err(RouteConfigError::InvalidControllerReference {
                reference: handler.identity(),
            });
        };
        if self.actions.write().insert(action, direct).is_some() {
            tracing::warn!(action = %reference, "Replacing registered controller action");
        }
        Ok(())
    }

    /// Returns true if `reference` is bound.
    #[must_use]
    pub fn contains(&self, reference: &str) -> bool {
        reference
            .parse::<ControllerAction>()
            .is_ok_and(|action| self.actions.read().contains_key(&action))
    }

    /// Returns the number of bound actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.read().len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.read().is_empty()
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<String> = self
            .actions
            .read()
            .keys()
            .map(ToString::to_string)
            .collect();
        actions.sort();
        f.debug_struct("ControllerRegistry")
            .field("actions", &actions)
            .finish()
    }
}

impl ControllerDispatcher for ControllerRegistry {
    fn dispatch(&self, action: &ControllerAction, params: Params, query: Query) -> HandlerFuture {
        let handler = self.actions.read().get(action).cloned();
        match handler {
            Some(handler) => handler.call(params, query),
            None => {
                let action = action.to_string();
                Box::pin(async move { Err(IvyError::unknown_action(action)) })
            }
        }
    }
}
