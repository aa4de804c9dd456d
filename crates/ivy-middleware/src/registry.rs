//! Named middleware lookup.
//!
//! Routes name their middleware in `options.middleware`; a
//! [`MiddlewareRegistry`] turns those names into a runnable chain.

use std::collections::HashMap;
use std::sync::Arc;

use ivy_core::MiddlewareSpec;
use parking_lot::RwLock;

use crate::error::MiddlewareError;
use crate::middleware::{BoxedMiddleware, Middleware};

/// Resolves middleware names into an ordered chain.
pub trait MiddlewareRegistry: Send + Sync + 'static {
    /// Returns the middleware named by `spec`, in declared order.
    ///
    /// # Errors
    ///
    /// Returns [`MiddlewareError::Unregistered`] for the first unknown name.
    fn parse(&self, spec: &MiddlewareSpec) -> Result<Vec<BoxedMiddleware>, MiddlewareError>;
}

/// An in-memory [`MiddlewareRegistry`].
///
/// Registration takes `&self`, so a container shared with the router can
/// still be filled in during startup.
///
/// # Example
///
/// ```
/// use ivy_core::MiddlewareSpec;
/// use ivy_middleware::{FnMiddleware, MiddlewareContainer, MiddlewareRegistry};
///
/// let container = MiddlewareContainer::new();
/// container.register(FnMiddleware::new("test", |_| Ok(())));
///
/// let chain = container.parse(&MiddlewareSpec::from("test")).unwrap();
/// assert_eq!(chain.len(), 1);
/// ```
#[derive(Default)]
pub struct MiddlewareContainer {
    entries: RwLock<HashMap<String, BoxedMiddleware>>,
}

impl MiddlewareContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a middleware under its own name, replacing any previous one.
    pub fn register(&self, middleware: impl Middleware) {
        self.register_arc(Arc::new(middleware));
    }

    /// Registers a shared middleware under its own name.
    pub fn register_arc(&self, middleware: BoxedMiddleware) {
        let name = middleware.name().to_string();
        if self.entries.write().insert(name.clone(), middleware).is_some() {
            tracing::warn!(middleware = %name, "Replacing registered middleware");
        }
    }

    /// Returns true if a middleware is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Returns the number of registered middleware.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for MiddlewareContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("MiddlewareContainer")
            .field("names", &names)
            .finish()
    }
}

impl MiddlewareRegistry for MiddlewareContainer {
    fn parse(&self, spec: &MiddlewareSpec) -> Result<Vec<BoxedMiddleware>, MiddlewareError> {
        let entries = self.entries.read();
        spec.names()
            .into_iter()
            .map(|name| {
                entries
                    .get(name)
                    .cloned()
                    .ok_or_else(|| MiddlewareError::unregistered(name))
            })
            .collect()
    }
}
