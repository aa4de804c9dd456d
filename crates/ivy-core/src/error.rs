//! Error types for Ivy.
//!
//! Two families of errors exist:
//!
//! - [`IvyError`] covers failures while a request is being served (a handler
//!   returning an error or panicking, an unknown controller action, a reply
//!   that cannot be serialized). The resolver turns every one of them into a
//!   logged `500` response.
//! - [`RouteConfigError`] covers malformed route registrations. These are
//!   raised synchronously at startup and never reach a request.

use http::StatusCode;
use ivy_router::PatternError;
use thiserror::Error;

/// Result type alias using [`IvyError`].
pub type IvyResult<T> = Result<T, IvyError>;

/// Failure raised while dispatching a request or writing its reply.
#[derive(Error, Debug)]
pub enum IvyError {
    /// A handler or controller action returned an error.
    #[error("Handler error: {message}")]
    Handler {
        /// Human-readable error message.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A handler panicked while producing its reply.
    #[error("Handler panicked: {message}")]
    Panicked {
        /// The panic payload, if it was a string.
        message: String,
    },

    /// A controller reference names an action nobody registered.
    #[error("Unknown controller action: {action}")]
    UnknownAction {
        /// The `Name@action` specifier.
        action: String,
    },

    /// A structured reply could not be converted to JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IvyError {
    /// Creates a handler error with a message.
    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a handler error wrapping a source error.
    pub fn handler_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Handler {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an unknown controller action error.
    #[must_use]
    pub fn unknown_action(action: impl Into<String>) -> Self {
        Self::UnknownAction {
            action: action.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// Every failure past route matching is a server error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<anyhow::Error> for IvyError {
    fn from(err: anyhow::Error) -> Self {
        Self::Handler {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// A malformed route registration, raised before any request is served.
#[derive(Error, Debug)]
pub enum RouteConfigError {
    /// A route tree leaf with an empty route list.
    #[error("no handler provided for path {path}")]
    NoHandler {
        /// The accumulated path of the leaf.
        path: String,
    },

    /// A route tuple without a well-formed method or handler.
    #[error("handler not defined for path {path}")]
    HandlerNotDefined {
        /// The accumulated path of the leaf.
        path: String,
    },

    /// A route registered for a method missing from the method set.
    #[error("method {method} is not supported; add it with add_method first")]
    UnsupportedMethod {
        /// The canonical (uppercase) method name.
        method: String,
    },

    /// A pattern the route table refused.
    #[error("invalid route pattern {pattern}")]
    InvalidPattern {
        /// The pattern as registered.
        pattern: String,
        /// Why the table refused it.
        #[source]
        source: PatternError,
    },

    /// A controller reference that is not of the form `Name@action`.
    #[error("invalid controller reference `{reference}`, expected `Name@action`")]
    InvalidControllerReference {
        /// The reference as given.
        reference: String,
    },
}

impl RouteConfigError {
    /// Creates an empty-leaf error.
    #[must_use]
    pub fn no_handler(path: impl Into<String>) -> Self {
        Self::NoHandler { path: path.into() }
    }

    /// Creates a malformed-tuple error.
    #[must_use]
    pub fn handler_not_defined(path: impl Into<String>) -> Self {
        Self::HandlerNotDefined { path: path.into() }
    }

    /// Creates an unsupported method error.
    #[must_use]
    pub fn unsupported_method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            method: method.into(),
        }
    }
}
