//! Middleware chain errors.

use thiserror::Error;

/// Why a middleware chain did not reach dispatch.
///
/// The resolver embeds the `Display` form in the `500` body, so
/// [`MiddlewareError::Rejected`] renders as the bare message a middleware
/// supplied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MiddlewareError {
    /// A middleware aborted the chain with an error.
    #[error("{message}")]
    Rejected {
        /// The message given by the middleware.
        message: String,
    },

    /// A route names a middleware nobody registered.
    #[error("middleware {name} is not registered")]
    Unregistered {
        /// The unknown name.
        name: String,
    },

    /// A middleware returned without invoking its continuation.
    #[error("middleware {name} did not continue the chain")]
    Halted {
        /// The middleware that stopped the chain.
        name: String,
    },

    /// A middleware panicked while the chain was running.
    #[error("middleware panicked: {message}")]
    Panicked {
        /// The panic payload, if it was a string.
        message: String,
    },
}

impl MiddlewareError {
    /// Creates a rejection with a message.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Creates an unregistered-middleware error.
    #[must_use]
    pub fn unregistered(name: impl Into<String>) -> Self {
        Self::Unregistered { name: name.into() }
    }

    /// Creates a halted-chain error.
    #[must_use]
    pub fn halted(name: impl Into<String>) -> Self {
        Self::Halted { name: name.into() }
    }

    /// Creates an error for a middleware that panicked.
    #[must_use]
    pub fn panicked(message: impl Into<String>) -> Self {
        Self::Panicked {
            message: message.into(),
        }
    }
}

impl From<&str> for MiddlewareError {
    fn from(message: &str) -> Self {
        Self::rejected(message)
    }
}

impl From<String> for MiddlewareError {
    fn from(message: String) -> Self {
        Self::rejected(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_displays_bare_message() {
        let err: MiddlewareError = "Cant go through!".into();
        assert_eq!(err.to_string(), "Cant go through!");
    }

    #[test]
    fn test_other_messages() {
        assert_eq!(
            MiddlewareError::unregistered("auth").to_string(),
            "middleware auth is not registered"
        );
        assert_eq!(
            MiddlewareError::halted("auth").to_string(),
            "middleware auth did not continue the chain"
        );
        assert_eq!(
            MiddlewareError::panicked("boom").to_string(),
            "middleware panicked: boom"
        );
    }
}
