//! Pattern registration errors.

use thiserror::Error;

/// Errors raised when a route pattern cannot be added to a table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A `:` segment without a name.
    #[error("pattern {pattern} has a dynamic segment without a name")]
    EmptyParamName {
        /// The offending pattern.
        pattern: String,
    },

    /// A wildcard segment followed by more segments.
    #[error("pattern {pattern} has a wildcard that is not the last segment")]
    WildcardNotLast {
        /// The offending pattern.
        pattern: String,
    },

    /// Two patterns name the same dynamic position differently.
    #[error("pattern {pattern} names a dynamic segment `{found}` where `{existing}` is already registered")]
    ConflictingName {
        /// The offending pattern.
        pattern: String,
        /// Name already bound at this position.
        existing: String,
        /// Name the new pattern tried to bind.
        found: String,
    },
}
