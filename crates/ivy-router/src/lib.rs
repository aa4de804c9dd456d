//! Segment tree route matching for Ivy.
//!
//! This crate provides the per-method pattern matcher used by the Ivy router.
//! Patterns are made of literal segments, named dynamic segments (`:id`) and
//! an optional trailing wildcard (`*path`).
//!
//! # Example
//!
//! ```rust
//! use ivy_router::RouteTable;
//!
//! let mut table = RouteTable::new();
//! table.set("/users", "listUsers").unwrap();
//! table.set("/users/:id", "getUser").unwrap();
//! table.set("/files/*path", "serveFile").unwrap();
//!
//! let found = table.get("/users/123").unwrap();
//! assert_eq!(*found.value, "getUser");
//! assert_eq!(found.params.get("id"), Some("123"));
//!
//! let found = table.get("/files/images/logo.png").unwrap();
//! assert_eq!(found.params.get("path"), Some("images/logo.png"));
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"        "files"
//!              │               │
//!        ┌─────┴─────┐      "*path"
//!        │           │
//!      (value)     ":id"
//!                    │
//!                 (value)
//! ```

mod error;
mod node;
mod params;
mod table;

pub use error::PatternError;
pub use node::{Node, SegmentKind, DEFAULT_WILDCARD};
pub use params::Params;
pub use table::{strip_query, RouteTable};

/// A matched pattern with its stored value and extracted parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The value stored for the matched pattern
    pub value: &'a T,
    /// Extracted path parameters
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(value: &'a T, params: Params) -> Self {
        Self { value, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_routing() {
        let mut table = RouteTable::new();
        table.set("/users", "listUsers").unwrap();
        table.set("/users/:id", "getUser").unwrap();

        let m = table.get("/users").unwrap();
        assert_eq!(*m.value, "listUsers");
        assert!(m.params.is_empty());

        let m = table.get("/users/123").unwrap();
        assert_eq!(*m.value, "getUser");
        assert_eq!(m.params.get("id"), Some("123"));
    }

    #[test]
    fn test_multiple_params() {
        let mut table = RouteTable::new();
        table.set("/orgs/:orgId/users/:userId", "getOrgUser").unwrap();

        let m = table.get("/orgs/acme/users/123").unwrap();
        assert_eq!(*m.value, "getOrgUser");
        assert_eq!(m.params.get("orgId"), Some("acme"));
        assert_eq!(m.params.get("userId"), Some("123"));
    }
}
