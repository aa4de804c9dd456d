//! Per-method route table.
//!
//! A [`RouteTable`] is the matchable side of route registration: one table
//! exists per HTTP method and maps patterns to whatever the caller stores.

use crate::error::PatternError;
use crate::node::Node;
use crate::RouteMatch;

/// Pattern matcher for a single HTTP method.
///
/// # Example
///
/// ```rust
/// use ivy_router::RouteTable;
///
/// let mut table = RouteTable::new();
/// table.set("/users/:id", "getUser").unwrap();
///
/// let found = table.get("/users/42?expand=true").unwrap();
/// assert_eq!(*found.value, "getUser");
/// assert_eq!(found.params.get("id"), Some("42"));
/// ```
///
/// # Route Priority
///
/// When more than one pattern could match a path, segments are tried in
/// this order at every position, backtracking on failure:
///
/// 1. **Literal segments** (e.g., `/users/me`)
/// 2. **Dynamic segments** (e.g., `/users/:id`)
/// 3. **Wildcard segments** (e.g., `/files/*path`)
#[derive(Debug, Clone)]
pub struct RouteTable<T> {
    root: Node<T>,
    len: usize,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RouteTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            len: 0,
        }
    }

    /// Stores `value` under `pattern`, returning the value it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern is malformed or conflicts with
    /// the dynamic segment names already in the table. The table is left
    /// unchanged in that case.
    pub fn set(&mut self, pattern: &str, value: T) -> Result<Option<T>, PatternError> {
        let previous = self.root.insert(strip_query(pattern), value)?;
        if previous.is_none() {
            self.len += 1;
        }
        Ok(previous)
    }

    /// Looks up a concrete path. Any `?query` suffix is ignored.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<RouteMatch<'_, T>> {
        let (value, params) = self.root.match_path(strip_query(path))?;
        Some(RouteMatch::new(value, params))
    }

    /// Returns the number of distinct patterns stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no pattern is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Returns `path` without its query string.
#[must_use]
pub fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(path, _)| path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_new() {
        let table: RouteTable<&str> = RouteTable::new();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_table_set_and_get_static() {
        let mut table = RouteTable::new();
        table.set("/", "root").unwrap();
        table.set("/users", "listUsers").unwrap();

        assert_eq!(*table.get("/").unwrap().value, "root");
        assert_eq!(*table.get("/users").unwrap().value, "listUsers");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_table_get_strips_query() {
        let mut table = RouteTable::new();
        table.set("/query-test", "query").unwrap();

        let found = table.get("/query-test?q=fastText").unwrap();
        assert_eq!(*found.value, "query");
        assert!(found.params.is_empty());
    }

    #[test]
    fn test_table_overwrite_keeps_len() {
        let mut table = RouteTable::new();
        table.set("/users/:id", "first").unwrap();
        let previous = table.set("/users/:id", "second").unwrap();

        assert_eq!(previous, Some("first"));
        assert_eq!(table.len(), 1);
        assert_eq!(*table.get("/users/1").unwrap().value, "second");
    }

    #[test]
    fn test_table_no_match() {
        let mut table = RouteTable::new();
        table.set("/users", "listUsers").unwrap();

        assert!(table.get("/posts").is_none());
        assert!(table.get("/users/1").is_none());
    }

    #[test]
    fn test_table_trailing_slash() {
        let mut table = RouteTable::new();
        table.set("/users", "listUsers").unwrap();

        assert!(table.get("/users/").is_some());
    }

    #[test]
    fn test_table_conflict_leaves_table_unchanged() {
        let mut table = RouteTable::new();
        table.set("/orgs/:org", "org").unwrap();

        assert!(table.set("/orgs/:name/users", "users").is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("/a?b=c"), "/a");
        assert_eq!(strip_query("/a"), "/a");
        assert_eq!(strip_query("?x"), "");
    }
}
