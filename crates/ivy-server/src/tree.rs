//! Declarative route trees.
//!
//! A [`RouteTree`] describes routes as nested URL segments instead of a flat
//! list. [`compile`] walks the tree depth-first and returns the flat list of
//! [`RouteEntry`] records it describes; nothing is registered until the whole
//! tree has compiled, so a bad leaf never leaves a half-registered router.
//!
//! # Example
//!
//! ```
//! use ivy_core::Handler;
//! use ivy_server::tree::{compile, RouteLeaf, RouteTree};
//!
//! let tree = RouteTree::new()
//!     .branch("users", RouteTree::new()
//!         .branch("/", vec![
//!             ivy_server::tree::route("GET", Handler::sync(|_, _| "list"), None),
//!             ivy_server::tree::route("POST", Handler::sync(|_, _| "create"), None),
//!         ])
//!         .branch("/:id", RouteLeaf::param(|names| {
//!             assert_eq!(names, ["id".to_string()]);
//!             ivy_server::tree::route("GET", Handler::sync(|_, _| "show"), None).into()
//!         })));
//!
//! let entries = compile(&tree, "").unwrap();
//! let paths: Vec<_> = entries.iter().map(|e| (e.method.as_str(), e.path.as_str())).collect();
//! assert_eq!(paths, [("GET", "/users/"), ("POST", "/users/"), ("GET", "/users/:id")]);
//! ```

use std::fmt;
use std::sync::OnceLock;

use http::Method;
use ivy_core::{Handler, RouteConfigError, RouteEntry, RouteOptions};
use regex::Regex;

/// The tuple constructor handed to [`RouteSpec::tree`] builders.
pub type RouteConstructor = fn(&str, Handler, Option<RouteOptions>) -> RouteTuple;

type ParamFn = dyn Fn(&[String]) -> RouteLeaf + Send + Sync;

/// One `(method, handler, options)` binding inside a tree.
///
/// A tuple without a usable handler or with a malformed method is kept as
/// is and rejected when the tree compiles.
#[derive(Debug, Clone)]
pub struct RouteTuple {
    method: String,
    handler: Option<Handler>,
    options: RouteOptions,
}

impl RouteTuple {
    /// Binds a controller reference, e.g. `RouteTuple::controller("GET", "Users@show", None)`.
    ///
    /// A malformed reference leaves the tuple without a handler.
    pub fn controller(
        method: &str,
        reference: &str,
        options: impl Into<Option<RouteOptions>>,
    ) -> Self {
        Self {
            method: method.to_string(),
            handler: Handler::controller(reference).ok(),
            options: options.into().unwrap_or_default(),
        }
    }

    /// A tuple with a method but no handler.
    pub fn method_only(method: &str) -> Self {
        Self {
            method: method.to_string(),
            handler: None,
            options: RouteOptions::default(),
        }
    }

    fn to_entry(&self, path: &str) -> Result<RouteEntry, RouteConfigError> {
        let method = self.method.trim();
        let well_formed = !method.is_empty() && Method::from_bytes(method.as_bytes()).is_ok();
        match &self.handler {
            Some(handler) if well_formed => Ok(RouteEntry::new(
                method,
                path,
                handler.clone(),
                self.options.clone(),
            )),
            _ => Err(RouteConfigError::handler_not_defined(path)),
        }
    }
}

/// Builds a route tuple.
pub fn route(method: &str, handler: Handler, options: Option<RouteOptions>) -> RouteTuple {
    RouteTuple {
        method: method.to_string(),
        handler: Some(handler),
        options: options.unwrap_or_default(),
    }
}

/// The value stored under a tree segment.
pub enum RouteLeaf {
    /// A single binding.
    Route(RouteTuple),
    /// Several methods bound to the same path.
    Routes(Vec<RouteTuple>),
    /// A nested tree.
    Tree(RouteTree),
    /// Produces a leaf from the dynamic parameter names of its segment.
    Param(Box<ParamFn>),
}

impl RouteLeaf {
    /// Creates a parametrized leaf.
    ///
    /// `f` receives the `:name` tokens of the segment it sits under, in
    /// order, and runs once while the tree compiles.
    pub fn param<F>(f: F) -> Self
    where
        F: Fn(&[String]) -> RouteLeaf + Send + Sync + 'static,
    {
        Self::Param(Box::new(f))
    }
}

impl fmt::Debug for RouteLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route(tuple) => f.debug_tuple("Route").field(tuple).finish(),
            Self::Routes(tuples) => f.debug_tuple("Routes").field(tuples).finish(),
            Self::Tree(tree) => f.debug_tuple("Tree").field(tree).finish(),
            Self::Param(_) => f.write_str("Param(..)"),
        }
    }
}

impl From<RouteTuple> for RouteLeaf {
    fn from(tuple: RouteTuple) -> Self {
        Self::Route(tuple)
    }
}

impl From<Vec<RouteTuple>> for RouteLeaf {
    fn from(tuples: Vec<RouteTuple>) -> Self {
        Self::Routes(tuples)
    }
}

impl From<RouteTree> for RouteLeaf {
    fn from(tree: RouteTree) -> Self {
        Self::Tree(tree)
    }
}

/// Ordered URL segments mapped to leaves.
#[derive(Debug, Default)]
pub struct RouteTree {
    branches: Vec<(String, RouteLeaf)>,
}

impl RouteTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a segment. A missing leading `/` is added when compiling.
    pub fn branch(mut self, segment: impl Into<String>, leaf: impl Into<RouteLeaf>) -> Self {
        self.branches.push((segment.into(), leaf.into()));
        self
    }

    /// Returns the number of top-level segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// Returns true if the tree has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

/// What [`Router::register_routes`](crate::Router::register_routes) accepts.
#[derive(Debug)]
pub enum RouteSpec {
    /// Ready-made entries, registered as given.
    List(Vec<RouteEntry>),
    /// A declarative tree, compiled first.
    Tree(RouteTree),
}

impl RouteSpec {
    /// Runs a tree builder, handing it the [`route`] constructor.
    pub fn tree<F>(build: F) -> Self
    where
        F: FnOnce(RouteConstructor) -> RouteTree,
    {
        Self::Tree(build(route))
    }

    /// Flattens the spec into entries.
    ///
    /// # Errors
    ///
    /// Returns the first [`RouteConfigError`] found in the tree.
    pub fn into_entries(self) -> Result<Vec<RouteEntry>, RouteConfigError> {
        match self {
            Self::List(entries) => Ok(entries),
            Self::Tree(tree) => compile(&tree, ""),
        }
    }
}

impl From<Vec<RouteEntry>> for RouteSpec {
    fn from(entries: Vec<RouteEntry>) -> Self {
        Self::List(entries)
    }
}

impl From<RouteTree> for RouteSpec {
    fn from(tree: RouteTree) -> Self {
        Self::Tree(tree)
    }
}

/// Compiles a tree into flat entries under `prefix`.
///
/// # Errors
///
/// - [`RouteConfigError::NoHandler`] for an empty list leaf
/// - [`RouteConfigError::HandlerNotDefined`] for a tuple without a handler
///   or with a malformed method
pub fn compile(tree: &RouteTree, prefix: &str) -> Result<Vec<RouteEntry>, RouteConfigError> {
    let mut entries = Vec::new();
    compile_into(tree, prefix, &mut entries)?;
    Ok(entries)
}

fn compile_into(
    tree: &RouteTree,
    prefix: &str,
    out: &mut Vec<RouteEntry>,
) -> Result<(), RouteConfigError> {
    for (segment, leaf) in &tree.branches {
        let segment = if segment.starts_with('/') {
            segment.clone()
        } else {
            format!("/{segment}")
        };
        let path = join(prefix, &segment);
        compile_leaf(leaf, &path, &segment, out)?;
    }
    Ok(())
}

fn compile_leaf(
    leaf: &RouteLeaf,
    path: &str,
    segment: &str,
    out: &mut Vec<RouteEntry>,
) -> Result<(), RouteConfigError> {
    match leaf {
        RouteLeaf::Route(tuple) => out.push(tuple.to_entry(path)?),
        RouteLeaf::Routes(tuples) => {
            if tuples.is_empty() {
                return Err(RouteConfigError::no_handler(path));
            }
            for tuple in tuples {
                out.push(tuple.to_entry(path)?);
            }
        }
        RouteLeaf::Tree(tree) => compile_into(tree, path, out)?,
        RouteLeaf::Param(produce) => {
            let produced = produce(&param_names(segment));
            compile_leaf(&produced, path, segment, out)?;
        }
    }
    Ok(())
}

fn join(prefix: &str, segment: &str) -> String {
    match prefix.strip_suffix('/') {
        Some(trimmed) => format!("{trimmed}{segment}"),
        None => format!("{prefix}{segment}"),
    }
}

/// Returns the `:name` tokens of a segment, in order.
pub fn param_names(segment: &str) -> Vec<String> {
    static PARAM: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = PARAM.get_or_init(|| Regex::new(r":(\w+)").ok()) else {
        return Vec::new();
    };
    re.captures_iter(segment)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok() -> Handler {
        Handler::sync(|_, _| "ok")
    }

    fn paths(entries: &[RouteEntry]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|e| (e.method.clone(), e.path.clone()))
            .collect()
    }

    #[test]
    fn test_segments_are_slash_prefixed() {
        let tree = RouteTree::new()
            .branch("health", route("get", ok(), None))
            .branch("/", route("GET", ok(), None));

        let entries = compile(&tree, "").unwrap();
        assert_eq!(
            paths(&entries),
            vec![
                ("GET".to_string(), "/health".to_string()),
                ("GET".to_string(), "/".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_paths_accumulate() {
        let tree = RouteTree::new().branch(
            "/api",
            RouteTree::new().branch(
                "/v1",
                RouteTree::new().branch("/items/:id", route("DELETE", ok(), None)),
            ),
        );

        let entries = compile(&tree, "").unwrap();
        assert_eq!(
            paths(&entries),
            vec![("DELETE".to_string(), "/api/v1/items/:id".to_string())]
        );
    }

    #[test]
    fn test_root_prefix_does_not_double_slash() {
        let tree = RouteTree::new().branch("/users", route("GET", ok(), None));
        let entries = compile(&tree, "/").unwrap();
        assert_eq!(entries[0].path, "/users");
    }

    #[test]
    fn test_param_leaf_receives_names() {
        let tree = RouteTree::new().branch(
            "/orgs/:org/repos/:repo",
            RouteLeaf::param(|names| {
                assert_eq!(names, ["org".to_string(), "repo".to_string()]);
                RouteLeaf::Routes(vec![
                    route("GET", Handler::sync(|_, _| "show"), None),
                    route("PUT", Handler::sync(|_, _| "update"), None),
                ])
            }),
        );

        let entries = compile(&tree, "").unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.path == "/orgs/:org/repos/:repo"));
    }

    #[test]
    fn test_param_leaf_can_return_subtree() {
        let tree = RouteTree::new().branch(
            "/:id",
            RouteLeaf::param(|names| {
                let name = names[0].clone();
                RouteTree::new()
                    .branch("/edit", route("GET", ok(), None))
                    .branch(
                        "/meta",
                        route(
                            "GET",
                            ok(),
                            Some(RouteOptions::new().with("param", name)),
                        ),
                    )
                    .into()
            }),
        );

        let entries = compile(&tree, "").unwrap();
        assert_eq!(entries[0].path, "/:id/edit");
        assert_eq!(entries[1].path, "/:id/meta");
        assert_eq!(
            entries[1].options.get("param"),
            Some(&serde_json::Value::from("id"))
        );
    }

    #[test]
    fn test_empty_list_is_rejected() {
        let tree = RouteTree::new().branch(
            "/users",
            RouteTree::new().branch("/:id", Vec::<RouteTuple>::new()),
        );

        let err = compile(&tree, "").unwrap_err();
        assert!(matches!(err, RouteConfigError::NoHandler { ref path } if path == "/users/:id"));
        assert_eq!(err.to_string(), "no handler provided for path /users/:id");
    }

    #[test]
    fn test_malformed_tuples_are_rejected() {
        for tuple in [
            RouteTuple::method_only("GET"),
            route("", ok(), None),
            route("GE T", ok(), None),
            RouteTuple::controller("GET", "NoAction", None),
        ] {
            let tree = RouteTree::new().branch("/x", tuple);
            let err = compile(&tree, "").unwrap_err();
            assert_eq!(err.to_string(), "handler not defined for path /x");
        }
    }

    #[test]
    fn test_controller_tuple() {
        let tree =
            RouteTree::new().branch("/users", RouteTuple::controller("GET", "Users@index", None));
        let entries = compile(&tree, "").unwrap();
        assert_eq!(entries[0].handler.identity(), "Users@index");
    }

    #[test]
    fn test_spec_tree_builder() {
        let spec = RouteSpec::tree(|route| {
            RouteTree::new().branch("/", route("GET", Handler::sync(|_, _| "root"), None))
        });
        let entries = spec.into_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "/");
    }

    #[test]
    fn test_param_names() {
        assert_eq!(param_names("/:id"), vec!["id".to_string()]);
        assert_eq!(
            param_names("/:a/b/:c_d"),
            vec!["a".to_string(), "c_d".to_string()]
        );
        assert!(param_names("/static").is_empty());
    }
}
