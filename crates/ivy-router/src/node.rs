//! Segment tree node implementation.
//!
//! Each node owns one path segment. Static children are kept sorted so that
//! lookup can binary search them; a node has at most one dynamic (`:name`)
//! child and at most one wildcard (`*name`) child.

use crate::error::PatternError;
use crate::params::Params;

/// Name given to a bare `*` wildcard segment.
pub const DEFAULT_WILDCARD: &str = "*";

/// Type of path segment in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal path segment (e.g., "users", "api")
    Static,
    /// Named dynamic segment (e.g., ":id")
    Param(String),
    /// Catch-all for the remaining path (e.g., "*path")
    Wildcard(String),
}

/// A node in the segment tree.
///
/// Nodes at the end of a registered pattern carry the stored value.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// The path segment this node represents
    pub segment: String,

    /// The kind of segment (static, param, or wildcard)
    pub kind: SegmentKind,

    /// Value stored for the pattern ending at this node
    pub value: Option<T>,

    /// Static children, sorted by segment for binary search
    pub static_children: Vec<Node<T>>,

    /// Dynamic child (at most one per node)
    pub param_child: Option<Box<Node<T>>>,

    /// Wildcard child (at most one per node, always a leaf)
    pub wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn with_kind(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            value: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a new static node.
    #[must_use]
    pub fn new_static(segment: impl Into<String>) -> Self {
        Self::with_kind(segment.into(), SegmentKind::Static)
    }

    /// Creates a new dynamic node.
    #[must_use]
    pub fn new_param(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!(":{name}"), SegmentKind::Param(name))
    }

    /// Creates a new wildcard node.
    #[must_use]
    pub fn new_wildcard(name: impl Into<String>) -> Self {
        let name = name.into();
        let segment = if name == DEFAULT_WILDCARD {
            name.clone()
        } else {
            format!("*{name}")
        };
        Self::with_kind(segment, SegmentKind::Wildcard(name))
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new_static("")
    }

    /// Inserts a value for a pattern, returning the value it replaced.
    ///
    /// The pattern is validated against the existing tree before anything is
    /// modified, so a failed insert leaves the tree untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern is malformed or names a
    /// dynamic segment differently from an already registered pattern at the
    /// same position.
    pub fn insert(&mut self, pattern: &str, value: T) -> Result<Option<T>, PatternError> {
        let segments = Self::parse_pattern(pattern)?;
        self.check_segments(pattern, &segments)?;
        Ok(self.insert_segments(&segments, value))
    }

    /// Parses a pattern into segments.
    fn parse_pattern(pattern: &str) -> Result<Vec<(String, SegmentKind)>, PatternError> {
        let raw: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let last = raw.len().saturating_sub(1);

        raw.iter()
            .enumerate()
            .map(|(index, s)| {
                if let Some(name) = s.strip_prefix(':') {
                    if name.is_empty() {
                        return Err(PatternError::EmptyParamName {
                            pattern: pattern.to_string(),
                        });
                    }
                    Ok(((*s).to_string(), SegmentKind::Param(name.to_string())))
                } else if let Some(name) = s.strip_prefix('*') {
                    if index != last {
                        return Err(PatternError::WildcardNotLast {
                            pattern: pattern.to_string(),
                        });
                    }
                    let name = if name.is_empty() { DEFAULT_WILDCARD } else { name };
                    Ok(((*s).to_string(), SegmentKind::Wildcard(name.to_string())))
                } else {
                    Ok(((*s).to_string(), SegmentKind::Static))
                }
            })
            .collect()
    }

    /// Walks the tree read-only and reports dynamic-name conflicts.
    fn check_segments(
        &self,
        pattern: &str,
        segments: &[(String, SegmentKind)],
    ) -> Result<(), PatternError> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            return Ok(());
        };

        match kind {
            SegmentKind::Static => match self.find_static_child(segment) {
                Some(child) => child.check_segments(pattern, remaining),
                None => Ok(()),
            },
            SegmentKind::Param(name) | SegmentKind::Wildcard(name) => {
                let existing = if matches!(kind, SegmentKind::Param(_)) {
                    self.param_child.as_deref()
                } else {
                    self.wildcard_child.as_deref()
                };
                match existing {
                    Some(child) => match &child.kind {
                        SegmentKind::Param(current) | SegmentKind::Wildcard(current)
                            if current != name =>
                        {
                            Err(PatternError::ConflictingName {
                                pattern: pattern.to_string(),
                                existing: current.clone(),
                                found: name.clone(),
                            })
                        }
                        _ => child.check_segments(pattern, remaining),
                    },
                    None => Ok(()),
                }
            }
        }
    }

    /// Inserts segments into the tree recursively.
    fn insert_segments(&mut self, segments: &[(String, SegmentKind)], value: T) -> Option<T> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            return self.value.replace(value);
        };

        match kind {
            SegmentKind::Static => {
                match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(index) => self.static_children[index].insert_segments(remaining, value),
                    Err(index) => {
                        let mut child = Node::new_static(segment.clone());
                        let previous = child.insert_segments(remaining, value);
                        self.static_children.insert(index, child);
                        previous
                    }
                }
            }
            SegmentKind::Param(name) => self
                .param_child
                .get_or_insert_with(|| Box::new(Node::new_param(name.clone())))
                .insert_segments(remaining, value),
            SegmentKind::Wildcard(name) => self
                .wildcard_child
                .get_or_insert_with(|| Box::new(Node::new_wildcard(name.clone())))
                .insert_segments(remaining, value),
        }
    }

    /// Matches a concrete path against the tree.
    ///
    /// Returns the stored value and extracted parameters if found.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&T, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let value = self.match_segments(&segments, &mut params)?;
        Some((value, params))
    }

    /// Matches segments recursively: literal, then dynamic, then wildcard.
    fn match_segments<'a>(&'a self, segments: &[&str], params: &mut Params) -> Option<&'a T> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.value.as_ref();
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(value) = child.match_segments(remaining, params) {
                return Some(value);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name, segment);
                if let Some(value) = child.match_segments(remaining, params) {
                    return Some(value);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                if let Some(value) = child.value.as_ref() {
                    params.push(name, &segments.join("/"));
                    return Some(value);
                }
            }
        }

        None
    }

    /// Finds a static child by segment using binary search.
    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}
