//! Query string parsing.

use http::Uri;
use indexmap::IndexMap;
use serde::Serialize;

/// A query value: a single string, or a list when the key repeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// The key appeared once.
    Single(String),
    /// The key appeared more than once, in order of appearance.
    Multiple(Vec<String>),
}

impl QueryValue {
    /// Returns the first value.
    #[must_use]
    pub fn first(&self) -> &str {
        match self {
            Self::Single(v) => v,
            Self::Multiple(values) => values.first().map_or("", String::as_str),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Self::Single(existing) => {
                let first = std::mem::take(existing);
                *self = Self::Multiple(vec![first, value]);
            }
            Self::Multiple(values) => values.push(value),
        }
    }
}

/// Parsed query parameters, keyed in order of first appearance.
///
/// # Example
///
/// ```
/// use ivy_core::Query;
///
/// let query = Query::parse("q=search&tag=a&tag=b");
/// assert_eq!(query.get("q"), Some("search"));
/// assert_eq!(query.get_all("tag"), vec!["a", "b"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Query(IndexMap<String, QueryValue>);

impl Query {
    /// Creates an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored. Malformed input yields an empty query
    /// and a warning.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        if raw.is_empty() {
            return Self::new();
        }

        match serde_urlencoded::from_str::<Vec<(String, String)>>(raw) {
            Ok(pairs) => pairs.into_iter().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed query string");
                Self::new()
            }
        }
    }

    /// Parses the query component of a URI.
    #[must_use]
    pub fn from_uri(uri: &Uri) -> Self {
        uri.query().map(Self::parse).unwrap_or_default()
    }

    /// Returns the first value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(QueryValue::first)
    }

    /// Returns the raw value for a key.
    #[must_use]
    pub fn get_value(&self, key: &str) -> Option<&QueryValue> {
        self.0.get(key)
    }

    /// Returns every value for a key.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        match self.0.get(key) {
            Some(QueryValue::Single(v)) => vec![v.as_str()],
            Some(QueryValue::Multiple(values)) => values.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }

    /// Adds a value, turning the entry into a list if the key exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.0.entry(key.into()) {
            indexmap::map::Entry::Occupied(mut slot) => slot.get_mut().push(value),
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(QueryValue::Single(value));
            }
        }
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the query has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over keys and values in order of first appearance.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, String)> for Query {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut query = Self::new();
        for (key, value) in iter {
            query.insert(key, value);
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let query = Query::parse("q=search");
        assert_eq!(query.get("q"), Some("search"));
        assert_eq!(query.len(), 1);
    }

    #[test]
    fn test_parse_strips_question_mark() {
        assert_eq!(Query::parse("?a=1").get("a"), Some("1"));
        assert!(Query::parse("?").is_empty());
        assert!(Query::parse("").is_empty());
    }

    #[test]
    fn test_parse_decodes() {
        let query = Query::parse("name=hello%20world&plus=a+b");
        assert_eq!(query.get("name"), Some("hello world"));
        assert_eq!(query.get("plus"), Some("a b"));
    }

    #[test]
    fn test_repeated_keys_become_list() {
        let query = Query::parse("tag=a&tag=b&tag=c");
        assert_eq!(
            query.get_value("tag"),
            Some(&QueryValue::Multiple(vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string()
            ]))
        );
        assert_eq!(query.get("tag"), Some("a"));
    }

    #[test]
    fn test_key_without_value() {
        let query = Query::parse("flag&x=1");
        assert_eq!(query.get("flag"), Some(""));
        assert_eq!(query.get("x"), Some("1"));
    }

    #[test]
    fn test_from_uri() {
        let uri: Uri = "/search?q=ivy".parse().unwrap();
        assert_eq!(Query::from_uri(&uri).get("q"), Some("ivy"));

        let bare: Uri = "/search".parse().unwrap();
        assert!(Query::from_uri(&bare).is_empty());
    }

    #[test]
    fn test_serializes_as_object() {
        let query = Query::parse("a=1&b=2&b=3");
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            serde_json::json!({ "a": "1", "b": ["2", "3"] })
        );
    }
}
