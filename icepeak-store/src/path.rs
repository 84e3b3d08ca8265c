//! Paths addressing locations inside the JSON document.
//!
//! A path is an ordered sequence of object-key segments; the empty sequence
//! denotes the document root. Paths only navigate JSON objects; arrays are
//! opaque values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered sequence of object-key segments.
///
/// Serializes transparently as a JSON array of strings, which is the form
/// used in journal entries (`"path":["a","b"]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<String>);

impl Path {
    /// The root path (empty segment sequence).
    pub fn root() -> Self {
        Path(Vec::new())
    }

    /// Build a path from owned segments.
    pub fn new(segments: Vec<String>) -> Self {
        Path(segments)
    }

    /// Parse a path from a URI-style string, e.g. `"users/1/name"`.
    ///
    /// Empty segments (leading, trailing, or doubled slashes) are dropped,
    /// so `"/a//b/"` addresses the same location as `"a/b"`.
    pub fn from_uri(uri: &str) -> Self {
        Path(
            uri.split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// The segments of this path, in order.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments; zero for the root.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `self` is a prefix of `other` (every path is a prefix of itself).
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl From<Vec<String>> for Path {
    fn from(segments: Vec<String>) -> Self {
        Path(segments)
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(segments: [&str; N]) -> Self {
        Path(segments.iter().map(|s| s.to_string()).collect())
    }
}
