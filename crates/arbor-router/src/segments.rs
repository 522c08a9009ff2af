//! Path segment parsing.

/// Ordered path segments, root to leaf.
///
/// Parsed by splitting the request path on `/`; empty segments (leading,
/// trailing, or doubled slashes) are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathSegments(Vec<String>);

impl PathSegments {
    /// Parse segments from a request path.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('/')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    /// Build from already-split segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first `len` segments, root-side.
    ///
    /// `prefix(0)` is the empty prefix used for the root layout.
    pub fn prefix(&self, len: usize) -> &[String] {
        &self.0[..len]
    }

    /// All segments as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for PathSegments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}
