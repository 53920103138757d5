//! Virtual document paths: absolute, `/`-separated, with an optional `#fragment`.
use std::fmt;

use crate::error::Error;

/// An absolute path inside a document tree, optionally pointing at a
/// fragment (target id) within the document.
///
/// Segments never contain `.`, `..`, or empty components; `join` and
/// `parse` normalize them away.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocPath {
    /// Fragment after `#`, without the `#`.
    fragment: Option<String>,
    /// Normalized path segments below the root.
    segments: Vec<String>,
}

impl DocPath {
    /// The fragment after `#`, if any.
    pub fn fragment(&self) -> Option<&str> {
        return self.fragment.as_deref();
    }

    /// Resolve `relative` against this path's document.
    ///
    /// A leading `/` makes `relative` absolute. A bare `#frag` keeps the
    /// current document and replaces the fragment. Otherwise `relative` is
    /// resolved against this document's parent directory; `..` above the
    /// root is clamped at the root.
    pub fn join(&self, relative: &str) -> Self {
        let (raw_path, fragment) = split_fragment(relative);

        if raw_path.is_empty() {
            return Self {
                fragment,
                segments: self.segments.clone(),
            };
        }

        let mut segments = if raw_path.starts_with('/') {
            Vec::new()
        } else {
            self.parent().segments
        };
        for component in raw_path.split('/') {
            push_normalized_segment(&mut segments, component);
        }

        return Self { fragment, segments };
    }

    /// The containing directory, without fragment. The root is its own parent.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        return Self {
            fragment: None,
            segments,
        };
    }

    /// Parse an absolute path such as `/guide/intro.json#setup`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if `raw` does not start with `/`.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        if !raw.starts_with('/') {
            return Err(Error::InvalidPath {
                path: raw.to_string(),
                reason: "virtual paths must be absolute".to_string(),
            });
        }
        return Ok(Self::root().join(raw));
    }

    /// The root of the tree (`/`).
    pub const fn root() -> Self {
        return Self {
            fragment: None,
            segments: Vec::new(),
        };
    }

    /// A copy of this path pointing at `fragment` within the same document.
    pub fn with_fragment(&self, fragment: &str) -> Self {
        return Self {
            fragment: Some(fragment.to_string()),
            segments: self.segments.clone(),
        };
    }

    /// A copy of this path with the fragment removed.
    pub fn without_fragment(&self) -> Self {
        return Self {
            fragment: None,
            segments: self.segments.clone(),
        };
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))?;
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        return Ok(());
    }
}

impl From<DocPath> for String {
    fn from(path: DocPath) -> Self {
        return path.to_string();
    }
}

impl TryFrom<String> for DocPath {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        return Self::parse(&raw);
    }
}

/// Handle a single component during normalization.
/// `..` pops the last segment; at the root there is nothing left to pop.
fn push_normalized_segment(segments: &mut Vec<String>, component: &str) {
    match component {
        "" | "." => {},
        ".." => {
            segments.pop();
        },
        other => segments.push(other.to_string()),
    }
    return;
}

/// Split `raw` at the first `#` into path and non-empty fragment.
fn split_fragment(raw: &str) -> (&str, Option<String>) {
    return match raw.split_once('#') {
        None => (raw, None),
        Some((path, "")) => (path, None),
        Some((path, fragment)) => (path, Some(fragment.to_string())),
    };
}
