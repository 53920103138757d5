//! Selectors classify what a target or reference is matched against.
//!
//! A selector has two independent properties:
//!
//! - `global`: whether matching may cross document boundaries.
//! - `unique`: whether at most one live resolver may claim the selector.
//!
//! Only two combinations exist today. Unique selectors (by id, by link
//! definition id, by path) are global; sequence selectors (anonymous links,
//! auto-numbered and auto-symbol footnotes) are neither global nor unique and
//! are matched by position.
use std::fmt;

use crate::path::DocPath;

/// Key under which resolvers are registered and references looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Selector {
    /// Positional selector shared by many targets and references.
    Sequence(SequenceSelector),
    /// Selector that identifies exactly one target.
    Unique(UniqueSelector),
}

/// Payload-free markers matched by position within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SequenceSelector {
    /// Anonymous link definitions and references (`__`).
    Anonymous,
    /// Auto-numbered footnotes (`[#]`).
    AutoNumber,
    /// Auto-symbol footnotes (`[*]`).
    AutoSymbol,
}

/// Selectors that must be claimed by at most one effective resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UniqueSelector {
    /// A named link definition (`.. _id: url`).
    LinkDefinition(String),
    /// A document or a fragment within it, addressed by path.
    Path(DocPath),
    /// Any node carrying this id (headers, anchors, named blocks).
    TargetId(String),
}

impl Selector {
    /// Human-readable description for diagnostics; only unique selectors have one.
    pub fn description(&self) -> Option<String> {
        return match self {
            Self::Sequence(_) => None,
            Self::Unique(unique) => Some(unique.description()),
        };
    }

    /// Whether matching may cross document boundaries.
    pub const fn is_global(&self) -> bool {
        return match self {
            Self::Sequence(_) => false,
            Self::Unique(_) => true,
        };
    }

    /// Whether at most one resolver may claim this selector.
    pub const fn is_unique(&self) -> bool {
        return match self {
            Self::Sequence(_) => false,
            Self::Unique(_) => true,
        };
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Self::Sequence(sequence) => write!(f, "{sequence}"),
            Self::Unique(unique) => write!(f, "{}", unique.description()),
        };
    }
}

impl From<SequenceSelector> for Selector {
    fn from(selector: SequenceSelector) -> Self {
        return Self::Sequence(selector);
    }
}

impl From<UniqueSelector> for Selector {
    fn from(selector: UniqueSelector) -> Self {
        return Self::Unique(selector);
    }
}

impl fmt::Display for SequenceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Anonymous => "anonymous link",
            Self::AutoNumber => "autonumber footnote",
            Self::AutoSymbol => "autosymbol footnote",
        };
        return f.write_str(name);
    }
}

impl UniqueSelector {
    /// Description used verbatim in diagnostics, e.g. `link target with id 'x'`.
    pub fn description(&self) -> String {
        return match self {
            Self::LinkDefinition(id) => format!("link definition with id '{id}'"),
            Self::Path(path) => format!("link target with path '{path}'"),
            Self::TargetId(id) => format!("link target with id '{id}'"),
        };
    }
}
