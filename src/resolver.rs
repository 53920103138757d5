//! Target resolvers: the unit that turns a reference into a link and a
//! target node into its final form.
//!
//! A resolver is registered under a [`Selector`] and has two operations:
//!
//! - `resolve_reference` produces the span replacing a reference node.
//! - `replace_target` produces the node replacing a target node.
//!
//! `None` from either operation means "nothing to do here", never an error.
//! Resolution failures are embedded in the tree as invalid nodes carrying a
//! diagnostic message, so a broken reference never aborts the pass.
use std::fmt;
use std::sync::Arc;

use crate::alias::LinkAliasResolver;
use crate::ast::{Block, LinkReference, Node, Span};
use crate::path::DocPath;
use crate::selector::{Selector, UniqueSelector};
use crate::sequence::TargetSequenceResolver;

/// Produces the span replacing a reference.
pub type ReferenceFn = Arc<dyn Fn(&LinkSource) -> Option<Span> + Send + Sync>;

/// Produces the node replacing a target, or `None` to drop it.
pub type TargetFn = Arc<dyn Fn(&Node) -> Option<Node> + Send + Sync>;

/// A reference being resolved, together with the document it occurs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSource {
    /// Path of the document containing the reference.
    pub path: DocPath,
    /// The reference node.
    pub reference: LinkReference,
}

/// The closed set of resolver behaviors.
#[derive(Clone)]
pub enum TargetResolver {
    /// Named indirection to another selector.
    Alias(LinkAliasResolver),
    /// Another resolver's behavior under a different selector.
    Delegate {
        /// The resolver whose behavior is re-exposed.
        delegate: Box<TargetResolver>,
        /// The selector this resolver is registered under.
        selector: Selector,
    },
    /// Reports `message` for every reference and target.
    Invalid {
        /// Diagnostic shown in place of the failed resolution.
        message: String,
        /// The selector that failed.
        selector: Selector,
    },
    /// Positional pairing of references and targets.
    Sequence(TargetSequenceResolver),
    /// Inline anchor that only attaches to span-shaped nodes.
    SpanTarget {
        /// Id stamped onto the span.
        id: String,
        /// Builds the link for a reference.
        reference: ReferenceFn,
    },
    /// Ordinary target backed by two functions.
    Static {
        /// Tie-break rank among duplicate claims; higher wins.
        precedence: i32,
        /// Builds the link for a reference.
        reference: ReferenceFn,
        /// The selector this resolver is registered under.
        selector: Selector,
        /// Builds the replacement for the target node.
        target: TargetFn,
    },
}

impl LinkSource {
    /// Pair a reference with the path of its document.
    pub const fn new(reference: LinkReference, path: DocPath) -> Self {
        return Self { path, reference };
    }
}

impl TargetResolver {
    /// Wrap two plain functions into a resolver with default precedence.
    pub fn create(
        selector: Selector,
        reference: impl Fn(&LinkSource) -> Option<Span> + Send + Sync + 'static,
        target: impl Fn(&Node) -> Option<Node> + Send + Sync + 'static,
    ) -> Self {
        return Self::Static {
            precedence: 0,
            reference: Arc::new(reference),
            selector,
            target: Arc::new(target),
        };
    }

    /// Re-expose `delegate`'s behavior under `selector`.
    pub fn for_delegate(selector: Selector, delegate: Self) -> Self {
        return Self::Delegate {
            delegate: Box::new(delegate),
            selector,
        };
    }

    /// Reduce several resolvers claiming one unique selector to one.
    ///
    /// Candidates are ranked by precedence. A single top-ranked candidate is
    /// returned unchanged and the rest are discarded silently. A tie at the
    /// top yields an invalid resolver, so every reference to the selector is
    /// reported as ambiguous. Returns `None` only for an empty candidate list.
    pub fn for_duplicate_selector(
        selector: &UniqueSelector,
        path: &DocPath,
        mut candidates: Vec<Self>,
    ) -> Option<Self> {
        if candidates.is_empty() {
            return None;
        }

        if let Some(index) = winning_candidate(&candidates) {
            return Some(candidates.swap_remove(index));
        }

        tracing::warn!(selector = %selector.description(), %path, "duplicate target with equal precedence");
        let message = format!("More than one {} in path {path}", selector.description());
        return Some(Self::for_invalid_target(Selector::Unique(selector.clone()), &message));
    }

    /// A resolver that reports `message` for every reference and target.
    pub fn for_invalid_target(selector: Selector, message: &str) -> Self {
        return Self::Invalid {
            message: message.to_string(),
            selector,
        };
    }

    /// A target that only attaches to spans, stamping `id` onto them.
    pub fn for_span_target(
        id: &str,
        reference: impl Fn(&LinkSource) -> Option<Span> + Send + Sync + 'static,
    ) -> Self {
        return Self::SpanTarget {
            id: id.to_string(),
            reference: Arc::new(reference),
        };
    }

    /// Tie-break rank; 0 unless set explicitly.
    pub fn precedence(&self) -> i32 {
        return match self {
            Self::Delegate { delegate, .. } => delegate.precedence(),
            Self::Static { precedence, .. } => *precedence,
            Self::Alias(_) | Self::Invalid { .. } | Self::Sequence(_) | Self::SpanTarget { .. } => 0,
        };
    }

    /// Replace the target node, or return `None` if this resolver has
    /// nothing to say about nodes of this shape.
    pub fn replace_target(&mut self, node: &Node) -> Option<Node> {
        return match self {
            Self::Alias(alias) => alias.replace_target(node),
            Self::Delegate { delegate, .. } => delegate.replace_target(node),
            Self::Invalid { message, .. } => invalid_target_node(message, node),
            Self::Sequence(sequence) => sequence.replace_target(node),
            Self::SpanTarget { id, .. } => match node {
                Node::Span(span) => Some(Node::Span(span.with_id(id))),
                Node::Block(_) | Node::Definition(_) => None,
            },
            Self::Static { target, .. } => target(node),
        };
    }

    /// Resolve a reference to its final span.
    pub fn resolve_reference(&mut self, source: &LinkSource) -> Option<Span> {
        return match self {
            Self::Alias(alias) => alias.resolve_reference(source),
            Self::Delegate { delegate, .. } => delegate.resolve_reference(source),
            Self::Invalid { message, .. } => Some(invalid_reference_span(message, source)),
            Self::Sequence(sequence) => sequence.resolve_reference(source),
            Self::SpanTarget { reference, .. } | Self::Static { reference, .. } => reference(source),
        };
    }

    /// The selector this resolver is registered under.
    pub fn selector(&self) -> Selector {
        return match self {
            Self::Alias(alias) => Selector::Unique(alias.selector()),
            Self::Delegate { selector, .. }
            | Self::Invalid { selector, .. }
            | Self::Static { selector, .. } => selector.clone(),
            Self::Sequence(sequence) => Selector::Sequence(sequence.selector()),
            Self::SpanTarget { id, .. } => Selector::Unique(UniqueSelector::TargetId(id.clone())),
        };
    }

    /// Set the tie-break rank. Only function-backed resolvers carry one;
    /// other variants are returned unchanged.
    #[must_use]
    pub fn with_precedence(self, rank: i32) -> Self {
        return match self {
            Self::Static { reference, selector, target, .. } => Self::Static {
                precedence: rank,
                reference,
                selector,
                target,
            },
            other => other,
        };
    }
}

impl fmt::Debug for TargetResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Self::Alias(alias) => f.debug_tuple("Alias").field(alias).finish(),
            Self::Delegate { delegate, selector } => f
                .debug_struct("Delegate")
                .field("selector", selector)
                .field("delegate", delegate)
                .finish(),
            Self::Invalid { message, selector } => f
                .debug_struct("Invalid")
                .field("selector", selector)
                .field("message", message)
                .finish(),
            Self::Sequence(sequence) => f.debug_tuple("Sequence").field(sequence).finish(),
            Self::SpanTarget { id, .. } => f.debug_struct("SpanTarget").field("id", id).finish_non_exhaustive(),
            Self::Static { precedence, selector, .. } => f
                .debug_struct("Static")
                .field("selector", selector)
                .field("precedence", precedence)
                .finish_non_exhaustive(),
        };
    }
}

/// Wrap the reference's original markup in an invalid span.
pub fn invalid_reference_span(message: &str, source: &LinkSource) -> Span {
    return Span::Invalid {
        fallback: Box::new(Span::text(&source.reference.source)),
        message: message.to_string(),
    };
}

/// Strip the node's id and wrap it as an invalid block or span.
/// Definitions have no invalid form.
fn invalid_target_node(message: &str, node: &Node) -> Option<Node> {
    return match node.without_id() {
        Node::Block(block) => Some(Node::Block(Block::Invalid {
            fallback: Box::new(block),
            message: message.to_string(),
        })),
        Node::Definition(_) => None,
        Node::Span(span) => Some(Node::Span(Span::Invalid {
            fallback: Box::new(span),
            message: message.to_string(),
        })),
    };
}

/// Index of the single candidate with the highest precedence, or `None`
/// if the list is empty or two or more candidates tie at the top.
/// The first candidate wins among equal lower ranks; only the top matters.
pub fn winning_candidate(candidates: &[TargetResolver]) -> Option<usize> {
    let top = candidates.iter().map(TargetResolver::precedence).max()?;
    let mut at_top = candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| return candidate.precedence() == top)
        .map(|(index, _)| return index);

    let first = at_top.next()?;
    if at_top.next().is_some() {
        return None;
    }
    return Some(first);
}
