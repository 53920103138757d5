//! Positional pairing of references and targets sharing a sequence selector.
//!
//! Anonymous links and auto-labelled footnotes have no name to match on:
//! the Nth reference in a document goes to the Nth target. Reference
//! resolution and target replacement advance independent cursors, so a
//! rewrite pass may visit references and targets in any relative order.
//!
//! Surplus references resolve to nothing (the driver decides how to report
//! them) and surplus targets are left untouched. The cursors carry no
//! locking: an instance belongs to exactly one resolution pass.
use crate::ast::{Node, Span};
use crate::resolver::{LinkSource, TargetResolver};
use crate::selector::SequenceSelector;

/// Serves an ordered list of resolvers by position.
#[derive(Debug, Clone)]
pub struct TargetSequenceResolver {
    /// Position of the next `resolve_reference` call.
    next_reference: usize,
    /// Position of the next `replace_target` call.
    next_target: usize,
    /// Underlying resolvers in document order.
    resolvers: Vec<TargetResolver>,
    /// The shared selector.
    selector: SequenceSelector,
}

impl TargetSequenceResolver {
    /// Wrap `resolvers`, ordered by document encounter, under `selector`.
    pub const fn new(selector: SequenceSelector, resolvers: Vec<TargetResolver>) -> Self {
        return Self {
            next_reference: 0,
            next_target: 0,
            resolvers,
            selector,
        };
    }

    /// Replace the next target in sequence; `None` once the list is exhausted.
    pub fn replace_target(&mut self, node: &Node) -> Option<Node> {
        let index = self.next_target;
        self.next_target = index.saturating_add(1);
        return self.resolvers.get_mut(index)?.replace_target(node);
    }

    /// Resolve the next reference in sequence; `None` once the list is exhausted.
    pub fn resolve_reference(&mut self, source: &LinkSource) -> Option<Span> {
        let index = self.next_reference;
        self.next_reference = index.saturating_add(1);
        return self.resolvers.get_mut(index)?.resolve_reference(source);
    }

    /// The selector shared by all underlying resolvers.
    pub const fn selector(&self) -> SequenceSelector {
        return self.selector;
    }
}
