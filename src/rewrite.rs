//! Document-order rewrite: every reference becomes a link (or an invalid
//! span) and every target is replaced through its effective resolver.
//!
//! Targets are replaced before their children are visited, so positional
//! resolvers see targets in the same pre-order they were collected in.
use std::collections::HashMap;

use crate::ast::{Block, Document, LinkReference, Node, ReferenceKind, Span};
use crate::collect::block_selector;
use crate::config::Config;
use crate::resolver::{LinkSource, invalid_reference_span};
use crate::scope::{DocumentScope, TreeScope};
use crate::selector::{Selector, SequenceSelector, UniqueSelector};
use crate::slug::slugify;

/// State of one document rewrite.
struct Rewriter<'a> {
    /// Decides which blocks are targets.
    config: &'a Config,
    /// Targets seen so far per selector.
    occurrences: HashMap<Selector, usize>,
    /// The document's own resolvers.
    scope: &'a mut DocumentScope,
    /// Tree-wide resolvers.
    tree: &'a mut TreeScope,
}

impl Rewriter<'_> {
    /// Count one more target under `selector`, returning its position.
    fn next_occurrence(&mut self, selector: &Selector) -> usize {
        let count = self.occurrences.entry(selector.clone()).or_insert(0);
        let occurrence = *count;
        *count = occurrence.saturating_add(1);
        return occurrence;
    }

    /// Resolve a reference by id: link definitions first, then target ids,
    /// first in the document and then tree-wide.
    fn resolve_by_id(&mut self, id: &str, source: &LinkSource) -> Option<Span> {
        let mut candidates = vec![
            UniqueSelector::LinkDefinition(id.to_string()),
            UniqueSelector::TargetId(id.to_string()),
        ];
        let slug = slugify(id);
        if !slug.is_empty() && slug != id {
            candidates.push(UniqueSelector::TargetId(slug));
        }

        for unique in &candidates {
            if let Some(resolver) = self.scope.get_mut(&Selector::Unique(unique.clone())) {
                return resolver.resolve_reference(source);
            }
        }
        for unique in &candidates {
            if let Some(resolver) = self.tree.get_mut(unique) {
                return resolver.resolve_reference(source);
            }
        }
        return None;
    }

    /// Turn a reference into its final span.
    fn resolve_reference(&mut self, reference: LinkReference) -> Span {
        let base = self.scope.path().clone();
        let selector = reference.selector(&base);
        let source = LinkSource::new(reference, base);

        let resolved = match (&source.reference.kind, &selector) {
            (ReferenceKind::Id { id }, _) => self.resolve_by_id(id, &source),
            (_, Selector::Unique(unique)) => {
                self.tree.get_mut(unique).and_then(|resolver| return resolver.resolve_reference(&source))
            },
            (_, Selector::Sequence(_)) => {
                self.scope.get_mut(&selector).and_then(|resolver| return resolver.resolve_reference(&source))
            },
        };

        return resolved.unwrap_or_else(|| {
            let message = unresolved_message(&source.reference, &selector);
            tracing::debug!(document = %source.path, %message, "reference not resolved");
            return invalid_reference_span(&message, &source);
        });
    }

    /// Replace a block if it is a target, then rewrite what it contains.
    /// Returns `None` when the block is removed. An invalid block already in
    /// the input was never collected and passes through untouched.
    fn rewrite_block(&mut self, block: Block) -> Option<Block> {
        if matches!(block, Block::Invalid { .. }) {
            return Some(block);
        }
        let replaced = match block_selector(&block, self.config) {
            None => block,
            Some(selector) => {
                let occurrence = self.next_occurrence(&selector);
                self.scope.replace_target(&selector, occurrence, &Node::from(block))?.into_block()?
            },
        };
        return Some(self.rewrite_block_children(replaced));
    }

    /// Rewrite the children of an already replaced block. A block invalidated
    /// by its own replacement still has its collected children rewritten.
    fn rewrite_block_children(&mut self, block: Block) -> Block {
        return match block {
            Block::Footnote { content, label, options } => Block::Footnote {
                content: self.rewrite_blocks(content),
                label,
                options,
            },
            Block::Header { content, level, options } => Block::Header {
                content: self.rewrite_spans(content),
                level,
                options,
            },
            Block::Invalid { fallback, message } => Block::Invalid {
                fallback: Box::new(self.rewrite_block_children(*fallback)),
                message,
            },
            Block::Paragraph { content, options } => Block::Paragraph {
                content: self.rewrite_spans(content),
                options,
            },
            Block::Quote { content, options } => Block::Quote {
                content: self.rewrite_blocks(content),
                options,
            },
            other @ (Block::LinkAlias(_) | Block::LinkDefinition(_)) => other,
        };
    }

    /// Rewrite a list of blocks, dropping removed ones.
    fn rewrite_blocks(&mut self, blocks: Vec<Block>) -> Vec<Block> {
        return blocks.into_iter().filter_map(|block| return self.rewrite_block(block)).collect();
    }

    /// Resolve a reference, or replace a span target, then rewrite children.
    /// Invalid spans already in the input pass through untouched.
    fn rewrite_span(&mut self, span: Span) -> Option<Span> {
        let span = match span {
            Span::Reference(reference) => return Some(self.resolve_reference(reference)),
            invalid @ Span::Invalid { .. } => return Some(invalid),
            other => other,
        };

        let replaced = match span.id().map(str::to_string) {
            None => span,
            Some(id) => {
                let selector = Selector::Unique(UniqueSelector::TargetId(id));
                let occurrence = self.next_occurrence(&selector);
                self.scope.replace_target(&selector, occurrence, &Node::Span(span))?.into_span()?
            },
        };
        return Some(self.rewrite_span_children(replaced));
    }

    /// Rewrite the children of an already replaced span.
    fn rewrite_span_children(&mut self, span: Span) -> Span {
        return match span {
            Span::Emphasized { content, options } => Span::Emphasized {
                content: self.rewrite_spans(content),
                options,
            },
            Span::Invalid { fallback, message } => Span::Invalid {
                fallback: Box::new(self.rewrite_span_children(*fallback)),
                message,
            },
            Span::Link { content, options, target, title } => Span::Link {
                content: self.rewrite_spans(content),
                options,
                target,
                title,
            },
            other @ (Span::FootnoteLink { .. } | Span::Reference(_) | Span::Text { .. }) => other,
        };
    }

    /// Rewrite a list of spans, dropping removed ones.
    fn rewrite_spans(&mut self, spans: Vec<Span>) -> Vec<Span> {
        return spans.into_iter().filter_map(|span| return self.rewrite_span(span)).collect();
    }
}

/// Rewrite `document` against its own scope and the tree scope.
pub fn rewrite_document(document: Document, scope: &mut DocumentScope, tree: &mut TreeScope, config: &Config) -> Document {
    let mut rewriter = Rewriter {
        config,
        occurrences: HashMap::new(),
        scope,
        tree,
    };
    let content = rewriter.rewrite_blocks(document.content);
    return Document::new(document.path, content);
}

/// Diagnostic for a reference no resolver answered.
fn unresolved_message(reference: &LinkReference, selector: &Selector) -> String {
    return match (&reference.kind, selector) {
        (ReferenceKind::Id { id }, _) => format!("unresolved link id reference: {id}"),
        (_, Selector::Sequence(SequenceSelector::Anonymous)) => "too many anonymous link references".to_string(),
        (_, Selector::Sequence(SequenceSelector::AutoNumber)) => {
            "too many autonumber footnote references".to_string()
        },
        (_, Selector::Sequence(SequenceSelector::AutoSymbol)) => {
            "too many autosymbol footnote references".to_string()
        },
        (_, Selector::Unique(UniqueSelector::Path(path))) => format!("unresolved link reference: {path}"),
        (_, Selector::Unique(unique)) => format!("unresolved {}", unique.description()),
    };
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;
    use crate::ast::{FootnoteLabel, LinkTarget, Options};
    use crate::collect::collect_document;
    use crate::path::DocPath;

    fn reference(kind: ReferenceKind, source: &str) -> Span {
        return Span::Reference(LinkReference {
            content: Vec::new(),
            kind,
            source: source.to_string(),
        });
    }

    fn rewrite(content: Vec<Block>) -> Vec<Block> {
        let config = Config::default();
        let document = Document::new(DocPath::parse("/doc.json").unwrap(), content);
        let collected = collect_document(&document, &config);
        let mut tree = TreeScope::build(&DocPath::root(), std::slice::from_ref(&collected));
        let mut scope = DocumentScope::build(collected);
        scope.resolve_aliases(&tree);
        return rewrite_document(document, &mut scope, &mut tree, &config).content;
    }

    fn paragraph(content: Vec<Span>) -> Block {
        return Block::Paragraph {
            content,
            options: Options::default(),
        };
    }

    fn auto_footnote(label: FootnoteLabel) -> Block {
        return Block::Footnote {
            content: vec![paragraph(vec![Span::text("note")])],
            label,
            options: Options::default(),
        };
    }

    fn header(text: &str) -> Block {
        return Block::Header {
            content: vec![Span::text(text)],
            level: 2,
            options: Options::default(),
        };
    }

    fn spans_of(block: Option<&Block>) -> Vec<Span> {
        return match block {
            Some(Block::Paragraph { content, .. }) => content.clone(),
            _ => Vec::new(),
        };
    }

    #[test]
    fn footnotes_are_numbered_in_document_order() {
        let footnote = || {
            return Block::Footnote {
                content: vec![paragraph(vec![Span::text("note")])],
                label: FootnoteLabel::AutoNumber,
                options: Options::default(),
            };
        };
        let out = rewrite(vec![
            paragraph(vec![reference(ReferenceKind::AutoNumber, "[#]_"), reference(ReferenceKind::AutoNumber, "[#]_")]),
            footnote(),
            footnote(),
        ]);

        assert_eq!(
            spans_of(out.first()),
            vec![
                Span::FootnoteLink {
                    label: "1".to_string(),
                    target_id: "__fn-1".to_string(),
                },
                Span::FootnoteLink {
                    label: "2".to_string(),
                    target_id: "__fn-2".to_string(),
                },
            ]
        );
        assert!(
            matches!(out.get(2), Some(Block::Footnote { label: FootnoteLabel::Assigned { text }, options, .. })
                if text == "2" && options.id.as_deref() == Some("__fn-2")),
            "second footnote not labelled: {:?}",
            out.get(2)
        );
    }

    #[test]
    fn surplus_anonymous_reference_is_reported() {
        let out = rewrite(vec![paragraph(vec![reference(ReferenceKind::Anonymous, "`x`__")])]);
        assert!(
            matches!(spans_of(out.first()).first(), Some(Span::Invalid { message, .. }) if message == "too many anonymous link references"),
            "surplus anonymous reference not reported"
        );
    }

    #[test]
    fn link_definitions_are_removed_and_references_resolved() {
        let definition = Block::LinkDefinition(crate::ast::LinkDefinition {
            id: Some("home".to_string()),
            target: LinkTarget::External {
                url: "https://example.com".to_string(),
            },
            title: None,
        });
        let out = rewrite(vec![
            paragraph(vec![reference(ReferenceKind::Id { id: "home".to_string() }, "`home`_")]),
            definition,
        ]);
        assert_eq!(out.len(), 1, "link definition not removed");
        assert!(
            matches!(spans_of(out.first()).first(), Some(Span::Link { target: LinkTarget::External { url }, .. }) if url == "https://example.com"),
            "reference not resolved"
        );
    }

    #[test]
    fn unknown_id_is_reported() {
        let out = rewrite(vec![paragraph(vec![reference(ReferenceKind::Id { id: "nope".to_string() }, "`nope`_")])]);
        let spans = spans_of(out.first());
        let Some(Span::Invalid { fallback, message }) = spans.first() else {
            panic!("expected invalid span, got {spans:?}");
        };
        assert_eq!(message, "unresolved link id reference: nope");
        assert_eq!(fallback.plain_text(), "`nope`_");
    }

    #[test]
    fn reference_text_matches_derived_header_id() {
        let out = rewrite(vec![
            Block::Header {
                content: vec![Span::text("Getting Started")],
                level: 1,
                options: Options::default(),
            },
            paragraph(vec![reference(
                ReferenceKind::Id {
                    id: "Getting Started".to_string(),
                },
                "`Getting Started`_",
            )]),
        ]);
        assert_eq!(out.first().and_then(Block::id), Some("getting-started"));
        assert!(
            matches!(spans_of(out.get(1)).first(), Some(Span::Link { target: LinkTarget::Internal { path }, .. })
                if path.to_string() == "/doc.json#getting-started"),
            "reference did not reach the header"
        );
    }

    #[test]
    fn duplicate_explicit_ids_become_invalid_targets() {
        let named = || {
            return Block::Paragraph {
                content: vec![Span::text("body")],
                options: Options::with_id("dup"),
            };
        };
        let out = rewrite(vec![named(), named()]);
        for block in &out {
            assert!(
                matches!(block, Block::Invalid { fallback, message }
                    if fallback.id().is_none() && message == "More than one link target with id 'dup' in path /doc.json"),
                "duplicate target not invalidated: {block:?}"
            );
        }
    }

    #[test]
    fn auto_symbol_footnotes_take_configured_symbols() {
        let out = rewrite(vec![
            paragraph(vec![
                reference(ReferenceKind::AutoSymbol, "[*]_"),
                reference(ReferenceKind::AutoSymbol, "[*]_"),
                reference(ReferenceKind::AutoSymbol, "[*]_"),
            ]),
            auto_footnote(FootnoteLabel::AutoSymbol),
            auto_footnote(FootnoteLabel::AutoSymbol),
        ]);

        let spans = spans_of(out.first());
        assert_eq!(
            spans.get(..2),
            Some(
                &[
                    Span::FootnoteLink {
                        label: "*".to_string(),
                        target_id: "__fns-1".to_string(),
                    },
                    Span::FootnoteLink {
                        label: "\u{2020}".to_string(),
                        target_id: "__fns-2".to_string(),
                    },
                ][..]
            )
        );
        assert!(
            matches!(spans.get(2), Some(Span::Invalid { message, .. }) if message == "too many autosymbol footnote references"),
            "surplus auto-symbol reference not reported: {spans:?}"
        );
        assert!(
            matches!(out.get(1), Some(Block::Footnote { label: FootnoteLabel::Assigned { text }, options, .. })
                if text == "*" && options.id.as_deref() == Some("__fns-1")),
            "first footnote not labelled: {:?}",
            out.get(1)
        );
        assert!(
            matches!(out.get(2), Some(Block::Footnote { label: FootnoteLabel::Assigned { text }, options, .. })
                if text == "\u{2020}" && options.id.as_deref() == Some("__fns-2")),
            "second footnote not labelled: {:?}",
            out.get(2)
        );
    }

    #[test]
    fn surplus_auto_number_reference_is_reported() {
        let out = rewrite(vec![
            paragraph(vec![reference(ReferenceKind::AutoNumber, "[#]_"), reference(ReferenceKind::AutoNumber, "[#]_")]),
            auto_footnote(FootnoteLabel::AutoNumber),
        ]);
        let spans = spans_of(out.first());
        assert!(matches!(spans.first(), Some(Span::FootnoteLink { label, .. }) if label == "1"), "first reference: {spans:?}");
        assert!(
            matches!(spans.get(1), Some(Span::Invalid { message, .. }) if message == "too many autonumber footnote references"),
            "surplus auto-number reference not reported: {spans:?}"
        );
    }

    #[test]
    fn number_and_symbol_footnotes_count_separately() {
        let out = rewrite(vec![
            auto_footnote(FootnoteLabel::AutoSymbol),
            auto_footnote(FootnoteLabel::AutoNumber),
        ]);
        assert_eq!(out.first().and_then(Block::id), Some("__fns-1"));
        assert_eq!(out.get(1).and_then(Block::id), Some("__fn-1"));
    }

    #[test]
    fn invalid_input_block_is_kept_and_not_counted() {
        let named = |text: &str| {
            return Block::Paragraph {
                content: vec![Span::text(text)],
                options: Options::with_id("x"),
            };
        };
        let earlier = Block::Invalid {
            fallback: Box::new(Block::Quote {
                content: vec![named("stale")],
                options: Options::default(),
            }),
            message: "from an earlier pass".to_string(),
        };
        let out = rewrite(vec![
            earlier.clone(),
            named("live"),
            paragraph(vec![reference(ReferenceKind::Id { id: "x".to_string() }, "`x`_")]),
        ]);

        assert_eq!(out.first(), Some(&earlier));
        assert_eq!(out.get(1).and_then(Block::id), Some("x"));
        assert!(
            matches!(spans_of(out.get(2)).first(), Some(Span::Link { target: LinkTarget::Internal { path }, .. })
                if path.to_string() == "/doc.json#x"),
            "reference did not reach the live target"
        );
    }

    #[test]
    fn invalid_input_span_is_kept() {
        let earlier = Span::Invalid {
            fallback: Box::new(Span::text("old").with_id("x")),
            message: "from an earlier pass".to_string(),
        };
        let out = rewrite(vec![paragraph(vec![earlier.clone(), Span::text("new").with_id("x")])]);
        let spans = spans_of(out.first());
        assert_eq!(spans.first(), Some(&earlier));
        assert_eq!(spans.get(1).and_then(Span::id), Some("x"));
    }

    #[test]
    fn headers_with_the_same_derived_id_are_both_invalid() {
        let out = rewrite(vec![header("Setup"), header("Setup!")]);
        for block in &out {
            assert!(
                matches!(block, Block::Invalid { message, .. }
                    if message == "More than one link target with id 'setup' in path /doc.json"),
                "colliding header not invalidated: {block:?}"
            );
        }
    }

    #[test]
    fn explicit_id_outranks_colliding_header_slug() {
        let out = rewrite(vec![
            header("Setup"),
            Block::Paragraph {
                content: vec![Span::text("install steps")],
                options: Options::with_id("setup"),
            },
            paragraph(vec![reference(ReferenceKind::Id { id: "Setup".to_string() }, "`Setup`_")]),
        ]);

        assert!(
            matches!(out.first(), Some(Block::Header { options, .. }) if options.id.is_none()),
            "header kept the contested id: {:?}",
            out.first()
        );
        assert_eq!(out.get(1).and_then(Block::id), Some("setup"));
        assert!(
            matches!(spans_of(out.get(2)).first(), Some(Span::Link { target: LinkTarget::Internal { path }, .. })
                if path.to_string() == "/doc.json#setup"),
            "slug fallback did not reach the explicit target"
        );
    }
}
