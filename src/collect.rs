//! Discovery of target nodes and the resolvers they contribute.
//!
//! Walks a document in pre-order and emits one candidate resolver per target
//! node, grouped by selector in encounter order. Nothing is deduplicated
//! here; that is the job of [`crate::scope`].
use std::collections::BTreeMap;

use crate::alias::LinkAliasResolver;
use crate::ast::{Block, Document, FootnoteLabel, LinkDefinition, LinkTarget, Node, Options, Span};
use crate::config::Config;
use crate::path::DocPath;
use crate::resolver::{LinkSource, TargetResolver};
use crate::selector::{Selector, SequenceSelector, UniqueSelector};
use crate::slug::slugify;

/// Footnote labels handed out by position.
#[derive(Debug, Clone, Copy)]
enum AutoFootnote {
    /// `[#]`, numbered from 1.
    Number,
    /// `[*]`, drawn from the configured symbols.
    Symbol,
}

/// Candidates discovered in one document.
#[derive(Debug, Clone)]
pub struct CollectedTargets {
    /// Candidates looked up from within the document, by selector.
    pub local: BTreeMap<Selector, Vec<TargetResolver>>,
    /// The document's path.
    pub path: DocPath,
    /// Path-addressed candidates, looked up tree-wide.
    pub paths: BTreeMap<UniqueSelector, Vec<TargetResolver>>,
}

/// Mutable state threaded through one document walk.
struct Collector<'a> {
    /// Id and footnote settings.
    config: &'a Config,
    /// Output being built.
    targets: CollectedTargets,
}

impl Collector<'_> {
    /// Register a footnote with an automatic label at its sequence position.
    fn add_auto_footnote(&mut self, kind: AutoFootnote) {
        let selector = match kind {
            AutoFootnote::Number => SequenceSelector::AutoNumber,
            AutoFootnote::Symbol => SequenceSelector::AutoSymbol,
        };
        let position = self
            .targets
            .local
            .get(&Selector::Sequence(selector))
            .map_or(0, Vec::len)
            .saturating_add(1);

        let (label, id) = match kind {
            AutoFootnote::Number => (position.to_string(), format!("__fn-{position}")),
            AutoFootnote::Symbol => {
                (self.config.footnotes.symbol_at(position.saturating_sub(1)), format!("__fns-{position}"))
            },
        };

        let resolver = TargetResolver::create(
            Selector::Sequence(selector),
            footnote_link(label.clone(), id.clone()),
            assign_footnote(label, id),
        );
        self.push(resolver);
        return;
    }

    /// Register an id-bearing block and its path-addressed twin.
    fn add_id_target(&mut self, id: &str, precedence: i32, fallback_text: String) {
        let fragment = self.targets.path.with_fragment(id);
        let local = TargetResolver::create(
            target_id(id),
            internal_link(fragment.clone(), fallback_text.clone()),
            stamp_id(id.to_string()),
        )
        .with_precedence(precedence);
        self.push(local);

        let published = TargetResolver::create(
            Selector::Unique(UniqueSelector::Path(fragment.clone())),
            internal_link(fragment.clone(), fallback_text),
            |_| return None,
        )
        .with_precedence(precedence);
        self.publish(fragment, published);
        return;
    }

    /// Visit a block, then everything nested inside it. Invalid blocks left
    /// by an earlier pass are not searched; the rewrite keeps them as they are.
    fn collect_block(&mut self, block: &Block) {
        self.register_block(block);

        match block {
            Block::Footnote { content, .. } | Block::Quote { content, .. } => {
                for child in content {
                    self.collect_block(child);
                }
            },
            Block::Header { content, .. } | Block::Paragraph { content, .. } => {
                for span in content {
                    self.collect_span(span);
                }
            },
            Block::Invalid { .. } | Block::LinkAlias(_) | Block::LinkDefinition(_) => {},
        }
        return;
    }

    /// Visit a span, then everything nested inside it. Reference content is
    /// replaced wholesale during rewrite and is not searched for targets, and
    /// neither are invalid spans.
    fn collect_span(&mut self, span: &Span) {
        if let Some(id) = span.id() {
            let fragment = self.targets.path.with_fragment(id);
            let text = span.plain_text();
            self.push(TargetResolver::for_span_target(id, internal_link(fragment.clone(), text.clone())));
            self.publish(
                fragment.clone(),
                TargetResolver::create(
                    Selector::Unique(UniqueSelector::Path(fragment.clone())),
                    internal_link(fragment, text),
                    |_| return None,
                ),
            );
        }

        if let Span::Emphasized { content, .. } | Span::Link { content, .. } = span {
            for child in content {
                self.collect_span(child);
            }
        }
        return;
    }

    /// Add a tree-wide candidate under `path`.
    fn publish(&mut self, path: DocPath, resolver: TargetResolver) {
        self.targets.paths.entry(UniqueSelector::Path(path)).or_default().push(resolver);
        return;
    }

    /// Add a document-local candidate under its own selector.
    fn push(&mut self, resolver: TargetResolver) {
        self.targets.local.entry(resolver.selector()).or_default().push(resolver);
        return;
    }

    /// Emit the candidate for `block` itself, if it is a target.
    fn register_block(&mut self, block: &Block) {
        match block {
            Block::Footnote { label: FootnoteLabel::AutoNumber, .. } => {
                self.add_auto_footnote(AutoFootnote::Number);
            },
            Block::Footnote { label: FootnoteLabel::AutoSymbol, .. } => {
                self.add_auto_footnote(AutoFootnote::Symbol);
            },
            Block::Header { .. } => {
                if let Some((id, precedence)) = header_id(block, self.config) {
                    self.add_id_target(&id, precedence, block.plain_text());
                }
            },
            Block::Footnote { options, .. } | Block::Paragraph { options, .. } | Block::Quote { options, .. } => {
                if let Some(id) = &options.id {
                    self.add_id_target(id, self.config.ids.explicit_precedence, id.clone());
                }
            },
            Block::Invalid { .. } => {},
            Block::LinkAlias(alias) => {
                self.push(TargetResolver::Alias(LinkAliasResolver::unresolved(&alias.id, &alias.target)));
            },
            Block::LinkDefinition(definition) => {
                let selector = match &definition.id {
                    None => Selector::Sequence(SequenceSelector::Anonymous),
                    Some(id) => Selector::Unique(UniqueSelector::LinkDefinition(id.clone())),
                };
                self.push(TargetResolver::create(selector, definition_link(definition), |_| return None));
            },
        }
        return;
    }
}

/// Footnote body replacement assigning its final label and id.
fn assign_footnote(label: String, id: String) -> impl Fn(&Node) -> Option<Node> + Send + Sync + 'static {
    return move |node| {
        let Node::Block(Block::Footnote { content, options, .. }) = node else {
            return None;
        };
        return Some(Node::Block(Block::Footnote {
            content: content.clone(),
            label: FootnoteLabel::Assigned { text: label.clone() },
            options: Options {
                id: Some(id.clone()),
                styles: options.styles.clone(),
            },
        }));
    };
}

/// The selector a block registers under, if it is a target.
///
/// Derived header ids are included when enabled. The same function decides
/// targets during collection and during rewrite, so both walks agree.
pub fn block_selector(block: &Block, config: &Config) -> Option<Selector> {
    return match block {
        Block::Footnote { label: FootnoteLabel::AutoNumber, .. } => {
            Some(Selector::Sequence(SequenceSelector::AutoNumber))
        },
        Block::Footnote { label: FootnoteLabel::AutoSymbol, .. } => {
            Some(Selector::Sequence(SequenceSelector::AutoSymbol))
        },
        Block::Header { .. } => header_id(block, config).map(|(id, _)| return target_id(&id)),
        Block::Footnote { options, .. } | Block::Paragraph { options, .. } | Block::Quote { options, .. } => {
            options.id.as_deref().map(target_id)
        },
        Block::Invalid { .. } => None,
        Block::LinkAlias(alias) => Some(Selector::Unique(UniqueSelector::LinkDefinition(alias.id.clone()))),
        Block::LinkDefinition(LinkDefinition { id: None, .. }) => {
            Some(Selector::Sequence(SequenceSelector::Anonymous))
        },
        Block::LinkDefinition(LinkDefinition { id: Some(id), .. }) => {
            Some(Selector::Unique(UniqueSelector::LinkDefinition(id.clone())))
        },
    };
}

/// Collect every candidate resolver in `document`.
pub fn collect_document(document: &Document, config: &Config) -> CollectedTargets {
    let mut collector = Collector {
        config,
        targets: CollectedTargets {
            local: BTreeMap::new(),
            path: document.path.clone(),
            paths: BTreeMap::new(),
        },
    };

    let document_path = document.path.without_fragment();
    let title = document_path.to_string();
    collector.publish(
        document_path.clone(),
        TargetResolver::create(
            Selector::Unique(UniqueSelector::Path(document_path.clone())),
            internal_link(document_path, title),
            |_| return None,
        ),
    );

    for block in &document.content {
        collector.collect_block(block);
    }

    tracing::debug!(
        document = %document.path,
        local = collector.targets.local.len(),
        paths = collector.targets.paths.len(),
        "collected targets"
    );
    return collector.targets;
}

/// Link builder for a link definition.
fn definition_link(definition: &LinkDefinition) -> impl Fn(&LinkSource) -> Option<Span> + Send + Sync + 'static {
    let target = definition.target.clone();
    let title = definition.title.clone();
    let fallback_text = match &target {
        LinkTarget::External { url } => url.clone(),
        LinkTarget::Internal { path } => path.to_string(),
    };
    return move |source| {
        return Some(Span::Link {
            content: reference_text_or(source, &fallback_text),
            options: Options::default(),
            target: target.clone(),
            title: title.clone(),
        });
    };
}

/// Footnote reference builder.
fn footnote_link(label: String, id: String) -> impl Fn(&LinkSource) -> Option<Span> + Send + Sync + 'static {
    return move |_| {
        return Some(Span::FootnoteLink {
            label: label.clone(),
            target_id: id.clone(),
        });
    };
}

/// The id a header registers under and its precedence.
/// Explicit ids outrank ids derived from the header text.
fn header_id(block: &Block, config: &Config) -> Option<(String, i32)> {
    if let Some(id) = block.id() {
        return Some((id.to_string(), config.ids.explicit_precedence));
    }
    if !config.ids.derive_header_ids {
        return None;
    }
    let slug = slugify(&block.plain_text());
    if slug.is_empty() {
        return None;
    }
    return Some((slug, 0));
}

/// Link builder for a target inside the tree. Uses the reference's own text,
/// or `fallback_text` when the reference has none.
fn internal_link(path: DocPath, fallback_text: String) -> impl Fn(&LinkSource) -> Option<Span> + Send + Sync + 'static {
    return move |source| {
        return Some(Span::Link {
            content: reference_text_or(source, &fallback_text),
            options: Options::default(),
            target: LinkTarget::Internal { path: path.clone() },
            title: None,
        });
    };
}

/// The reference's link text, or a single text span when it has none.
fn reference_text_or(source: &LinkSource, fallback_text: &str) -> Vec<Span> {
    if source.reference.content.is_empty() {
        return vec![Span::text(fallback_text)];
    }
    return source.reference.content.clone();
}

/// Target replacement stamping `id` onto the node.
fn stamp_id(id: String) -> impl Fn(&Node) -> Option<Node> + Send + Sync + 'static {
    return move |node| {
        return match node {
            Node::Block(block) => Some(Node::Block(block.with_id(&id))),
            Node::Definition(_) => None,
            Node::Span(span) => Some(Node::Span(span.with_id(&id))),
        };
    };
}

/// Selector for a node id.
fn target_id(id: &str) -> Selector {
    return Selector::Unique(UniqueSelector::TargetId(id.to_string()));
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;
    use crate::ast::LinkAliasDefinition;

    fn header(text: &str, id: Option<&str>) -> Block {
        return Block::Header {
            content: vec![Span::text(text)],
            level: 2,
            options: id.map(Options::with_id).unwrap_or_default(),
        };
    }

    fn document(content: Vec<Block>) -> Document {
        return Document::new(DocPath::parse("/guide/intro.json").unwrap(), content);
    }

    #[test]
    fn headers_register_derived_and_explicit_ids() {
        let doc = document(vec![header("Getting Started", None), header("Setup", Some("install"))]);
        let collected = collect_document(&doc, &Config::default());

        let derived = collected.local.get(&target_id("getting-started")).unwrap();
        assert_eq!(derived.first().map(TargetResolver::precedence), Some(0));
        let explicit = collected.local.get(&target_id("install")).unwrap();
        assert_eq!(explicit.first().map(TargetResolver::precedence), Some(1));

        let path = UniqueSelector::Path(DocPath::parse("/guide/intro.json#install").unwrap());
        assert!(collected.paths.contains_key(&path), "header path not published");
        let document_path = UniqueSelector::Path(DocPath::parse("/guide/intro.json").unwrap());
        assert!(collected.paths.contains_key(&document_path), "document path not published");
    }

    #[test]
    fn derived_ids_can_be_disabled() {
        let config = Config::parse("[ids]\nderive_header_ids = false").unwrap();
        let collected = collect_document(&document(vec![header("Getting Started", None)]), &config);
        assert!(collected.local.is_empty(), "derived id registered while disabled");
    }

    #[test]
    fn anonymous_definitions_share_one_sequence_selector() {
        let anonymous = |url: &str| {
            return Block::LinkDefinition(LinkDefinition {
                id: None,
                target: LinkTarget::External { url: url.to_string() },
                title: None,
            });
        };
        let collected = collect_document(&document(vec![anonymous("https://a"), anonymous("https://b")]), &Config::default());
        let group = collected.local.get(&Selector::Sequence(SequenceSelector::Anonymous)).unwrap();
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn aliases_register_under_link_definition_selector() {
        let alias = Block::LinkAlias(LinkAliasDefinition {
            id: "docs".to_string(),
            target: "home".to_string(),
        });
        let collected = collect_document(&document(vec![alias]), &Config::default());
        let selector = Selector::Unique(UniqueSelector::LinkDefinition("docs".to_string()));
        assert!(
            matches!(collected.local.get(&selector).and_then(|g| return g.first()), Some(TargetResolver::Alias(_))),
            "alias not registered"
        );
    }

    #[test]
    fn nested_span_anchor_is_a_span_target() {
        let paragraph = Block::Paragraph {
            content: vec![Span::Emphasized {
                content: vec![Span::text("here").with_id("anchor")],
                options: Options::default(),
            }],
            options: Options::default(),
        };
        let collected = collect_document(&document(vec![paragraph]), &Config::default());
        assert!(
            matches!(
                collected.local.get(&target_id("anchor")).and_then(|g| return g.first()),
                Some(TargetResolver::SpanTarget { .. })
            ),
            "span anchor not registered"
        );
    }
}
