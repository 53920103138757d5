//! Document tree nodes consumed and produced by link resolution.
//!
//! Parsers produce this tree (usually as JSON); renderers consume the
//! resolved tree. Resolution only ever replaces whole nodes, so every
//! id-editing operation returns a modified copy.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::path::DocPath;
use crate::selector::{Selector, SequenceSelector, UniqueSelector};

/// Block-level node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A footnote body, labelled automatically or explicitly.
    Footnote {
        /// Nested blocks forming the footnote body.
        content: Vec<Block>,
        /// How the footnote is labelled.
        label: FootnoteLabel,
        /// Id and styles.
        #[serde(default, skip_serializing_if = "Options::is_empty")]
        options: Options,
    },
    /// Section header.
    Header {
        /// Header text.
        content: Vec<Span>,
        /// Nesting level, starting at 1.
        level: u8,
        /// Id and styles.
        #[serde(default, skip_serializing_if = "Options::is_empty")]
        options: Options,
    },
    /// A block that failed resolution, with the original block as fallback.
    Invalid {
        /// The original block, with its id removed.
        fallback: Box<Block>,
        /// Human-readable diagnostic.
        message: String,
    },
    /// Indirection to another link definition or target.
    LinkAlias(LinkAliasDefinition),
    /// Named or anonymous link definition.
    LinkDefinition(LinkDefinition),
    /// Plain paragraph.
    Paragraph {
        /// Inline content.
        content: Vec<Span>,
        /// Id and styles.
        #[serde(default, skip_serializing_if = "Options::is_empty")]
        options: Options,
    },
    /// Block quote containing nested blocks.
    Quote {
        /// Nested blocks.
        content: Vec<Block>,
        /// Id and styles.
        #[serde(default, skip_serializing_if = "Options::is_empty")]
        options: Options,
    },
}

/// Definition nodes are neither blocks nor spans once handed to a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    /// An alias definition.
    Alias(LinkAliasDefinition),
    /// A link definition.
    Link(LinkDefinition),
}

/// A single document within a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Top-level blocks in document order.
    pub content: Vec<Block>,
    /// Virtual path of the document.
    pub path: DocPath,
}

/// All documents taking part in one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTree {
    /// Documents in encounter order.
    pub documents: Vec<Document>,
    /// Path of the tree root, used in tree-wide diagnostics.
    pub root: DocPath,
}

/// How a footnote is labelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FootnoteLabel {
    /// Label assigned during resolution.
    Assigned {
        /// Rendered label text.
        text: String,
    },
    /// Numbered by position (`[#]`).
    AutoNumber,
    /// Symbol by position (`[*]`).
    AutoSymbol,
}

/// `.. _id: target_` style alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAliasDefinition {
    /// Id under which the alias is registered.
    pub id: String,
    /// Id the alias points at.
    pub target: String,
}

/// External or internal link definition; `id: None` marks an anonymous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDefinition {
    /// Definition id, absent for anonymous definitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Where the link points.
    pub target: LinkTarget,
    /// Optional link title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// An unresolved reference as produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReference {
    /// Link text.
    #[serde(default)]
    pub content: Vec<Span>,
    /// What the reference points at.
    pub kind: ReferenceKind,
    /// The original markup, shown in diagnostics.
    pub source: String,
}

/// Resolved link destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkTarget {
    /// Absolute URL outside the tree.
    External {
        /// The URL.
        url: String,
    },
    /// Document (or fragment) inside the tree.
    Internal {
        /// Absolute virtual path.
        path: DocPath,
    },
}

/// The shape of a node handed to `replace_target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Block-shaped node.
    Block(Block),
    /// Neither block nor span.
    Definition(Definition),
    /// Span-shaped node.
    Span(Span),
}

/// Id and style classes shared by id-bearing nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Explicit or assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Style classes.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub styles: BTreeSet<String>,
}

/// What a reference points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Next anonymous link definition.
    Anonymous,
    /// Next auto-numbered footnote.
    AutoNumber,
    /// Next auto-symbol footnote.
    AutoSymbol,
    /// Link definition or target id.
    Id {
        /// Referenced id.
        id: String,
    },
    /// Path relative to the referencing document, with optional fragment.
    Path {
        /// Raw path as written.
        path: String,
    },
}

/// Inline node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Span {
    /// Emphasized inline content.
    Emphasized {
        /// Inline content.
        content: Vec<Span>,
        /// Id and styles.
        #[serde(default, skip_serializing_if = "Options::is_empty")]
        options: Options,
    },
    /// Resolved footnote reference.
    FootnoteLink {
        /// Label shown at the reference site.
        label: String,
        /// Id of the footnote block.
        target_id: String,
    },
    /// A span that failed resolution, with the original span as fallback.
    Invalid {
        /// The original span, with its id removed.
        fallback: Box<Span>,
        /// Human-readable diagnostic.
        message: String,
    },
    /// Resolved link.
    Link {
        /// Link text.
        content: Vec<Span>,
        /// Id and styles.
        #[serde(default, skip_serializing_if = "Options::is_empty")]
        options: Options,
        /// Where the link points.
        target: LinkTarget,
        /// Optional title.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    /// Reference awaiting resolution.
    Reference(LinkReference),
    /// Plain text.
    Text {
        /// The text.
        content: String,
        /// Id and styles.
        #[serde(default, skip_serializing_if = "Options::is_empty")]
        options: Options,
    },
}

impl Block {
    /// The explicit id, if this block carries one.
    pub fn id(&self) -> Option<&str> {
        return self.options().and_then(|o| return o.id.as_deref());
    }

    /// Id and styles, for block kinds that carry them.
    pub const fn options(&self) -> Option<&Options> {
        return match self {
            Self::Footnote { options, .. }
            | Self::Header { options, .. }
            | Self::Paragraph { options, .. }
            | Self::Quote { options, .. } => Some(options),
            Self::Invalid { .. } | Self::LinkAlias(_) | Self::LinkDefinition(_) => None,
        };
    }

    /// Concatenated text of the block's inline content (headers, paragraphs).
    pub fn plain_text(&self) -> String {
        return match self {
            Self::Header { content, .. } | Self::Paragraph { content, .. } => {
                content.iter().map(Span::plain_text).collect()
            },
            Self::Footnote { .. }
            | Self::Invalid { .. }
            | Self::LinkAlias(_)
            | Self::LinkDefinition(_)
            | Self::Quote { .. } => String::new(),
        };
    }

    /// A copy with `id` assigned. Blocks without options are returned unchanged.
    #[must_use]
    pub fn with_id(&self, id: &str) -> Self {
        let mut copy = self.clone();
        if let Some(options) = copy.options_mut() {
            options.id = Some(id.to_string());
        }
        return copy;
    }

    /// A copy with any id removed.
    #[must_use]
    pub fn without_id(&self) -> Self {
        let mut copy = self.clone();
        if let Some(options) = copy.options_mut() {
            options.id = None;
        }
        return copy;
    }

    /// Mutable id and styles of this (owned copy of a) block.
    fn options_mut(&mut self) -> Option<&mut Options> {
        return match self {
            Self::Footnote { options, .. }
            | Self::Header { options, .. }
            | Self::Paragraph { options, .. }
            | Self::Quote { options, .. } => Some(options),
            Self::Invalid { .. } | Self::LinkAlias(_) | Self::LinkDefinition(_) => None,
        };
    }
}

impl From<Definition> for Block {
    fn from(definition: Definition) -> Self {
        return match definition {
            Definition::Alias(alias) => Self::LinkAlias(alias),
            Definition::Link(link) => Self::LinkDefinition(link),
        };
    }
}

impl Document {
    /// Create a document from its path and top-level blocks.
    pub const fn new(path: DocPath, content: Vec<Block>) -> Self {
        return Self { content, path };
    }
}

impl DocumentTree {
    /// Create a tree rooted at `/`.
    pub const fn new(documents: Vec<Document>) -> Self {
        return Self {
            documents,
            root: DocPath::root(),
        };
    }
}

impl LinkReference {
    /// The selector this reference is looked up under, relative to the
    /// document at `base`.
    pub fn selector(&self, base: &DocPath) -> Selector {
        return match &self.kind {
            ReferenceKind::Anonymous => Selector::Sequence(SequenceSelector::Anonymous),
            ReferenceKind::AutoNumber => Selector::Sequence(SequenceSelector::AutoNumber),
            ReferenceKind::AutoSymbol => Selector::Sequence(SequenceSelector::AutoSymbol),
            ReferenceKind::Id { id } => Selector::Unique(UniqueSelector::LinkDefinition(id.clone())),
            ReferenceKind::Path { path } => Selector::Unique(UniqueSelector::Path(base.join(path))),
        };
    }
}

impl Node {
    /// A copy with any id removed.
    #[must_use]
    pub fn without_id(&self) -> Self {
        return match self {
            Self::Block(block) => Self::Block(block.without_id()),
            Self::Definition(definition) => Self::Definition(definition.clone()),
            Self::Span(span) => Self::Span(span.without_id()),
        };
    }

    /// Convert back into a block, if this node is block-shaped or a definition.
    pub fn into_block(self) -> Option<Block> {
        return match self {
            Self::Block(block) => Some(block),
            Self::Definition(definition) => Some(Block::from(definition)),
            Self::Span(_) => None,
        };
    }

    /// Convert back into a span, if this node is span-shaped.
    pub fn into_span(self) -> Option<Span> {
        return match self {
            Self::Span(span) => Some(span),
            Self::Block(_) | Self::Definition(_) => None,
        };
    }
}

impl From<Block> for Node {
    fn from(block: Block) -> Self {
        return match block {
            Block::LinkAlias(alias) => Self::Definition(Definition::Alias(alias)),
            Block::LinkDefinition(link) => Self::Definition(Definition::Link(link)),
            other => Self::Block(other),
        };
    }
}

impl From<Span> for Node {
    fn from(span: Span) -> Self {
        return Self::Span(span);
    }
}

impl Options {
    /// Options carrying only an id.
    pub fn with_id(id: &str) -> Self {
        return Self {
            id: Some(id.to_string()),
            styles: BTreeSet::new(),
        };
    }

    /// Whether neither id nor styles are set.
    pub fn is_empty(&self) -> bool {
        return self.id.is_none() && self.styles.is_empty();
    }
}

impl Span {
    /// The explicit id, if this span carries one.
    pub fn id(&self) -> Option<&str> {
        return self.options().and_then(|o| return o.id.as_deref());
    }

    /// Id and styles, for span kinds that carry them.
    pub const fn options(&self) -> Option<&Options> {
        return match self {
            Self::Emphasized { options, .. } | Self::Link { options, .. } | Self::Text { options, .. } => {
                Some(options)
            },
            Self::FootnoteLink { .. } | Self::Invalid { .. } | Self::Reference(_) => None,
        };
    }

    /// Concatenated text content.
    pub fn plain_text(&self) -> String {
        return match self {
            Self::Emphasized { content, .. } | Self::Link { content, .. } => {
                content.iter().map(Self::plain_text).collect()
            },
            Self::FootnoteLink { label, .. } => label.clone(),
            Self::Invalid { fallback, .. } => fallback.plain_text(),
            Self::Reference(reference) => reference.source.clone(),
            Self::Text { content, .. } => content.clone(),
        };
    }

    /// Plain text span without options.
    pub fn text(content: &str) -> Self {
        return Self::Text {
            content: content.to_string(),
            options: Options::default(),
        };
    }

    /// A copy with `id` assigned. Spans without options are returned unchanged.
    #[must_use]
    pub fn with_id(&self, id: &str) -> Self {
        let mut copy = self.clone();
        if let Some(options) = copy.options_mut() {
            options.id = Some(id.to_string());
        }
        return copy;
    }

    /// A copy with any id removed.
    #[must_use]
    pub fn without_id(&self) -> Self {
        let mut copy = self.clone();
        if let Some(options) = copy.options_mut() {
            options.id = None;
        }
        return copy;
    }

    /// Mutable id and styles of this (owned copy of a) span.
    fn options_mut(&mut self) -> Option<&mut Options> {
        return match self {
            Self::Emphasized { options, .. } | Self::Link { options, .. } | Self::Text { options, .. } => {
                Some(options)
            },
            Self::FootnoteLink { .. } | Self::Invalid { .. } | Self::Reference(_) => None,
        };
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    #[test]
    fn with_id_does_not_touch_original() {
        let header = Block::Header {
            content: vec![Span::text("Intro")],
            level: 1,
            options: Options::default(),
        };
        let stamped = header.with_id("intro");
        assert_eq!(stamped.id(), Some("intro"));
        assert_eq!(header.id(), None);
        assert_eq!(stamped.without_id(), header);
    }

    #[test]
    fn definitions_convert_to_definition_nodes() {
        let block = Block::LinkAlias(LinkAliasDefinition {
            id: "a".to_string(),
            target: "b".to_string(),
        });
        let node = Node::from(block.clone());
        assert!(matches!(node, Node::Definition(Definition::Alias(_))), "alias not a definition node");
        assert_eq!(node.into_block(), Some(block));
    }

    #[test]
    fn deserializes_tagged_json() {
        let json = r#"[
            {"type": "header", "level": 1, "content": [{"type": "text", "content": "Intro"}]},
            {"type": "link_definition", "id": "home", "target": {"kind": "external", "url": "https://example.com"}},
            {"type": "paragraph", "content": [
                {"type": "reference", "kind": {"by": "id", "id": "home"}, "source": "`home`_",
                 "content": [{"type": "text", "content": "home"}]}
            ]}
        ]"#;
        let blocks: Vec<Block> = serde_json::from_str(json).unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks.first().map(Block::plain_text).as_deref(), Some("Intro"));
        assert!(matches!(blocks.get(1), Some(Block::LinkDefinition(_))), "expected link definition");
    }

    #[test]
    fn id_reference_selects_link_definition() {
        let reference = LinkReference {
            content: Vec::new(),
            kind: ReferenceKind::Id { id: "x".to_string() },
            source: "`x`_".to_string(),
        };
        let base = DocPath::parse("/doc.json").unwrap();
        assert_eq!(
            reference.selector(&base),
            Selector::Unique(UniqueSelector::LinkDefinition("x".to_string()))
        );
    }
}
