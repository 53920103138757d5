//! Human-readable output for hard errors and for resolution failures left
//! in a resolved tree.
use std::fmt::Write as _;

use crate::ast::{Block, DocumentTree, Span};
use crate::config::CONFIG_FILE;
use crate::error::Error;
use crate::path::DocPath;

/// ANSI bold, for markdown headings on stderr.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// One invalid node found in a resolved tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionDiagnostic {
    /// Document containing the node.
    pub document: DocPath,
    /// Text of the original node, as the reader would have seen it.
    pub fallback: String,
    /// Why resolution failed.
    pub message: String,
}

/// Every invalid block and span in `tree`, in document order.
pub fn collect_invalid(tree: &DocumentTree) -> Vec<ResolutionDiagnostic> {
    let mut found = Vec::new();
    for document in &tree.documents {
        for block in &document.content {
            collect_from_block(&document.path, block, &mut found);
        }
    }
    return found;
}

/// Walk a block, recording invalid nodes.
fn collect_from_block(document: &DocPath, block: &Block, found: &mut Vec<ResolutionDiagnostic>) {
    match block {
        Block::Footnote { content, .. } | Block::Quote { content, .. } => {
            for child in content {
                collect_from_block(document, child, found);
            }
        },
        Block::Header { content, .. } | Block::Paragraph { content, .. } => {
            for span in content {
                collect_from_span(document, span, found);
            }
        },
        Block::Invalid { fallback, message } => {
            found.push(ResolutionDiagnostic {
                document: document.clone(),
                fallback: fallback.plain_text(),
                message: message.clone(),
            });
            collect_from_block(document, fallback, found);
        },
        Block::LinkAlias(_) | Block::LinkDefinition(_) => {},
    }
    return;
}

/// Walk a span, recording invalid nodes.
fn collect_from_span(document: &DocPath, span: &Span, found: &mut Vec<ResolutionDiagnostic>) {
    match span {
        Span::Emphasized { content, .. } | Span::Link { content, .. } => {
            for child in content {
                collect_from_span(document, child, found);
            }
        },
        Span::Invalid { fallback, message } => {
            found.push(ResolutionDiagnostic {
                document: document.clone(),
                fallback: fallback.plain_text(),
                message: message.clone(),
            });
            collect_from_span(document, fallback, found);
        },
        Span::FootnoteLink { .. } | Span::Reference(_) | Span::Text { .. } => {},
    }
    return;
}

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
    return;
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is
/// one, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::DocumentNotFound { path } => format!(
            "\
# Error: Document Root Not Found

`{}` does not exist or is not a directory.

## Fix

Pass the directory holding your `*.json` documents:

    docxref check --root path/to/docs
",
            path.display()
        ),
        Error::InvalidDocument { file, reason } => render_invalid_document(&file.display().to_string(), reason),
        Error::InvalidPath { path, reason } => format!(
            "\
# Error: Invalid Path

`{path}`: {reason}
"
        ),
        Error::Io(e) => format!(
            "\
# Error: I/O

{e}
"
        ),
        Error::Json(e) => format!(
            "\
# Error: JSON

{e}
"
        ),
        Error::TomlDe(e) => format!(
            "\
# Error: Invalid TOML

{e}

## Fix

Check the syntax of `{CONFIG_FILE}`.
"
        ),
    };
}

/// Render the per-reference lines printed by `docxref check`.
pub fn render_resolution_report(diagnostics: &[ResolutionDiagnostic]) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics {
        let _ = writeln!(out, "INVALID  {}  {}", diagnostic.document, diagnostic.message);
        if !diagnostic.fallback.is_empty() {
            let _ = writeln!(out, "         {}", diagnostic.fallback);
        }
    }
    return out;
}

/// Malformed document file, with the expected shape as a hint.
fn render_invalid_document(file: &str, reason: &str) -> String {
    let mut out = format!(
        "\
# Error: Invalid Document

Could not read `{file}`: {reason}
"
    );
    out.push_str(
        "\
\n## Expected shape

    {\"content\": [{\"type\": \"paragraph\", \"content\": [...]}, ...]}
",
    );
    return out;
}
