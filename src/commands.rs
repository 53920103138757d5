//! CLI commands for docxref: check, resolve, targets.

use std::path::Path;
use std::process::ExitCode;

use docxref::ast::{Block, DocumentTree};
use docxref::config::Config;
use docxref::diagnostics;
use docxref::driver;
use docxref::error::Error;
use docxref::loader;

/// On-disk shape of a resolved document.
#[derive(serde::Serialize)]
struct ResolvedFile<'a> {
    /// Resolved top-level blocks.
    content: &'a [Block],
}

/// Resolve the tree under `root` and report every failed resolution.
///
/// Exit code 0 when everything resolves, 1 when any reference or target is
/// invalid.
///
/// # Errors
///
/// Returns errors from config loading or document loading.
pub fn check(root: &Path) -> Result<ExitCode, Error> {
    let resolved = load_and_resolve(root)?;
    let found = diagnostics::collect_invalid(&resolved);

    if found.is_empty() {
        let total = resolved.documents.len();
        println!("All {total} documents resolved");
        return Ok(ExitCode::SUCCESS);
    }

    print!("{}", diagnostics::render_resolution_report(&found));
    println!();
    println!("{} invalid", found.len());
    return Ok(ExitCode::from(1));
}

/// Load config and documents from `root`, then run one resolution pass.
///
/// # Errors
///
/// Returns errors from config loading or document loading.
fn load_and_resolve(root: &Path) -> Result<DocumentTree, Error> {
    let config = Config::load(root)?;
    let tree = loader::load_tree(root, &config)?;
    return Ok(driver::resolve_tree(tree, &config));
}

/// Resolve the tree under `root` and write it out as JSON.
///
/// Without `out`, the whole tree is printed to stdout as one JSON object
/// keyed by document path. With `out`, each document is written to the same
/// relative path under `out`.
///
/// # Errors
///
/// Returns errors from loading, serialization, or writing output files.
pub fn resolve(root: &Path, out: Option<&Path>) -> Result<(), Error> {
    let resolved = load_and_resolve(root)?;

    let Some(out_dir) = out else {
        let by_path: serde_json::Map<String, serde_json::Value> = resolved
            .documents
            .iter()
            .map(|document| {
                let value = serde_json::to_value(ResolvedFile {
                    content: &document.content,
                })?;
                return Ok::<_, serde_json::Error>((document.path.to_string(), value));
            })
            .collect::<Result<_, serde_json::Error>>()?;
        println!("{}", serde_json::to_string_pretty(&by_path)?);
        return Ok(());
    };

    for document in &resolved.documents {
        let relative = document.path.to_string();
        let target = out_dir.join(relative.trim_start_matches('/'));
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&ResolvedFile {
            content: &document.content,
        })?;
        std::fs::write(&target, json)?;
    }

    let count = resolved.documents.len();
    eprintln!("Wrote {count} resolved documents to {}", out_dir.display());
    return Ok(());
}

/// List the selectors each document registers.
///
/// # Errors
///
/// Returns errors from config loading or document loading.
pub fn targets(root: &Path) -> Result<(), Error> {
    let config = Config::load(root)?;
    let tree = loader::load_tree(root, &config)?;

    for listing in driver::list_targets(&tree, &config) {
        println!("{}", listing.path);
        for selector in &listing.selectors {
            println!("  {selector}");
        }
    }
    return Ok(());
}
