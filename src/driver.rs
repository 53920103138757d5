//! One resolution pass over a document tree.
//!
//! The pass runs in four phases:
//!
//! 1. Collect candidate resolvers from every document.
//! 2. Build the tree scope from every document's unique candidates.
//! 3. Build each document scope, then follow its aliases.
//! 4. Rewrite each document in order.
//!
//! The pass never fails. Everything that cannot be resolved ends up as an
//! invalid node carrying a message; see [`crate::diagnostics::collect_invalid`].
use crate::ast::DocumentTree;
use crate::collect::{CollectedTargets, collect_document};
use crate::config::Config;
use crate::path::DocPath;
use crate::rewrite::rewrite_document;
use crate::scope::{DocumentScope, TreeScope};
use crate::selector::Selector;

/// Selectors registered by one document, as listed by `docxref targets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetListing {
    /// The document.
    pub path: DocPath,
    /// Local selectors followed by path selectors.
    pub selectors: Vec<Selector>,
}

/// Selectors each document registers, before any deduplication.
pub fn list_targets(tree: &DocumentTree, config: &Config) -> Vec<TargetListing> {
    return tree
        .documents
        .iter()
        .map(|document| {
            let collected = collect_document(document, config);
            let selectors = collected
                .local
                .keys()
                .cloned()
                .chain(collected.paths.keys().cloned().map(Selector::Unique))
                .collect();
            return TargetListing {
                path: collected.path,
                selectors,
            };
        })
        .collect();
}

/// Resolve every reference and target in `tree`.
pub fn resolve_tree(tree: DocumentTree, config: &Config) -> DocumentTree {
    let collected: Vec<CollectedTargets> =
        tree.documents.iter().map(|document| return collect_document(document, config)).collect();

    let mut tree_scope = TreeScope::build(&tree.root, &collected);
    tracing::debug!(selectors = tree_scope.selectors().count(), "built tree scope");

    let mut scopes: Vec<DocumentScope> = collected
        .into_iter()
        .map(|targets| {
            let mut scope = DocumentScope::build(targets);
            scope.resolve_aliases(&tree_scope);
            tracing::debug!(document = %scope.path(), selectors = scope.selectors().count(), "built document scope");
            return scope;
        })
        .collect();

    let documents = tree
        .documents
        .into_iter()
        .zip(scopes.iter_mut())
        .map(|(document, scope)| return rewrite_document(document, scope, &mut tree_scope, config))
        .collect();

    return DocumentTree {
        documents,
        root: tree.root,
    };
}
