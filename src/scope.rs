//! Registries of effective resolvers.
//!
//! A [`DocumentScope`] holds one resolver per selector seen in a document,
//! after duplicate claims are reduced. A [`TreeScope`] holds the tree-wide
//! unique selectors every document can reach: path-addressed targets plus
//! the ids and link definitions of all documents.
use std::collections::{BTreeMap, BTreeSet};

use crate::alias::{LinkAlias, LinkAliasResolver, Resolving};
use crate::ast::Node;
use crate::collect::CollectedTargets;
use crate::path::DocPath;
use crate::resolver::{TargetResolver, winning_candidate};
use crate::selector::{Selector, UniqueSelector};
use crate::sequence::TargetSequenceResolver;

/// Effective resolvers of one document.
#[derive(Debug, Clone)]
pub struct DocumentScope {
    /// Effective resolver per selector.
    entries: BTreeMap<Selector, Registration>,
    /// The document's path.
    path: DocPath,
}

/// One effective resolver and the occurrence that owns it.
#[derive(Debug, Clone)]
struct Registration {
    /// Position of the winning target among all nodes claiming the selector.
    /// `None` when every claimant goes through the resolver, which is the
    /// case for ties and sequences.
    authoritative: Option<usize>,
    /// The resolver references and targets are routed to.
    resolver: TargetResolver,
}

/// Effective tree-wide resolvers.
#[derive(Debug, Clone)]
pub struct TreeScope {
    /// Effective resolver per unique selector.
    entries: BTreeMap<UniqueSelector, TargetResolver>,
}

impl DocumentScope {
    /// Reduce a document's candidates to one resolver per selector.
    pub fn build(collected: CollectedTargets) -> Self {
        let mut entries = BTreeMap::new();
        for (selector, candidates) in collected.local {
            let registration = match &selector {
                Selector::Sequence(sequence) => Registration {
                    authoritative: None,
                    resolver: TargetResolver::Sequence(TargetSequenceResolver::new(*sequence, candidates)),
                },
                Selector::Unique(unique) => {
                    let authoritative = winning_candidate(&candidates);
                    let Some(resolver) = TargetResolver::for_duplicate_selector(unique, &collected.path, candidates)
                    else {
                        continue;
                    };
                    Registration { authoritative, resolver }
                },
            };
            entries.insert(selector, registration);
        }

        return Self {
            entries,
            path: collected.path,
        };
    }

    /// The effective resolver for `selector`.
    pub fn get_mut(&mut self, selector: &Selector) -> Option<&mut TargetResolver> {
        return self.entries.get_mut(selector).map(|registration| return &mut registration.resolver);
    }

    /// The document's path.
    pub const fn path(&self) -> &DocPath {
        return &self.path;
    }

    /// Replace the `occurrence`-th node claiming `selector`.
    ///
    /// Nodes that lost a precedence contest keep their content but lose their
    /// id. A selector with no registration leaves the node untouched.
    pub fn replace_target(&mut self, selector: &Selector, occurrence: usize, node: &Node) -> Option<Node> {
        let Some(registration) = self.entries.get_mut(selector) else {
            return Some(node.clone());
        };
        if let Some(winner) = registration.authoritative
            && winner != occurrence
        {
            return Some(node.without_id());
        }
        return registration.resolver.replace_target(node);
    }

    /// Follow every alias registered in this document to its end.
    ///
    /// Each alias looks up its target as a link definition, then as a target
    /// id, first in this document and then tree-wide. Revisiting an alias
    /// that is still being followed marks the chain circular.
    pub fn resolve_aliases(&mut self, tree: &TreeScope) {
        let pending: Vec<Selector> = self
            .entries
            .iter()
            .filter(|(_, registration)| return is_unresolved_alias(&registration.resolver))
            .map(|(selector, _)| return selector.clone())
            .collect();

        for selector in pending {
            let mut resolving = BTreeSet::new();
            self.follow_alias(&selector, tree, &mut resolving);
        }
        return;
    }

    /// Selectors registered in this document, in order.
    pub fn selectors(&self) -> impl Iterator<Item = &Selector> {
        return self.entries.keys();
    }

    /// Where the alias started from `alias` ends up.
    fn alias_outcome(
        &mut self,
        alias: LinkAlias<Resolving>,
        tree: &TreeScope,
        resolving: &mut BTreeSet<Selector>,
    ) -> LinkAliasResolver {
        let candidates = alias_target_selectors(alias.target());

        for unique in &candidates {
            let candidate = Selector::Unique(unique.clone());
            if resolving.contains(&candidate) {
                return alias.circular_reference().into();
            }
            if self.entries.get(&candidate).is_some_and(|r| return is_unresolved_alias(&r.resolver)) {
                self.follow_alias(&candidate, tree, resolving);
            }
            let Some(registration) = self.entries.get(&candidate) else {
                continue;
            };
            return match &registration.resolver {
                TargetResolver::Alias(LinkAliasResolver::Circular(_)) => alias.circular_reference().into(),
                resolver => {
                    let delegate = TargetResolver::for_delegate(Selector::Unique(alias.selector()), resolver.clone());
                    alias.resolve_with(delegate).into()
                },
            };
        }

        for unique in &candidates {
            if let Some(resolver) = tree.get(unique) {
                let delegate = TargetResolver::for_delegate(Selector::Unique(alias.selector()), resolver.clone());
                return alias.resolve_with(delegate).into();
            }
        }

        tracing::debug!(alias = %alias.source(), target = %alias.target(), "alias target not found");
        let message = format!("unresolved link alias: {}", alias.target());
        let invalid = TargetResolver::for_invalid_target(Selector::Unique(alias.selector()), &message);
        return alias.resolve_with(invalid).into();
    }

    /// Move the alias at `selector` through `Resolving` to a terminal state.
    fn follow_alias(&mut self, selector: &Selector, tree: &TreeScope, resolving: &mut BTreeSet<Selector>) {
        let Some(registration) = self.entries.get_mut(selector) else {
            return;
        };
        let TargetResolver::Alias(LinkAliasResolver::Unresolved(alias)) = &registration.resolver else {
            return;
        };

        let alias = alias.clone().begin_resolving();
        registration.resolver = TargetResolver::Alias(alias.clone().into());
        resolving.insert(selector.clone());

        let outcome = self.alias_outcome(alias, tree, resolving);

        resolving.remove(selector);
        if let Some(registration) = self.entries.get_mut(selector) {
            registration.resolver = TargetResolver::Alias(outcome);
        }
        return;
    }
}

impl TreeScope {
    /// Reduce tree-wide candidates to one resolver per selector.
    ///
    /// Path-addressed targets come from every document. Ids and link
    /// definitions are published too, except aliases, which resolve within
    /// their own document.
    pub fn build(root: &DocPath, documents: &[CollectedTargets]) -> Self {
        let mut candidates: BTreeMap<UniqueSelector, Vec<TargetResolver>> = BTreeMap::new();
        for document in documents {
            for (selector, resolvers) in &document.paths {
                candidates.entry(selector.clone()).or_default().extend(resolvers.iter().cloned());
            }
            for (selector, resolvers) in &document.local {
                let Selector::Unique(unique) = selector else {
                    continue;
                };
                let published = resolvers.iter().filter(|r| return !matches!(r, TargetResolver::Alias(_))).cloned();
                candidates.entry(unique.clone()).or_default().extend(published);
            }
        }

        let entries = candidates
            .into_iter()
            .filter_map(|(selector, resolvers)| {
                let resolver = TargetResolver::for_duplicate_selector(&selector, root, resolvers)?;
                return Some((selector, resolver));
            })
            .collect();
        return Self { entries };
    }

    /// The effective resolver for `selector`.
    pub fn get(&self, selector: &UniqueSelector) -> Option<&TargetResolver> {
        return self.entries.get(selector);
    }

    /// The effective resolver for `selector`, for resolving references.
    pub fn get_mut(&mut self, selector: &UniqueSelector) -> Option<&mut TargetResolver> {
        return self.entries.get_mut(selector);
    }

    /// Registered selectors, in order.
    pub fn selectors(&self) -> impl Iterator<Item = &UniqueSelector> {
        return self.entries.keys();
    }
}

/// Selectors an alias target is looked up under, in priority order.
fn alias_target_selectors(target: &str) -> [UniqueSelector; 2] {
    return [
        UniqueSelector::LinkDefinition(target.to_string()),
        UniqueSelector::TargetId(target.to_string()),
    ];
}

/// Whether `resolver` is an alias nobody has followed yet.
const fn is_unresolved_alias(resolver: &TargetResolver) -> bool {
    return matches!(resolver, TargetResolver::Alias(LinkAliasResolver::Unresolved(_)));
}
