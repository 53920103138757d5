//! Link aliases: named references that redirect to another id.
//!
//! An alias is never a target itself. Its lifecycle is a one-way state
//! machine encoded in the type of [`LinkAlias`]:
//!
//! ```text
//! Unresolved --begin_resolving--> Resolving --resolve_with--------> Resolved
//!                                           \--circular_reference--> Circular
//! ```
//!
//! Only `LinkAlias<Resolving>` offers the terminal transitions, so an alias
//! can be neither resolved twice nor un-resolved. The driver keeps the set
//! of aliases currently `Resolving` and calls `circular_reference` when a
//! chain revisits one of them.
use crate::ast::{Node, Span};
use crate::resolver::{LinkSource, TargetResolver, invalid_reference_span};
use crate::selector::UniqueSelector;

/// Terminal state: the chain revisited itself.
#[derive(Debug, Clone, Copy)]
pub struct Circular;

/// An alias in one of its four states.
#[derive(Debug, Clone)]
pub enum LinkAliasResolver {
    /// The chain revisited itself.
    Circular(LinkAlias<Circular>),
    /// The chain ended at a non-alias resolver.
    Resolved(LinkAlias<Resolved>),
    /// The driver is following this alias's chain.
    Resolving(LinkAlias<Resolving>),
    /// Not yet followed.
    Unresolved(LinkAlias<Unresolved>),
}

/// An alias from `source` to `target`, in state `S`.
#[derive(Debug, Clone)]
pub struct LinkAlias<S> {
    /// Id under which the alias is registered.
    source: String,
    /// State-specific data.
    state: S,
    /// Id the alias points at.
    target: String,
}

/// Terminal state: references resolve through the final resolver.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The non-alias resolver at the end of the chain.
    resolver: Box<TargetResolver>,
}

/// Transient state while the driver follows the chain.
#[derive(Debug, Clone, Copy)]
pub struct Resolving;

/// Initial state.
#[derive(Debug, Clone, Copy)]
pub struct Unresolved;

impl<S> LinkAlias<S> {
    /// The selector the alias is registered under.
    pub fn selector(&self) -> UniqueSelector {
        return UniqueSelector::LinkDefinition(self.source.clone());
    }

    /// Id under which the alias is registered.
    pub fn source(&self) -> &str {
        return &self.source;
    }

    /// Id the alias points at.
    pub fn target(&self) -> &str {
        return &self.target;
    }

    /// Move to `state`, keeping both ids.
    fn into_state<T>(self, state: T) -> LinkAlias<T> {
        return LinkAlias {
            source: self.source,
            state,
            target: self.target,
        };
    }
}

impl LinkAlias<Resolving> {
    /// Mark the alias as part of a cycle. Permanent.
    pub fn circular_reference(self) -> LinkAlias<Circular> {
        tracing::warn!(alias = %self.source, target = %self.target, "circular link alias");
        return self.into_state(Circular);
    }

    /// Bind the alias to the resolver its chain ends at. Permanent.
    pub fn resolve_with(self, resolver: TargetResolver) -> LinkAlias<Resolved> {
        return self.into_state(Resolved {
            resolver: Box::new(resolver),
        });
    }
}

impl LinkAlias<Unresolved> {
    /// Start following the chain.
    pub fn begin_resolving(self) -> LinkAlias<Resolving> {
        return self.into_state(Resolving);
    }

    /// A fresh alias from `source` to `target`.
    pub fn unresolved(source: &str, target: &str) -> Self {
        return Self {
            source: source.to_string(),
            state: Unresolved,
            target: target.to_string(),
        };
    }
}

impl LinkAliasResolver {
    /// A fresh, unresolved alias wrapped for registration.
    pub fn unresolved(source: &str, target: &str) -> Self {
        return Self::Unresolved(LinkAlias::unresolved(source, target));
    }

    /// Aliases are never targets.
    pub const fn replace_target(&self, _node: &Node) -> Option<Node> {
        return None;
    }

    /// Resolve through the chain, or report why it cannot be followed.
    pub fn resolve_reference(&mut self, source: &LinkSource) -> Option<Span> {
        return match self {
            Self::Circular(alias) => Some(invalid_reference_span(
                &format!("circular link reference: {}", alias.target),
                source,
            )),
            Self::Resolved(alias) => alias.state.resolver.resolve_reference(source),
            Self::Resolving(LinkAlias { target, .. }) | Self::Unresolved(LinkAlias { target, .. }) => {
                Some(invalid_reference_span(&format!("unresolved link alias: {target}"), source))
            },
        };
    }

    /// The selector the alias is registered under.
    pub fn selector(&self) -> UniqueSelector {
        return match self {
            Self::Circular(alias) => alias.selector(),
            Self::Resolved(alias) => alias.selector(),
            Self::Resolving(alias) => alias.selector(),
            Self::Unresolved(alias) => alias.selector(),
        };
    }
}

impl From<LinkAlias<Circular>> for LinkAliasResolver {
    fn from(alias: LinkAlias<Circular>) -> Self {
        return Self::Circular(alias);
    }
}

impl From<LinkAlias<Resolved>> for LinkAliasResolver {
    fn from(alias: LinkAlias<Resolved>) -> Self {
        return Self::Resolved(alias);
    }
}

impl From<LinkAlias<Resolving>> for LinkAliasResolver {
    fn from(alias: LinkAlias<Resolving>) -> Self {
        return Self::Resolving(alias);
    }
}
