//! Cross-reference resolution for document trees.
//!
//! Documents are trees of blocks and spans (see [`ast`]). References point at
//! targets by id, by path, or by position (anonymous links and automatically
//! labelled footnotes), and link aliases add named indirection. One pass of
//! [`driver::resolve_tree`] turns every reference into a link and every
//! target into its final form. Anything that cannot be resolved stays in the
//! tree as an invalid node with a message; the pass itself never fails.
//!
//! The engine is the [`selector`], [`resolver`], [`sequence`] and [`alias`]
//! modules. [`collect`], [`scope`] and [`rewrite`] are the driver built on
//! top of it.
pub mod alias;
pub mod ast;
pub mod collect;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod loader;
pub mod path;
pub mod resolver;
pub mod rewrite;
pub mod scope;
pub mod selector;
pub mod sequence;
pub mod slug;
