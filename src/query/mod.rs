//! Query rewriting module
//!
//! Text-preserving rewrites of GraphQL documents.
//!
//! # Overview
//!
//! - **Augmentation**: inject cursor variables and `pageInfo` selections
//!   into every root field the schema marks as paginated
//! - **Pruning**: drop branches whose result set is exhausted going forward
//! - **Cursor bindings**: map each branch to the variable driving its cursor

mod augment;
mod document;
mod prune;

pub use augment::{augment_query, try_augment_query};
pub use document::cursor_bindings;
pub use prune::{prune_query, try_prune_query};
