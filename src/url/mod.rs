//! URL handling module for Sumi-Crawl
//!
//! This module provides the [`Address`] type used as the crawl's identity key,
//! scope and exclusion rules for a single-host crawl, and the canonicalization
//! that folds equivalent links into one address.

mod address;
mod normalize;
mod scope;

// Re-export main types and functions
pub use address::Address;
pub use normalize::{canonicalize, canonicalize_link};
pub use scope::{is_excluded, is_in_scope, EXCLUDED_PATH_MARKER};
