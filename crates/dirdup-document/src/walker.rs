//! Reference walker
//!
//! Visits every node of a document tree and substitutes scalar values that
//! sit directly under the reserved reference key. Structure is never changed.

use crate::node::{DocumentNode, DocumentSet};

/// Default reserved reference-field key
pub const DEFAULT_REFERENCE_KEY: &str = "guid";

/// Lookup from old identifier text to its replacement
///
/// Implemented for the standard string maps; identifier map types implement it
/// so the walker does not depend on them.
pub trait ReferenceLookup {
    /// Replacement for `old`, if any
    fn lookup(&self, old: &str) -> Option<&str>;
}

impl<S: std::hash::BuildHasher> ReferenceLookup for std::collections::HashMap<String, String, S> {
    fn lookup(&self, old: &str) -> Option<&str> {
        self.get(old).map(String::as_str)
    }
}

impl ReferenceLookup for std::collections::BTreeMap<String, String> {
    fn lookup(&self, old: &str) -> Option<&str> {
        self.get(old).map(String::as_str)
    }
}

/// Walks trees and rewrites references behind one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTreeWalker {
    reference_key: String,
}

impl Default for DocumentTreeWalker {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_KEY)
    }
}

impl DocumentTreeWalker {
    /// Create walker for a reference key
    #[inline]
    #[must_use]
    pub fn new(reference_key: impl Into<String>) -> Self {
        Self {
            reference_key: reference_key.into(),
        }
    }

    /// Reserved key this walker rewrites under
    #[inline]
    #[must_use]
    pub fn reference_key(&self) -> &str {
        &self.reference_key
    }

    /// Rewrite `node` in place; returns the number of replaced scalars
    ///
    /// `current_key` is the mapping key `node` sits under, `None` for
    /// sequence items and document roots.
    pub fn rewrite<M>(&self, node: &mut DocumentNode, current_key: Option<&str>, map: &M) -> usize
    where
        M: ReferenceLookup + ?Sized,
    {
        match node {
            DocumentNode::Mapping { entries, .. } => entries
                .iter_mut()
                .map(|(key, child)| self.rewrite(child, Some(key.as_str()), map))
                .sum(),
            DocumentNode::Sequence { items, .. } => items
                .iter_mut()
                .map(|child| self.rewrite(child, None, map))
                .sum(),
            DocumentNode::Scalar(scalar) => {
                if current_key != Some(self.reference_key.as_str()) {
                    return 0;
                }
                match map.lookup(&scalar.value) {
                    Some(replacement) => {
                        scalar.value = replacement.to_string();
                        1
                    }
                    None => 0,
                }
            }
        }
    }

    /// Rewrite every document root of a set
    pub fn rewrite_set<M>(&self, documents: &mut DocumentSet, map: &M) -> usize
    where
        M: ReferenceLookup + ?Sized,
    {
        documents
            .documents
            .iter_mut()
            .map(|document| self.rewrite(&mut document.root, None, map))
            .sum()
    }
}
