//! String intern table.
//!
//! Maps content to the single [`ObjRef`] holding that content. Lookups are
//! bucketed by the precomputed FNV-1a hash; colliding strings share a bucket
//! and are told apart by comparing text. The table does not keep strings
//! alive: the collector prunes unmarked entries before sweeping.

use core_types::ObjRef;
use std::collections::HashMap;

/// Weak set of interned strings, keyed by hash
#[derive(Debug, Default)]
pub struct Interner {
    buckets: HashMap<u32, Vec<ObjRef>>,
    len: usize,
}

impl Interner {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Find an entry with `hash` for which `same_text` holds
    pub fn find(&self, hash: u32, mut same_text: impl FnMut(ObjRef) -> bool) -> Option<ObjRef> {
        self.buckets
            .get(&hash)?
            .iter()
            .copied()
            .find(|r| same_text(*r))
    }

    /// Register a freshly allocated string
    pub fn insert(&mut self, hash: u32, r: ObjRef) {
        self.buckets.entry(hash).or_default().push(r);
        self.len += 1;
    }

    /// Keep only entries for which `keep` holds; returns how many were dropped
    pub fn retain(&mut self, mut keep: impl FnMut(ObjRef) -> bool) -> usize {
        let before = self.len;
        self.buckets.retain(|_, bucket| {
            bucket.retain(|r| keep(*r));
            !bucket.is_empty()
        });
        self.len = self.buckets.values().map(Vec::len).sum();
        before - self.len
    }

    /// Number of interned strings
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }
}
