//! Content-addressed memo of "fields sent → enrichment result"
//!
//! Run-scoped and in-memory: the orchestrator clears it when a run starts
//! and it is never persisted. The digest is an explicit fixed-size content
//! hash over the name-sorted field set, so key order in the source row can
//! never produce a cache miss.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::enrichment::EnrichmentResult;

/// Fixed-size blake3 digest of a normalized field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Digest the exact field subset sent to the enrichment service.
    /// `BTreeMap` iteration is name-ordered, which makes the digest
    /// independent of source column order; values are hashed verbatim.
    pub fn of_fields(fields: &BTreeMap<String, String>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for (name, value) in fields {
            hasher.update(name.as_bytes());
            hasher.update(&[0x1f]);
            hasher.update(value.as_bytes());
            hasher.update(&[0x1e]);
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Synchronous in-memory memo, owned by the orchestrator's control task.
#[derive(Debug, Default)]
pub struct EnrichmentCache {
    entries: HashMap<ContentDigest, EnrichmentResult>,
    hits: u64,
    misses: u64,
}

impl EnrichmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, digest: &ContentDigest) -> Option<&EnrichmentResult> {
        let entry = self.entries.get(digest);
        if entry.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        entry
    }

    pub fn put(&mut self, digest: ContentDigest, result: EnrichmentResult) {
        self.entries.insert(digest, result);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn digest_is_order_independent_on_field_names() {
        let a = fields(&[("nome", "Parafuso M8"), ("categoria", "fixadores")]);
        let b = fields(&[("categoria", "fixadores"), ("nome", "Parafuso M8")]);
        assert_eq!(ContentDigest::of_fields(&a), ContentDigest::of_fields(&b));
    }

    #[test]
    fn digest_distinguishes_values_and_field_splits() {
        let a = fields(&[("nome", "Parafuso M8")]);
        let b = fields(&[("nome", "Parafuso M9")]);
        assert_ne!(ContentDigest::of_fields(&a), ContentDigest::of_fields(&b));

        // "ab" + "c" must not collide with "a" + "bc".
        let c = fields(&[("ab", "c")]);
        let d = fields(&[("a", "bc")]);
        assert_ne!(ContentDigest::of_fields(&c), ContentDigest::of_fields(&d));
    }

    #[test]
    fn cache_round_trip_and_counters() {
        let mut cache = EnrichmentCache::new();
        let digest = ContentDigest::of_fields(&fields(&[("nome", "Porca M8")]));

        assert!(cache.get(&digest).is_none());
        cache.put(
            digest,
            EnrichmentResult::accepted(0, fields(&[("categoria", "fixadores")]), 40),
        );
        assert!(cache.get(&digest).is_some());
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.hits(), 0);
    }
}
