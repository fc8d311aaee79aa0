//! Duplicate report payload produced by the detection engine

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// How a duplicate group was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DuplicateKind {
    /// Rows sharing an identical trimmed unique-key value.
    ExactKey,
    /// Rows whose comparable text fields exceed the similarity threshold.
    NearText,
}

/// A group of rows believed to describe the same product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub kind: DuplicateKind,
    /// Shared key value for `ExactKey`, representative text for `NearText`.
    pub key: String,
    /// Sorted, valid row indices; always at least two members.
    pub member_indices: Vec<usize>,
    /// Similarity in `[0, 1]`; exactly `1.0` for `ExactKey` groups.
    pub similarity: f64,
    /// Whether members come from more than one uploaded source.
    pub cross_source: bool,
    /// Distinct provenance tags of the members (untagged rows contribute none).
    pub sources: BTreeSet<String>,
}

impl DuplicateGroup {
    /// Identity used to de-duplicate emitted groups: detection kind plus the
    /// exact member set.
    pub fn dedup_identity(&self) -> (DuplicateKind, Vec<usize>) {
        (self.kind, self.member_indices.clone())
    }
}

/// Advisory report over one row set; rows themselves are never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub groups: Vec<DuplicateGroup>,
    pub rows_scanned: usize,
    /// Pairwise similarity evaluations performed; observability only.
    pub comparisons: u64,
}

impl DuplicateReport {
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn cross_source_groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.iter().filter(|group| group.cross_source)
    }
}
