//! Duplicate detection engine: exact-key pass plus near-text pass
//!
//! Detection is an advisory report over the row set; rows are never
//! mutated, no I/O happens, and malformed rows degrade to "excluded from
//! matching" rather than failing the scan.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::config::DetectionConfig;
use crate::domain::dedup::{DuplicateGroup, DuplicateKind, DuplicateReport};
use crate::domain::record::ProductRecord;
use crate::domain::schema::ColumnRoleMap;

use super::similarity::{fingerprint, similarity};

/// Finds exact and near-duplicate rows without collapsing into O(n²) at
/// scale: row sets above `pairwise_limit` are bucketed by fingerprint and
/// only bucket-mates are compared.
#[derive(Debug, Clone, Default)]
pub struct DuplicateDetectionEngine {
    config: DetectionConfig,
}

impl DuplicateDetectionEngine {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Scan `rows` using the key/text roles of `roles`. Pure computation;
    /// an absent key or text role simply skips the corresponding pass.
    pub fn detect(&self, rows: &[ProductRecord], roles: &ColumnRoleMap) -> DuplicateReport {
        let mut report = DuplicateReport {
            rows_scanned: rows.len(),
            ..DuplicateReport::default()
        };
        let mut seen: HashSet<(DuplicateKind, Vec<usize>)> = HashSet::new();

        if let Some(key_column) = roles.key_column() {
            self.exact_key_pass(rows, key_column, &mut report, &mut seen);
        }
        if let Some(text_column) = roles.text_column() {
            self.near_text_pass(rows, text_column, &mut report, &mut seen);
        }

        debug!(
            groups = report.groups.len(),
            comparisons = report.comparisons,
            "duplicate detection finished"
        );
        report
    }

    /// Group rows by the trimmed, case-sensitive key value; empty keys are
    /// excluded, groups of two or more become `ExactKey` duplicates.
    fn exact_key_pass(
        &self,
        rows: &[ProductRecord],
        key_column: &str,
        report: &mut DuplicateReport,
        seen: &mut HashSet<(DuplicateKind, Vec<usize>)>,
    ) {
        let mut by_key: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, row) in rows.iter().enumerate() {
            let key = row.text_or_empty(key_column).trim();
            if key.is_empty() {
                continue;
            }
            by_key.entry(key).or_default().push(index);
        }

        let mut keys: Vec<&str> = by_key.keys().copied().collect();
        keys.sort_unstable();
        for key in keys {
            let members = &by_key[key];
            if members.len() < 2 {
                continue;
            }
            push_group(
                report,
                seen,
                rows,
                DuplicateKind::ExactKey,
                key.to_string(),
                members.clone(),
                1.0,
            );
        }
    }

    fn near_text_pass(
        &self,
        rows: &[ProductRecord],
        text_column: &str,
        report: &mut DuplicateReport,
        seen: &mut HashSet<(DuplicateKind, Vec<usize>)>,
    ) {
        if rows.len() <= self.config.pairwise_limit {
            self.near_text_pairwise(rows, text_column, report, seen);
        } else {
            self.near_text_bucketed(rows, text_column, report, seen);
        }
    }

    /// Full pairwise scan for small row sets. For each row `i` the first
    /// qualifying `j > i` wins and scanning for `i` stops: earliest index,
    /// not highest similarity. Cheap by construction, not exhaustive
    /// clustering.
    fn near_text_pairwise(
        &self,
        rows: &[ProductRecord],
        text_column: &str,
        report: &mut DuplicateReport,
        seen: &mut HashSet<(DuplicateKind, Vec<usize>)>,
    ) {
        let texts: Vec<&str> = rows
            .iter()
            .map(|row| row.text_or_empty(text_column))
            .collect();

        for i in 0..texts.len() {
            if texts[i].is_empty() {
                continue;
            }
            for j in (i + 1)..texts.len() {
                if texts[j].is_empty() {
                    continue;
                }
                report.comparisons += 1;
                let score = similarity(texts[i], texts[j]);
                if score > self.config.near_dup_threshold {
                    push_group(
                        report,
                        seen,
                        rows,
                        DuplicateKind::NearText,
                        texts[i].to_string(),
                        vec![i, j],
                        score,
                    );
                    break;
                }
            }
        }
    }

    /// Fingerprint-bucketed scan for large row sets: only rows sharing a
    /// non-empty fingerprint are compared, which drops the cost from O(n²)
    /// to O(n·b) for average bucket size b. Every qualifying pair in a
    /// bucket is recorded.
    fn near_text_bucketed(
        &self,
        rows: &[ProductRecord],
        text_column: &str,
        report: &mut DuplicateReport,
        seen: &mut HashSet<(DuplicateKind, Vec<usize>)>,
    ) {
        let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, row) in rows.iter().enumerate() {
            let text = row.text_or_empty(text_column);
            let print = fingerprint(text);
            if print.is_empty() {
                continue;
            }
            buckets.entry(print).or_default().push(index);
        }

        let mut prints: Vec<&String> = buckets.keys().collect();
        prints.sort_unstable();
        for print in prints {
            let members = &buckets[print];
            if members.len() < 2 {
                continue;
            }
            for (slot, &i) in members.iter().enumerate() {
                for &j in &members[slot + 1..] {
                    report.comparisons += 1;
                    let score = similarity(
                        rows[i].text_or_empty(text_column),
                        rows[j].text_or_empty(text_column),
                    );
                    if score > self.config.near_dup_threshold {
                        push_group(
                            report,
                            seen,
                            rows,
                            DuplicateKind::NearText,
                            rows[i].text_or_empty(text_column).to_string(),
                            vec![i, j],
                            score,
                        );
                    }
                }
            }
        }
    }
}

/// Append a group unless an identical (kind, member set) was already
/// emitted; derives the cross-source flag from member provenance tags.
fn push_group(
    report: &mut DuplicateReport,
    seen: &mut HashSet<(DuplicateKind, Vec<usize>)>,
    rows: &[ProductRecord],
    kind: DuplicateKind,
    key: String,
    mut member_indices: Vec<usize>,
    similarity: f64,
) {
    member_indices.sort_unstable();
    if !seen.insert((kind, member_indices.clone())) {
        return;
    }

    let sources: BTreeSet<String> = member_indices
        .iter()
        .filter_map(|&index| rows[index].source())
        .map(str::to_string)
        .collect();

    report.groups.push(DuplicateGroup {
        kind,
        key,
        cross_source: sources.len() > 1,
        sources,
        member_indices,
        similarity,
    });
}
