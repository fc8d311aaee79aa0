//! Similarity index: cheap text fingerprints and token-set Jaccard
//!
//! The fingerprint is a coarse bucketing key built from a field's leading
//! significant tokens; rows sharing a fingerprint become candidates for the
//! pairwise comparison the engine runs inside each bucket. Short or empty
//! text never fingerprints and never counts as similar, so near-empty
//! fields cannot produce pathological matches.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Tokens this short carry no signal and are dropped everywhere.
pub const MIN_TOKEN_LEN: usize = 2;

/// Leading significant tokens kept when building a fingerprint.
pub const FINGERPRINT_TOKEN_LIMIT: usize = 4;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("valid token splitter"));

/// Significant tokens of `text`: lowercased, split on non-word boundaries,
/// tokens of length ≤ 2 dropped.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    NON_WORD
        .split(text)
        .filter(|token| token.len() > MIN_TOKEN_LEN)
        .map(str::to_lowercase)
}

/// Bucketing key for `text`: first 4 significant tokens, sorted and joined.
/// Returns `""` for text with no significant tokens; callers must treat an
/// empty key as "no fingerprint" and exclude it from bucketing.
pub fn fingerprint(text: &str) -> String {
    let mut leading: Vec<String> = tokens(text).take(FINGERPRINT_TOKEN_LIMIT).collect();
    leading.sort();
    leading.join("|")
}

/// Token-set Jaccard index over significant tokens: `|A∩B| / |A∪B|`.
/// Returns `0.0` when either token set is empty.
pub fn similarity(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<String> = tokens(a).collect();
    let set_b: BTreeSet<String> = tokens(b).collect();

    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}
