//! Cross-path tests for the duplicate detection engine
use catalog_refinery::{
    ColumnRole, ColumnRoleMap, DetectionConfig, DuplicateDetectionEngine, DuplicateKind,
    ProductRecord,
};

fn roles() -> ColumnRoleMap {
    ColumnRoleMap::new()
        .with_role("nome", ColumnRole::Analyze)
        .with_key_column("sku")
        .with_text_column("nome")
}

fn row(sku: &str, nome: &str) -> ProductRecord {
    ProductRecord::from_pairs([("sku", sku), ("nome", nome)])
}

/// Mid-sized set where every near-duplicate pair is vocabulary-disjoint
/// from the others and shares a fingerprint, so the pairwise and bucketed
/// paths must agree on membership.
fn paired_rows() -> Vec<ProductRecord> {
    let mut rows = Vec::new();
    let families = [
        ("parafuso sextavado zincado rosca", "fix"),
        ("martelo unha cabo madeira", "imp"),
        ("chave fenda philips isolada", "fer"),
        ("arruela lisa polida grande", "arr"),
        ("bucha nylon expansao pesada", "anc"),
    ];
    for (index, (name, prefix)) in families.iter().enumerate() {
        // Two members per family: identical significant tokens, so the
        // fingerprints coincide and similarity is 1.0.
        rows.push(row(&format!("{prefix}-{index}-a"), name));
        rows.push(row(&format!("{prefix}-{index}-b"), &format!("{name}!")));
        // A decoy with an unrelated vocabulary never qualifies.
        rows.push(row(
            &format!("{prefix}-{index}-c"),
            &format!("etiqueta adesiva rolo tipo{index} serie{index}"),
        ));
    }
    rows
}

fn near_pairs(report: &catalog_refinery::DuplicateReport) -> Vec<Vec<usize>> {
    let mut pairs: Vec<Vec<usize>> = report
        .groups
        .iter()
        .filter(|group| group.kind == DuplicateKind::NearText)
        .map(|group| group.member_indices.clone())
        .collect();
    pairs.sort();
    pairs
}

#[test]
fn rows_sharing_a_key_always_land_in_exactly_one_exact_group() {
    let mut rows = paired_rows();
    rows.push(row("fix-0-a", "algo completamente diferente"));
    rows.push(row(" fix-0-a ", "outro texto distinto aqui"));

    let engine = DuplicateDetectionEngine::new(DetectionConfig::default());
    let report = engine.detect(&rows, &roles());

    let exact: Vec<_> = report
        .groups
        .iter()
        .filter(|group| group.kind == DuplicateKind::ExactKey)
        .collect();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].key, "fix-0-a");
    // Indices 0 (original), plus the two appended rows.
    assert_eq!(exact[0].member_indices.len(), 3);
    assert_eq!(exact[0].similarity, 1.0);

    // No row index escapes the row set.
    for group in &report.groups {
        assert!(group.member_indices.iter().all(|&index| index < rows.len()));
        assert!(group.member_indices.len() >= 2);
    }
}

#[test]
fn pairwise_and_bucketed_paths_agree_on_membership() {
    let rows = paired_rows();

    let pairwise = DuplicateDetectionEngine::new(DetectionConfig {
        pairwise_limit: 500,
        ..DetectionConfig::default()
    })
    .detect(&rows, &roles());

    let bucketed = DuplicateDetectionEngine::new(DetectionConfig {
        pairwise_limit: 0,
        ..DetectionConfig::default()
    })
    .detect(&rows, &roles());

    let pairwise_pairs = near_pairs(&pairwise);
    let bucketed_pairs = near_pairs(&bucketed);

    assert_eq!(pairwise_pairs, bucketed_pairs);
    assert_eq!(pairwise_pairs.len(), 5, "one near pair per family");

    // The bucketed path must do strictly less comparison work.
    assert!(bucketed.comparisons < pairwise.comparisons);
}

#[test]
fn detection_is_advisory_and_leaves_rows_untouched() {
    let rows = paired_rows();
    let before = rows.clone();

    let engine = DuplicateDetectionEngine::new(DetectionConfig::default());
    let report = engine.detect(&rows, &roles());

    assert_eq!(rows, before);
    assert_eq!(report.rows_scanned, rows.len());
}

#[test]
fn detection_without_roles_yields_an_empty_report() {
    let rows = paired_rows();
    let engine = DuplicateDetectionEngine::new(DetectionConfig::default());

    let no_roles = ColumnRoleMap::new().with_role("nome", ColumnRole::Analyze);
    let report = engine.detect(&rows, &no_roles);

    assert!(report.groups.is_empty());
    assert_eq!(report.rows_scanned, rows.len());
}
