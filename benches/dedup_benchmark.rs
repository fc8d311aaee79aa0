//! Compares the two near-duplicate code paths on a mid-sized catalog.
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use catalog_refinery::{
    ColumnRole, ColumnRoleMap, DetectionConfig, DuplicateDetectionEngine, ProductRecord,
};

fn synthetic_rows(n: usize) -> Vec<ProductRecord> {
    let nouns = [
        "parafuso", "porca", "arruela", "bucha", "martelo", "chave", "broca", "rebite",
    ];
    let qualifiers = [
        "sextavado", "zincado", "polido", "reforcado", "isolado", "temperado",
    ];

    (0..n)
        .map(|i| {
            let nome = format!(
                "{} {} modelo{} linha{}",
                nouns[i % nouns.len()],
                qualifiers[(i / nouns.len()) % qualifiers.len()],
                i % 97,
                i % 13,
            );
            ProductRecord::from_pairs([("sku", format!("SKU-{i}").as_str()), ("nome", nome.as_str())])
        })
        .collect()
}

fn roles() -> ColumnRoleMap {
    ColumnRoleMap::new()
        .with_role("nome", ColumnRole::Analyze)
        .with_key_column("sku")
        .with_text_column("nome")
}

fn bench_detection_paths(c: &mut Criterion) {
    let rows = synthetic_rows(1_000);
    let roles = roles();

    let mut group = c.benchmark_group("near_duplicate_detection");

    group.bench_function("pairwise_1000_rows", |b| {
        let engine = DuplicateDetectionEngine::new(DetectionConfig {
            pairwise_limit: usize::MAX,
            ..DetectionConfig::default()
        });
        b.iter(|| black_box(engine.detect(black_box(&rows), &roles)));
    });

    group.bench_function("bucketed_1000_rows", |b| {
        let engine = DuplicateDetectionEngine::new(DetectionConfig {
            pairwise_limit: 0,
            ..DetectionConfig::default()
        });
        b.iter(|| black_box(engine.detect(black_box(&rows), &roles)));
    });

    group.finish();
}

criterion_group!(benches, bench_detection_paths);
criterion_main!(benches);
