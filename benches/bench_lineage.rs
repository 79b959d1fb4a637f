use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use sqlin::{
    dialect::Dialect,
    lineage::LineageParser,
    test_utils::{LINEAGE_TESTS_FILE, TestLineageData},
};

fn extract_lineage_tests(inputs: &[(String, Dialect)]) {
    for (sql, dialect) in inputs {
        let _ = LineageParser::with_dialect(sql, *dialect);
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let lineage_data_file =
        std::fs::read_to_string(LINEAGE_TESTS_FILE).expect("Cannot open lineage test cases");
    let test_lineage_data: TestLineageData =
        toml::from_str(&lineage_data_file).expect("Cannot parse test cases defined in toml");

    let inputs = test_lineage_data
        .tests
        .iter()
        .map(|t| (t.sql.clone(), t.dialect.unwrap_or_default()))
        .collect::<Vec<_>>();

    c.bench_function("bench lineage tests", |b| {
        b.iter(|| extract_lineage_tests(black_box(&inputs)))
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(1000);
    targets = criterion_benchmark
);
criterion_main!(benches);
