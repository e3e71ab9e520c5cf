//! # Concept Benchmarks
//!
//! Performance benchmarks for lexis-core resolution, projection and search.
//!
//! Run with: `cargo bench -p lexis-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lexis_core::{
    ConceptStore, IdentifierResolver, MemoryStore, NameSpec, NewConcept, Representation,
    RequestContext, SearchEngine, SearchFilter, SearchOptions, Session, project,
    snapshot_to_bytes,
};
use std::hint::black_box;

/// Build an in-memory dictionary of `size` concepts named "TERM <i>".
fn create_dictionary(size: usize) -> Session {
    let mut session = Session::new();
    let ctx = RequestContext::default();
    for i in 0..size {
        let spec = NewConcept {
            names: vec![NameSpec::fully_specified(format!("TERM {}", i))],
            datatype: "Numeric".to_string(),
            concept_class: "Test".to_string(),
            ..NewConcept::default()
        };
        session.create(&ctx, spec).expect("create");
    }
    session
}

fn to_store(session: &Session) -> MemoryStore {
    MemoryStore::from_concepts(session.export_concepts().expect("export"))
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_resolve_by_name(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_by_name");

    for size in [100, 1000, 10000].iter() {
        let store = to_store(&create_dictionary(*size));
        let resolver = IdentifierResolver::default();
        let target = format!("term {}", size / 2);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(resolver.resolve(&store, &target)));
        });
    }

    group.finish();
}

fn bench_project_full(c: &mut Criterion) {
    let store = to_store(&create_dictionary(1000));
    let concepts = store.list_all(false).expect("list");
    let locale = RequestContext::default().locale;

    c.bench_function("project_full_1000", |b| {
        b.iter(|| {
            for concept in &concepts {
                let _ = black_box(project(&store, concept, Representation::Full, &locale));
            }
        });
    });
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let ctx = RequestContext::default();

    for size in [100, 1000, 10000].iter() {
        let store = to_store(&create_dictionary(*size));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                black_box(SearchEngine.search(
                    &store,
                    &ctx,
                    "term 5",
                    SearchFilter::None,
                    SearchOptions::default(),
                ))
            });
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_to_bytes");

    for size in [100, 1000].iter() {
        let concepts = create_dictionary(*size).export_concepts().expect("export");
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(snapshot_to_bytes(&concepts)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_resolve_by_name,
    bench_project_full,
    bench_search,
    bench_snapshot,
);

criterion_main!(benches);
