//! Benchmarks for measuring script evaluation and commit performance.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scriptgen::format::{CanonicalFormatter, MergeFormatter, Transform};
use scriptgen::{ScriptEngine, ScriptSource};
use std::fs;
use tempfile::TempDir;

const MODELS_SCRIPT: &str = "\
{{ output.attach_formatter('models.rs', formatters.canonical) }}
{% for entity in project.properties.entities %}
{{ output.writeln('models.rs', 'pub struct ' ~ (entity | pascal_case) ~ ' {') }}
{{ output.writeln('models.rs', 'pub id: u64,') }}
{{ output.writeln('models.rs', 'pub ' ~ (entity | foreign_key) ~ ': u64,') }}
{{ output.writeln('models.rs', '}') }}
{% endfor %}
";

/// Project with `entities` entity names and one script.
fn setup(entities: usize) -> (TempDir, ScriptEngine, ScriptSource) {
    let dir = TempDir::new().unwrap();
    let names: Vec<String> = (0..entities).map(|i| format!("entity_{i}")).collect();
    let project = dir.path().join("bench.json");
    fs::write(&project, serde_json::json!({ "entities": names }).to_string()).unwrap();
    let script = dir.path().join("models.gen");
    fs::write(&script, MODELS_SCRIPT).unwrap();

    let engine = ScriptEngine::new(&project, None).unwrap();
    let source = ScriptSource::from_file(&script).unwrap();
    (dir, engine, source)
}

/// Benchmark: full evaluation with a growing number of entities
fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for entities in [5, 25, 100] {
        let (_dir, engine, source) = setup(entities);
        group.throughput(Throughput::Elements(entities as u64));
        group.bench_with_input(BenchmarkId::new("entities", entities), &source, |b, source| {
            b.iter(|| assert!(engine.evaluate(black_box(source)).success));
        });
    }

    group.finish();
}

/// Benchmark: formatters on a large generated file
fn bench_formatters(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatters");
    group.sample_size(20);

    let mut generated = String::new();
    let mut previous = String::new();
    for i in 0..200 {
        let block = format!(
            "impl Entity{i} {{\nfn id(&self) -> u64 {{\n{i}\n}}\n// BEGIN-PRESERVED custom{i}\n// END-PRESERVED custom{i}\n}}\n"
        );
        generated.push_str(&block);
        previous.push_str(&block.replace(
            &format!("// BEGIN-PRESERVED custom{i}\n"),
            &format!("// BEGIN-PRESERVED custom{i}\nfn extra(&self) {{}}\n"),
        ));
    }

    group.bench_function("canonical", |b| {
        let canonical = CanonicalFormatter::new(4);
        b.iter(|| canonical.transform(black_box(&generated), None).unwrap());
    });
    group.bench_function("merge", |b| {
        b.iter(|| MergeFormatter.transform(black_box(&generated), Some(&previous)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_formatters);
criterion_main!(benches);
