use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lumen_fhirpath::{Engine, JsonAdapter, Variables};
use serde_json::json;

fn patient() -> serde_json::Value {
    json!({
        "resourceType": "Patient",
        "active": true,
        "name": [
            {"use": "official", "given": ["Peter", "James"], "family": "Chalmers"},
            {"use": "usual", "given": ["Jim"]}
        ],
        "birthDate": "1974-12-25"
    })
}

fn bench_parse(c: &mut Criterion) {
    let engine = Engine::default();
    c.bench_function("parse_path", |b| {
        b.iter(|| engine.parse(black_box("Patient.name.where(use = 'official').given")))
    });
    c.bench_function("parse_arithmetic", |b| {
        b.iter(|| engine.parse(black_box("(1 + 2 * 3 - 4) div 2 = 1 and 3 > 2")))
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let engine = Engine::default();
    let vars = Variables::new();

    let arithmetic = engine.parse("(1 | 2 | 3 | 4 | 5).aggregate($total + $this, 0)").unwrap();
    c.bench_function("eval_aggregate", |b| {
        b.iter(|| engine.evaluate_ast(black_box(&arithmetic), None, &vars))
    });

    let quantity = engine.parse("1 'kg' * 2 'm' = 2000 'g.m'").unwrap();
    c.bench_function("eval_quantity", |b| {
        b.iter(|| engine.evaluate_ast(black_box(&quantity), None, &vars))
    });
}

fn bench_navigation(c: &mut Criterion) {
    let resource = patient();
    let (adapter, root) = JsonAdapter::from_json(&resource).unwrap();
    let engine = Engine::new(Arc::new(adapter));
    let vars = Variables::new();
    let ast = engine.parse("name.where(use = 'official').given").unwrap();

    c.bench_function("eval_navigation", |b| {
        b.iter(|| engine.evaluate_ast(black_box(&ast), Some(root.clone()), &vars))
    });
}

criterion_group!(benches, bench_parse, bench_evaluate, bench_navigation);
criterion_main!(benches);
