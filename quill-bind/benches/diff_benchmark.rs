use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use quill_bind::{detect_change, Selection, Transform};

/// ~64KB of prose, roughly a long document.
fn document() -> String {
    "The quick brown fox jumps over the lazy dog. ".repeat(1450)
}

fn bench_detect_keystroke(c: &mut Criterion) {
    let old = document();
    let mid = old.chars().count() / 2;
    let new = Transform::insert(mid, "x").apply(&old).unwrap();

    c.bench_function("detect_keystroke_64KB", |b| {
        b.iter(|| black_box(detect_change(black_box(&old), black_box(&new))))
    });
}

fn bench_detect_identical(c: &mut Criterion) {
    let old = document();
    let new = old.clone();

    c.bench_function("detect_identical_64KB", |b| {
        b.iter(|| black_box(detect_change(black_box(&old), black_box(&new))))
    });
}

fn bench_detect_total_replace(c: &mut Criterion) {
    let old = document();
    let new = old.to_uppercase();

    c.bench_function("detect_total_replace_64KB", |b| {
        b.iter(|| black_box(detect_change(black_box(&old), black_box(&new))))
    });
}

fn bench_apply(c: &mut Criterion) {
    let content = document();
    let t = Transform::replace(1000, 20, "replacement text");

    c.bench_function("apply_replace_64KB", |b| {
        b.iter(|| black_box(t.apply(black_box(&content)).unwrap()))
    });
}

fn bench_remap(c: &mut Criterion) {
    let sel = Selection::new(5000, 5010);
    let t = Transform::insert(10, "abc");

    c.bench_function("selection_remap", |b| {
        b.iter(|| black_box(black_box(sel).remap(black_box(&t), 70_000)))
    });
}

criterion_group!(
    benches,
    bench_detect_keystroke,
    bench_detect_identical,
    bench_detect_total_replace,
    bench_apply,
    bench_remap,
);
criterion_main!(benches);
