use criterion::{criterion_group, criterion_main, Criterion};
use quarry_core::tokenizer::{stems, unique_stems};

const SAMPLE: &str = "The quick brown fox jumps over the lazy dog while \
    categorical cats catch red fish, red fish, and herons wade through \
    shallow water searching for minnows near the riverbank. Crawlers visit \
    pages, extract anchors, and feed stemmed tokens into a shared index \
    guarded by a reader-writer lock.";

fn bench_stems(c: &mut Criterion) {
    c.bench_function("stems_paragraph", |b| b.iter(|| stems(SAMPLE)));
    c.bench_function("unique_stems_paragraph", |b| b.iter(|| unique_stems(SAMPLE)));
}

criterion_group!(benches, bench_stems);
criterion_main!(benches);
