use criterion::{criterion_group, criterion_main};


use book_ops::register_benchmarks as register_book_benchmarks;

criterion_group!(benches, register_book_benchmarks);

criterion_main!(benches);
