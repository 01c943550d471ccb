//! Benchmarks for IRIS value conversion.

#![allow(clippy::unwrap_used, missing_docs)]

use criterion::{Criterion, criterion_group, criterion_main};
use iris_protocol::ListItem;
use iris_types::{FromIris, IrisValue, SqlType, ToIris, from_odbc, to_odbc};
use std::hint::black_box;

/// Benchmark ToIris conversions (Rust → IrisValue).
fn bench_to_iris(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_iris");

    let int_val: i32 = 12345;
    group.bench_function("i32", |b| {
        b.iter(|| black_box(black_box(&int_val).to_iris().unwrap()))
    });

    let string_val = "test string value".to_string();
    group.bench_function("String", |b| {
        b.iter(|| black_box(black_box(&string_val).to_iris().unwrap()))
    });

    let opt_none: Option<i32> = None;
    group.bench_function("Option_i32_None", |b| {
        b.iter(|| black_box(black_box(&opt_none).to_iris().unwrap()))
    });

    group.finish();
}

/// Benchmark FromIris conversions (IrisValue → Rust).
fn bench_from_iris(c: &mut Criterion) {
    let mut group = c.benchmark_group("from_iris");

    let int_val = IrisValue::Int(12345);
    group.bench_function("i32", |b| {
        b.iter(|| black_box(i32::from_iris(black_box(&int_val)).unwrap()))
    });

    let text_val = IrisValue::from("test string value");
    group.bench_function("String", |b| {
        b.iter(|| black_box(String::from_iris(black_box(&text_val)).unwrap()))
    });

    group.finish();
}

/// Benchmark column decoding by declared type.
fn bench_from_odbc(c: &mut Criterion) {
    let mut group = c.benchmark_group("from_odbc");

    let int_item = ListItem::from_i64(987_654_321);
    group.bench_function("integer", |b| {
        b.iter(|| black_box(from_odbc(SqlType::Integer, black_box(&int_item)).unwrap()))
    });

    let text_item = ListItem::from_text("Ada Lovelace");
    group.bench_function("varchar", |b| {
        b.iter(|| black_box(from_odbc(SqlType::VarChar, black_box(&text_item)).unwrap()))
    });

    let ticks_item = ListItem::from_i64(1_154_679_522_636_970_432);
    group.bench_function("timestamp_posix", |b| {
        b.iter(|| black_box(from_odbc(SqlType::TimestampPosix, black_box(&ticks_item)).unwrap()))
    });

    group.finish();
}

/// Benchmark parameter encoding.
fn bench_to_odbc(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_odbc");

    let float_val = IrisValue::Float(1.234);
    group.bench_function("float", |b| {
        b.iter(|| black_box(to_odbc(black_box(&float_val)).unwrap()))
    });

    let text_val = IrisValue::from("Привет, мир");
    group.bench_function("unicode_text", |b| {
        b.iter(|| black_box(to_odbc(black_box(&text_val)).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_to_iris,
    bench_from_iris,
    bench_from_odbc,
    bench_to_odbc,
);

criterion_main!(benches);
