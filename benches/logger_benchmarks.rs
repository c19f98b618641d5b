//! Criterion benchmarks for ops_toolkit

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ops_toolkit::prelude::*;
use ops_toolkit::{JsonHandler, PrettyHandler, TextHandler};
use std::io;

fn request_record() -> Record {
    Record::new(Severity::INFO, "request served").with_attrs(vec![
        Attr::new("method", "GET"),
        Attr::new("path", "/health"),
        Attr::new("status", 200),
        Attr::new("elapsed_ms", 1.25),
    ])
}

// ============================================================================
// Rendering Benchmarks
// ============================================================================

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.throughput(Throughput::Elements(1));

    let record = request_record();
    let json = JsonHandler::new(Sink::new("null", io::sink()), Severity::DEBUG);
    let pretty = PrettyHandler::new(Sink::new("null", io::sink()), Severity::DEBUG);
    let colored = PrettyHandler::new(Sink::new("null", io::sink()).with_color(true), Severity::DEBUG);
    let text = TextHandler::new(Sink::new("null", io::sink()), Severity::DEBUG);

    group.bench_function("json", |b| b.iter(|| black_box(json.render(&record))));
    group.bench_function("pretty", |b| b.iter(|| black_box(pretty.render(&record))));
    group.bench_function("pretty_colored", |b| b.iter(|| black_box(colored.render(&record))));
    group.bench_function("plain", |b| b.iter(|| black_box(text.render(&record))));

    group.finish();
}

// ============================================================================
// Logger Benchmarks
// ============================================================================

fn bench_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("logging");
    group.throughput(Throughput::Elements(1));

    for format in ["json", "pretty", "plain"] {
        let logger = Logger::builder()
            .format(format)
            .sink(Sink::new("null", io::sink()))
            .build()
            .unwrap()
            .with_attr("component", "bench");

        group.bench_function(format, |b| {
            b.iter(|| logger.info_with("request served", [Attr::new("status", black_box(200))]))
        });
    }

    group.finish();
}

fn bench_disabled(c: &mut Criterion) {
    let mut group = c.benchmark_group("disabled");
    group.throughput(Throughput::Elements(1));

    let filtered = Logger::builder()
        .level(Severity::ERROR)
        .format("json")
        .sink(Sink::new("null", io::sink()))
        .build()
        .unwrap();
    let discard = Logger::discard();

    group.bench_function("below_threshold", |b| {
        b.iter(|| ops_toolkit::debug!(filtered, "value {}", black_box(42); "k" => "v"))
    });
    group.bench_function("discard", |b| {
        b.iter(|| ops_toolkit::info!(discard, "value {}", black_box(42); "k" => "v"))
    });

    group.finish();
}

// ============================================================================
// Derivation Benchmarks
// ============================================================================

fn bench_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("derivation");

    let logger = Logger::builder()
        .format("json")
        .sink(Sink::new("null", io::sink()))
        .build()
        .unwrap();

    group.bench_function("with_attr", |b| {
        b.iter(|| black_box(logger.with_attr("request_id", "abc-123")))
    });
    group.bench_function("with_group", |b| b.iter(|| black_box(logger.with_group("request"))));

    group.finish();
}

criterion_group!(benches, bench_render, bench_logging, bench_disabled, bench_derivation);
criterion_main!(benches);
