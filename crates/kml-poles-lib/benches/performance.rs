//! Performance benchmarks for kml-poles-lib
//!
//! Run with: cargo bench --package kml-poles-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geo::Coord;
use kml_poles_lib::{
    LabelConfig, Numbering, PipelineConfig, Polyline, StepPolicy, encode, label_markers, parse,
    process, segment_with_policy,
};

/// Generate a wiggly route with the specified number of vertices.
fn generate_coords(num_points: usize, base_x: f64, base_y: f64) -> Vec<Coord<f64>> {
    (0..num_points)
        .map(|i| {
            let t = i as f64 / num_points as f64;
            Coord {
                x: base_x + t * 1000.0 + (t * 50.0).sin() * 10.0,
                y: base_y + t * 1000.0 + (t * 30.0).cos() * 10.0,
            }
        })
        .collect()
}

/// Generate a KML document with `num_lines` routes nested in a folder
fn generate_kml(num_lines: usize, points_per_line: usize) -> Vec<u8> {
    let mut body = String::new();
    for i in 0..num_lines {
        let coords: Vec<String> = generate_coords(points_per_line, i as f64 * 10.0, 0.0)
            .iter()
            .map(|c| format!("{},{},0", c.x, c.y))
            .collect();
        body.push_str(&format!(
            "<Placemark><name>Line {i}</name><LineString><coordinates>{}</coordinates></LineString></Placemark>",
            coords.join(" ")
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><kml xmlns="http://www.opengis.net/kml/2.2"><Document><Folder>{body}</Folder></Document></kml>"#
    )
    .into_bytes()
}

// ============================================================================
// Core Benchmarks - Key performance indicators
// ============================================================================

fn bench_segment(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment");

    let polyline = Polyline::new(generate_coords(50_000, 0.0, 0.0), 0, None).unwrap();
    for interval in [1.0, 10.0, 100.0] {
        group.bench_with_input(
            BenchmarkId::new("floor_to_unit", interval),
            &interval,
            |b, &interval| {
                b.iter(|| segment_with_policy(&polyline, interval, StepPolicy::FloorToUnit).unwrap())
            },
        );
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for num_lines in [10, 100] {
        let document = generate_kml(num_lines, 1_000);
        group.throughput(Throughput::Bytes(document.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_lines),
            &document,
            |b, document| b.iter(|| parse(document)),
        );
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let polyline = Polyline::new(generate_coords(10_000, 0.0, 0.0), 0, None).unwrap();
    let markers = segment_with_policy(&polyline, 1.0, StepPolicy::FloorToUnit).unwrap();
    let placemarks = label_markers(&[markers], &LabelConfig::new("TE", Numbering::Global));

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(placemarks.len() as u64));
    group.bench_function("placemarks", |b| {
        b.iter(|| encode(&placemarks, &Default::default()).unwrap())
    });
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let document = generate_kml(50, 2_000);
    let config = PipelineConfig {
        interval: 5.0,
        ..PipelineConfig::default()
    };

    c.bench_function("pipeline/process", |b| {
        b.iter(|| process(&document, &config).unwrap())
    });
}

criterion_group!(
    benches,
    bench_segment,
    bench_parse,
    bench_encode,
    bench_pipeline
);
criterion_main!(benches);
