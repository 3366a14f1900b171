use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stride_tracker::geometry::{path_distance, polygon_area};
use stride_tracker::models::LocationSample;

/// Synthetic walk: a closed loop around a park, one fix per second.
fn synthetic_loop(points: usize) -> Vec<LocationSample> {
    (0..points)
        .map(|i| {
            let angle = (i as f64 / points as f64) * std::f64::consts::TAU;
            // ~500 m radius loop around a fixed center
            let lat = 37.4419 + 0.0045 * angle.sin();
            let lon = -122.1430 + 0.0045 * angle.cos();
            LocationSample::new(lat, lon, i as i64 * 1000)
        })
        .collect()
}

fn benchmark_geometry(c: &mut Criterion) {
    // Hour-long walk at 1 Hz
    let long_walk = synthetic_loop(3600);
    // Short neighborhood loop
    let short_walk = synthetic_loop(300);

    let mut group = c.benchmark_group("geodesic");

    group.bench_function("path_distance_3600_samples", |b| {
        b.iter(|| path_distance(black_box(&long_walk)))
    });

    group.bench_function("path_distance_300_samples", |b| {
        b.iter(|| path_distance(black_box(&short_walk)))
    });

    group.bench_function("polygon_area_3600_samples", |b| {
        b.iter(|| polygon_area(black_box(&long_walk)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_geometry);
criterion_main!(benches);
