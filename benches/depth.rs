use criterion::{criterion_group, criterion_main, Criterion, black_box};

use raddepth::conversion::{ConversionTable, DensityConverter};
use raddepth::depth::compute_depth;
use raddepth::math::Ray;
use raddepth::raytrace::traverse_into;
use raddepth::volume::{GridDims, GridGeometry, VoxelGrid};

use glam::DVec3;

fn cube_geometry(n: usize) -> GridGeometry {
    let dims = GridDims::new(n, n, n).unwrap();
    GridGeometry::new(dims, DVec3::new(-50.0, -50.0, -50.0), DVec3::splat(100.0 / n as f64)).unwrap()
}

fn bench_traverse_diagonal_128(c: &mut Criterion) {
    let geometry = cube_geometry(128);
    let ray = Ray::new(DVec3::new(-80.0, -61.0, -73.0), DVec3::new(90.0, 77.0, 58.0));
    let mut samples = Vec::new();

    c.bench_function("traverse_diagonal_128", |b| {
        b.iter(|| {
            traverse_into(black_box(&geometry), black_box(&ray), &mut samples);
            black_box(samples.len())
        });
    });
}

fn bench_convert_64(c: &mut Criterion) {
    let geometry = cube_geometry(64);
    let values = (0..geometry.dims.len())
        .map(|i| -1000.0 + (i % 2000) as f64)
        .collect();
    let ct = VoxelGrid::from_vec(geometry, values).unwrap();
    let table = ConversionTable::from_columns(
        &[-1000.0, -100.0, 0.0, 100.0, 1000.0],
        &[0.0, 0.9, 1.0, 1.1, 1.6],
    )
    .unwrap();
    let converter = DensityConverter::new(&table);

    c.bench_function("convert_64", |b| {
        b.iter(|| converter.convert(black_box(&ct)).unwrap());
    });

    c.bench_function("convert_par_64", |b| {
        b.iter(|| converter.convert_par(black_box(&ct)).unwrap());
    });
}

fn bench_depth_32(c: &mut Criterion) {
    let geometry = cube_geometry(32);
    let density = VoxelGrid::filled(geometry, 1.0_f32).unwrap();
    let source = DVec3::new(0.0, -1000.0, 0.0);

    c.bench_function("depth_32", |b| {
        b.iter(|| compute_depth(black_box(&density), black_box(source)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_traverse_diagonal_128,
    bench_convert_64,
    bench_depth_32,
);
criterion_main!(benches);
