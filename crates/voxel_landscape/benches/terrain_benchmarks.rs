//! Benchmarks for the chunk generation pipeline.
//!
//! Covers each stage a generation worker runs: section building, land map
//! sampling, and box meshing.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::prelude::*;
use voxel_landscape::{
  Chunk, ChunkPos, Column, Grid, LATTICE_SIZE, LandMap, LandSection, TerrainGenerator, build_mesh,
  generate_section,
};

const SECTIONS: u64 = 10_000;

fn bench_sections(c: &mut Criterion) {
  let mut rng = StdRng::seed_from_u64(42);
  let inputs: Vec<(f32, f32)> = (0..SECTIONS)
    .map(|_| (rng.gen_range(0.0..=1.0), rng.gen_range(0.0..=1.0)))
    .collect();

  let mut group = c.benchmark_group("terrain/section");
  group.throughput(Throughput::Elements(SECTIONS));
  group.bench_function("generate_section", |b| {
    b.iter(|| {
      let mut columns = 0;
      for &(a, bv) in &inputs {
        if let Ok(section) = generate_section(black_box(a), black_box(bv)) {
          columns += section.len();
        }
      }
      columns
    })
  });
  group.finish();
}

fn bench_land_map(c: &mut Criterion) {
  let generator = TerrainGenerator::default();
  let mut group = c.benchmark_group("terrain/land_map");
  group.throughput(Throughput::Elements((LATTICE_SIZE * LATTICE_SIZE) as u64));

  for (x, z) in [(0, 0), (17, -9)] {
    let pos = ChunkPos::from_grid(x, z);
    group.bench_with_input(BenchmarkId::from_parameter(pos), &pos, |b, &pos| {
      b.iter(|| generator.generate_map(black_box(pos)))
    });
  }
  group.finish();
}

/// Every cell the same section.
fn uniform_map(section: LandSection) -> LandMap {
  Grid::filled(LATTICE_SIZE, LATTICE_SIZE, section)
}

fn bench_meshing(c: &mut Criterion) {
  let maps = [
    ("solid", uniform_map(LandSection::Solid(Column::new(0, 150)))),
    (
      "cavern",
      uniform_map(LandSection::Cavern {
        floor: Column::new(0, 60),
        ceiling: Some(Column::new(120, 200)),
      }),
    ),
    (
      "generated",
      TerrainGenerator::default()
        .generate_map(ChunkPos::default())
        .expect("default terrain is in range"),
    ),
  ];

  let mut group = c.benchmark_group("mesh/build");
  for (name, map) in &maps {
    group.bench_with_input(BenchmarkId::from_parameter(name), map, |b, map| {
      b.iter(|| build_mesh(black_box(map)))
    });
  }
  group.finish();
}

fn bench_chunk(c: &mut Criterion) {
  let generator = TerrainGenerator::default();
  c.bench_function("chunk/generate", |b| {
    b.iter(|| Chunk::generate(black_box(ChunkPos::from_grid(3, 4)), &generator))
  });
}

criterion_group!(benches, bench_sections, bench_land_map, bench_meshing, bench_chunk);
criterion_main!(benches);
