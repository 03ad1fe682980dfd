//! E2E tests for background chunk generation.
//!
//! Drives the loader from several threads at once and checks that every
//! request resolves to exactly one chunk, or to nothing once cleared.

use std::sync::Arc;
use std::thread;

use voxel_landscape::{Chunk, ChunkLoader, ChunkPos, LoaderStats, TerrainConfig, TerrainGenerator};

fn loader(workers: usize) -> ChunkLoader {
  ChunkLoader::new(Arc::new(TerrainGenerator::default()), workers).unwrap()
}

#[test]
fn concurrent_requests_generate_each_position_once() {
  let loader = loader(4);
  let positions: Vec<ChunkPos> = (0..4)
    .flat_map(|x| (0..2).map(move |z| ChunkPos::from_grid(x, z)))
    .collect();

  thread::scope(|s| {
    for _ in 0..4 {
      s.spawn(|| {
        for &pos in &positions {
          loader.add(pos);
        }
      });
    }
  });
  loader.block_until_idle();

  let stats = loader.stats();
  assert_eq!(stats.generated, positions.len());
  assert_eq!(stats.completed, positions.len());

  for &pos in &positions {
    let chunk = loader.get(pos).expect("requested chunk is ready");
    assert_eq!(chunk.pos(), pos);
  }
  assert_eq!(loader.stats(), LoaderStats {
    generated: positions.len(),
    ..Default::default()
  });
}

#[test]
fn loaded_chunk_matches_direct_generation() {
  let config = TerrainConfig {
    seed: 1234,
    ..Default::default()
  };
  let generator = Arc::new(TerrainGenerator::new(&config));
  let loader = ChunkLoader::new(Arc::clone(&generator), 2).unwrap();
  let pos = ChunkPos::from_grid(-7, 5);

  loader.add(pos);
  loader.block_until_idle();
  let streamed = loader.get(pos).unwrap();
  let direct = Chunk::generate(pos, &generator).unwrap();

  assert_eq!(streamed.mesh(), direct.mesh());
}

#[test]
fn clearing_mid_flight_leaves_no_stale_chunks() {
  let loader = loader(2);
  for x in -3..=3 {
    loader.add(ChunkPos::from_grid(x, 0));
  }
  loader.clear();

  // Re-want a subset while earlier jobs may still be running.
  let kept = [ChunkPos::from_grid(-1, 0), ChunkPos::from_grid(2, 0)];
  for pos in kept {
    loader.add(pos);
  }
  loader.block_until_idle();

  for pos in kept {
    assert_eq!(loader.get(pos).map(|c| c.pos()), Some(pos));
  }
  assert!(loader.get(ChunkPos::from_grid(0, 0)).is_none());

  loader.delete_dead_chunks();
  let stats = loader.stats();
  assert_eq!(stats.wanted, 0);
  assert_eq!(stats.completed, 0);
  assert_eq!(stats.orphaned, 0);
  assert_eq!(stats.in_flight, 0);
}

#[test]
fn dropping_loader_with_pending_work_does_not_hang() {
  let loader = loader(1);
  for x in 0..8 {
    loader.add(ChunkPos::from_grid(x, x));
  }
  drop(loader);
}
