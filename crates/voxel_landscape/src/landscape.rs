//! Sliding window of chunks around the observer.
//!
//! The [`Landscape`] owns a fixed grid of chunk slots centred on a chunk grid
//! coordinate. Each frame it:
//!
//! 1. Re-centres when the observer strays more than one chunk from the centre,
//!    shifting surviving chunks and releasing evicted ones
//! 2. Hands loaded chunks within view distance to the renderer, nearest first
//! 3. Claims finished chunks from the loader for empty slots and uploads them
//! 4. Drops chunks that finished after they stopped being wanted
//!
//! Slot `(x, y)` covers the chunk at grid
//! `(x - w/2 + center.x, y - h/2 + center.y)`.

use std::sync::Arc;

use bevy::log::{debug, info};
use bevy::math::{IVec2, Vec2};
use bevy::prelude::Resource;

use crate::chunk::Chunk;
use crate::config::LandscapeConfig;
use crate::coords::{CHUNK_SIZE, ChunkPos, nearest_grid};
use crate::gpu::{ChunkRenderer, GpuBackend, GpuContext, GpuError, Projection};
use crate::grid::Grid;
use crate::loader::{ChunkLoader, LoaderError};
use crate::terrain::TerrainGenerator;

/// What happened during one [`Landscape::render`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
  /// Window shift applied this frame, in chunks.
  pub shifted: Option<IVec2>,
  /// Chunks handed to the renderer.
  pub drawn: usize,
  /// Chunks uploaded to the GPU.
  pub uploaded: usize,
  /// Orphaned chunks discarded.
  pub dead: usize,
}

/// Streams chunks around a moving observer.
#[derive(Resource)]
pub struct Landscape {
  config: LandscapeConfig,
  loader: ChunkLoader,
  slots: Grid<Option<Chunk>>,
  center: IVec2,
}

impl Landscape {
  /// Creates a landscape centred on grid `(0, 0)` and requests every slot.
  pub fn new(config: LandscapeConfig, generator: Arc<TerrainGenerator>) -> Result<Self, LoaderError> {
    let [w, h] = config.window_size;
    let loader = ChunkLoader::new(generator, config.worker_threads)?;
    let landscape = Self {
      slots: Grid::empty(w as usize, h as usize),
      center: IVec2::ZERO,
      loader,
      config,
    };
    landscape.request_empty_slots();
    info!(
      "Landscape streaming a {w}x{h} chunk window with {} workers",
      landscape.loader.workers()
    );
    Ok(landscape)
  }

  /// Creates a landscape whose generator is built from `config.terrain`.
  pub fn from_config(config: LandscapeConfig) -> Result<Self, LoaderError> {
    let generator = Arc::new(TerrainGenerator::new(&config.terrain));
    Self::new(config, generator)
  }

  /// Runs one frame of streaming and drawing.
  ///
  /// Fails only if a chunk upload fails; the chunk stays in its slot and the
  /// upload is retried next frame.
  pub fn render(
    &mut self,
    projection: &Projection,
    ctx: &GpuContext,
    backend: &mut impl GpuBackend,
    renderer: &mut impl ChunkRenderer,
  ) -> Result<FrameStats, GpuError> {
    let observer = projection.xz();
    let shifted = self.update_center(observer, ctx, backend);

    let visible = self.visible_chunks(observer);
    renderer.render(ctx, &visible, projection);
    let drawn = visible.len();

    let uploaded = self.load_ready_chunks(ctx, backend)?;
    let dead = self.loader.delete_dead_chunks();

    Ok(FrameStats {
      shifted,
      drawn,
      uploaded,
      dead,
    })
  }

  /// Re-centres the window if the observer is more than one chunk from the
  /// current centre on either axis. Returns the applied shift.
  pub fn update_center(
    &mut self,
    observer: Vec2,
    ctx: &GpuContext,
    backend: &mut impl GpuBackend,
  ) -> Option<IVec2> {
    let chunk = CHUNK_SIZE as f32;
    let offset = (observer - self.center.as_vec2() * chunk).abs();
    if offset.x <= chunk && offset.y <= chunk {
      return None;
    }

    let new_center = nearest_grid(observer);
    let diff = new_center - self.center;

    self.loader.clear();
    let evicted = self.slots.shift(diff);
    let evicted_count = evicted.len();
    for (_, mut chunk) in evicted {
      chunk.unload(ctx, backend);
    }
    self.center = new_center;
    self.request_empty_slots();

    debug!(
      "Landscape re-centred to {} (shift {diff}, {evicted_count} chunks evicted)",
      new_center
    );
    Some(diff)
  }

  /// Loaded chunks within view distance of `observer`, nearest first.
  pub fn visible_chunks(&self, observer: Vec2) -> Vec<&Chunk> {
    let max_sq = self.config.view_distance * self.config.view_distance;
    let mut visible: Vec<(f32, &Chunk)> = self
      .slots
      .iter()
      .filter_map(|(_, slot)| slot.as_ref())
      .filter(|chunk| chunk.is_loaded())
      .map(|chunk| (chunk.pos().distance_squared(observer), chunk))
      .filter(|(dist_sq, _)| *dist_sq <= max_sq)
      .collect();
    visible.sort_by(|a, b| a.0.total_cmp(&b.0));
    visible.into_iter().map(|(_, chunk)| chunk).collect()
  }

  /// Releases every chunk and forgets all requests.
  ///
  /// Leaves the window empty; nothing is re-requested until the next shift.
  pub fn unload_all(&mut self, ctx: &GpuContext, backend: &mut impl GpuBackend) {
    self.loader.clear();
    for (_, slot) in self.slots.iter_mut() {
      if let Some(mut chunk) = slot.take() {
        chunk.unload(ctx, backend);
      }
    }
    self.loader.delete_dead_chunks();
  }

  /// Window centre in chunk grid coordinates.
  pub fn center(&self) -> IVec2 {
    self.center
  }

  /// World position of the chunk covered by slot `(x, y)`.
  pub fn slot_pos(&self, x: usize, y: usize) -> ChunkPos {
    slot_pos(self.center, self.slots.width(), self.slots.height(), x, y)
  }

  /// Chunk held by slot `(x, y)`, if any.
  pub fn chunk_at(&self, x: usize, y: usize) -> Option<&Chunk> {
    self.slots.get(x, y)?.as_ref()
  }

  /// Number of chunks with an uploaded mesh.
  pub fn loaded_count(&self) -> usize {
    self
      .slots
      .iter()
      .filter(|(_, slot)| slot.as_ref().is_some_and(Chunk::is_loaded))
      .count()
  }

  pub fn loader(&self) -> &ChunkLoader {
    &self.loader
  }

  pub fn config(&self) -> &LandscapeConfig {
    &self.config
  }

  fn request_empty_slots(&self) {
    for (x, y) in self.slots.empty_slots() {
      self.loader.add(self.slot_pos(x, y));
    }
  }

  /// Moves finished chunks into empty slots and uploads anything not yet
  /// loaded.
  fn load_ready_chunks(
    &mut self,
    ctx: &GpuContext,
    backend: &mut impl GpuBackend,
  ) -> Result<usize, GpuError> {
    let (w, h, center) = (self.slots.width(), self.slots.height(), self.center);
    let mut uploaded = 0;

    for ((x, y), slot) in self.slots.iter_mut() {
      if slot.is_none() {
        *slot = self.loader.get(slot_pos(center, w, h, x, y));
      }
      if let Some(chunk) = slot
        && !chunk.is_loaded()
      {
        chunk.load(ctx, backend)?;
        uploaded += 1;
      }
    }
    Ok(uploaded)
  }
}

fn slot_pos(center: IVec2, width: usize, height: usize, x: usize, y: usize) -> ChunkPos {
  let half = IVec2::new(width as i32 / 2, height as i32 / 2);
  ChunkPos::from(IVec2::new(x as i32, y as i32) - half + center)
}

#[cfg(test)]
mod tests {
  use bevy::math::Vec3;

  use super::*;
  use crate::gpu::testing::{CountingBackend, RecordingRenderer};

  fn small_config() -> LandscapeConfig {
    LandscapeConfig {
      window_size: [3, 3],
      worker_threads: 2,
      ..Default::default()
    }
  }

  fn at(x: f32, z: f32) -> Projection {
    Projection::new(Vec3::new(x, 300.0, z), Vec3::NEG_Z)
  }

  #[test]
  fn slot_positions_follow_center() {
    let landscape = Landscape::from_config(small_config()).unwrap();
    assert_eq!(landscape.slot_pos(0, 0), ChunkPos::from_grid(-1, -1));
    assert_eq!(landscape.slot_pos(1, 1), ChunkPos::from_grid(0, 0));
    assert_eq!(landscape.slot_pos(2, 0), ChunkPos::from_grid(1, -1));
    assert_eq!(landscape.loader().stats().wanted, 9);
  }

  #[test]
  fn first_frames_upload_then_draw() {
    let ctx = GpuContext::bind_current_thread();
    let mut backend = CountingBackend::default();
    let mut renderer = RecordingRenderer::default();
    let mut landscape = Landscape::from_config(small_config()).unwrap();
    landscape.loader().block_until_idle();

    let first = landscape.render(&at(0.0, 0.0), &ctx, &mut backend, &mut renderer).unwrap();
    assert_eq!(first.shifted, None);
    assert_eq!(first.drawn, 0);
    assert_eq!(first.uploaded, 9);

    let second = landscape.render(&at(0.0, 0.0), &ctx, &mut backend, &mut renderer).unwrap();
    assert_eq!(second.drawn, 9);
    assert_eq!(second.uploaded, 0);
    assert_eq!(renderer.frames[1][0], ChunkPos::from_grid(0, 0));
    assert_eq!(backend.live.len(), 9);
    assert_eq!(landscape.loaded_count(), 9);

    landscape.unload_all(&ctx, &mut backend);
    assert!(backend.live.is_empty());
  }

  #[test]
  fn view_distance_limits_drawn_chunks() {
    let ctx = GpuContext::bind_current_thread();
    let mut backend = CountingBackend::default();
    let mut renderer = RecordingRenderer::default();
    let mut landscape = Landscape::from_config(LandscapeConfig {
      view_distance: 40.0,
      ..small_config()
    })
    .unwrap();
    landscape.loader().block_until_idle();
    landscape.render(&at(0.0, 0.0), &ctx, &mut backend, &mut renderer).unwrap();

    // Diagonal neighbours are ~45.3 units away.
    let visible = landscape.visible_chunks(Vec2::ZERO);
    assert_eq!(visible.len(), 5);
    let distances: Vec<f32> = visible
      .iter()
      .map(|c| c.pos().distance_squared(Vec2::ZERO))
      .collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));

    landscape.unload_all(&ctx, &mut backend);
  }

  #[test]
  fn shift_evicts_and_requests_new_column() {
    let ctx = GpuContext::bind_current_thread();
    let mut backend = CountingBackend::default();
    let mut renderer = RecordingRenderer::default();
    let mut landscape = Landscape::from_config(small_config()).unwrap();
    landscape.loader().block_until_idle();
    landscape.render(&at(0.0, 0.0), &ctx, &mut backend, &mut renderer).unwrap();

    // One chunk width away is still inside the hysteresis band.
    let stats = landscape.render(&at(32.0, 0.0), &ctx, &mut backend, &mut renderer).unwrap();
    assert_eq!(stats.shifted, None);

    let stats = landscape.render(&at(33.0, 0.0), &ctx, &mut backend, &mut renderer).unwrap();
    assert_eq!(stats.shifted, Some(IVec2::new(1, 0)));
    assert_eq!(landscape.center(), IVec2::new(1, 0));
    assert_eq!(backend.destroyed, 3);

    // Survivors moved one slot left.
    assert_eq!(landscape.chunk_at(0, 1).map(Chunk::pos), Some(ChunkPos::from_grid(0, 0)));
    assert_eq!(landscape.chunk_at(1, 1).map(Chunk::pos), Some(ChunkPos::from_grid(1, 0)));

    let stats = landscape.render(&at(33.0, 0.0), &ctx, &mut backend, &mut renderer).unwrap();
    assert_eq!(stats.shifted, None);

    landscape.loader().block_until_idle();
    landscape.render(&at(33.0, 0.0), &ctx, &mut backend, &mut renderer).unwrap();
    assert_eq!(landscape.loaded_count(), 9);
    for y in 0..3 {
      assert_eq!(
        landscape.chunk_at(2, y).map(Chunk::pos),
        Some(ChunkPos::from_grid(2, y as i32 - 1))
      );
    }

    landscape.unload_all(&ctx, &mut backend);
    assert!(backend.live.is_empty());
    assert_eq!(backend.created, backend.destroyed);
  }

  #[test]
  fn failed_upload_is_retried() {
    let ctx = GpuContext::bind_current_thread();
    let mut backend = CountingBackend::default();
    let mut renderer = RecordingRenderer::default();
    let mut landscape = Landscape::from_config(small_config()).unwrap();
    landscape.loader().block_until_idle();

    backend.fail_next = true;
    let result = landscape.render(&at(0.0, 0.0), &ctx, &mut backend, &mut renderer);
    assert!(matches!(result, Err(GpuError::ResourceCreation(_))));

    landscape.render(&at(0.0, 0.0), &ctx, &mut backend, &mut renderer).unwrap();
    assert_eq!(landscape.loaded_count(), 9);
    assert_eq!(backend.created, 9);

    landscape.unload_all(&ctx, &mut backend);
  }
}
