//! A generated terrain chunk and its GPU lifecycle.
//!
//! Chunks are built off-thread by [`Chunk::generate`], which only touches CPU
//! memory. Uploading and releasing the GPU mesh happens on the graphics
//! thread through [`Chunk::load`] and [`Chunk::unload`].
//!
//! ```text
//! Generated --load--> Loaded --unload--> Unloaded
//!     |                                     ^
//!     +---------------unload----------------+
//! ```

use std::fmt;

use bevy::log::debug;

use crate::coords::ChunkPos;
use crate::gpu::{GpuBackend, GpuContext, GpuError, GpuMeshId};
use crate::mesh::{MeshData, MeshError, build_mesh};
use crate::terrain::{TerrainError, TerrainGenerator};

/// Where a chunk is in its GPU lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkLifecycle {
  /// CPU mesh built, nothing uploaded.
  Generated,
  /// Mesh uploaded; the handle is owned by this chunk.
  Loaded(GpuMeshId),
  /// GPU resources released. Terminal.
  Unloaded,
}

/// Error from chunk generation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkError {
  Terrain(TerrainError),
  Mesh(MeshError),
}

impl fmt::Display for ChunkError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Terrain(e) => write!(f, "terrain generation failed: {e}"),
      Self::Mesh(e) => write!(f, "meshing failed: {e}"),
    }
  }
}

impl std::error::Error for ChunkError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Terrain(e) => Some(e),
      Self::Mesh(e) => Some(e),
    }
  }
}

impl From<TerrainError> for ChunkError {
  fn from(err: TerrainError) -> Self {
    Self::Terrain(err)
  }
}

impl From<MeshError> for ChunkError {
  fn from(err: MeshError) -> Self {
    Self::Mesh(err)
  }
}

/// One 32×32 tile of terrain.
#[derive(Debug)]
pub struct Chunk {
  pos: ChunkPos,
  mesh: MeshData,
  lifecycle: ChunkLifecycle,
}

impl Chunk {
  /// Generates the land map for `pos` and meshes it.
  ///
  /// Pure CPU work; safe to call from any thread.
  pub fn generate(pos: ChunkPos, generator: &TerrainGenerator) -> Result<Self, ChunkError> {
    let map = generator.generate_map(pos)?;
    let mesh = build_mesh(&map)?;
    Ok(Self::from_mesh(pos, mesh))
  }

  /// Wraps an already built mesh.
  pub fn from_mesh(pos: ChunkPos, mesh: MeshData) -> Self {
    Self {
      pos,
      mesh,
      lifecycle: ChunkLifecycle::Generated,
    }
  }

  /// Uploads the mesh. A no-op if already loaded.
  ///
  /// Fails with [`GpuError::ChunkRetired`] once the chunk was unloaded, and
  /// propagates backend failures, leaving the chunk in `Generated`.
  pub fn load(&mut self, ctx: &GpuContext, backend: &mut impl GpuBackend) -> Result<(), GpuError> {
    match self.lifecycle {
      ChunkLifecycle::Loaded(_) => Ok(()),
      ChunkLifecycle::Unloaded => Err(GpuError::ChunkRetired(self.pos)),
      ChunkLifecycle::Generated => {
        let id = backend.create_mesh(ctx, self.pos, &self.mesh)?;
        self.lifecycle = ChunkLifecycle::Loaded(id);
        Ok(())
      }
    }
  }

  /// Releases the GPU mesh, if any. Idempotent.
  pub fn unload(&mut self, ctx: &GpuContext, backend: &mut impl GpuBackend) {
    if let ChunkLifecycle::Loaded(id) = self.lifecycle {
      backend.destroy_mesh(ctx, id);
      debug!("Unloaded chunk {}", self.pos);
    }
    self.lifecycle = ChunkLifecycle::Unloaded;
  }

  #[inline]
  pub fn pos(&self) -> ChunkPos {
    self.pos
  }

  #[inline]
  pub fn mesh(&self) -> &MeshData {
    &self.mesh
  }

  #[inline]
  pub fn vertex_count(&self) -> usize {
    self.mesh.vertex_count()
  }

  #[inline]
  pub fn triangle_count(&self) -> usize {
    self.mesh.triangle_count()
  }

  /// GPU handle, present only while loaded.
  #[inline]
  pub fn gpu_mesh(&self) -> Option<GpuMeshId> {
    match self.lifecycle {
      ChunkLifecycle::Loaded(id) => Some(id),
      _ => None,
    }
  }

  #[inline]
  pub fn lifecycle(&self) -> ChunkLifecycle {
    self.lifecycle
  }

  #[inline]
  pub fn is_loaded(&self) -> bool {
    matches!(self.lifecycle, ChunkLifecycle::Loaded(_))
  }
}
