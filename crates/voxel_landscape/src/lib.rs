//! Voxel Landscape - infinite streamed column terrain for Bevy.
//!
//! Terrain is generated from two Perlin fields into vertical rock columns,
//! meshed into boxes, and streamed in 32x32 chunks around a moving observer.
//! Generation runs on a worker pool; GPU uploads and releases stay on the
//! thread holding the [`GpuContext`].
//!
//! The core ([`Landscape`], [`ChunkLoader`], the mesher) is engine agnostic
//! and talks to graphics through [`GpuBackend`] and [`ChunkRenderer`].
//! [`LandscapePlugin`] wires it into a Bevy app.

pub mod chunk;
pub mod config;
pub mod coords;
pub mod gpu;
pub mod grid;
pub mod landscape;
pub mod loader;
pub mod mesh;
pub mod plugin;
pub mod terrain;

pub use chunk::{Chunk, ChunkError, ChunkLifecycle};
pub use config::{ConfigError, LandscapeConfig, TerrainConfig};
pub use coords::{CHUNK_SIZE, ChunkPos, LATTICE_SIZE};
pub use gpu::{ChunkRenderer, GpuBackend, GpuContext, GpuError, GpuMeshId, Projection};
pub use grid::Grid;
pub use landscape::{FrameStats, Landscape};
pub use loader::{ChunkLoader, LoaderError, LoaderStats};
pub use mesh::{MeshData, MeshError, add_rectangle, build_mesh};
pub use plugin::{
  BevyMeshBackend, ChunkEntities, ChunkMaterial, ChunkMesh, LandscapePlugin, StreamingCamera,
  VisibleChunks,
};
pub use terrain::{
  Column, LandMap, LandSection, NoiseField, TerrainError, TerrainGenerator, generate_section,
};
