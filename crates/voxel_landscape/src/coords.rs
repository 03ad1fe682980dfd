//! Coordinate types and spatial constants.
//!
//! Defines the coordinate system for the landscape:
//! - [`ChunkPos`]: World-space origin of a chunk (always a multiple of
//!   [`CHUNK_SIZE`])
//! - Chunk grid coordinates ([`IVec2`]): `ChunkPos / CHUNK_SIZE`
//!
//! The terrain lies in the XZ plane with Y+ up. 2D positions use `(x, z)`
//! stored as `(x, y)` components.

use std::fmt;

use bevy::math::{IVec2, Vec2};

/// World units between neighbouring chunk origins.
pub const CHUNK_SIZE: i32 = 32;

/// Lattice points per edge of a land map, including the one-cell border.
pub const LATTICE_SIZE: usize = 66;

/// First meshed lattice index (index 0 is border).
pub const MESH_BEGIN: usize = 1;

/// One past the last meshed lattice index (index 65 is border).
pub const MESH_END: usize = LATTICE_SIZE - 1;

/// Offset subtracted from a lattice index to centre cube centres on the chunk
/// origin (cube centres range from -31.5 to 31.5).
pub const CELL_CENTER_OFFSET: f32 = 32.5;

/// World-space origin of a chunk.
///
/// Uniquely identifies a chunk's placement and the lattice offset used when
/// sampling noise for it. Both components are multiples of [`CHUNK_SIZE`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
  pub x: i32,
  pub z: i32,
}

impl ChunkPos {
  /// Creates a chunk position from chunk grid coordinates.
  pub const fn from_grid(x: i32, z: i32) -> Self {
    Self {
      x: x * CHUNK_SIZE,
      z: z * CHUNK_SIZE,
    }
  }

  /// Returns the chunk grid coordinate of this position.
  pub const fn grid(self) -> IVec2 {
    IVec2::new(self.x / CHUNK_SIZE, self.z / CHUNK_SIZE)
  }

  /// Returns the origin as an integer lattice offset.
  #[inline]
  pub const fn as_ivec2(self) -> IVec2 {
    IVec2::new(self.x, self.z)
  }

  /// Returns the origin in world units on the XZ plane.
  #[inline]
  pub fn as_vec2(self) -> Vec2 {
    Vec2::new(self.x as f32, self.z as f32)
  }

  /// Squared XZ distance from this chunk's origin to `point`.
  #[inline]
  pub fn distance_squared(self, point: Vec2) -> f32 {
    self.as_vec2().distance_squared(point)
  }
}

impl From<IVec2> for ChunkPos {
  /// Interprets the vector as chunk grid coordinates.
  fn from(grid: IVec2) -> Self {
    Self::from_grid(grid.x, grid.y)
  }
}

impl fmt::Display for ChunkPos {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {})", self.x, self.z)
  }
}

/// Chunk grid coordinate nearest to a world-space XZ point.
pub fn nearest_grid(point: Vec2) -> IVec2 {
  (point / CHUNK_SIZE as f32).round().as_ivec2()
}
