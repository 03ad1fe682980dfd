//! Box meshing of land maps.
//!
//! Every column of a [`LandMap`] becomes an axis-aligned box of six quads,
//! each quad two triangles with per-vertex position, normal and UV. Quads are
//! unindexed so each face carries its own flat normal.
//!
//! Triangles are wound clockwise when viewed from outside the box, and the
//! stored normals are the raw `height × width` cross products. Backends with a
//! counter-clockwise front-face convention flip both on upload.

use std::fmt;

use bevy::math::{Vec2, Vec3};

use crate::coords::{CELL_CENTER_OFFSET, MESH_BEGIN, MESH_END};
use crate::terrain::{Column, LandMap};

/// Vertices emitted per column (6 faces × 2 triangles × 3 vertices).
pub const VERTICES_PER_COLUMN: usize = 36;

/// Vertices emitted per rectangle.
pub const VERTICES_PER_RECTANGLE: usize = 6;

/// UVs for the corners c1..c4.
const CORNER_UVS: [[f32; 2]; 4] = [[1.0, 1.0], [1.0, 0.0], [0.0, 0.0], [0.0, 1.0]];

/// Unindexed triangle soup with parallel attribute arrays.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
  pub positions: Vec<[f32; 3]>,
  pub normals: Vec<[f32; 3]>,
  pub uvs: Vec<[f32; 2]>,
}

impl MeshData {
  /// Creates an empty mesh with room for `vertices` vertices.
  pub fn with_capacity(vertices: usize) -> Self {
    Self {
      positions: Vec::with_capacity(vertices),
      normals: Vec::with_capacity(vertices),
      uvs: Vec::with_capacity(vertices),
    }
  }

  /// Number of vertices.
  #[inline]
  pub fn vertex_count(&self) -> usize {
    self.positions.len()
  }

  /// Number of triangles.
  #[inline]
  pub fn triangle_count(&self) -> usize {
    self.positions.len() / 3
  }

  /// Returns true if the mesh has no vertices.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }

  fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: [f32; 2]) {
    self.positions.push(position.to_array());
    self.normals.push(normal.to_array());
    self.uvs.push(uv);
  }
}

/// Error from mesh construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeshError {
  /// A rectangle edge vector had zero length.
  DegenerateFace { height: Vec3, width: Vec3 },
}

impl fmt::Display for MeshError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::DegenerateFace { height, width } => {
        write!(f, "degenerate face: height={height}, width={width}")
      }
    }
  }
}

impl std::error::Error for MeshError {}

/// Appends a rectangle as two triangles.
///
/// `height` and `width` are full edge vectors through `center`. Corners are
/// `c1 = c + h/2 + w/2`, `c2 = c - h/2 + w/2`, `c3 = c - h/2 - w/2`,
/// `c4 = c + h/2 - w/2`, emitted as triangles `(c1, c2, c3)` and
/// `(c3, c4, c1)`. Every vertex gets the normal `height × width`.
pub fn add_rectangle(
  mesh: &mut MeshData,
  center: Vec3,
  height: Vec3,
  width: Vec3,
) -> Result<(), MeshError> {
  if height == Vec3::ZERO || width == Vec3::ZERO {
    return Err(MeshError::DegenerateFace { height, width });
  }

  let h = height / 2.0;
  let w = width / 2.0;
  let corners = [center + h + w, center - h + w, center - h - w, center + h - w];
  let normal = height.cross(width);

  for i in [0, 1, 2, 2, 3, 0] {
    mesh.push_vertex(corners[i], normal, CORNER_UVS[i]);
  }
  Ok(())
}

/// Appends the six faces of the box spanned by `column` at cell centre
/// `cell` (XZ).
pub fn add_column(mesh: &mut MeshData, cell: Vec2, column: Column) -> Result<(), MeshError> {
  let (x, z) = (cell.x, cell.y);
  let top = column.top as f32;
  let bot = column.bot as f32;
  let mid = (bot + top) / 2.0;
  let span = Vec3::new(0.0, top - bot, 0.0);

  // top
  add_rectangle(mesh, Vec3::new(x, top, z), Vec3::NEG_Z, Vec3::X)?;
  // bottom
  add_rectangle(mesh, Vec3::new(x, bot, z), Vec3::Z, Vec3::X)?;
  // front
  add_rectangle(mesh, Vec3::new(x, mid, z + 0.5), Vec3::NEG_X, span)?;
  // back
  add_rectangle(mesh, Vec3::new(x, mid, z - 0.5), Vec3::X, span)?;
  // right
  add_rectangle(mesh, Vec3::new(x + 0.5, mid, z), Vec3::Z, span)?;
  // left
  add_rectangle(mesh, Vec3::new(x - 0.5, mid, z), Vec3::NEG_Z, span)?;
  Ok(())
}

/// Builds the box mesh for the interior of a land map.
///
/// Lattice cells `1..65` on both axes are meshed, with the cell at `(x, z)`
/// centred at `(x - 32.5, z - 32.5)`. Border cells are skipped.
pub fn build_mesh(map: &LandMap) -> Result<MeshData, MeshError> {
  let interior = MESH_END - MESH_BEGIN;
  let mut mesh = MeshData::with_capacity(interior * interior * VERTICES_PER_COLUMN);

  for z in MESH_BEGIN..MESH_END {
    for x in MESH_BEGIN..MESH_END {
      let cell = Vec2::new(x as f32 - CELL_CENTER_OFFSET, z as f32 - CELL_CENTER_OFFSET);
      for column in map[(x, z)].columns() {
        add_column(&mut mesh, cell, column)?;
      }
    }
  }
  Ok(mesh)
}
