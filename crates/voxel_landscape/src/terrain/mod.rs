//! Terrain generation - turning noise into vertical rock columns.
//!
//! Each lattice point of a chunk gets a [`LandSection`]: one solid column, or a
//! floor and optional ceiling when a cavern carves a gap through it. Two
//! independent [`NoiseField`]s drive the surface height and the cavern roof.
//!
//! Generation is a pure function of the chunk position, which makes
//! position-keyed caching and regeneration safe.

mod noise;

use std::fmt;

use bevy::math::IVec2;
pub use self::noise::NoiseField;

use crate::config::TerrainConfig;
use crate::coords::{ChunkPos, LATTICE_SIZE};
use crate::grid::Grid;

/// Base surface height, reached where the surface noise is 0.
const HEIGHT_BASE: f32 = 100.0;
/// Additional surface height at noise 1.
const HEIGHT_RANGE: f32 = 156.0;
/// Lowest cavern floor.
const CAVERN_BEGIN_BASE: f32 = 10.0;
/// Additional cavern floor height at noise 1.
const CAVERN_BEGIN_RANGE: f32 = 128.0;
/// Cavern roof height at noise 1.
const CAVERN_END_RANGE: f32 = 256.0;

/// A vertical run of solid rock from `bot` to `top`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Column {
  pub top: i32,
  pub bot: i32,
}

impl Column {
  /// Creates a column spanning `[bot, top]`.
  pub const fn new(bot: i32, top: i32) -> Self {
    Self { top, bot }
  }

  /// Vertical extent of the column.
  #[inline]
  pub const fn height(self) -> i32 {
    self.top - self.bot
  }
}

/// Solid ground at one lattice point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LandSection {
  /// Ground from bedrock to the surface, no cavern.
  Solid(Column),
  /// A cavern gap above `floor`. `ceiling` is `None` when the cavern opens
  /// to the sky.
  Cavern {
    floor: Column,
    ceiling: Option<Column>,
  },
}

impl LandSection {
  /// Iterates over the columns from bottom to top.
  pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
    let (first, second) = match *self {
      Self::Solid(column) => (column, None),
      Self::Cavern { floor, ceiling } => (floor, ceiling),
    };
    std::iter::once(first).chain(second)
  }

  /// Number of columns (1 or 2).
  pub fn len(&self) -> usize {
    match self {
      Self::Solid(_) | Self::Cavern { ceiling: None, .. } => 1,
      Self::Cavern {
        ceiling: Some(_), ..
      } => 2,
    }
  }

  /// Always false; a section holds at least one column.
  pub fn is_empty(&self) -> bool {
    false
  }
}

/// Land sections for a chunk's 66×66 lattice.
///
/// Indices 0 and 65 form a one-cell border around the 64×64 meshed
/// interior. The border is reserved for seam continuity with neighbouring
/// chunks and is not meshed.
pub type LandMap = Grid<LandSection>;

/// Error from terrain generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerrainError {
  /// A normalised noise value was outside `[0, 1]`.
  OutOfRange { a: f32, b: f32 },
}

impl fmt::Display for TerrainError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::OutOfRange { a, b } => {
        write!(f, "section inputs must be within [0, 1], got a={a}, b={b}")
      }
    }
  }
}

impl std::error::Error for TerrainError {}

/// Builds the land section for one lattice point.
///
/// `a` drives the surface height and cavern floor, `b` the cavern roof. Both
/// must lie in `[0, 1]`.
pub fn generate_section(a: f32, b: f32) -> Result<LandSection, TerrainError> {
  let unit = 0.0..=1.0;
  if !unit.contains(&a) || !unit.contains(&b) {
    return Err(TerrainError::OutOfRange { a, b });
  }

  let height = (HEIGHT_BASE + HEIGHT_RANGE * a) as i32;
  let cavern_begin = (CAVERN_BEGIN_BASE + CAVERN_BEGIN_RANGE * a) as i32;
  let cavern_end = (CAVERN_END_RANGE * b) as i32;

  if cavern_end <= cavern_begin {
    return Ok(LandSection::Solid(Column::new(0, height)));
  }

  Ok(LandSection::Cavern {
    floor: Column::new(0, cavern_begin),
    ceiling: (cavern_end < height).then(|| Column::new(cavern_end, height)),
  })
}

/// Deterministic land map generator.
///
/// Shared across generation workers; holds no mutable state.
#[derive(Clone)]
pub struct TerrainGenerator {
  surface: NoiseField,
  cavern: NoiseField,
}

impl TerrainGenerator {
  /// Creates a generator from terrain settings.
  pub fn new(config: &TerrainConfig) -> Self {
    let [ox, oz] = config.cavern_offset;
    Self {
      surface: NoiseField::new(config.seed, config.noise_scale, IVec2::ZERO),
      cavern: NoiseField::new(config.seed, config.noise_scale, IVec2::new(ox, oz)),
    }
  }

  /// Samples both noise fields at a lattice point and builds its section.
  pub fn section_at(&self, point: IVec2) -> Result<LandSection, TerrainError> {
    generate_section(self.surface.sample(point), self.cavern.sample(point))
  }

  /// Generates the land map for the chunk at `pos`.
  ///
  /// Lattice cell `(x, z)` samples the noise at `(x, z) + pos`. Identical
  /// positions always produce identical maps.
  pub fn generate_map(&self, pos: ChunkPos) -> Result<LandMap, TerrainError> {
    let origin = pos.as_ivec2();
    Grid::try_from_fn(LATTICE_SIZE, LATTICE_SIZE, |x, z| {
      self.section_at(origin + IVec2::new(x as i32, z as i32))
    })
  }
}

impl Default for TerrainGenerator {
  fn default() -> Self {
    Self::new(&TerrainConfig::default())
  }
}
