//! Coherent noise sampled on the terrain lattice.

use ::noise::{NoiseFn, Perlin};
use bevy::math::IVec2;

/// A Perlin noise field over the integer lattice.
///
/// Stateless and deterministic: the same seed, scale and offset always
/// produce the same value for a lattice point.
#[derive(Clone)]
pub struct NoiseField {
  perlin: Perlin,
  scale: f64,
  offset: IVec2,
}

impl NoiseField {
  /// Creates a noise field.
  ///
  /// - `seed`: Perlin permutation seed.
  /// - `scale`: Lattice units per noise unit (larger = broader features).
  /// - `offset`: Added to every lattice point before scaling, so two fields
  ///   with the same seed can be decorrelated.
  pub fn new(seed: u32, scale: f32, offset: IVec2) -> Self {
    Self {
      perlin: Perlin::new(seed),
      scale: f64::from(scale),
      offset,
    }
  }

  /// Samples the raw noise at a lattice point, in `[-1, 1]`.
  pub fn raw(&self, point: IVec2) -> f64 {
    let p = (point + self.offset).as_dvec2() / self.scale;
    // Perlin can overshoot its nominal range by a hair.
    self.perlin.get([p.x, p.y]).clamp(-1.0, 1.0)
  }

  /// Samples the noise at a lattice point, remapped to `[0, 1]`.
  pub fn sample(&self, point: IVec2) -> f32 {
    ((self.raw(point) + 1.0) / 2.0) as f32
  }

  /// Returns the offset applied to lattice points.
  pub fn offset(&self) -> IVec2 {
    self.offset
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn samples_are_normalised() {
    let field = NoiseField::new(0, 133.37, IVec2::ZERO);
    for x in -200..200 {
      let v = field.sample(IVec2::new(x * 7, x * 3));
      assert!((0.0..=1.0).contains(&v), "sample {v} out of range");
    }
  }

  #[test]
  fn sampling_is_deterministic() {
    let a = NoiseField::new(7, 133.37, IVec2::new(444, 124));
    let b = NoiseField::new(7, 133.37, IVec2::new(444, 124));
    for x in 0..66 {
      let p = IVec2::new(x, 65 - x);
      assert_eq!(a.sample(p).to_bits(), b.sample(p).to_bits());
    }
  }

  #[test]
  fn offset_shifts_the_lattice() {
    let base = NoiseField::new(3, 133.37, IVec2::ZERO);
    let shifted = NoiseField::new(3, 133.37, IVec2::new(444, 124));
    let p = IVec2::new(10, 20);
    assert_eq!(shifted.sample(p), base.sample(p + IVec2::new(444, 124)));
  }
}
