//! Fixed-size 2D buffer with bounds-checked access.
//!
//! A [`Grid`] holds any element type in row-major order (`y * width + x`).
//! It backs both the 66×66 land map and the landscape's window of chunk
//! slots. Slot grids (`Grid<Option<T>>`) additionally support [`Grid::shift`],
//! which moves owned elements to their new coordinates when the window
//! re-centres.

use std::ops::{Index, IndexMut};

use bevy::math::IVec2;

/// A 2D buffer of elements.
///
/// Data is stored in row-major order (y * width + x).
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
  data: Box<[T]>,
  width: usize,
  height: usize,
}

impl<T> Grid<T> {
  /// Creates a grid by calling `f(x, y)` for every cell.
  pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
      for x in 0..width {
        data.push(f(x, y));
      }
    }
    Self {
      data: data.into_boxed_slice(),
      width,
      height,
    }
  }

  /// Creates a grid by calling `f(x, y)` for every cell, stopping at the
  /// first error.
  pub fn try_from_fn<E>(
    width: usize,
    height: usize,
    mut f: impl FnMut(usize, usize) -> Result<T, E>,
  ) -> Result<Self, E> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
      for x in 0..width {
        data.push(f(x, y)?);
      }
    }
    Ok(Self {
      data: data.into_boxed_slice(),
      width,
      height,
    })
  }

  /// Returns the width of the grid.
  #[inline]
  pub fn width(&self) -> usize {
    self.width
  }

  /// Returns the height of the grid.
  #[inline]
  pub fn height(&self) -> usize {
    self.height
  }

  /// Converts (x, y) to a linear index, or `None` if out of bounds.
  #[inline]
  fn index_of(&self, x: usize, y: usize) -> Option<usize> {
    if x < self.width && y < self.height {
      Some(y * self.width + x)
    } else {
      None
    }
  }

  /// Converts a signed coordinate to (x, y), or `None` if out of bounds.
  #[inline]
  pub fn checked_coord(&self, coord: IVec2) -> Option<(usize, usize)> {
    let x = usize::try_from(coord.x).ok()?;
    let y = usize::try_from(coord.y).ok()?;
    self.index_of(x, y).map(|_| (x, y))
  }

  /// Returns a reference to the element at (x, y), or `None` if out of bounds.
  #[inline]
  pub fn get(&self, x: usize, y: usize) -> Option<&T> {
    self.index_of(x, y).map(|i| &self.data[i])
  }

  /// Returns a mutable reference to the element at (x, y), or `None` if out of
  /// bounds.
  #[inline]
  pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
    self.index_of(x, y).map(|i| &mut self.data[i])
  }

  /// Iterates over `((x, y), element)` in row-major order.
  pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
    let width = self.width;
    self
      .data
      .iter()
      .enumerate()
      .map(move |(i, value)| ((i % width, i / width), value))
  }

  /// Iterates mutably over `((x, y), element)` in row-major order.
  pub fn iter_mut(&mut self) -> impl Iterator<Item = ((usize, usize), &mut T)> {
    let width = self.width;
    self
      .data
      .iter_mut()
      .enumerate()
      .map(move |(i, value)| ((i % width, i / width), value))
  }

  /// Returns a slice of the underlying data.
  #[inline]
  pub fn as_slice(&self) -> &[T] {
    &self.data
  }
}

impl<T: Clone> Grid<T> {
  /// Creates a new grid filled with the given value.
  pub fn filled(width: usize, height: usize, value: T) -> Self {
    Self {
      data: vec![value; width * height].into_boxed_slice(),
      width,
      height,
    }
  }
}

impl<T> Grid<Option<T>> {
  /// Creates a grid of empty slots.
  pub fn empty(width: usize, height: usize) -> Self {
    Self::from_fn(width, height, |_, _| None)
  }

  /// Translates occupied slots by `-diff`.
  ///
  /// The element at `(x, y)` moves to `(x - diff.x, y - diff.y)`. Elements
  /// whose destination falls outside the grid are returned together with
  /// their old coordinates; each occupied slot is either moved or returned,
  /// never both.
  pub fn shift(&mut self, diff: IVec2) -> Vec<((usize, usize), T)> {
    let mut shifted = Self::empty(self.width, self.height);
    let mut evicted = Vec::new();

    for ((x, y), slot) in self.iter_mut() {
      let Some(value) = slot.take() else {
        continue;
      };
      let target = IVec2::new(x as i32, y as i32) - diff;
      match shifted.checked_coord(target) {
        Some((tx, ty)) => shifted[(tx, ty)] = Some(value),
        None => evicted.push(((x, y), value)),
      }
    }

    *self = shifted;
    evicted
  }

  /// Returns the coordinates of every empty slot.
  pub fn empty_slots(&self) -> Vec<(usize, usize)> {
    self
      .iter()
      .filter(|(_, slot)| slot.is_none())
      .map(|(coord, _)| coord)
      .collect()
  }

  /// Number of occupied slots.
  pub fn occupied(&self) -> usize {
    self.data.iter().filter(|slot| slot.is_some()).count()
  }
}

impl<T> Index<(usize, usize)> for Grid<T> {
  type Output = T;

  #[inline]
  fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
    let i = self
      .index_of(x, y)
      .unwrap_or_else(|| panic!("grid index ({x}, {y}) out of bounds"));
    &self.data[i]
  }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
  #[inline]
  fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
    let i = self
      .index_of(x, y)
      .unwrap_or_else(|| panic!("grid index ({x}, {y}) out of bounds"));
    &mut self.data[i]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_fn_is_row_major() {
    let grid = Grid::from_fn(3, 2, |x, y| y * 10 + x);
    assert_eq!(grid.as_slice(), &[0, 1, 2, 10, 11, 12]);
    assert_eq!(grid[(2, 1)], 12);
    assert_eq!(grid.get(3, 0), None);
    assert_eq!(grid.get(0, 2), None);
  }

  #[test]
  #[should_panic(expected = "out of bounds")]
  fn index_out_of_bounds_panics() {
    let grid = Grid::filled(2, 2, 0u8);
    let _ = grid[(2, 0)];
  }

  #[test]
  fn checked_coord_rejects_negative() {
    let grid = Grid::filled(4, 4, ());
    assert_eq!(grid.checked_coord(IVec2::new(-1, 0)), None);
    assert_eq!(grid.checked_coord(IVec2::new(3, 3)), Some((3, 3)));
    assert_eq!(grid.checked_coord(IVec2::new(4, 3)), None);
  }

  #[test]
  fn shift_moves_and_evicts() {
    let mut grid = Grid::from_fn(3, 3, |x, y| Some((x, y)));

    let evicted = grid.shift(IVec2::new(1, 0));

    // Column x=0 falls off the left edge.
    let mut evicted_coords: Vec<_> = evicted.iter().map(|(coord, _)| *coord).collect();
    evicted_coords.sort();
    assert_eq!(evicted_coords, vec![(0, 0), (0, 1), (0, 2)]);

    // Old (1, y) now lives at (0, y); old (2, y) at (1, y).
    for y in 0..3 {
      assert_eq!(grid[(0, y)], Some((1, y)));
      assert_eq!(grid[(1, y)], Some((2, y)));
      assert_eq!(grid[(2, y)], None);
    }
    assert_eq!(grid.empty_slots(), vec![(2, 0), (2, 1), (2, 2)]);
  }

  #[test]
  fn shift_larger_than_grid_evicts_everything() {
    let mut grid = Grid::from_fn(2, 2, |x, y| Some(x + y));
    let evicted = grid.shift(IVec2::new(-5, 9));
    assert_eq!(evicted.len(), 4);
    assert_eq!(grid.occupied(), 0);
  }

  #[test]
  fn shift_skips_empty_slots() {
    let mut grid: Grid<Option<u32>> = Grid::empty(2, 2);
    grid[(1, 1)] = Some(7);
    let evicted = grid.shift(IVec2::new(0, -1));
    assert_eq!(evicted, vec![((1, 1), 7)]);
    assert_eq!(grid.occupied(), 0);
  }
}
