// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use bytemuck::Zeroable;
use bytemuck::allocation::zeroed_slice_box;

use std::ops::{Index, IndexMut};

// Two-dimensional array type
#[derive(Clone, Debug)]
pub struct Array2D<T> {
  rows: usize,
  cols: usize,
  stride: usize,
  data: Box<[T]>,
}

impl<T> Array2D<T> {
  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn cols(&self) -> usize {
    self.cols
  }

  pub fn data(&self) -> &[T] {
    &self.data
  }

  // View of the whole array
  pub fn as_slice2d(&self) -> Slice2D<'_, T> {
    Slice2D::new(&self.data, self.rows, self.cols, self.stride)
  }

  pub fn as_slice2d_mut(&mut self) -> Slice2DMut<'_, T> {
    Slice2DMut::new(&mut self.data, self.rows, self.cols, self.stride)
  }

  // View of the region starting at (row, col) with the given size
  pub fn block(&self, row: usize, col: usize, rows: usize, cols: usize) -> Slice2D<'_, T> {
    self.as_slice2d().sub(row as isize, col as isize, rows, cols)
  }

  pub fn block_mut(&mut self, row: usize, col: usize, rows: usize, cols: usize) -> Slice2DMut<'_, T> {
    self.as_slice2d_mut().into_sub(row, col, rows, cols)
  }
}

impl<T> Array2D<T> {
  pub fn fill_with<F: FnMut(usize, usize) -> T>(&mut self, mut f: F) {
    for i in 0..self.rows {
      for j in 0..self.cols {
        self[i][j] = f(i, j);
      }
    }
  }
}

impl<T: Zeroable> Array2D<T> {
  pub fn zeroed(rows: usize, cols: usize) -> Self {
    let stride = cols;
    let num_elements = rows.checked_mul(stride).unwrap();
    let data = zeroed_slice_box(num_elements);

    Self {
      rows: rows,
      cols: cols,
      stride: stride,
      data: data
    }
  }

  pub fn new_with<F: FnMut(usize, usize) -> T>(rows: usize, cols: usize, f: F) -> Self {
    let mut result = Array2D::zeroed(rows, cols);
    result.fill_with(f);
    return result;
  }
}

// Allow indexing by array[row][col]
// This is done by having array[row] return a normal slice which
// references the entire row in question. Then a normal slice index
// can pick out the desired element
impl<T> Index<usize> for Array2D<T> {
  type Output = [T];
  fn index(&self, index: usize) -> &[T] {
    if index >= self.rows {
      panic!("Array2D row index out of bounds (index {} vs. size {})", index, self.rows);
    }
    // Due to the above check, these calculations should never overflow
    let start_index = index * self.stride;
    let end_index = start_index + self.cols;
    &self.data[start_index .. end_index]
  }
}

impl<T> IndexMut<usize> for Array2D<T> {
  fn index_mut(&mut self, index: usize) -> &mut [T] {
    if index >= self.rows {
      panic!("Array2D row index out of bounds (index {} vs. size {})", index, self.rows);
    }
    // Due to the above check, these calculations should never overflow
    let start_index = index * self.stride;
    let end_index = start_index + self.cols;
    &mut self.data[start_index .. end_index]
  }
}

// Borrowed view into a strided 2D buffer.
//
// The view has a nominal size of rows x cols, but reads relative to its origin
// may reach outside that rectangle (including at negative offsets) as long as
// they stay inside the backing slice. The filters rely on this to read the
// extra rows and columns needed by their taps.
#[derive(Clone, Copy, Debug)]
pub struct Slice2D<'a, T> {
  data: &'a [T],
  origin: usize,
  rows: usize,
  cols: usize,
  stride: usize,
}

impl<'a, T> Slice2D<'a, T> {
  pub fn new(data: &'a [T], rows: usize, cols: usize, stride: usize) -> Self {
    assert!(cols <= stride);
    assert!(rows == 0 || (rows - 1) * stride + cols <= data.len());
    Self {
      data: data,
      origin: 0,
      rows: rows,
      cols: cols,
      stride: stride
    }
  }

  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn cols(&self) -> usize {
    self.cols
  }

  fn position(&self, row: isize, col: isize) -> usize {
    let pos = self.origin as isize + row * self.stride as isize + col;
    debug_assert!(pos >= 0, "Slice2D access before start of buffer ({}, {})", row, col);
    pos as usize
  }

  // Sub-view whose origin is at (row, col) relative to this view
  pub fn sub(&self, row: isize, col: isize, rows: usize, cols: usize) -> Slice2D<'a, T> {
    Slice2D {
      data: self.data,
      origin: self.position(row, col),
      rows: rows,
      cols: cols,
      stride: self.stride
    }
  }

  // `len` consecutive elements of row `row`, starting at column `col`
  pub fn span(&self, row: isize, col: isize, len: usize) -> &'a [T] {
    let start = self.position(row, col);
    &self.data[start .. start + len]
  }

  pub fn row(&self, row: usize) -> &'a [T] {
    debug_assert!(row < self.rows);
    self.span(row as isize, 0, self.cols)
  }
}

impl<'a, T: Copy> Slice2D<'a, T> {
  pub fn at(&self, row: isize, col: isize) -> T {
    self.data[self.position(row, col)]
  }
}

impl<'a, T> Index<usize> for Slice2D<'a, T> {
  type Output = [T];
  fn index(&self, index: usize) -> &[T] {
    self.row(index)
  }
}

// Mutable counterpart of Slice2D. Accesses are limited to the nominal rectangle.
#[derive(Debug)]
pub struct Slice2DMut<'a, T> {
  data: &'a mut [T],
  rows: usize,
  cols: usize,
  stride: usize,
}

impl<'a, T> Slice2DMut<'a, T> {
  pub fn new(data: &'a mut [T], rows: usize, cols: usize, stride: usize) -> Self {
    assert!(cols <= stride);
    assert!(rows == 0 || (rows - 1) * stride + cols <= data.len());
    Self {
      data: data,
      rows: rows,
      cols: cols,
      stride: stride
    }
  }

  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn cols(&self) -> usize {
    self.cols
  }

  // Narrow this view to the region starting at (row, col)
  pub fn into_sub(self, row: usize, col: usize, rows: usize, cols: usize) -> Slice2DMut<'a, T> {
    assert!(row + rows <= self.rows && col + cols <= self.cols,
            "Slice2DMut region {}x{} at ({}, {}) exceeds {}x{}", rows, cols, row, col, self.rows, self.cols);
    let start = row * self.stride + col;
    let stride = self.stride;
    let data = self.data;
    Slice2DMut::new(&mut data[start ..], rows, cols, stride)
  }
}

impl<'a, T> Index<usize> for Slice2DMut<'a, T> {
  type Output = [T];
  fn index(&self, index: usize) -> &[T] {
    if index >= self.rows {
      panic!("Slice2DMut row index out of bounds (index {} vs. size {})", index, self.rows);
    }
    let start_index = index * self.stride;
    &self.data[start_index .. start_index + self.cols]
  }
}

impl<'a, T> IndexMut<usize> for Slice2DMut<'a, T> {
  fn index_mut(&mut self, index: usize) -> &mut [T] {
    if index >= self.rows {
      panic!("Slice2DMut row index out of bounds (index {} vs. size {})", index, self.rows);
    }
    let start_index = index * self.stride;
    &mut self.data[start_index .. start_index + self.cols]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_block_view_reads_outside_nominal_region() {
    let arr = Array2D::new_with(6, 6, |i, j| (i * 10 + j) as u8);
    let view = arr.block(2, 2, 2, 2);
    assert_eq!(view[0], [22, 23]);
    assert_eq!(view.at(-1, -2), 10);
    assert_eq!(view.span(-2, -1, 4), &[1, 2, 3, 4]);
  }

  #[test]
  fn test_block_mut_writes_through() {
    let mut arr: Array2D<u16> = Array2D::zeroed(4, 8);
    {
      let mut view = arr.block_mut(1, 4, 2, 4);
      view[1][3] = 7;
      let mut inner = view.into_sub(0, 1, 1, 2);
      inner[0][0] = 5;
    }
    assert_eq!(arr[2][7], 7);
    assert_eq!(arr[1][5], 5);
  }

  #[test]
  #[should_panic]
  fn test_row_out_of_bounds() {
    let arr: Array2D<u8> = Array2D::zeroed(2, 2);
    let _ = &arr[2];
  }
}
