// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use std::io;
use std::io::prelude::*;

use crate::array2d::{Array2D, Slice2D, Slice2DMut};

// Extra pixels kept on every side of a plane, so that motion vectors may point
// a little way outside the picture and the filters can still read their taps
pub const BORDER: usize = 32;

// Planes are allocated in whole 8x8 blocks
pub const BLOCK_ALIGN: usize = 8;

pub struct Plane {
  // Pixel data, including the border.
  // The width() / height() methods give the block-aligned size of the picture
  // area; for the real size use crop_width() / crop_height()
  pixels: Array2D<u8>,

  width: usize,
  height: usize,
  crop_width: usize,
  crop_height: usize
}

impl Plane {
  pub fn new(crop_height: usize, crop_width: usize) -> Self {
    let width = crop_width.next_multiple_of(BLOCK_ALIGN);
    let height = crop_height.next_multiple_of(BLOCK_ALIGN);
    Self {
      pixels: Array2D::zeroed(height + 2 * BORDER, width + 2 * BORDER),
      width: width,
      height: height,
      crop_width: crop_width,
      crop_height: crop_height
    }
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn crop_width(&self) -> usize {
    self.crop_width
  }

  pub fn crop_height(&self) -> usize {
    self.crop_height
  }

  // Pixel at (row, col) of the picture. Coordinates may reach into the border
  pub fn at(&self, row: isize, col: isize) -> u8 {
    self.view().at(row, col)
  }

  // The picture area, with reads allowed to extend into the border
  pub fn view(&self) -> Slice2D<'_, u8> {
    self.pixels.block(BORDER, BORDER, self.height, self.width)
  }

  // A block of the picture area, for writing
  pub fn block_mut(&mut self, row: usize, col: usize, rows: usize, cols: usize) -> Slice2DMut<'_, u8> {
    assert!(row + rows <= self.height && col + cols <= self.width);
    self.pixels.block_mut(BORDER + row, BORDER + col, rows, cols)
  }

  pub fn fill_with<F: FnMut(usize, usize) -> u8>(&mut self, mut f: F) {
    for i in 0..self.crop_height {
      for j in 0..self.crop_width {
        self.pixels[BORDER + i][BORDER + j] = f(i, j);
      }
    }
    self.extend_borders();
  }

  // Fill everything outside the crop region by replicating the nearest pixel
  // inside it. This *must* be called after any modification which may affect
  // the outermost rows/columns of the picture
  pub fn extend_borders(&mut self) {
    let total_cols = self.pixels.cols();
    let total_rows = self.pixels.rows();
    let first_col = BORDER;
    let last_col = BORDER + self.crop_width - 1;
    let first_row = BORDER;
    let last_row = BORDER + self.crop_height - 1;

    for row in first_row ..= last_row {
      let r = &mut self.pixels[row];
      let left = r[first_col];
      let right = r[last_col];
      r[.. first_col].fill(left);
      r[last_col + 1 .. total_cols].fill(right);
    }

    let top: Vec<u8> = self.pixels[first_row].to_vec();
    for row in 0 .. first_row {
      self.pixels[row].copy_from_slice(&top);
    }
    let bottom: Vec<u8> = self.pixels[last_row].to_vec();
    for row in last_row + 1 .. total_rows {
      self.pixels[row].copy_from_slice(&bottom);
    }
  }

  pub fn read_from<R: Read>(&mut self, r: &mut R) -> Result<(), io::Error> {
    for row in 0 .. self.crop_height {
      r.read_exact(&mut self.pixels[BORDER + row][BORDER .. BORDER + self.crop_width])?;
    }
    self.extend_borders();
    Ok(())
  }

  pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), io::Error> {
    for row in 0 .. self.crop_height {
      w.write_all(&self.pixels[BORDER + row][BORDER .. BORDER + self.crop_width])?;
    }
    Ok(())
  }
}

// 8-bit 4:2:0 frame
pub struct Frame {
  planes: [Plane; 3]
}

impl Frame {
  pub fn new(y_crop_height: usize, y_crop_width: usize) -> Self {
    let uv_crop_width = (y_crop_width + 1) / 2;
    let uv_crop_height = (y_crop_height + 1) / 2;

    Self {
      planes: [
        Plane::new(y_crop_height, y_crop_width),
        Plane::new(uv_crop_height, uv_crop_width),
        Plane::new(uv_crop_height, uv_crop_width),
      ]
    }
  }

  pub fn plane(&self, idx: usize) -> &Plane {
    &self.planes[idx]
  }

  pub fn plane_mut(&mut self, idx: usize) -> &mut Plane {
    &mut self.planes[idx]
  }

  pub fn y(&self) -> &Plane {
    &self.planes[0]
  }

  pub fn y_mut(&mut self) -> &mut Plane {
    &mut self.planes[0]
  }

  pub fn u(&self) -> &Plane {
    &self.planes[1]
  }

  pub fn u_mut(&mut self) -> &mut Plane {
    &mut self.planes[1]
  }

  pub fn v(&self) -> &Plane {
    &self.planes[2]
  }

  pub fn v_mut(&mut self) -> &mut Plane {
    &mut self.planes[2]
  }
}
