// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Inter prediction of whole blocks from a reference plane

use crate::array2d::{Array2D, Slice2DMut};
use crate::consts::*;
use crate::convolve::{predict, ConvolveParams};
use crate::enums::InterpFilter;
use crate::frame::{Plane, BORDER};
use crate::util::*;

// Motion vector in 1/16 pel units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotionVector {
  pub row: i32,
  pub col: i32,
}

impl MotionVector {
  pub fn new(row: i32, col: i32) -> Self {
    Self {
      row: row,
      col: col
    }
  }
}

// Rows/columns which the longest kernel reads before and after a block
const FILTER_REACH_BEFORE: isize = (MAX_FILTER_TAP / 2 - 1) as isize;
const FILTER_REACH_AFTER: isize = (MAX_FILTER_TAP / 2) as isize;

// Split a 1/16-pel position into its integer and sub-pixel parts, keeping the
// integer part far enough inside the border that every tap stays readable.
// Pixels beyond the picture edge are all copies of the edge, so clamping does
// not change what gets predicted as long as it happens deep in the border
fn split_position(pos: i32, size: usize, block: usize) -> (isize, usize) {
  let int_pos = (pos >> SUBPEL_BITS) as isize;
  let subpel = (pos & SUBPEL_MASK as i32) as usize;
  let min = -(BORDER as isize) + FILTER_REACH_BEFORE;
  let max = (size + BORDER) as isize - block as isize - FILTER_REACH_AFTER;
  (clamp(int_pos, min, max), subpel)
}

// Filter one w x h block at (y0, x0), displaced by `mv`, from `reference`.
// This is one half of a compound prediction; see ConvolveParams for how the
// two halves interact through `acc`
pub fn predict_inter_block(reference: &Plane, y0: usize, x0: usize, h: usize, w: usize,
                           mv: MotionVector, filter: InterpFilter, params: &ConvolveParams,
                           acc: &mut Slice2DMut<u16>, dst: &mut Slice2DMut<u8>) {
  let pos_y = ((y0 as i32) << SUBPEL_BITS) + mv.row;
  let pos_x = ((x0 as i32) << SUBPEL_BITS) + mv.col;
  let (row, subpel_y) = split_position(pos_y, reference.height(), h);
  let (col, subpel_x) = split_position(pos_x, reference.width(), w);

  let src = reference.view().sub(row, col, h, w);
  predict(src, w, h, filter, subpel_x, filter, subpel_y, params, acc, dst);
}

// Single-reference prediction. This runs the compound pipeline with the same
// reference twice, which averages back to exactly the single prediction
pub fn predict_single(reference: &Plane, y0: usize, x0: usize, h: usize, w: usize,
                      mv: MotionVector, filter: InterpFilter, dst: &mut Slice2DMut<u8>) {
  let mut acc: Array2D<u16> = Array2D::zeroed(h, w);
  let mut acc_view = acc.as_slice2d_mut();
  predict_inter_block(reference, y0, x0, h, w, mv, filter, &ConvolveParams::first(), &mut acc_view, dst);
  predict_inter_block(reference, y0, x0, h, w, mv, filter, &ConvolveParams::average(), &mut acc_view, dst);
}

// Two-reference prediction. `weights` gives (forward, backward) distance
// weights; without them the two predictions are averaged
pub fn predict_compound(ref0: &Plane, mv0: MotionVector, ref1: &Plane, mv1: MotionVector,
                        y0: usize, x0: usize, h: usize, w: usize, filter: InterpFilter,
                        weights: Option<(u16, u16)>, dst: &mut Slice2DMut<u8>) {
  let mut acc: Array2D<u16> = Array2D::zeroed(h, w);
  let mut acc_view = acc.as_slice2d_mut();
  let second = match weights {
    Some((fwd, bck)) => ConvolveParams::weighted(fwd, bck),
    None => ConvolveParams::average(),
  };
  predict_inter_block(ref0, y0, x0, h, w, mv0, filter, &ConvolveParams::first(), &mut acc_view, dst);
  predict_inter_block(ref1, y0, x0, h, w, mv1, filter, &second, &mut acc_view, dst);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::enums::InterpFilter::*;

  fn gradient_plane() -> Plane {
    let mut plane = Plane::new(32, 32);
    plane.fill_with(|i, j| (4 * i + 2 * j) as u8);
    plane
  }

  #[test]
  fn test_integer_mv_copies() {
    let plane = gradient_plane();
    let mut out: Array2D<u8> = Array2D::zeroed(8, 8);
    predict_single(&plane, 8, 8, 8, 8, MotionVector::new(2 * 16, -3 * 16), EIGHTTAP_SHARP,
                   &mut out.as_slice2d_mut());
    for i in 0..8 {
      for j in 0..8 {
        assert_eq!(out[i][j], plane.at(10 + i as isize, 5 + j as isize));
      }
    }
  }

  #[test]
  fn test_half_pel_on_linear_ramp() {
    // All kernels are symmetric at the half-pel position, so on a linear ramp
    // the result is the mean of the two neighboring pixels
    let plane = gradient_plane();
    let mut out: Array2D<u8> = Array2D::zeroed(8, 8);
    predict_single(&plane, 8, 8, 8, 8, MotionVector::new(0, 8), EIGHTTAP_REGULAR, &mut out.as_slice2d_mut());
    assert_eq!(out[0][0], plane.at(8, 8) + 1);
  }

  #[test]
  fn test_far_mv_is_clamped() {
    let plane = gradient_plane();
    let mut out: Array2D<u8> = Array2D::zeroed(8, 8);
    predict_single(&plane, 0, 0, 8, 8, MotionVector::new(-1000 * 16, -1000 * 16), BILINEAR,
                   &mut out.as_slice2d_mut());
    // Entirely inside the replicated top-left corner
    assert!(out.data().iter().all(|&p| p == plane.at(0, 0)));
  }

  #[test]
  fn test_compound_of_identical_refs() {
    let plane = gradient_plane();
    let mv = MotionVector::new(5, 11);
    let mut single: Array2D<u8> = Array2D::zeroed(8, 8);
    let mut compound: Array2D<u8> = Array2D::zeroed(8, 8);
    predict_single(&plane, 8, 16, 8, 8, mv, EIGHTTAP_SMOOTH, &mut single.as_slice2d_mut());
    predict_compound(&plane, mv, &plane, mv, 8, 16, 8, 8, EIGHTTAP_SMOOTH, Some((11, 5)),
                     &mut compound.as_slice2d_mut());
    assert_eq!(single.data(), compound.data());
  }
}
