// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Compound (two-reference) sub-pixel prediction
//
// Each reference is filtered to 16-bit "compound precision" values. The first
// prediction of a pair writes these into the caller's accumulator, and the
// second one blends its own values with the stored ones and writes 8-bit
// pixels to `dst`.
//
// All four paths (copy, horizontal only, vertical only, two-pass) produce the
// same compound precision, so the two predictions of a pair can freely use
// different paths.

use crate::array2d::{Slice2D, Slice2DMut};
use crate::consts::*;
use crate::enums::InterpFilter;
use crate::filters::{FilterKernel, InterpFilterParams};
use crate::util::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConvolveParams {
  // Set for the second prediction of a pair
  pub do_average: bool,
  pub use_dist_wtd_comp_avg: bool,
  // Weight of the stored (first) prediction
  pub fwd_offset: u16,
  // Weight of the new (second) prediction
  pub bck_offset: u16,
}

impl ConvolveParams {
  // First prediction of a pair: just fill the accumulator
  pub fn first() -> Self {
    Self {
      do_average: false,
      use_dist_wtd_comp_avg: false,
      fwd_offset: DIST_WEIGHT_SUM / 2,
      bck_offset: DIST_WEIGHT_SUM / 2
    }
  }

  // Second prediction, plain average
  pub fn average() -> Self {
    Self {
      do_average: true,
      ..Self::first()
    }
  }

  // Second prediction, distance weighted
  pub fn weighted(fwd_offset: u16, bck_offset: u16) -> Self {
    assert_eq!(fwd_offset + bck_offset, DIST_WEIGHT_SUM,
               "Compound weights {} + {} must sum to {}", fwd_offset, bck_offset, DIST_WEIGHT_SUM);
    Self {
      do_average: true,
      use_dist_wtd_comp_avg: true,
      fwd_offset: fwd_offset,
      bck_offset: bck_offset
    }
  }

  // Distance weights from the lookup table. `index` grows with how unequal the
  // two reference distances are, and `fwd_is_closer` says which one is nearer
  pub fn from_distance_index(index: usize, fwd_is_closer: bool) -> Self {
    let (large, small) = quant_dist_lookup_table[index];
    if fwd_is_closer {
      Self::weighted(large, small)
    } else {
      Self::weighted(small, large)
    }
  }
}

// Either store `res` or blend it with what is already stored, for one row
#[inline(always)]
fn finish_row(params: &ConvolveParams, res: &[u16], acc: &mut [u16], dst: &mut [u8]) {
  if !params.do_average {
    acc.copy_from_slice(res);
    return;
  }

  let fwd = params.fwd_offset as u32;
  let bck = params.bck_offset as u32;
  for j in 0..res.len() {
    let a = acc[j] as u32;
    let b = res[j] as u32;
    let avg = if params.use_dist_wtd_comp_avg {
      (a * fwd + b * bck) >> DIST_PRECISION_BITS
    } else {
      (a + b) >> 1
    };
    dst[j] = clip_pixel(round2(avg as i32 - ROUND_OFFSET, COMPOUND_ROUND_BITS));
  }
}

#[inline(always)]
fn dot<const N: usize, T: Copy + Into<i32>>(taps: &[i16; N], samples: &[T]) -> i32 {
  let mut sum = 0i32;
  for k in 0..N {
    let s: i32 = samples[k].into();
    sum += taps[k] as i32 * s;
  }
  sum
}

fn check_block(w: usize, h: usize, acc: &Slice2DMut<u16>, dst: &Slice2DMut<u8>) {
  debug_assert!(w % 4 == 0 && h % 4 == 0, "Block size {}x{} is not a multiple of 4", w, h);
  debug_assert!(w <= MAX_SB_SIZE && h <= MAX_SB_SIZE, "Block size {}x{} is too large", w, h);
  assert!(acc.rows() >= h && acc.cols() >= w);
  assert!(dst.rows() >= h && dst.cols() >= w);
}

// Full-pixel positions in both directions
pub fn convolve_copy(src: Slice2D<u8>, w: usize, h: usize, params: &ConvolveParams,
                     acc: &mut Slice2DMut<u16>, dst: &mut Slice2DMut<u8>) {
  check_block(w, h, acc, dst);
  let mut res = [0u16; MAX_SB_SIZE];

  for i in 0..h {
    let row = src.span(i as isize, 0, w);
    for j in 0..w {
      res[j] = (((row[j] as i32) << COMPOUND_ROUND_BITS) + ROUND_OFFSET) as u16;
    }
    finish_row(params, &res[..w], &mut acc[i][..w], &mut dst[i][..w]);
  }
}

fn convolve_x_taps<const N: usize>(taps: &[i16; N], src: Slice2D<u8>, w: usize, h: usize,
                                   params: &ConvolveParams, acc: &mut Slice2DMut<u16>,
                                   dst: &mut Slice2DMut<u8>) {
  let offset = (N / 2 - 1) as isize;
  let mut res = [0u16; MAX_SB_SIZE];

  for i in 0..h {
    let row = src.span(i as isize, -offset, w + N - 1);
    for j in 0..w {
      // Halved taps, so one bit less of rounding
      let sum = dot(taps, &row[j .. j + N]);
      res[j] = (round2(sum, ROUND0_BITS - 1) + ROUND_OFFSET) as u16;
    }
    finish_row(params, &res[..w], &mut acc[i][..w], &mut dst[i][..w]);
  }
}

// Sub-pixel horizontally, full-pixel vertically
pub fn convolve_x(src: Slice2D<u8>, w: usize, h: usize, kernel_x: FilterKernel,
                  params: &ConvolveParams, acc: &mut Slice2DMut<u16>, dst: &mut Slice2DMut<u8>) {
  check_block(w, h, acc, dst);
  match kernel_x.halved() {
    FilterKernel::FourTap(k) => convolve_x_taps(&k, src, w, h, params, acc, dst),
    FilterKernel::SixTap(k) => convolve_x_taps(&k, src, w, h, params, acc, dst),
    FilterKernel::EightTap(k) => convolve_x_taps(&k, src, w, h, params, acc, dst),
  }
}

fn convolve_y_taps<const N: usize>(taps: &[i16; N], src: Slice2D<u8>, w: usize, h: usize,
                                   params: &ConvolveParams, acc: &mut Slice2DMut<u16>,
                                   dst: &mut Slice2DMut<u8>) {
  let offset = (N / 2 - 1) as isize;
  let mut sum = [0i32; MAX_SB_SIZE];
  let mut res = [0u16; MAX_SB_SIZE];

  for i in 0..h {
    sum[..w].fill(0);
    for k in 0..N {
      let row = src.span(i as isize + k as isize - offset, 0, w);
      for j in 0..w {
        sum[j] += taps[k] as i32 * row[j] as i32;
      }
    }
    for j in 0..w {
      res[j] = (round2(sum[j], ROUND0_BITS - 1) + ROUND_OFFSET) as u16;
    }
    finish_row(params, &res[..w], &mut acc[i][..w], &mut dst[i][..w]);
  }
}

// Full-pixel horizontally, sub-pixel vertically
pub fn convolve_y(src: Slice2D<u8>, w: usize, h: usize, kernel_y: FilterKernel,
                  params: &ConvolveParams, acc: &mut Slice2DMut<u16>, dst: &mut Slice2DMut<u8>) {
  check_block(w, h, acc, dst);
  match kernel_y.halved() {
    FilterKernel::FourTap(k) => convolve_y_taps(&k, src, w, h, params, acc, dst),
    FilterKernel::SixTap(k) => convolve_y_taps(&k, src, w, h, params, acc, dst),
    FilterKernel::EightTap(k) => convolve_y_taps(&k, src, w, h, params, acc, dst),
  }
}

// Intermediate buffer of the two-pass filter: the largest block plus the rows
// an 8-tap vertical kernel needs above and below it
const IM_BLOCK_SIZE: usize = (MAX_SB_SIZE + MAX_FILTER_TAP - 1) * MAX_SB_SIZE;

// Horizontal half of the two-pass filter.
// `src` must already point at the first row the vertical kernel will need.
// With halved taps, the rounding shift is folded into the bias:
//   (sum + 2^(bd+FILTER_BITS-1) + 2^(ROUND0_BITS-1)) >> ROUND0_BITS
//   == (sum/2 + 2^(bd+FILTER_BITS-2) + 2^(ROUND0_BITS-2)) >> (ROUND0_BITS-1)
fn convolve_2d_horiz<const N: usize>(taps: &[i16; N], src: Slice2D<u8>, im: &mut Slice2DMut<i16>) {
  const horiz_const: i32 = (HORIZ_OFFSET >> 1) + (1 << (ROUND0_BITS - 2));
  let offset = (N / 2 - 1) as isize;
  let w = im.cols();

  for i in 0..im.rows() {
    let row = src.span(i as isize, -offset, w + N - 1);
    let out = &mut im[i];
    for j in 0..w {
      out[j] = ((dot(taps, &row[j .. j + N]) + horiz_const) >> (ROUND0_BITS - 1)) as i16;
    }
  }
}

// Vertical half of the two-pass filter, on full-precision taps
fn convolve_2d_vert<const N: usize>(taps: &[i16; N], im: &Slice2DMut<i16>, h: usize,
                                    params: &ConvolveParams, acc: &mut Slice2DMut<u16>,
                                    dst: &mut Slice2DMut<u8>) {
  let w = im.cols();
  let mut sum = [0i32; MAX_SB_SIZE];
  let mut res = [0u16; MAX_SB_SIZE];

  for i in 0..h {
    sum[..w].fill(1 << OFFSET_BITS);
    for k in 0..N {
      let row = &im[i + k];
      for j in 0..w {
        sum[j] += taps[k] as i32 * row[j] as i32;
      }
    }
    for j in 0..w {
      res[j] = round2(sum[j], COMPOUND_ROUND1_BITS) as u16;
    }
    finish_row(params, &res[..w], &mut acc[i][..w], &mut dst[i][..w]);
  }
}

// Sub-pixel in both directions
pub fn convolve_2d(src: Slice2D<u8>, w: usize, h: usize, kernel_x: FilterKernel, kernel_y: FilterKernel,
                   params: &ConvolveParams, acc: &mut Slice2DMut<u16>, dst: &mut Slice2DMut<u8>) {
  check_block(w, h, acc, dst);

  // Intermediate rows cover the vertical kernel's support above and below the block
  let im_h = h + kernel_y.taps() - 1;
  let mut im_block = [0i16; IM_BLOCK_SIZE];
  let mut im = Slice2DMut::new(&mut im_block[.. im_h * w], im_h, w, w);
  let src_top = src.sub(-(kernel_y.offset() as isize), 0, im_h, w);

  match kernel_x.halved() {
    FilterKernel::FourTap(k) => convolve_2d_horiz(&k, src_top, &mut im),
    FilterKernel::SixTap(k) => convolve_2d_horiz(&k, src_top, &mut im),
    FilterKernel::EightTap(k) => convolve_2d_horiz(&k, src_top, &mut im),
  }

  match kernel_y {
    FilterKernel::FourTap(k) => convolve_2d_vert(&k, &im, h, params, acc, dst),
    FilterKernel::SixTap(k) => convolve_2d_vert(&k, &im, h, params, acc, dst),
    FilterKernel::EightTap(k) => convolve_2d_vert(&k, &im, h, params, acc, dst),
  }
}

// Predict one w x h block from `src`, whose origin is the integer-pel position
// of the block's top-left pixel. `src` must have readable pixels up to 3 rows/columns
// before and 4 after the block.
//
// Kernel size depends on the block size along each axis, and the path depends
// on which phases are non-zero
pub fn predict(src: Slice2D<u8>, w: usize, h: usize,
               filter_x: InterpFilter, subpel_x: usize,
               filter_y: InterpFilter, subpel_y: usize,
               params: &ConvolveParams, acc: &mut Slice2DMut<u16>, dst: &mut Slice2DMut<u8>) {
  debug_assert!(subpel_x < SUBPEL_SHIFTS && subpel_y < SUBPEL_SHIFTS);

  match (subpel_x != 0, subpel_y != 0) {
    (false, false) => convolve_copy(src, w, h, params, acc, dst),
    (true, false) => {
      let kernel_x = InterpFilterParams::for_block(filter_x, w).kernel(subpel_x);
      convolve_x(src, w, h, kernel_x, params, acc, dst);
    },
    (false, true) => {
      let kernel_y = InterpFilterParams::for_block(filter_y, h).kernel(subpel_y);
      convolve_y(src, w, h, kernel_y, params, acc, dst);
    },
    (true, true) => {
      let kernel_x = InterpFilterParams::for_block(filter_x, w).kernel(subpel_x);
      let kernel_y = InterpFilterParams::for_block(filter_y, h).kernel(subpel_y);
      convolve_2d(src, w, h, kernel_x, kernel_y, params, acc, dst);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::array2d::Array2D;
  use crate::enums::InterpFilter::*;

  const PAD: usize = 8;

  fn test_source(rows: usize, cols: usize) -> Array2D<u8> {
    Array2D::new_with(rows + 2 * PAD, cols + 2 * PAD, |i, j| ((i * 37 + j * 11) ^ (i * j)) as u8)
  }

  fn source_view(src: &Array2D<u8>, h: usize, w: usize) -> Slice2D<'_, u8> {
    src.block(PAD, PAD, h, w)
  }

  #[test]
  fn test_copy_path_values() {
    let src = Array2D::new_with(PAD * 2 + 4, PAD * 2 + 4, |_, _| 200u8);
    let mut acc: Array2D<u16> = Array2D::zeroed(4, 4);
    let mut dst: Array2D<u8> = Array2D::zeroed(4, 4);
    convolve_copy(source_view(&src, 4, 4), 4, 4, &ConvolveParams::first(),
                  &mut acc.as_slice2d_mut(), &mut dst.as_slice2d_mut());
    assert_eq!(acc[0][0], 200 * 16 + 6144);
    // The first prediction leaves dst alone
    assert_eq!(dst[3][3], 0);

    convolve_copy(source_view(&src, 4, 4), 4, 4, &ConvolveParams::average(),
                  &mut acc.as_slice2d_mut(), &mut dst.as_slice2d_mut());
    assert!(dst.data().iter().all(|&p| p == 200));
  }

  #[test]
  fn test_flat_input_is_preserved_by_every_path() {
    let src = Array2D::new_with(32, 32, |_, _| 77u8);
    for (sx, sy) in [(0, 0), (5, 0), (0, 11), (3, 9)] {
      for filter in [EIGHTTAP_REGULAR, EIGHTTAP_SMOOTH, EIGHTTAP_SHARP, BILINEAR] {
        let mut acc: Array2D<u16> = Array2D::zeroed(8, 8);
        let mut dst: Array2D<u8> = Array2D::zeroed(8, 8);
        let view = source_view(&src, 8, 8);
        predict(view, 8, 8, filter, sx, filter, sy, &ConvolveParams::first(),
                &mut acc.as_slice2d_mut(), &mut dst.as_slice2d_mut());
        assert!(acc.data().iter().all(|&v| v == 77 * 16 + 6144), "{:?} ({}, {})", filter, sx, sy);
        predict(view, 8, 8, filter, sx, filter, sy, &ConvolveParams::from_distance_index(2, true),
                &mut acc.as_slice2d_mut(), &mut dst.as_slice2d_mut());
        assert!(dst.data().iter().all(|&p| p == 77));
      }
    }
  }

  #[test]
  fn test_largest_block_two_pass() {
    // 128x128 with 8-tap kernels on both axes fills the whole intermediate buffer
    let src = Array2D::new_with(MAX_SB_SIZE + 2 * PAD, MAX_SB_SIZE + 2 * PAD, |_, _| 91u8);
    let mut acc: Array2D<u16> = Array2D::zeroed(MAX_SB_SIZE, MAX_SB_SIZE);
    let mut dst: Array2D<u8> = Array2D::zeroed(MAX_SB_SIZE, MAX_SB_SIZE);
    let view = source_view(&src, MAX_SB_SIZE, MAX_SB_SIZE);
    predict(view, MAX_SB_SIZE, MAX_SB_SIZE, EIGHTTAP_SHARP, 7, EIGHTTAP_SHARP, 3, &ConvolveParams::first(),
            &mut acc.as_slice2d_mut(), &mut dst.as_slice2d_mut());
    assert!(acc.data().iter().all(|&v| v == 91 * 16 + 6144));
    predict(view, MAX_SB_SIZE, MAX_SB_SIZE, EIGHTTAP_SHARP, 3, EIGHTTAP_SHARP, 7, &ConvolveParams::average(),
            &mut acc.as_slice2d_mut(), &mut dst.as_slice2d_mut());
    assert!(dst.data().iter().all(|&p| p == 91));
  }

  #[test]
  fn test_horizontal_bias_matches_unfolded_rounding() {
    // Halved taps halve both the offset and the rounding term
    let halved = (HORIZ_OFFSET >> 1) + (1 << (ROUND0_BITS - 2));
    let full = HORIZ_OFFSET + (1 << (ROUND0_BITS - 1));
    assert_eq!(halved * 2, full);
  }

  #[test]
  fn test_half_pel_bilinear_is_average() {
    // Bilinear at phase 8 is (64, 64), so a horizontal step of 0 -> 100 gives 50
    let src = Array2D::new_with(24, 24, |_, j| if j < PAD + 4 { 0u8 } else { 100u8 });
    let mut acc: Array2D<u16> = Array2D::zeroed(8, 8);
    let mut dst: Array2D<u8> = Array2D::zeroed(8, 8);
    let view = source_view(&src, 8, 8);
    predict(view, 8, 8, BILINEAR, 8, BILINEAR, 0, &ConvolveParams::first(),
            &mut acc.as_slice2d_mut(), &mut dst.as_slice2d_mut());
    predict(view, 8, 8, BILINEAR, 8, BILINEAR, 0, &ConvolveParams::average(),
            &mut acc.as_slice2d_mut(), &mut dst.as_slice2d_mut());
    assert_eq!(dst[0], [0, 0, 0, 50, 100, 100, 100, 100]);
  }

  #[test]
  fn test_blend_uses_both_predictions() {
    let src = test_source(8, 8);
    let mut acc: Array2D<u16> = Array2D::zeroed(8, 8);
    let mut dst: Array2D<u8> = Array2D::zeroed(8, 8);
    let view = source_view(&src, 8, 8);
    let shifted = src.block(PAD + 1, PAD, 8, 8);

    convolve_copy(view, 8, 8, &ConvolveParams::first(), &mut acc.as_slice2d_mut(), &mut dst.as_slice2d_mut());
    convolve_copy(shifted, 8, 8, &ConvolveParams::average(), &mut acc.as_slice2d_mut(), &mut dst.as_slice2d_mut());
    for i in 0..8 {
      for j in 0..8 {
        let a = view[i][j] as u32;
        let b = shifted[i][j] as u32;
        // Both are exact in compound precision, so halves round up
        assert_eq!(dst[i][j] as u32, (a + b) / 2 + ((a + b) & 1));
      }
    }
  }

  #[test]
  fn test_weights_from_table() {
    let p = ConvolveParams::from_distance_index(0, false);
    assert_eq!((p.fwd_offset, p.bck_offset), (7, 9));
    let p = ConvolveParams::from_distance_index(3, true);
    assert_eq!((p.fwd_offset, p.bck_offset), (13, 3));
  }

  #[test]
  #[should_panic]
  fn test_unbalanced_weights_rejected() {
    let _ = ConvolveParams::weighted(9, 9);
  }
}
