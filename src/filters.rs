// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Interpolation kernel selection

use crate::consts::*;
use crate::enums::InterpFilter;
use crate::enums::InterpFilter::*;

// The table of kernels used for one axis of one block
#[derive(Clone, Copy, Debug)]
pub struct InterpFilterParams {
  pub filter: InterpFilter,
  pub table: &'static [[i16; MAX_FILTER_TAP]; SUBPEL_SHIFTS],
  // Whether only the middle four taps can be non-zero
  pub narrow: bool,
}

impl InterpFilterParams {
  // Pick the kernel table for a block whose size along the filtered axis is `dim`.
  // Small blocks switch to 4-tap kernels. There is no 4-tap sharp filter, so
  // those fall back to the regular 4-tap kernels
  pub fn for_block(filter: InterpFilter, dim: usize) -> Self {
    let narrow = dim <= 4;
    let table = match (filter, narrow) {
      (EIGHTTAP_REGULAR, false) => &sub_pel_filters_8,
      (EIGHTTAP_SMOOTH, false) => &sub_pel_filters_8smooth,
      (EIGHTTAP_SHARP, false) => &sub_pel_filters_8sharp,
      (EIGHTTAP_REGULAR, true) => &sub_pel_filters_4,
      (EIGHTTAP_SMOOTH, true) => &sub_pel_filters_4smooth,
      (EIGHTTAP_SHARP, true) => &sub_pel_filters_4,
      (BILINEAR, _) => &bilinear_filters,
    };

    Self {
      filter: filter,
      table: table,
      narrow: narrow
    }
  }

  pub fn kernel(&self, subpel: usize) -> FilterKernel {
    debug_assert!(subpel < SUBPEL_SHIFTS);
    let taps = &self.table[subpel & SUBPEL_MASK];
    if self.narrow {
      FilterKernel::narrow(taps)
    } else {
      FilterKernel::select(taps)
    }
  }
}

// A kernel trimmed down to its non-zero support.
// The inner loops are monomorphised on the tap count, so matching on this once
// per block picks the whole loop nest
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKernel {
  FourTap([i16; 4]),
  SixTap([i16; 6]),
  EightTap([i16; 8]),
}

impl FilterKernel {
  // Taps 2..5 of an 8-tap layout. Only valid for the narrow tables
  pub fn narrow(taps: &[i16; 8]) -> Self {
    debug_assert!(taps[0] == 0 && taps[1] == 0 && taps[6] == 0 && taps[7] == 0);
    FilterKernel::FourTap([taps[2], taps[3], taps[4], taps[5]])
  }

  // Drop the outermost taps when both are zero
  pub fn select(taps: &[i16; 8]) -> Self {
    if taps[0] == 0 && taps[7] == 0 {
      FilterKernel::SixTap([taps[1], taps[2], taps[3], taps[4], taps[5], taps[6]])
    } else {
      FilterKernel::EightTap(*taps)
    }
  }

  pub fn taps(&self) -> usize {
    match self {
      FilterKernel::FourTap(_) => 4,
      FilterKernel::SixTap(_) => 6,
      FilterKernel::EightTap(_) => 8,
    }
  }

  // Number of source pixels the kernel reaches back before the output position
  pub fn offset(&self) -> usize {
    self.taps() / 2 - 1
  }

  // All taps are even, so halving them is exact and buys one bit of headroom
  pub fn halved(&self) -> Self {
    match *self {
      FilterKernel::FourTap(k) => FilterKernel::FourTap(k.map(|t| t >> 1)),
      FilterKernel::SixTap(k) => FilterKernel::SixTap(k.map(|t| t >> 1)),
      FilterKernel::EightTap(k) => FilterKernel::EightTap(k.map(|t| t >> 1)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ALL_FILTERS: [InterpFilter; 4] = [EIGHTTAP_REGULAR, EIGHTTAP_SMOOTH, EIGHTTAP_SHARP, BILINEAR];

  fn coeffs(kernel: &FilterKernel) -> &[i16] {
    match kernel {
      FilterKernel::FourTap(k) => k,
      FilterKernel::SixTap(k) => k,
      FilterKernel::EightTap(k) => k,
    }
  }

  // The kernel laid back out as 8 taps, with zeros outside its support
  fn expand(kernel: &FilterKernel) -> [i16; 8] {
    let mut full = [0i16; 8];
    let start = 3 - kernel.offset();
    full[start .. start + kernel.taps()].copy_from_slice(coeffs(kernel));
    full
  }

  #[test]
  fn test_kernel_shapes() {
    assert_eq!(InterpFilterParams::for_block(EIGHTTAP_SHARP, 8).kernel(5).taps(), 8);
    assert_eq!(InterpFilterParams::for_block(EIGHTTAP_REGULAR, 16).kernel(5).taps(), 6);
    assert_eq!(InterpFilterParams::for_block(BILINEAR, 64).kernel(5).taps(), 6);
    for filter in ALL_FILTERS {
      assert_eq!(InterpFilterParams::for_block(filter, 4).kernel(9).taps(), 4);
    }
  }

  #[test]
  fn test_kernels_are_normalised() {
    for filter in ALL_FILTERS {
      for dim in [4, 8] {
        let params = InterpFilterParams::for_block(filter, dim);
        for subpel in 0..SUBPEL_SHIFTS {
          let kernel = params.kernel(subpel);
          let sum: i32 = coeffs(&kernel).iter().map(|&t| t as i32).sum();
          assert_eq!(sum, 1 << FILTER_BITS);
          assert!(coeffs(&kernel).iter().all(|t| t % 2 == 0));
          // Trimming must never lose a non-zero tap
          assert_eq!(expand(&kernel), params.table[subpel]);
        }
      }
    }
  }

  #[test]
  fn test_offsets() {
    assert_eq!(FilterKernel::FourTap([0; 4]).offset(), 1);
    assert_eq!(FilterKernel::SixTap([0; 6]).offset(), 2);
    assert_eq!(FilterKernel::EightTap([0; 8]).offset(), 3);
  }
}
