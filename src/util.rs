// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Small arithmetic helpers shared by the filters and the probability code

pub fn clamp<T: PartialOrd>(value: T, low: T, high: T) -> T {
  if value < low {
    low
  } else if value > high {
    high
  } else {
    value
  }
}

// Divide by 2^n, rounding halves upward: (x + 2^(n-1)) >> n
// The shift is arithmetic, so negative values round toward +infinity on ties as well
#[inline(always)]
pub fn round2(x: i32, n: u32) -> i32 {
  if n == 0 {
    return x;
  }
  (x + (1 << (n - 1))) >> n
}

// Unsigned variant, used for probability arithmetic
#[inline(always)]
pub fn round2_u32(x: u32, n: u32) -> u32 {
  if n == 0 {
    return x;
  }
  (x + (1 << (n - 1))) >> n
}

#[inline(always)]
pub fn clip_pixel(value: i32) -> u8 {
  clamp(value, 0, 255) as u8
}
