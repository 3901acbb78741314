// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterpFilter {
  EIGHTTAP_REGULAR = 0,
  EIGHTTAP_SMOOTH = 1,
  EIGHTTAP_SHARP = 2,
  BILINEAR = 3
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxSize {
  TX_4X4 = 0,
  TX_8X8 = 1,
  TX_16X16 = 2,
  TX_32X32 = 3
}

pub const TX_SIZES: usize = 4;

impl TxSize {
  pub const ALL: [TxSize; TX_SIZES] = [TxSize::TX_4X4, TxSize::TX_8X8, TxSize::TX_16X16, TxSize::TX_32X32];

  // Width (= height) of the transform, in coefficients
  pub fn width(self) -> usize {
    4 << (self as usize)
  }

  pub fn num_coeffs(self) -> usize {
    self.width() * self.width()
  }
}

// 1D transform types applied vertically / horizontally
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxType {
  DCT_DCT = 0,
  ADST_DCT = 1,
  DCT_ADST = 2,
  ADST_ADST = 3
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScanType {
  DEFAULT = 0,
  COL = 1,
  ROW = 2
}

// "Block type" axis of the coefficient probability tables
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaneType {
  Y_WITH_DC = 0,
  UV = 1
}

pub const BLOCK_TYPES: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefType {
  INTRA = 0,
  INTER = 1
}

pub const REF_TYPES: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameType {
  KEY_FRAME = 0,
  INTER_FRAME = 1
}

// Coefficient tokens
// DCT_VAL_CATEGORY1..6 cover progressively larger magnitude ranges, with the
// exact value sent as extra bits (see tokens.rs)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
  ZERO_TOKEN = 0,
  ONE_TOKEN = 1,
  TWO_TOKEN = 2,
  THREE_TOKEN = 3,
  FOUR_TOKEN = 4,
  DCT_VAL_CATEGORY1 = 5,
  DCT_VAL_CATEGORY2 = 6,
  DCT_VAL_CATEGORY3 = 7,
  DCT_VAL_CATEGORY4 = 8,
  DCT_VAL_CATEGORY5 = 9,
  DCT_VAL_CATEGORY6 = 10,
  DCT_EOB_TOKEN = 11
}

pub const MAX_ENTROPY_TOKENS: usize = 12;

// In the reduced "model" token alphabet, ZERO, ONE and TWO keep their indices
// and every token from TWO upward is folded into TWO. EOB moves to index 3
pub const DCT_EOB_MODEL_TOKEN: usize = 3;
pub const UNCONSTRAINED_TOKENS: usize = 4;
