// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Coefficient token alphabet

use crate::enums::*;
use crate::enums::Token::*;
use crate::treeprob::{Prob, TreeIndex};

// Full token tree. Node 0 decides EOB vs. "more coefficients", node 1 ZERO vs.
// non-zero, node 2 ONE vs. larger. The remaining nodes split the larger values
pub const coef_tree: [TreeIndex; 2 * (MAX_ENTROPY_TOKENS - 1)] = [
  -(DCT_EOB_TOKEN as TreeIndex), 2,
  -(ZERO_TOKEN as TreeIndex), 4,
  -(ONE_TOKEN as TreeIndex), 6,
  8, 12,
  -(TWO_TOKEN as TreeIndex), 10,
  -(THREE_TOKEN as TreeIndex), -(FOUR_TOKEN as TreeIndex),
  14, 16,
  -(DCT_VAL_CATEGORY1 as TreeIndex), -(DCT_VAL_CATEGORY2 as TreeIndex),
  18, 20,
  -(DCT_VAL_CATEGORY3 as TreeIndex), -(DCT_VAL_CATEGORY4 as TreeIndex),
  -(DCT_VAL_CATEGORY5 as TreeIndex), -(DCT_VAL_CATEGORY6 as TreeIndex)
];

// The first three nodes of coef_tree, with everything from TWO upward merged
pub const coefmodel_tree: [TreeIndex; 6] = [
  -(DCT_EOB_MODEL_TOKEN as TreeIndex), 2,
  -(ZERO_TOKEN as TreeIndex), 4,
  -(ONE_TOKEN as TreeIndex), -(TWO_TOKEN as TreeIndex)
];

// Fixed-probability extra bits which follow a category token
#[derive(Clone, Copy, Debug)]
pub struct ExtraBits {
  // One probability per bit, most significant bit first
  pub probs: &'static [Prob],
  pub base_val: u32,
}

impl ExtraBits {
  pub fn len(&self) -> usize {
    self.probs.len()
  }

  // Largest coefficient magnitude representable by this token
  pub fn max_val(&self) -> u32 {
    self.base_val + (1 << self.len()) - 1
  }
}

const Pcat1: [Prob; 1] = [159];
const Pcat2: [Prob; 2] = [165, 145];
const Pcat3: [Prob; 3] = [173, 148, 140];
const Pcat4: [Prob; 4] = [176, 155, 140, 135];
const Pcat5: [Prob; 5] = [180, 157, 141, 134, 130];
const Pcat6: [Prob; 14] = [254, 254, 254, 252, 249, 243, 230, 196, 177, 153, 140, 133, 130, 129];

pub const extra_bits: [ExtraBits; MAX_ENTROPY_TOKENS] = [
  ExtraBits { probs: &[], base_val: 0 },
  ExtraBits { probs: &[], base_val: 1 },
  ExtraBits { probs: &[], base_val: 2 },
  ExtraBits { probs: &[], base_val: 3 },
  ExtraBits { probs: &[], base_val: 4 },
  ExtraBits { probs: &Pcat1, base_val: 5 },
  ExtraBits { probs: &Pcat2, base_val: 7 },
  ExtraBits { probs: &Pcat3, base_val: 11 },
  ExtraBits { probs: &Pcat4, base_val: 19 },
  ExtraBits { probs: &Pcat5, base_val: 35 },
  ExtraBits { probs: &Pcat6, base_val: 67 },
  ExtraBits { probs: &[], base_val: 0 },
];

// Split a coefficient magnitude into its token and the value of the extra bits
pub fn token_for_value(abs_value: u32) -> (Token, u32) {
  let token = match abs_value {
    0 => ZERO_TOKEN,
    1 => ONE_TOKEN,
    2 => TWO_TOKEN,
    3 => THREE_TOKEN,
    4 => FOUR_TOKEN,
    5 ..= 6 => DCT_VAL_CATEGORY1,
    7 ..= 10 => DCT_VAL_CATEGORY2,
    11 ..= 18 => DCT_VAL_CATEGORY3,
    19 ..= 34 => DCT_VAL_CATEGORY4,
    35 ..= 66 => DCT_VAL_CATEGORY5,
    _ => DCT_VAL_CATEGORY6
  };
  let eb = &extra_bits[token as usize];
  debug_assert!(abs_value <= eb.max_val(), "Coefficient {} too large to tokenize", abs_value);
  (token, abs_value - eb.base_val)
}

// Bit pattern of a tree leaf, as (value, length), MSB = first decision
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenCode {
  pub value: u32,
  pub len: u32,
}

fn tree_to_codes(codes: &mut [TokenCode], tree: &[TreeIndex], i: usize, value: u32, len: u32) {
  for side in 0..2 {
    let v = (value << 1) | side as u32;
    let child = tree[i + side];
    if child <= 0 {
      codes[(-child) as usize] = TokenCode { value: v, len: len + 1 };
    } else {
      tree_to_codes(codes, tree, child as usize, v, len + 1);
    }
  }
}

// Walk a tree and list the code of every leaf, indexed by token
pub fn tokens_from_tree(tree: &[TreeIndex]) -> Vec<TokenCode> {
  let mut codes = vec![TokenCode::default(); tree.len() / 2 + 1];
  tree_to_codes(&mut codes, tree, 0, 0, 0);
  return codes;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_token_for_value_boundaries() {
    assert_eq!(token_for_value(0), (ZERO_TOKEN, 0));
    assert_eq!(token_for_value(4), (FOUR_TOKEN, 0));
    assert_eq!(token_for_value(5), (DCT_VAL_CATEGORY1, 0));
    assert_eq!(token_for_value(6), (DCT_VAL_CATEGORY1, 1));
    assert_eq!(token_for_value(10), (DCT_VAL_CATEGORY2, 3));
    assert_eq!(token_for_value(66), (DCT_VAL_CATEGORY5, 31));
    assert_eq!(token_for_value(67), (DCT_VAL_CATEGORY6, 0));
  }

  #[test]
  fn test_categories_tile_the_value_range() {
    for t in (DCT_VAL_CATEGORY1 as usize)..(DCT_VAL_CATEGORY6 as usize) {
      assert_eq!(extra_bits[t].max_val() + 1, extra_bits[t + 1].base_val);
    }
  }

  #[test]
  fn test_coef_tree_codes() {
    let codes = tokens_from_tree(&coef_tree);
    assert_eq!(codes.len(), MAX_ENTROPY_TOKENS);
    assert_eq!(codes[DCT_EOB_TOKEN as usize], TokenCode { value: 0, len: 1 });
    assert_eq!(codes[ZERO_TOKEN as usize], TokenCode { value: 0b10, len: 2 });
    assert_eq!(codes[ONE_TOKEN as usize], TokenCode { value: 0b110, len: 3 });
    assert_eq!(codes[TWO_TOKEN as usize], TokenCode { value: 0b11100, len: 5 });
    assert_eq!(codes[DCT_VAL_CATEGORY6 as usize], TokenCode { value: 0b1111111, len: 7 });
  }

  #[test]
  fn test_model_tree_codes() {
    let codes = tokens_from_tree(&coefmodel_tree);
    assert_eq!(codes[DCT_EOB_MODEL_TOKEN], TokenCode { value: 0, len: 1 });
    assert_eq!(codes[TWO_TOKEN as usize], TokenCode { value: 0b111, len: 3 });
  }
}
