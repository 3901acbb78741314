// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Binary probabilities and the token trees built out of them
//
// A probability is the chance, out of 256, that a tree node takes its
// left (0) branch. Valid probabilities are 1..=255.
//
// Trees are stored as flat arrays of node pairs: entry i and i+1 are the
// left and right children of node i/2. A positive entry is the index of
// another node pair, while an entry <= 0 is a leaf holding -token.

use crate::util::round2_u32;

pub type Prob = u8;
pub type TreeIndex = i8;

pub fn clip_prob(p: u32) -> Prob {
  if p > 255 {
    255
  } else if p < 1 {
    1
  } else {
    p as Prob
  }
}

// Probability of a 0, given `num` zeros out of `den` events
pub fn get_prob(num: u32, den: u32) -> Prob {
  if den == 0 {
    return 128;
  }
  let p = ((num as u64 * 256 + (den >> 1) as u64) / den as u64) as u32;
  clip_prob(p)
}

pub fn get_binary_prob(n0: u32, n1: u32) -> Prob {
  get_prob(n0, n0 + n1)
}

// Blend two probabilities, with `factor` / 256 weight given to `prob2`
pub fn weighted_prob(prob1: Prob, prob2: Prob, factor: u32) -> Prob {
  debug_assert!(factor <= 256);
  round2_u32(prob1 as u32 * (256 - factor) + prob2 as u32 * factor, 8) as Prob
}

fn convert_distribution(i: usize, tree: &[TreeIndex], probs: &mut [Prob],
                        branch_ct: &mut [[u32; 2]], num_events: &[u32]) -> u32 {
  let mut count = [0u32; 2];
  for side in 0..2 {
    let child = tree[i + side];
    count[side] = if child <= 0 {
      num_events[(-child) as usize]
    } else {
      convert_distribution(child as usize, tree, probs, branch_ct, num_events)
    };
  }
  let [left, right] = count;

  probs[i >> 1] = get_binary_prob(left, right);
  branch_ct[i >> 1] = [left, right];
  return left + right;
}

// Given how often each token was seen, work out how often each tree node took
// each branch, and the probability which best matches those counts.
// `probs` and `branch_ct` need one entry per internal node (tree.len() / 2)
pub fn tree_probs_from_distribution(tree: &[TreeIndex], probs: &mut [Prob],
                                    branch_ct: &mut [[u32; 2]], num_events: &[u32]) {
  debug_assert!(probs.len() >= tree.len() / 2);
  debug_assert!(branch_ct.len() >= tree.len() / 2);
  convert_distribution(0, tree, probs, branch_ct, num_events);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_get_prob() {
    assert_eq!(get_prob(0, 0), 128);
    assert_eq!(get_prob(1, 2), 128);
    assert_eq!(get_prob(0, 10), 1);
    assert_eq!(get_prob(10, 10), 255);
    // 3 * 256 / 4 = 192 exactly
    assert_eq!(get_prob(3, 4), 192);
    // (256 + 1) / 3 = 85
    assert_eq!(get_binary_prob(1, 2), 85);
  }

  #[test]
  fn test_weighted_prob() {
    assert_eq!(weighted_prob(100, 200, 0), 100);
    assert_eq!(weighted_prob(100, 200, 256), 200);
    assert_eq!(weighted_prob(100, 200, 128), 150);
    // (128 * 144 + 255 * 112 + 128) >> 8 = 184
    assert_eq!(weighted_prob(128, 255, 112), 184);
  }

  #[test]
  fn test_tree_probs_from_distribution() {
    // Three-symbol tree: A | (B | C)
    let tree: [TreeIndex; 4] = [0, 2, -1, -2];
    let mut probs = [0; 2];
    let mut branch_ct = [[0; 2]; 2];
    tree_probs_from_distribution(&tree, &mut probs, &mut branch_ct, &[6, 1, 3]);
    assert_eq!(branch_ct, [[6, 4], [1, 3]]);
    assert_eq!(probs, [get_prob(6, 10), get_prob(1, 4)]);
  }
}
