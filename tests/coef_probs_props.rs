// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Property tests for the coefficient probability model: scan neighbors,
// model expansion and backward adaptation

use bytemuck::Zeroable;
use proptest::prelude::*;

use tinyrecon::coef_probs::*;
use tinyrecon::consts::COEF_BANDS;
use tinyrecon::context::PREV_COEF_CONTEXTS;
use tinyrecon::enums::*;
use tinyrecon::pareto::*;
use tinyrecon::scan::{scan_tables, ScanTables};
use tinyrecon::treeprob::Prob;

const MODEL_ENTRIES: usize = BLOCK_TYPES * REF_TYPES * COEF_BANDS * PREV_COEF_CONTEXTS * UNCONSTRAINED_NODES;

fn model_from_values(values: &[Prob]) -> CoeffProbsModel {
  let mut model: CoeffProbsModel = Zeroable::zeroed();
  let mut it = values.iter().copied();
  for i in 0..BLOCK_TYPES {
    for j in 0..REF_TYPES {
      for k in 0..COEF_BANDS {
        for l in 0..PREV_COEF_CONTEXTS {
          for t in 0..UNCONSTRAINED_NODES {
            model[i][j][k][l][t] = it.next().unwrap_or(128);
          }
        }
      }
    }
  }
  model
}

fn arbitrary_model() -> impl Strategy<Value = CoeffProbsModel> {
  prop::collection::vec(1u8..=255, MODEL_ENTRIES).prop_map(|values| model_from_values(&values))
}

// Neighbors must always be coded before the coefficient they predict
#[test]
fn test_neighbors_precede_position_in_every_scan() {
  let tables = ScanTables::new();
  for order in tables.iter() {
    for c in 0..order.len() {
      for n in order.neighbors[c].iter().flatten() {
        assert!((*n as usize) < c, "{:?} {:?}: neighbor {} of position {}",
                order.tx_size, order.scan_type, n, c);
      }
    }
  }
}

// Poison every not-yet-coded entry of the token cache. If the context ever
// read one of them, the result would fall outside the valid context range
#[test]
fn test_context_ignores_uncoded_coefficients() {
  for order in scan_tables().iter() {
    let n = order.len();
    let mut token_cache = vec![0u8; n];
    for c in 0..n {
      for pos in c..n {
        token_cache[order.scan[pos] as usize] = 200;
      }
      let ctx = order.context_for(&token_cache, c, n);
      assert!(ctx < PREV_COEF_CONTEXTS, "{:?} {:?}: position {} read an uncoded neighbor",
              order.tx_size, order.scan_type, c);
      // Mark this position as coded with the largest energy class
      token_cache[order.scan[c] as usize] = 5;
    }
  }
}

#[test]
fn test_odd_pivot_expansion_is_stable() {
  for pivot in (1..=255u16).step_by(2) {
    let pivot = pivot as Prob;
    let full = expand_model_to_full(&[17, 230, pivot]);
    assert_eq!(full[UNCONSTRAINED_NODES ..], modelcoefprobs_pareto8[(pivot as usize - 1) / 2]);

    // Re-expanding from the head of the full row gives the same row back
    let head = [full[0], full[1], full[2]];
    assert_eq!(expand_model_to_full(&head), full);
  }
}

proptest! {
  /// Adapting on an empty frame changes nothing, however often it's done
  #[test]
  fn adapt_with_no_counts_is_identity(
    prev in arbitrary_model(),
    count_sat in 1u32..=255,
    update_factor in 0u32..=255
  ) {
    let counts: CoeffCountsModel = Zeroable::zeroed();
    let eob_branch: EobBranchCounts = Zeroable::zeroed();

    let once = adapt_probs(&prev, &counts, &eob_branch, count_sat, update_factor);
    let twice = adapt_probs(&once, &counts, &eob_branch, count_sat, update_factor);
    prop_assert_eq!(once, prev);
    prop_assert_eq!(twice, prev);
  }

  /// Adapted probabilities always stay in the valid range
  #[test]
  fn adapted_probs_stay_in_range(
    prev in arbitrary_model(),
    counts in prop::collection::vec(0u32..500, BLOCK_TYPES * REF_TYPES * COEF_BANDS * PREV_COEF_CONTEXTS * 4)
  ) {
    let mut model_counts: CoeffCountsModel = Zeroable::zeroed();
    let mut eob_branch: EobBranchCounts = Zeroable::zeroed();
    let mut it = counts.iter().copied();
    for i in 0..BLOCK_TYPES {
      for j in 0..REF_TYPES {
        for k in 0..COEF_BANDS {
          for l in 0..PREV_COEF_CONTEXTS {
            for t in 0..UNCONSTRAINED_TOKENS {
              model_counts[i][j][k][l][t] = it.next().unwrap_or(0);
            }
            // Every EOB token implies an EOB check, and there can be more checks than that
            let eobs = model_counts[i][j][k][l][DCT_EOB_MODEL_TOKEN];
            eob_branch[i][j][k][l] = eobs + model_counts[i][j][k][l][Token::ONE_TOKEN as usize];
          }
        }
      }
    }

    let adapted = adapt_probs(&prev, &model_counts, &eob_branch, COEF_ADAPT_AFTER_KEY.count_sat,
                              COEF_ADAPT_AFTER_KEY.update_factor);
    for p in adapted.iter().flatten().flatten().flatten().flatten() {
      prop_assert!(*p >= 1);
    }
  }
}

#[test]
fn test_empty_4x4_block_only_touches_dc_context() {
  let defaults = [model_from_values(&[]); TX_SIZES];
  let mut model = CoefProbabilityModel::new(defaults);

  model.start_frame(FrameType::KEY_FRAME);
  let order = scan_tables().get(TxSize::TX_4X4, TxType::DCT_DCT);
  let qcoeff = [0i32; 16];
  model.counts_mut().accumulate_block(TxSize::TX_4X4, PlaneType::Y_WITH_DC, RefType::INTER,
                                      order, &qcoeff, 0, 0);
  let policy = model.end_frame();
  assert_eq!(policy, AdaptPolicy { count_sat: 24, update_factor: 112 });

  let y = PlaneType::Y_WITH_DC as usize;
  let inter = RefType::INTER as usize;
  for tx_size in TxSize::ALL {
    let probs = model.probs(tx_size);
    let before = &defaults[tx_size as usize];
    for i in 0..BLOCK_TYPES {
      for j in 0..REF_TYPES {
        for k in 0..COEF_BANDS {
          for l in 0..PREV_COEF_CONTEXTS {
            if tx_size == TxSize::TX_4X4 && (i, j, k, l) == (y, inter, 0, 0) {
              continue;
            }
            assert_eq!(probs[i][j][k][l], before[i][j][k][l], "{:?} [{}][{}][{}][{}]", tx_size, i, j, k, l);
          }
        }
      }
    }
  }

  // The one EOB seen in the DC context pulls its EOB probability upward
  // (factor 112 * 1 / 24 = 4): round2(128 * 252 + 255 * 4, 8) = 130
  let dc = model.probs(TxSize::TX_4X4)[y][inter][0][0];
  assert_eq!(dc, [130, 128, 128]);
}
