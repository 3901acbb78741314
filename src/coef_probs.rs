// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Coefficient token probabilities, and their adaptation from frame to frame
//
// Only the first UNCONSTRAINED_NODES probabilities of each context are stored
// and adapted. The full set used for coding is derived from those via the
// Pareto model table (see pareto.rs)

use bytemuck::allocation::zeroed_box;
use bytemuck::Zeroable;
use log::debug;

use crate::consts::*;
use crate::context::PREV_COEF_CONTEXTS;
use crate::enums::*;
use crate::pareto::*;
use crate::scan::ScanOrder;
use crate::tokens::{coefmodel_tree, token_for_value};
use crate::treeprob::*;

// Indexed by [block type][ref type][band][context][node or token]
pub type CoeffProbsModel = [[[[[Prob; UNCONSTRAINED_NODES]; PREV_COEF_CONTEXTS]; COEF_BANDS]; REF_TYPES]; BLOCK_TYPES];
pub type CoeffProbsFull = [[[[[Prob; ENTROPY_NODES]; PREV_COEF_CONTEXTS]; COEF_BANDS]; REF_TYPES]; BLOCK_TYPES];
pub type CoeffCounts = [[[[[u32; MAX_ENTROPY_TOKENS]; PREV_COEF_CONTEXTS]; COEF_BANDS]; REF_TYPES]; BLOCK_TYPES];
pub type CoeffCountsModel = [[[[[u32; UNCONSTRAINED_TOKENS]; PREV_COEF_CONTEXTS]; COEF_BANDS]; REF_TYPES]; BLOCK_TYPES];
pub type EobBranchCounts = [[[[u32; PREV_COEF_CONTEXTS]; COEF_BANDS]; REF_TYPES]; BLOCK_TYPES];

// Band 0 only holds the DC coefficient, whose context comes from the
// neighboring blocks and is limited to 0..=2
pub const BAND_0_CONTEXTS: usize = 3;

fn context_exists(band: usize, ctx: usize) -> bool {
  band > 0 || ctx < BAND_0_CONTEXTS
}

// Expand every context of one transform size to the full node set
pub fn model_to_full_table(model: &CoeffProbsModel) -> CoeffProbsFull {
  let mut full = [[[[[0; ENTROPY_NODES]; PREV_COEF_CONTEXTS]; COEF_BANDS]; REF_TYPES]; BLOCK_TYPES];
  for i in 0..BLOCK_TYPES {
    for j in 0..REF_TYPES {
      for k in 0..COEF_BANDS {
        for l in 0..PREV_COEF_CONTEXTS {
          full[i][j][k][l] = expand_model_to_full(&model[i][j][k][l]);
        }
      }
    }
  }
  return full;
}

// Merge a full token histogram into the model alphabet:
// ZERO and ONE stay put, everything from TWO upward counts as TWO
pub fn model_counts_from_full(full: &[u32; MAX_ENTROPY_TOKENS]) -> [u32; UNCONSTRAINED_TOKENS] {
  let two_or_more: u32 = full[Token::TWO_TOKEN as usize .. Token::DCT_EOB_TOKEN as usize].iter().sum();
  let mut model = [0; UNCONSTRAINED_TOKENS];
  model[Token::ZERO_TOKEN as usize] = full[Token::ZERO_TOKEN as usize];
  model[Token::ONE_TOKEN as usize] = full[Token::ONE_TOKEN as usize];
  model[Token::TWO_TOKEN as usize] = two_or_more;
  model[DCT_EOB_MODEL_TOKEN] = full[Token::DCT_EOB_TOKEN as usize];
  return model;
}

// How strongly one frame's statistics pull the probabilities
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdaptPolicy {
  // Branch count at which a context is considered fully trusted
  pub count_sat: u32,
  // Maximum weight (out of 256) given to the new statistics
  pub update_factor: u32,
}

pub const COEF_ADAPT_KEY: AdaptPolicy = AdaptPolicy { count_sat: 24, update_factor: 112 };
// Adapt faster on the frame right after a key frame
pub const COEF_ADAPT_AFTER_KEY: AdaptPolicy = AdaptPolicy { count_sat: 24, update_factor: 128 };
pub const COEF_ADAPT_NORMAL: AdaptPolicy = AdaptPolicy { count_sat: 24, update_factor: 112 };

impl AdaptPolicy {
  pub fn for_frame(frame_type: FrameType, last_frame_type: Option<FrameType>) -> AdaptPolicy {
    if frame_type == FrameType::KEY_FRAME {
      COEF_ADAPT_KEY
    } else if last_frame_type == Some(FrameType::KEY_FRAME) {
      COEF_ADAPT_AFTER_KEY
    } else {
      COEF_ADAPT_NORMAL
    }
  }
}

// Blend the probabilities in effect at the start of a frame with the
// statistics gathered while coding it
pub fn adapt_probs(prev: &CoeffProbsModel, counts: &CoeffCountsModel, eob_branch: &EobBranchCounts,
                   count_sat: u32, update_factor: u32) -> CoeffProbsModel {
  assert!(count_sat > 0);
  let mut new_probs = *prev;

  for i in 0..BLOCK_TYPES {
    for j in 0..REF_TYPES {
      for k in 0..COEF_BANDS {
        for l in 0..PREV_COEF_CONTEXTS {
          if !context_exists(k, l) {
            continue;
          }

          let mut probs = [0; UNCONSTRAINED_NODES];
          let mut branch_ct = [[0u32; 2]; UNCONSTRAINED_NODES];
          tree_probs_from_distribution(&coefmodel_tree, &mut probs, &mut branch_ct, &counts[i][j][k][l]);

          // The tree can't see positions where the EOB check was skipped (right
          // after a ZERO token), so the "not EOB" side of node 0 comes from the
          // number of times the check was actually made
          let checks = eob_branch[i][j][k][l];
          debug_assert!(checks >= branch_ct[0][0], "More EOB tokens than EOB checks");
          branch_ct[0][1] = checks.saturating_sub(branch_ct[0][0]);
          probs[0] = get_binary_prob(branch_ct[0][0], branch_ct[0][1]);

          for t in 0..UNCONSTRAINED_NODES {
            let count = (branch_ct[t][0] + branch_ct[t][1]).min(count_sat);
            let factor = update_factor * count / count_sat;
            new_probs[i][j][k][l][t] = weighted_prob(prev[i][j][k][l][t], probs[t], factor);
          }
        }
      }
    }
  }

  return new_probs;
}

// Statistics gathered over one frame, for every transform size
#[derive(Clone, Copy, Zeroable)]
pub struct FrameCounts {
  pub coef: [CoeffCounts; TX_SIZES],
  pub eob_branch: [EobBranchCounts; TX_SIZES],
}

impl FrameCounts {
  pub fn new() -> Box<Self> {
    zeroed_box()
  }

  pub fn reset(&mut self) {
    *self = Self::zeroed();
  }

  pub fn model_counts(&self, tx_size: TxSize) -> Box<CoeffCountsModel> {
    let full = &self.coef[tx_size as usize];
    let mut model: Box<CoeffCountsModel> = zeroed_box();
    for i in 0..BLOCK_TYPES {
      for j in 0..REF_TYPES {
        for k in 0..COEF_BANDS {
          for l in 0..PREV_COEF_CONTEXTS {
            if context_exists(k, l) {
              model[i][j][k][l] = model_counts_from_full(&full[i][j][k][l]);
            }
          }
        }
      }
    }
    return model;
  }

  // Count the tokens of one transform block, visiting it in the same order as
  // the tokenizer would.
  //
  // `qcoeff` holds the quantized coefficients in raster order, `eob` is one past
  // the last non-zero coefficient in scan order, and `initial_ctx` is the DC
  // context derived from the neighboring blocks
  pub fn accumulate_block(&mut self, tx_size: TxSize, plane_type: PlaneType, ref_type: RefType,
                          order: &ScanOrder, qcoeff: &[i32], eob: usize, initial_ctx: usize) {
    let num_coeffs = order.len();
    assert_eq!(order.tx_size, tx_size);
    assert!(qcoeff.len() >= num_coeffs);
    assert!(eob <= num_coeffs);
    assert!(initial_ctx < BAND_0_CONTEXTS);

    let counts = &mut self.coef[tx_size as usize][plane_type as usize][ref_type as usize];
    let eob_branch = &mut self.eob_branch[tx_size as usize][plane_type as usize][ref_type as usize];

    let mut token_cache = [0u8; 1024];
    let mut ctx = initial_ctx;
    let mut c = 0;
    loop {
      let band = order.band(c);
      let rc = order.scan[c] as usize;
      if c > 0 {
        ctx = order.context_for(&token_cache, c, num_coeffs);
      }

      let token = if c < eob {
        token_for_value(qcoeff[rc].unsigned_abs()).0
      } else {
        Token::DCT_EOB_TOKEN
      };

      counts[band][ctx][token as usize] += 1;
      // No end-of-block can follow a ZERO token, so that check is skipped
      let skip_eob_check = c > 0 && token_cache[order.scan[c - 1] as usize] == 0;
      if !skip_eob_check {
        eob_branch[band][ctx] += 1;
      }
      token_cache[rc] = pt_energy_class[token as usize];

      c += 1;
      if c > eob || c >= num_coeffs {
        break;
      }
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelState {
  // Freshly reset to the default probabilities
  Default,
  // Counting the tokens of the current frame
  Accumulating,
  // The last frame's statistics have been folded in
  Adapted,
}

// Per-stream coefficient probability state.
//
// The model-form probabilities are the only authoritative copy. The full
// form is rebuilt on demand and thrown away whenever they change.
pub struct CoefProbabilityModel {
  defaults: Box<[CoeffProbsModel; TX_SIZES]>,
  probs: Box<[CoeffProbsModel; TX_SIZES]>,
  counts: Box<FrameCounts>,
  full_cache: [Option<Box<CoeffProbsFull>>; TX_SIZES],
  state: ModelState,
  frame_type: FrameType,
  last_frame_type: Option<FrameType>,
}

impl CoefProbabilityModel {
  // `defaults` are the probabilities every key frame starts from
  pub fn new(defaults: [CoeffProbsModel; TX_SIZES]) -> Self {
    Self {
      defaults: Box::new(defaults),
      probs: Box::new(defaults),
      counts: FrameCounts::new(),
      full_cache: [None, None, None, None],
      state: ModelState::Default,
      frame_type: FrameType::KEY_FRAME,
      last_frame_type: None
    }
  }

  pub fn state(&self) -> ModelState {
    self.state
  }

  pub fn probs(&self, tx_size: TxSize) -> &CoeffProbsModel {
    &self.probs[tx_size as usize]
  }

  pub fn full_probs(&mut self, tx_size: TxSize) -> &CoeffProbsFull {
    let probs = &self.probs[tx_size as usize];
    self.full_cache[tx_size as usize].get_or_insert_with(|| Box::new(model_to_full_table(probs)))
  }

  fn invalidate_full(&mut self) {
    self.full_cache = [None, None, None, None];
  }

  pub fn start_frame(&mut self, frame_type: FrameType) {
    assert!(self.state != ModelState::Accumulating, "start_frame() called twice without end_frame()");
    if frame_type == FrameType::KEY_FRAME {
      debug!("Key frame: resetting coefficient probabilities to defaults");
      *self.probs = *self.defaults;
      self.invalidate_full();
    }
    self.counts.reset();
    self.frame_type = frame_type;
    self.state = ModelState::Accumulating;
  }

  pub fn counts_mut(&mut self) -> &mut FrameCounts {
    assert_eq!(self.state, ModelState::Accumulating, "Counts can only be updated during a frame");
    &mut self.counts
  }

  // Fold this frame's counts into the probabilities. The result becomes the
  // baseline for the next frame
  pub fn end_frame(&mut self) -> AdaptPolicy {
    assert_eq!(self.state, ModelState::Accumulating, "end_frame() called outside of a frame");
    let policy = AdaptPolicy::for_frame(self.frame_type, self.last_frame_type);
    debug!("Adapting coefficient probabilities after {:?} (count_sat {}, update_factor {})",
           self.frame_type, policy.count_sat, policy.update_factor);

    for tx_size in TxSize::ALL {
      let t = tx_size as usize;
      let model_counts = self.counts.model_counts(tx_size);
      self.probs[t] = adapt_probs(&self.probs[t], &model_counts, &self.counts.eob_branch[t],
                                  policy.count_sat, policy.update_factor);
    }

    self.invalidate_full();
    self.last_frame_type = Some(self.frame_type);
    self.state = ModelState::Adapted;
    return policy;
  }
}
