// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Per-coefficient probability context

use crate::scan::{Neighbors, ScanOrder};

pub const PREV_COEF_CONTEXTS: usize = 6;

// Context for coding the coefficient at scan position `c`.
//
// `token_cache` is indexed by raster position and holds the energy class of
// every coefficient coded so far in this block. The neighbor map only ever
// points at earlier scan positions, so all entries read here are already set.
//
// `eob` is the position at which an end-of-block is being considered; a
// coefficient there always uses context 0.
pub fn context_for(scan: &[u16], neighbors: &[Neighbors], token_cache: &[u8], c: usize, eob: usize) -> usize {
  if c == eob {
    return 0;
  }

  let energy = |n: u16| token_cache[scan[n as usize] as usize] as usize;
  match neighbors[c] {
    [Some(a), Some(b)] => (1 + energy(a) + energy(b)) >> 1,
    [Some(a), None] => energy(a),
    // Only DC has no neighbors, and its context is taken from the surrounding
    // blocks by the caller
    _ => {
      debug_assert!(c == 0, "Scan position {} has no context neighbors", c);
      0
    }
  }
}

impl ScanOrder {
  pub fn context_for(&self, token_cache: &[u8], c: usize, eob: usize) -> usize {
    context_for(self.scan, &self.neighbors, token_cache, c, eob)
  }
}
