// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Bit-exact building blocks for video reconstruction: compound sub-pixel
// interpolation, and adaptive coefficient token probabilities

// Disable name styling checks, so that we can name things in line with the
// codec specifications
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]

pub mod array2d;
pub mod coef_probs;
pub mod consts;
pub mod context;
pub mod convolve;
pub mod enums;
pub mod error;
pub mod filters;
pub mod frame;
pub mod logger;
pub mod pareto;
pub mod recon;
pub mod scan;
pub mod tokens;
pub mod treeprob;
pub mod util;
pub mod y4m;

pub use crate::error::{Error, Result};
