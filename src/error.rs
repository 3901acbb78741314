// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Errors from the file-facing parts of the crate.
// The filters and probability code have no failure modes of their own;
// misuse there is caught by assertions.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  #[error("Invalid Y4M file header")]
  InvalidFileHeader,

  #[error("Invalid Y4M frame header")]
  InvalidFrameHeader,

  #[error("Unexpected byte {0:#04x} in Y4M header")]
  UnexpectedByte(u8),

  #[error("Invalid Y4M size {width}x{height}")]
  InvalidSize {
    width: usize,
    height: usize,
  },

  #[error("Unsupported Y4M colorspace {0} (only 8-bit 4:2:0 is supported)")]
  UnsupportedColorspace(String),

  #[error("Invalid argument: {0}")]
  InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
  // Running out of input mid-header means the header was cut short
  pub(crate) fn from_header_io(err: io::Error) -> Self {
    if err.kind() == io::ErrorKind::UnexpectedEof {
      Error::InvalidFileHeader
    } else {
      Error::Io(err)
    }
  }
}
