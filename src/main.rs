// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::{debug, info};

use tinyrecon::consts::quant_dist_lookup_table;
use tinyrecon::enums::InterpFilter;
use tinyrecon::frame::{Frame, Plane};
use tinyrecon::logger::ColorLogger;
use tinyrecon::recon::{predict_compound, predict_single, MotionVector};
use tinyrecon::util::round2;
use tinyrecon::y4m::{Y4MReader, Y4MWriter};
use tinyrecon::{Error, Result};

// Luma is predicted in 8x8 blocks, chroma in 4x4 blocks
const LUMA_BLOCK_SIZE: usize = 8;
const CHROMA_BLOCK_SIZE: usize = 4;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FilterArg {
  Regular,
  Smooth,
  Sharp,
  Bilinear,
}

impl From<FilterArg> for InterpFilter {
  fn from(arg: FilterArg) -> InterpFilter {
    match arg {
      FilterArg::Regular => InterpFilter::EIGHTTAP_REGULAR,
      FilterArg::Smooth => InterpFilter::EIGHTTAP_SMOOTH,
      FilterArg::Sharp => InterpFilter::EIGHTTAP_SHARP,
      FilterArg::Bilinear => InterpFilter::BILINEAR,
    }
  }
}

#[derive(Parser)]
#[command(override_usage = "tinyrecon <INPUT> [-o <OUTPUT>] --mv-row <N> --mv-col <N> [--filter <FILTER>] \
                            [--second-mv-row <N> --second-mv-col <N> [--weights <INDEX>]]")]
struct CommandlineArgs {
  /// Input file, must end in .y4m. The first frame is used as the reference
  input: PathBuf,
  /// Output file [default: <input>.pred.y4m]
  #[arg(short, long)]
  output: Option<PathBuf>,
  /// Vertical motion, in 1/16 luma pixels
  #[arg(long, allow_hyphen_values = true)]
  mv_row: i32,
  /// Horizontal motion, in 1/16 luma pixels
  #[arg(long, allow_hyphen_values = true)]
  mv_col: i32,
  /// Interpolation filter
  #[arg(long, value_enum, default_value_t = FilterArg::Regular)]
  filter: FilterArg,
  /// Vertical motion of a second prediction. Enables compound prediction
  #[arg(long, allow_hyphen_values = true, requires = "second_mv_col")]
  second_mv_row: Option<i32>,
  /// Horizontal motion of a second prediction
  #[arg(long, allow_hyphen_values = true, requires = "second_mv_row")]
  second_mv_col: Option<i32>,
  /// Blend the two predictions with distance weights instead of averaging.
  /// Valid range is 0-3; larger values weight the first prediction more
  #[arg(long, requires = "second_mv_row")]
  weights: Option<usize>,
  /// Don't print anything except errors
  #[arg(short, long)]
  quiet: bool,
  /// Print more detail (repeat for even more)
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

// Motion on a 4:2:0 chroma plane covers half the distance, at the same precision
fn chroma_mv(mv: MotionVector) -> MotionVector {
  MotionVector::new(round2(mv.row, 1), round2(mv.col, 1))
}

fn check_extension(path: &Path, what: &str) -> Result<()> {
  match path.extension().and_then(|ext| ext.to_str()) {
    Some("y4m") => Ok(()),
    _ => Err(Error::InvalidArgument(format!("{} file {} must end in .y4m", what, path.display())))
  }
}

fn predict_plane(reference: &Plane, out: &mut Plane, block_size: usize, filter: InterpFilter,
                 mv0: MotionVector, second: Option<MotionVector>, weights: Option<(u16, u16)>) {
  for row in (0 .. reference.height()).step_by(block_size) {
    for col in (0 .. reference.width()).step_by(block_size) {
      let mut dst = out.block_mut(row, col, block_size, block_size);
      match second {
        None => predict_single(reference, row, col, block_size, block_size, mv0, filter, &mut dst),
        Some(mv1) => predict_compound(reference, mv0, reference, mv1, row, col, block_size, block_size,
                                      filter, weights, &mut dst),
      }
    }
  }
  out.extend_borders();
}

fn run(args: CommandlineArgs) -> Result<()> {
  let input_path = args.input;
  check_extension(&input_path, "Input")?;
  let output_path = args.output.unwrap_or_else(|| input_path.with_extension("pred.y4m"));
  check_extension(&output_path, "Output")?;

  let filter = InterpFilter::from(args.filter);
  let mv0 = MotionVector::new(args.mv_row, args.mv_col);
  let second = match (args.second_mv_row, args.second_mv_col) {
    (Some(row), Some(col)) => Some(MotionVector::new(row, col)),
    _ => None,
  };
  let weights = match args.weights {
    None => None,
    Some(index) if index < quant_dist_lookup_table.len() => Some(quant_dist_lookup_table[index]),
    Some(index) => {
      return Err(Error::InvalidArgument(format!("--weights must be in the range 0-{}, got {}",
                                                quant_dist_lookup_table.len() - 1, index)));
    }
  };

  let mut y4m = Y4MReader::new(BufReader::new(File::open(&input_path)?))?;
  let source = y4m.read_frame()?;
  let crop_width = source.y().crop_width();
  let crop_height = source.y().crop_height();
  info!("Read {}x{} frame from {}", crop_width, crop_height, input_path.display());

  match second {
    None => info!("Single prediction with {:?}, mv ({}, {})", filter, mv0.row, mv0.col),
    Some(mv1) => info!("Compound prediction with {:?}, mvs ({}, {}) and ({}, {}), weights {:?}",
                       filter, mv0.row, mv0.col, mv1.row, mv1.col, weights),
  }

  let mut output = Frame::new(crop_height, crop_width);
  for plane in 0..3 {
    let (block_size, mv0, second) = if plane == 0 {
      (LUMA_BLOCK_SIZE, mv0, second)
    } else {
      (CHROMA_BLOCK_SIZE, chroma_mv(mv0), second.map(chroma_mv))
    };
    debug!("Plane {}: {}x{} blocks", plane, block_size, block_size);
    predict_plane(source.plane(plane), output.plane_mut(plane), block_size, filter, mv0, second, weights);
  }

  let mut writer = Y4MWriter::new(BufWriter::new(File::create(&output_path)?), crop_width, crop_height)?;
  writer.write_frame(&output)?;
  writer.into_inner().flush()?;
  info!("Wrote prediction to {}", output_path.display());
  Ok(())
}

fn main() {
  let args = CommandlineArgs::parse();

  if let Err(e) = ColorLogger::new(args.quiet, args.verbose).init() {
    eprintln!("Warning: could not set up logging: {}", e);
  }

  if let Err(e) = run(args) {
    eprintln!("{} {}", "Error:".red().bold(), e);
    exit(2);
  }
}
