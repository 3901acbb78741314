// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Minimal stderr logger for the command line tool

use std::io::{self, Write};

use colored::Colorize;
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

#[derive(Clone, Copy, Debug)]
pub struct ColorLogger {
  max_level: LevelFilter,
}

impl ColorLogger {
  pub fn new(quiet: bool, verbose: u8) -> Self {
    let max_level = if quiet {
      LevelFilter::Off
    } else {
      match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
      }
    };
    Self {
      max_level: max_level
    }
  }

  pub fn init(self) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(self))?;
    log::set_max_level(self.max_level);
    Ok(())
  }
}

impl log::Log for ColorLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= self.max_level
  }

  fn log(&self, record: &Record) {
    if !self.enabled(record.metadata()) {
      return;
    }
    match record.level() {
      Level::Error => eprintln!("{} {}", "[ERROR]".red().bold(), record.args().to_string().red().bold()),
      Level::Warn => eprintln!("{} {}", "[WARN]".yellow().bold(), record.args().to_string().yellow()),
      level => eprintln!("[{}] {}", level.to_string().blue(), record.args()),
    }
  }

  fn flush(&self) {
    // Nothing useful to do if stderr can't be flushed
    let _ = io::stderr().flush();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use log::Log;

  fn enabled(logger: &ColorLogger, level: Level) -> bool {
    logger.enabled(&Metadata::builder().level(level).build())
  }

  #[test]
  fn test_verbosity_levels() {
    let quiet = ColorLogger::new(true, 2);
    assert!(!enabled(&quiet, Level::Error));

    let default = ColorLogger::new(false, 0);
    assert!(enabled(&default, Level::Info));
    assert!(!enabled(&default, Level::Debug));

    let debug = ColorLogger::new(false, 1);
    assert!(enabled(&debug, Level::Debug));
    assert!(!enabled(&debug, Level::Trace));

    assert!(enabled(&ColorLogger::new(false, 5), Level::Trace));
  }

  #[test]
  fn test_init_installs_once() {
    // Only the first logger in a process can be installed
    let _ = ColorLogger::new(false, 0).init();
    assert!(ColorLogger::new(false, 0).init().is_err());
  }
}
