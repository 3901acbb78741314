// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use std::io::prelude::*;

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::frame::Frame;

const Y4M_FILE_MAGIC: &str = "YUV4MPEG2 ";
const Y4M_FRAME_MAGIC: &str = "FRAME";

pub struct Y4MReader<R> {
  inner: R,
  width: usize,
  height: usize
}

pub struct Y4MWriter<W> {
  inner: W,
  width: usize,
  height: usize
}

fn is_whitespace(byte: u8) -> bool {
  matches!(byte, b' ' | b'\t' | b'\n')
}

// Parse a decimal number, returning it along with the byte which ended it
fn read_decimal<R: Read>(r: &mut R) -> Result<(usize, u8)> {
  let mut v: usize = 0;
  loop {
    let byte = r.read_u8().map_err(Error::from_header_io)?;
    match byte {
      b'0' ..= b'9' => {
        v = v.checked_mul(10)
             .and_then(|v| v.checked_add((byte - b'0') as usize))
             .ok_or(Error::InvalidFileHeader)?;
      },
      _ => {
        return Ok((v, byte));
      }
    }
  }
}

// Read a parameter's value up to the next whitespace character.
// Returns the value and the whitespace character found
fn read_word<R: Read>(r: &mut R) -> Result<(String, u8)> {
  let mut word = Vec::new();
  loop {
    let byte = r.read_u8().map_err(Error::from_header_io)?;
    if is_whitespace(byte) {
      return Ok((String::from_utf8_lossy(&word).into_owned(), byte));
    }
    word.push(byte);
  }
}

impl<R: Read> Y4MReader<R> {
  pub fn new(mut inner: R) -> Result<Self> {
    // Read header line
    let mut file_magic = [0u8; 10];
    inner.read_exact(&mut file_magic).map_err(Error::from_header_io)?;
    if file_magic != Y4M_FILE_MAGIC.as_bytes() {
      return Err(Error::InvalidFileHeader);
    }

    let mut width = 0;
    let mut height = 0;

    // Parse parameter line
    loop {
      let tag = inner.read_u8().map_err(Error::from_header_io)?;
      let terminator = match tag {
        b'\n' => break,
        b' ' | b'\t' => continue,
        b'W' | b'H' => {
          let (value, terminator) = read_decimal(&mut inner)?;
          if !is_whitespace(terminator) {
            return Err(Error::UnexpectedByte(terminator));
          }
          if tag == b'W' { width = value; } else { height = value; }
          terminator
        },
        b'C' => {
          let (colorspace, terminator) = read_word(&mut inner)?;
          if !colorspace.starts_with("420") {
            return Err(Error::UnsupportedColorspace(colorspace));
          }
          terminator
        },
        _ => {
          // Frame rate, aspect ratio, etc. don't matter here
          read_word(&mut inner)?.1
        }
      };
      if terminator == b'\n' {
        break;
      }
    }

    if width == 0 || height == 0 {
      // Didn't find a width/height parameter, or it was zero
      return Err(Error::InvalidSize { width: width, height: height });
    }

    Ok(Y4MReader {
      inner: inner,
      width: width,
      height: height
    })
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn read_frame(&mut self) -> Result<Box<Frame>> {
    // Frame lines can carry parameters, but none of them matter here.
    // So just check the magic number and skip the rest of the line
    let mut frame_magic = [0u8; 5];
    self.inner.read_exact(&mut frame_magic)?;
    if frame_magic != Y4M_FRAME_MAGIC.as_bytes() {
      return Err(Error::InvalidFrameHeader);
    }

    while self.inner.read_u8()? != b'\n' {}

    let mut frame = Box::new(Frame::new(self.height, self.width));
    for plane in 0..3 {
      frame.plane_mut(plane).read_from(&mut self.inner)?;
    }
    Ok(frame)
  }
}

impl<W: Write> Y4MWriter<W> {
  pub fn new(mut inner: W, width: usize, height: usize) -> Result<Self> {
    inner.write_all(Y4M_FILE_MAGIC.as_bytes())?;
    write!(inner, "W{} H{} C420jpeg\n", width, height)?;

    Ok(Y4MWriter {
      inner: inner,
      width: width,
      height: height
    })
  }

  pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
    assert!(frame.y().crop_width() == self.width);
    assert!(frame.y().crop_height() == self.height);

    self.inner.write_all(Y4M_FRAME_MAGIC.as_bytes())?;
    self.inner.write_u8(b'\n')?;

    for plane in 0..3 {
      frame.plane(plane).write_to(&mut self.inner)?;
    }
    Ok(())
  }

  pub fn into_inner(self) -> W {
    self.inner
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_roundtrip_through_memory() {
    let mut frame = Frame::new(6, 10);
    frame.y_mut().fill_with(|i, j| (i * 10 + j) as u8);
    frame.u_mut().fill_with(|_, _| 100);
    frame.v_mut().fill_with(|_, _| 200);

    let mut writer = Y4MWriter::new(Vec::new(), 10, 6).unwrap();
    writer.write_frame(&frame).unwrap();
    let bytes = writer.into_inner();
    assert!(bytes.starts_with(b"YUV4MPEG2 W10 H6 C420jpeg\nFRAME\n"));

    let mut reader = Y4MReader::new(&bytes[..]).unwrap();
    assert_eq!((reader.width(), reader.height()), (10, 6));
    let read_back = reader.read_frame().unwrap();
    assert_eq!(read_back.y().at(5, 9), 59);
    assert_eq!(read_back.u().at(2, 4), 100);
    assert_eq!(read_back.v().at(0, 0), 200);
  }

  #[test]
  fn test_header_errors() {
    assert!(matches!(Y4MReader::new(&b"NOTAY4M..."[..]), Err(Error::InvalidFileHeader)));
    assert!(matches!(Y4MReader::new(&b"YUV4MPEG2 W8 F30:1\n"[..]),
                     Err(Error::InvalidSize { width: 8, height: 0 })));
    assert!(matches!(Y4MReader::new(&b"YUV4MPEG2 W8 H8 C444\n"[..]),
                     Err(Error::UnsupportedColorspace(_))));
    assert!(matches!(Y4MReader::new(&b"YUV4MPEG2 W8x H8\n"[..]), Err(Error::UnexpectedByte(b'x'))));
    assert!(matches!(Y4MReader::new(&b"YUV4MPEG2 W8"[..]), Err(Error::InvalidFileHeader)));
  }
}
