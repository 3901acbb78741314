// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Coefficient scan orders and their context neighbor maps

use std::sync::OnceLock;

use log::trace;

use crate::consts::*;
use crate::enums::*;

pub const MAX_NEIGHBORS: usize = 2;

// Scan positions (not raster positions) of the already-coded coefficients
// which form the context of a given scan position
pub type Neighbors = [Option<u16>; MAX_NEIGHBORS];

#[derive(Clone, Debug)]
pub struct ScanOrder {
  pub tx_size: TxSize,
  pub scan_type: ScanType,
  // scan position -> raster position
  pub scan: &'static [u16],
  // raster position -> scan position
  pub iscan: Box<[u16]>,
  pub neighbors: Box<[Neighbors]>,
}

impl ScanOrder {
  pub fn new(tx_size: TxSize, scan_type: ScanType, scan: &'static [u16]) -> Self {
    let n = tx_size.width();
    assert_eq!(scan.len(), tx_size.num_coeffs());

    let mut iscan = vec![0u16; n * n].into_boxed_slice();
    for (pos, &rc) in scan.iter().enumerate() {
      iscan[rc as usize] = pos as u16;
    }

    let mut neighbors = vec![[None; MAX_NEIGHBORS]; n * n].into_boxed_slice();
    for (pos, &rc) in scan.iter().enumerate() {
      let i = rc as usize / n;
      let j = rc as usize % n;
      let above = if i > 0 { Some(iscan[(i - 1) * n + j]) } else { None };
      let left = if j > 0 { Some(iscan[i * n + j - 1]) } else { None };

      neighbors[pos] = match (above, left) {
        // Column scans go with a 1D ADST vertically, where energy decays quickly;
        // the coefficient above (along the DCT direction) is the better predictor.
        // Row scans are the transpose of that
        (Some(a), Some(b)) => match scan_type {
          ScanType::COL => [Some(a), None],
          ScanType::ROW => [Some(b), None],
          ScanType::DEFAULT => [Some(a), Some(b)],
        },
        (Some(a), None) => [Some(a), None],
        (None, Some(b)) => [Some(b), None],
        // DC: its context comes from the neighboring blocks instead
        (None, None) => [None, None],
      };
    }

    trace!("Built {:?} scan neighbors for {:?}", scan_type, tx_size);

    Self {
      tx_size: tx_size,
      scan_type: scan_type,
      scan: scan,
      iscan: iscan,
      neighbors: neighbors
    }
  }

  pub fn len(&self) -> usize {
    self.scan.len()
  }

  // Coefficient band of a scan position
  pub fn band(&self, pos: usize) -> usize {
    let bands = if self.tx_size == TxSize::TX_4X4 { &coefband_trans_4x4 } else { &coefband_trans_8x8plus };
    bands[pos.min(MAXBAND_INDEX)] as usize
  }
}

// All scan orders, built once and then only read
#[derive(Debug)]
pub struct ScanTables {
  // Indexed by [tx size][scan type]. 32x32 only has a default scan, which is
  // repeated in all three slots
  orders: Vec<[ScanOrder; 3]>,
}

impl ScanTables {
  pub fn new() -> Self {
    let table = |tx_size: TxSize, default: &'static [u16], col: &'static [u16], row: &'static [u16]| [
      ScanOrder::new(tx_size, ScanType::DEFAULT, default),
      ScanOrder::new(tx_size, ScanType::COL, col),
      ScanOrder::new(tx_size, ScanType::ROW, row),
    ];

    let default_32x32 = ScanOrder::new(TxSize::TX_32X32, ScanType::DEFAULT, &default_scan_32x32);

    Self {
      orders: vec![
        table(TxSize::TX_4X4, &default_scan_4x4[..], &col_scan_4x4[..], &row_scan_4x4[..]),
        table(TxSize::TX_8X8, &default_scan_8x8[..], &col_scan_8x8[..], &row_scan_8x8[..]),
        table(TxSize::TX_16X16, &default_scan_16x16[..], &col_scan_16x16[..], &row_scan_16x16[..]),
        [default_32x32.clone(), default_32x32.clone(), default_32x32],
      ]
    }
  }

  pub fn scan_type(tx_size: TxSize, tx_type: TxType) -> ScanType {
    if tx_size == TxSize::TX_32X32 {
      return ScanType::DEFAULT;
    }
    match tx_type {
      TxType::ADST_DCT => ScanType::ROW,
      TxType::DCT_ADST => ScanType::COL,
      TxType::DCT_DCT | TxType::ADST_ADST => ScanType::DEFAULT,
    }
  }

  pub fn get(&self, tx_size: TxSize, tx_type: TxType) -> &ScanOrder {
    self.get_by_type(tx_size, Self::scan_type(tx_size, tx_type))
  }

  pub fn get_by_type(&self, tx_size: TxSize, scan_type: ScanType) -> &ScanOrder {
    &self.orders[tx_size as usize][scan_type as usize]
  }

  // Every distinct scan order
  pub fn iter(&self) -> impl Iterator<Item = &ScanOrder> {
    self.orders.iter().flat_map(|orders| {
      let distinct = if orders[0].tx_size == TxSize::TX_32X32 { 1 } else { 3 };
      orders[..distinct].iter()
    })
  }
}

// Process-wide copy of the scan tables, for callers which do not want to
// carry a ScanTables around
pub fn scan_tables() -> &'static ScanTables {
  static TABLES: OnceLock<ScanTables> = OnceLock::new();
  TABLES.get_or_init(ScanTables::new)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_scans_are_permutations() {
    let tables = ScanTables::new();
    assert_eq!(tables.iter().count(), 10);
    for order in tables.iter() {
      let mut seen = vec![false; order.len()];
      for &rc in order.scan {
        assert!(!seen[rc as usize]);
        seen[rc as usize] = true;
      }
      assert_eq!(order.scan[0], 0);
      for pos in 0..order.len() {
        assert_eq!(order.iscan[order.scan[pos] as usize] as usize, pos);
      }
    }
  }

  #[test]
  fn test_neighbor_rules() {
    let tables = ScanTables::new();
    for order in tables.iter() {
      let n = order.tx_size.width();
      assert_eq!(order.neighbors[0], [None, None]);
      for pos in 1..order.len() {
        let rc = order.scan[pos] as usize;
        let (i, j) = (rc / n, rc % n);
        let first = order.neighbors[pos][0].map(|p| order.scan[p as usize] as usize);
        let second = order.neighbors[pos][1].map(|p| order.scan[p as usize] as usize);
        if i > 0 && j > 0 {
          match order.scan_type {
            ScanType::COL => assert_eq!((first, second), (Some(rc - n), None)),
            ScanType::ROW => assert_eq!((first, second), (Some(rc - 1), None)),
            ScanType::DEFAULT => assert_eq!((first, second), (Some(rc - n), Some(rc - 1))),
          }
        } else if i > 0 {
          assert_eq!((first, second), (Some(rc - n), None));
        } else {
          assert_eq!((first, second), (Some(rc - 1), None));
        }
      }
    }
  }

  #[test]
  fn test_scan_selection() {
    let tables = scan_tables();
    assert_eq!(tables.get(TxSize::TX_4X4, TxType::ADST_DCT).scan_type, ScanType::ROW);
    assert_eq!(tables.get(TxSize::TX_8X8, TxType::DCT_ADST).scan_type, ScanType::COL);
    assert_eq!(tables.get(TxSize::TX_16X16, TxType::ADST_ADST).scan_type, ScanType::DEFAULT);
    assert_eq!(tables.get(TxSize::TX_32X32, TxType::ADST_DCT).scan_type, ScanType::DEFAULT);
    assert_eq!(tables.get(TxSize::TX_8X8, TxType::DCT_DCT).scan, &default_scan_8x8[..]);
  }

  #[test]
  fn test_bands() {
    let tables = scan_tables();
    let order = tables.get(TxSize::TX_4X4, TxType::DCT_DCT);
    assert_eq!(order.band(0), 0);
    assert_eq!(order.band(15), 5);
    let order = tables.get(TxSize::TX_32X32, TxType::DCT_DCT);
    assert_eq!(order.band(20), 4);
    assert_eq!(order.band(1000), 5);
  }
}
