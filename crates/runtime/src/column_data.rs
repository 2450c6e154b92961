// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Opens and reads column data files (spec.md §4.1, §6). Grounded on
//! `runtime/column_data.{h,cc}` in the reference implementation: one struct
//! per fixed-width element type plus a variable-width TEXT layout, each with
//! `Open`/`Size`/`Get`. Here the per-type structs become variants of a single
//! [`ColumnData`] enum so callers can match on `catalog::TypeId` once and get
//! an exhaustiveness check for free.

use std::path::Path;

use kepler_catalog::TypeId;
use kepler_common::{KeplerError, Result};

use crate::aligned::AlignedBytes;

/// A value read out of a column, still tagged by its storage type. Distinct
/// from any expression-evaluation `Value` type -- this is purely "what did
/// the column file contain at this tuple id", with no notion of `NULL` (null
/// bitmaps are a separate file, read via [`crate::null_bitmap::NullBitmap`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnValue<'a> {
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Real(f64),
    /// DATE is stored as i64 Unix-ms UTC (spec.md §3).
    Date(i64),
    Text(&'a str),
    Boolean(bool),
    /// The dictionary id; resolving it to a string goes through
    /// `EnumDictionary` (spec.md §6).
    Enum(i32),
}

/// `{cardinality: u32, [{length: u32, offset: u32}] * cardinality}` followed
/// by packed, null-terminated strings (spec.md §6). `offset` is absolute
/// from the start of the file, matching the reference implementation's
/// `StringMetadata` layout exactly so loader-written files need no
/// translation.
struct TextLayout {
    cardinality: u32,
}

impl TextLayout {
    const HEADER_LEN: usize = 4;
    const SLOT_LEN: usize = 8;

    fn parse(bytes: &[u8], path: &Path) -> Result<Self> {
        if bytes.len() < Self::HEADER_LEN {
            return Err(KeplerError::corrupt(format!(
                "{}: file too short for TEXT header",
                path.display()
            )));
        }
        let cardinality = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let min_len = Self::HEADER_LEN + cardinality as usize * Self::SLOT_LEN;
        if bytes.len() < min_len {
            return Err(KeplerError::corrupt(format!(
                "{}: cardinality {cardinality} inconsistent with file length {}",
                path.display(),
                bytes.len()
            )));
        }
        Ok(TextLayout { cardinality })
    }

    fn slot(&self, bytes: &[u8], idx: u32) -> (u32, u32) {
        let base = Self::HEADER_LEN + idx as usize * Self::SLOT_LEN;
        let length = u32::from_le_bytes(bytes[base..base + 4].try_into().unwrap());
        let offset = u32::from_le_bytes(bytes[base + 4..base + 8].try_into().unwrap());
        (length, offset)
    }
}

enum Storage {
    SmallInt(AlignedBytes),
    Int(AlignedBytes),
    BigInt(AlignedBytes),
    Real(AlignedBytes),
    Date(AlignedBytes),
    Enum(AlignedBytes),
    Boolean(AlignedBytes),
    Text { bytes: AlignedBytes, layout: TextLayout },
}

/// An opened column file. `Size`/`Get` are O(1) per spec.md §4.1.
pub struct ColumnData {
    storage: Storage,
    path: String,
}

impl ColumnData {
    pub fn open(path: impl AsRef<Path>, type_id: TypeId) -> Result<Self> {
        let path_ref = path.as_ref();
        let bytes = AlignedBytes::open(path_ref)?;
        let storage = match type_id {
            TypeId::SmallInt => {
                Self::check_fixed_width(&bytes, 2, path_ref)?;
                Storage::SmallInt(bytes)
            }
            TypeId::Int | TypeId::Enum => {
                Self::check_fixed_width(&bytes, 4, path_ref)?;
                if type_id == TypeId::Enum {
                    Storage::Enum(bytes)
                } else {
                    Storage::Int(bytes)
                }
            }
            TypeId::BigInt | TypeId::Date => {
                Self::check_fixed_width(&bytes, 8, path_ref)?;
                if type_id == TypeId::Date {
                    Storage::Date(bytes)
                } else {
                    Storage::BigInt(bytes)
                }
            }
            TypeId::Real => {
                Self::check_fixed_width(&bytes, 8, path_ref)?;
                Storage::Real(bytes)
            }
            TypeId::Boolean => {
                Self::check_fixed_width(&bytes, 1, path_ref)?;
                Storage::Boolean(bytes)
            }
            TypeId::Text => {
                let layout = TextLayout::parse(bytes.as_slice(), path_ref)?;
                Storage::Text { bytes, layout }
            }
        };
        Ok(ColumnData {
            storage,
            path: path_ref.display().to_string(),
        })
    }

    fn check_fixed_width(bytes: &AlignedBytes, width: usize, path: &Path) -> Result<()> {
        if bytes.len() % width != 0 {
            return Err(KeplerError::corrupt(format!(
                "{}: length {} is not a multiple of element width {width}",
                path.display(),
                bytes.len()
            )));
        }
        Ok(())
    }

    /// Number of logical elements (spec.md §4.1).
    pub fn size(&self) -> u32 {
        match &self.storage {
            Storage::SmallInt(b) => (b.len() / 2) as u32,
            Storage::Int(b) | Storage::Enum(b) => (b.len() / 4) as u32,
            Storage::BigInt(b) | Storage::Date(b) => (b.len() / 8) as u32,
            Storage::Real(b) => (b.len() / 8) as u32,
            Storage::Boolean(b) => b.len() as u32,
            Storage::Text { layout, .. } => layout.cardinality,
        }
    }

    fn bounds_check(&self, idx: u32) -> Result<()> {
        if idx >= self.size() {
            return Err(KeplerError::corrupt(format!(
                "{}: tuple id {idx} out of range (cardinality {})",
                self.path,
                self.size()
            )));
        }
        Ok(())
    }

    /// Reads the element at tuple id `idx`. O(1) (spec.md §4.1).
    pub fn get(&self, idx: u32) -> Result<ColumnValue<'_>> {
        self.bounds_check(idx)?;
        let i = idx as usize;
        Ok(match &self.storage {
            Storage::SmallInt(b) => ColumnValue::SmallInt(b.as_slice_of::<i16>()[i]),
            Storage::Int(b) => ColumnValue::Int(b.as_slice_of::<i32>()[i]),
            Storage::BigInt(b) => ColumnValue::BigInt(b.as_slice_of::<i64>()[i]),
            Storage::Real(b) => ColumnValue::Real(b.as_slice_of::<f64>()[i]),
            Storage::Date(b) => ColumnValue::Date(b.as_slice_of::<i64>()[i]),
            Storage::Enum(b) => ColumnValue::Enum(b.as_slice_of::<i32>()[i]),
            Storage::Boolean(b) => ColumnValue::Boolean(b.as_slice()[i] != 0),
            Storage::Text { bytes, layout } => {
                let (length, offset) = layout.slot(bytes.as_slice(), idx);
                let start = offset as usize;
                let end = start + length as usize;
                if end > bytes.len() {
                    return Err(KeplerError::corrupt(format!(
                        "{}: text slot {idx} out of bounds",
                        self.path
                    )));
                }
                let s = std::str::from_utf8(&bytes.as_slice()[start..end])
                    .map_err(|e| KeplerError::corrupt(format!("{}: invalid utf8: {e}", self.path)))?;
                ColumnValue::Text(s)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ColumnDataBuilder, Scalar};

    #[test]
    fn int_column_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("col.kdb");
        ColumnDataBuilder::write_fixed(&path, &[Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)])
            .unwrap();

        let col = ColumnData::open(&path, TypeId::Int).unwrap();
        assert_eq!(col.size(), 3);
        assert_eq!(col.get(0).unwrap(), ColumnValue::Int(1));
        assert_eq!(col.get(2).unwrap(), ColumnValue::Int(3));
        assert!(col.get(3).is_err());
    }

    #[test]
    fn text_column_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("col.kdb");
        ColumnDataBuilder::write_text(&path, &["alice", "bob", ""]).unwrap();

        let col = ColumnData::open(&path, TypeId::Text).unwrap();
        assert_eq!(col.size(), 3);
        assert_eq!(col.get(0).unwrap(), ColumnValue::Text("alice"));
        assert_eq!(col.get(1).unwrap(), ColumnValue::Text("bob"));
        assert_eq!(col.get(2).unwrap(), ColumnValue::Text(""));
    }

    #[test]
    fn corrupt_header_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.kdb");
        std::fs::write(&path, [0u8; 3]).unwrap(); // not a multiple of 4
        assert!(ColumnData::open(&path, TypeId::Int).is_err());
    }
}
