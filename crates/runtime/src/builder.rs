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

//! Serializes the on-disk column, index and enum-dictionary formats
//! (spec.md §6). This is the write side of the contract whose read side
//! lives in [`crate::column_data`]/[`crate::column_index`]/[`crate::enum_dict`];
//! loader programs (TPC-H/JCC-H/JOB, out of scope per spec.md §1) are
//! expected to call through these builders rather than hand-write the wire
//! format.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use kepler_common::Result;

/// A single fixed-width scalar to append to a column file via
/// [`ColumnDataBuilder::write_fixed`].
#[derive(Debug, Clone, Copy)]
pub enum Scalar {
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Real(f64),
    Date(i64),
    Enum(i32),
    Boolean(bool),
}

pub struct ColumnDataBuilder;

impl ColumnDataBuilder {
    /// Writes a raw little-endian array, no header -- the layout for every
    /// fixed-width type (spec.md §6).
    pub fn write_fixed(path: impl AsRef<Path>, values: &[Scalar]) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        for v in values {
            match v {
                Scalar::SmallInt(x) => w.write_all(&x.to_le_bytes())?,
                Scalar::Int(x) | Scalar::Enum(x) => w.write_all(&x.to_le_bytes())?,
                Scalar::BigInt(x) | Scalar::Date(x) => w.write_all(&x.to_le_bytes())?,
                Scalar::Real(x) => w.write_all(&x.to_le_bytes())?,
                Scalar::Boolean(x) => w.write_all(&[*x as u8])?,
            }
        }
        w.flush()?;
        Ok(())
    }

    /// Writes the TEXT layout: `u32 cardinality`, then
    /// `cardinality * {u32 length, u32 offset}`, then the packed,
    /// null-terminated strings (spec.md §6). `offset` is absolute from the
    /// start of the file.
    pub fn write_text(path: impl AsRef<Path>, values: &[&str]) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        let cardinality = values.len() as u32;
        let header_len = 4 + values.len() * 8;
        w.write_all(&cardinality.to_le_bytes())?;

        let mut offset = header_len as u32;
        let mut slots = Vec::with_capacity(values.len());
        for v in values {
            let length = v.len() as u32;
            slots.push((length, offset));
            // length+1 to account for the trailing null terminator byte.
            offset += length + 1;
        }
        for (length, offset) in &slots {
            w.write_all(&length.to_le_bytes())?;
            w.write_all(&offset.to_le_bytes())?;
        }
        for v in values {
            w.write_all(v.as_bytes())?;
            w.write_all(&[0u8])?;
        }
        w.flush()?;
        Ok(())
    }

    /// Writes a null-bitmap file: one `u8` per row, `0` = not null, `1` = null
    /// (spec.md §6).
    pub fn write_null_bitmap(path: impl AsRef<Path>, nulls: &[bool]) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        for &is_null in nulls {
            w.write_all(&[is_null as u8])?;
        }
        w.flush()?;
        Ok(())
    }
}

pub struct ColumnIndexBuilder;

macro_rules! write_fixed_index {
    ($name:ident, $key_ty:ty, $write_key:expr) => {
        pub fn $name(path: impl AsRef<Path>, buckets: &[($key_ty, Vec<i32>)]) -> Result<()> {
            let mut w = BufWriter::new(File::create(path)?);
            w.write_all(&(buckets.len() as u32).to_le_bytes())?;
            for (key, ids) in buckets {
                $write_key(&mut w, *key)?;
                w.write_all(&(ids.len() as u32).to_le_bytes())?;
                for id in ids {
                    w.write_all(&id.to_le_bytes())?;
                }
            }
            w.flush()?;
            Ok(())
        }
    };
}

impl ColumnIndexBuilder {
    write_fixed_index!(write_small_int, i16, |w: &mut BufWriter<File>, k: i16| w
        .write_all(&k.to_le_bytes()));
    write_fixed_index!(write_int, i32, |w: &mut BufWriter<File>, k: i32| w
        .write_all(&k.to_le_bytes()));
    write_fixed_index!(write_enum, i32, |w: &mut BufWriter<File>, k: i32| w
        .write_all(&k.to_le_bytes()));
    write_fixed_index!(write_big_int, i64, |w: &mut BufWriter<File>, k: i64| w
        .write_all(&k.to_le_bytes()));
    write_fixed_index!(write_date, i64, |w: &mut BufWriter<File>, k: i64| w
        .write_all(&k.to_le_bytes()));
    write_fixed_index!(write_real_bits, u64, |w: &mut BufWriter<File>, k: u64| w
        .write_all(&k.to_le_bytes()));
    write_fixed_index!(write_boolean, bool, |w: &mut BufWriter<File>, k: bool| w
        .write_all(&[k as u8]));

    pub fn write_real(path: impl AsRef<Path>, buckets: &[(f64, Vec<i32>)]) -> Result<()> {
        let as_bits: Vec<(u64, Vec<i32>)> = buckets
            .iter()
            .map(|(k, ids)| (k.to_bits(), ids.clone()))
            .collect();
        Self::write_real_bits(path, &as_bits)
    }

    pub fn write_text(path: impl AsRef<Path>, buckets: &[(&str, Vec<i32>)]) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        w.write_all(&(buckets.len() as u32).to_le_bytes())?;
        for (key, ids) in buckets {
            w.write_all(&(key.len() as u32).to_le_bytes())?;
            w.write_all(key.as_bytes())?;
            w.write_all(&(ids.len() as u32).to_le_bytes())?;
            for id in ids {
                w.write_all(&id.to_le_bytes())?;
            }
        }
        w.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_fixed_is_raw_little_endian() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("col.kdb");
        ColumnDataBuilder::write_fixed(&path, &[Scalar::Int(1), Scalar::Int(-1)]).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, [1, 0, 0, 0, 255, 255, 255, 255]);
    }
}
