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

//! Per-column hash index: `value -> sorted tuple ids` (spec.md §4.1, §6).
//! Grounded on `runtime/column_index.{h,cc}`, which keeps one
//! `std::unordered_map<T, std::vector<int32_t>>` per key type and finds the
//! successor of `prev_tuple` by binary search since each bucket is kept
//! sorted. `hashbrown::HashMap` plays the same role here; buckets are kept as
//! plain `Vec<i32>` and searched with the standard library's `partition_point`
//! instead of hand-rolling the binary search.

use std::path::Path;

use hashbrown::HashMap;
use kepler_catalog::TypeId;
use kepler_common::{KeplerError, Result};

use crate::aligned::AlignedBytes;

/// Key type recovered from a scanned predicate constant, used both to probe
/// the index and (by the builder) to serialize one.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexKey {
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    /// Compared/hashed by bit pattern, matching the reference
    /// implementation's use of `double` directly as an `unordered_map` key.
    Real(u64),
    Date(i64),
    Enum(i32),
    Boolean(bool),
    Text(String),
}

impl IndexKey {
    pub fn real(value: f64) -> Self {
        IndexKey::Real(value.to_bits())
    }
}

enum Buckets {
    SmallInt(HashMap<i16, Vec<i32>>),
    Int(HashMap<i32, Vec<i32>>),
    BigInt(HashMap<i64, Vec<i32>>),
    Real(HashMap<u64, Vec<i32>>),
    Date(HashMap<i64, Vec<i32>>),
    Enum(HashMap<i32, Vec<i32>>),
    Boolean(HashMap<i8, Vec<i32>>),
    Text(HashMap<String, Vec<i32>>),
}

/// An opened hash index. `cardinality` is the owning column's row count,
/// returned as the "no larger tuple" sentinel by [`ColumnIndex::get_next_tuple`]
/// (spec.md §4.1).
pub struct ColumnIndex {
    buckets: Buckets,
    cardinality: u32,
}

fn read_u32(bytes: &[u8], pos: &mut usize) -> Result<u32> {
    let v = bytes
        .get(*pos..*pos + 4)
        .ok_or_else(|| KeplerError::corrupt("truncated index file"))?;
    *pos += 4;
    Ok(u32::from_le_bytes(v.try_into().unwrap()))
}

fn read_tuple_ids(bytes: &[u8], pos: &mut usize) -> Result<Vec<i32>> {
    let count = read_u32(bytes, pos)? as usize;
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let v = bytes
            .get(*pos..*pos + 4)
            .ok_or_else(|| KeplerError::corrupt("truncated index bucket"))?;
        *pos += 4;
        ids.push(i32::from_le_bytes(v.try_into().unwrap()));
    }
    if !ids.windows(2).all(|w| w[0] < w[1]) {
        return Err(KeplerError::corrupt(
            "index bucket tuple ids are not strictly increasing",
        ));
    }
    Ok(ids)
}

macro_rules! parse_fixed_buckets {
    ($bytes:expr, $pos:expr, $bucket_count:expr, $read_key:expr) => {{
        let mut map = HashMap::with_capacity($bucket_count as usize);
        for _ in 0..$bucket_count {
            let key = $read_key($bytes, $pos)?;
            let ids = read_tuple_ids($bytes, $pos)?;
            map.insert(key, ids);
        }
        map
    }};
}

impl ColumnIndex {
    pub fn open(path: impl AsRef<Path>, type_id: TypeId, cardinality: u32) -> Result<Self> {
        let raw = AlignedBytes::open(path)?;
        let bytes = raw.as_slice();
        let mut pos = 0usize;
        let bucket_count = read_u32(bytes, &mut pos)?;

        let buckets = match type_id {
            TypeId::SmallInt => Buckets::SmallInt(parse_fixed_buckets!(
                bytes,
                &mut pos,
                bucket_count,
                |b: &[u8], p: &mut usize| -> Result<i16> {
                    let v = b
                        .get(*p..*p + 2)
                        .ok_or_else(|| KeplerError::corrupt("truncated key"))?;
                    *p += 2;
                    Ok(i16::from_le_bytes(v.try_into().unwrap()))
                }
            )),
            TypeId::Int => Buckets::Int(parse_fixed_buckets!(
                bytes,
                &mut pos,
                bucket_count,
                |b: &[u8], p: &mut usize| -> Result<i32> { read_i32(b, p) }
            )),
            TypeId::Enum => Buckets::Enum(parse_fixed_buckets!(
                bytes,
                &mut pos,
                bucket_count,
                |b: &[u8], p: &mut usize| -> Result<i32> { read_i32(b, p) }
            )),
            TypeId::BigInt => Buckets::BigInt(parse_fixed_buckets!(
                bytes,
                &mut pos,
                bucket_count,
                |b: &[u8], p: &mut usize| -> Result<i64> { read_i64(b, p) }
            )),
            TypeId::Date => Buckets::Date(parse_fixed_buckets!(
                bytes,
                &mut pos,
                bucket_count,
                |b: &[u8], p: &mut usize| -> Result<i64> { read_i64(b, p) }
            )),
            TypeId::Real => Buckets::Real(parse_fixed_buckets!(
                bytes,
                &mut pos,
                bucket_count,
                |b: &[u8], p: &mut usize| -> Result<u64> {
                    let v = b
                        .get(*p..*p + 8)
                        .ok_or_else(|| KeplerError::corrupt("truncated key"))?;
                    *p += 8;
                    Ok(u64::from_le_bytes(v.try_into().unwrap()))
                }
            )),
            TypeId::Boolean => Buckets::Boolean(parse_fixed_buckets!(
                bytes,
                &mut pos,
                bucket_count,
                |b: &[u8], p: &mut usize| -> Result<i8> {
                    let v = *b
                        .get(*p)
                        .ok_or_else(|| KeplerError::corrupt("truncated key"))?;
                    *p += 1;
                    Ok(v as i8)
                }
            )),
            TypeId::Text => {
                let mut map = HashMap::with_capacity(bucket_count as usize);
                for _ in 0..bucket_count {
                    let len = read_u32(bytes, &mut pos)? as usize;
                    let key_bytes = bytes
                        .get(pos..pos + len)
                        .ok_or_else(|| KeplerError::corrupt("truncated text key"))?;
                    let key = std::str::from_utf8(key_bytes)
                        .map_err(|e| KeplerError::corrupt(format!("invalid utf8 key: {e}")))?
                        .to_owned();
                    pos += len;
                    let ids = read_tuple_ids(bytes, &mut pos)?;
                    map.insert(key, ids);
                }
                Buckets::Text(map)
            }
        };

        Ok(ColumnIndex {
            buckets,
            cardinality,
        })
    }

    /// Returns the smallest tuple id `> prev` whose column value equals
    /// `key`, or the column's cardinality if none exists (spec.md §4.1).
    pub fn get_next_tuple(&self, key: &IndexKey, prev: i32) -> i32 {
        let bucket: Option<&Vec<i32>> = match (&self.buckets, key) {
            (Buckets::SmallInt(m), IndexKey::SmallInt(k)) => m.get(k),
            (Buckets::Int(m), IndexKey::Int(k)) => m.get(k),
            (Buckets::Enum(m), IndexKey::Enum(k)) => m.get(k),
            (Buckets::BigInt(m), IndexKey::BigInt(k)) => m.get(k),
            (Buckets::Date(m), IndexKey::Date(k)) => m.get(k),
            (Buckets::Real(m), IndexKey::Real(k)) => m.get(k),
            (Buckets::Boolean(m), IndexKey::Boolean(k)) => m.get(&(*k as i8)),
            (Buckets::Text(m), IndexKey::Text(k)) => m.get(k.as_str()),
            _ => None,
        };

        let Some(bucket) = bucket else {
            return self.cardinality as i32;
        };

        // Bucket is sorted ascending (validated at Open); the first id
        // strictly greater than `prev` is the partition point.
        let idx = bucket.partition_point(|&id| id <= prev);
        bucket.get(idx).copied().unwrap_or(self.cardinality as i32)
    }
}

fn read_i32(bytes: &[u8], pos: &mut usize) -> Result<i32> {
    let v = bytes
        .get(*pos..*pos + 4)
        .ok_or_else(|| KeplerError::corrupt("truncated key"))?;
    *pos += 4;
    Ok(i32::from_le_bytes(v.try_into().unwrap()))
}

fn read_i64(bytes: &[u8], pos: &mut usize) -> Result<i64> {
    let v = bytes
        .get(*pos..*pos + 8)
        .ok_or_else(|| KeplerError::corrupt("truncated key"))?;
    *pos += 8;
    Ok(i64::from_le_bytes(v.try_into().unwrap()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ColumnIndexBuilder;

    #[test]
    fn get_next_tuple_is_monotone_and_hits_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx.kdbindex");
        ColumnIndexBuilder::write_int(&path, &[(7, vec![1, 4, 9]), (3, vec![0])]).unwrap();

        let idx = ColumnIndex::open(&path, TypeId::Int, 10).unwrap();
        let key = IndexKey::Int(7);
        assert_eq!(idx.get_next_tuple(&key, -1), 1);
        assert_eq!(idx.get_next_tuple(&key, 1), 4);
        assert_eq!(idx.get_next_tuple(&key, 4), 9);
        assert_eq!(idx.get_next_tuple(&key, 9), 10); // cardinality sentinel
        assert_eq!(idx.get_next_tuple(&IndexKey::Int(100), 0), 10);
    }

    #[test]
    fn non_monotone_bucket_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx.kdbindex");
        ColumnIndexBuilder::write_int(&path, &[(1, vec![5, 2])]).unwrap();
        assert!(ColumnIndex::open(&path, TypeId::Int, 10).is_err());
    }
}
