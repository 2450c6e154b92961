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

//! One byte per row, `0`/`1` (spec.md §6). Kept as its own small type rather
//! than folded into `ColumnData` because a column may have no null path at
//! all (spec.md §3: "optional null_path").

use std::path::Path;

use kepler_common::Result;

use crate::aligned::AlignedBytes;

pub struct NullBitmap {
    bytes: AlignedBytes,
}

impl NullBitmap {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(NullBitmap {
            bytes: AlignedBytes::open(path)?,
        })
    }

    pub fn is_null(&self, idx: u32) -> bool {
        self.bytes.as_slice()[idx as usize] != 0
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ColumnDataBuilder;

    #[test]
    fn reads_null_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("col.kdbnull");
        ColumnDataBuilder::write_null_bitmap(&path, &[false, true, false]).unwrap();
        let bm = NullBitmap::open(&path).unwrap();
        assert!(!bm.is_null(0));
        assert!(bm.is_null(1));
        assert!(!bm.is_null(2));
    }
}
