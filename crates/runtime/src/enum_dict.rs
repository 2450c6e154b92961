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

//! Process-scoped `string <-> i32` enum dictionaries (spec.md §6). Grounded
//! on `runtime/enum.{h,cc}`: a dictionary is a TEXT column of keys (id ->
//! string, `GetKey`) plus a hash index over that same TEXT data (string ->
//! id, `GetValue`), and dictionaries are registered in a process-wide
//! manager that hands out ids in registration order.

use std::path::Path;

use kepler_common::{KeplerError, Result};

use crate::column_data::{ColumnData, ColumnValue};
use crate::column_index::{ColumnIndex, IndexKey};
use kepler_catalog::TypeId;

/// One dictionary: `keys[id]` is the string for `id`, `reverse` maps a
/// string back to its id.
pub struct EnumDictionary {
    keys: ColumnData,
    reverse: ColumnIndex,
}

impl EnumDictionary {
    /// `keys_path` holds the dictionary file (spec.md §6: identical layout to
    /// a TEXT column); `index_path` holds a hash index over those same
    /// strings, built by the loader alongside it.
    pub fn open(keys_path: impl AsRef<Path>, index_path: impl AsRef<Path>) -> Result<Self> {
        let keys = ColumnData::open(keys_path, TypeId::Text)?;
        let cardinality = keys.size();
        let reverse = ColumnIndex::open(index_path, TypeId::Text, cardinality)?;
        Ok(EnumDictionary { keys, reverse })
    }

    pub fn cardinality(&self) -> u32 {
        self.keys.size()
    }

    /// `GetKey`: the string registered under `id`.
    pub fn get_key(&self, id: i32) -> Result<&str> {
        match self.keys.get(id as u32)? {
            ColumnValue::Text(s) => Ok(s),
            _ => unreachable!("EnumDictionary keys column is always TEXT"),
        }
    }

    /// `GetValue`: the id registered for `value`, if any. Used at plan-build
    /// time to rewrite `enum_col = 'literal'` predicates (spec.md §4.2).
    pub fn get_value(&self, value: &str) -> Option<i32> {
        let key = IndexKey::Text(value.to_owned());
        let first = self.reverse.get_next_tuple(&key, -1);
        if first as u32 >= self.cardinality() {
            None
        } else {
            Some(first)
        }
    }
}

/// Process-wide registry handing out dictionary ids in registration order
/// (spec.md §6: "dictionary id is the registration order in the process").
/// Not a global/static singleton here -- the engine threads an owned
/// `EnumManager` through plan construction instead, which gives identical
/// semantics without hidden global mutable state (spec.md §9: "in a language
/// without safe singletons, thread them as context handles").
#[derive(Default)]
pub struct EnumManager {
    dictionaries: Vec<EnumDictionary>,
}

impl EnumManager {
    pub fn new() -> Self {
        EnumManager::default()
    }

    pub fn register(
        &mut self,
        keys_path: impl AsRef<Path>,
        index_path: impl AsRef<Path>,
    ) -> Result<i32> {
        let dict = EnumDictionary::open(keys_path, index_path)?;
        let id = self.dictionaries.len() as i32;
        self.dictionaries.push(dict);
        Ok(id)
    }

    pub fn get(&self, id: i32) -> Result<&EnumDictionary> {
        self.dictionaries
            .get(id as usize)
            .ok_or_else(|| KeplerError::resource_missing(format!("enum dictionary {id}")))
    }

    pub fn get_key(&self, id: i32, value: i32) -> Result<&str> {
        self.get(id)?.get_key(value)
    }

    pub fn get_value(&self, id: i32, value: &str) -> Result<Option<i32>> {
        Ok(self.get(id)?.get_value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ColumnDataBuilder, ColumnIndexBuilder};

    #[test]
    fn round_trips_key_and_value() {
        let dir = tempfile::tempdir().unwrap();
        let keys_path = dir.path().join("nation.kdb");
        let index_path = dir.path().join("nation.kdbindex");
        ColumnDataBuilder::write_text(&keys_path, &["ALGERIA", "ARGENTINA", "BRAZIL"]).unwrap();
        ColumnIndexBuilder::write_text(
            &index_path,
            &[("ALGERIA", vec![0]), ("ARGENTINA", vec![1]), ("BRAZIL", vec![2])],
        )
        .unwrap();

        let mut mgr = EnumManager::new();
        let id = mgr.register(&keys_path, &index_path).unwrap();
        assert_eq!(id, 0);
        assert_eq!(mgr.get_key(id, 1).unwrap(), "ARGENTINA");
        assert_eq!(mgr.get_value(id, "BRAZIL").unwrap(), Some(2));
        assert_eq!(mgr.get_value(id, "CANADA").unwrap(), None);
    }

    #[test]
    fn registration_order_is_dictionary_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = EnumManager::new();
        for (i, name) in ["a", "b"].iter().enumerate() {
            let keys_path = dir.path().join(format!("{name}.kdb"));
            let index_path = dir.path().join(format!("{name}.kdbindex"));
            ColumnDataBuilder::write_text(&keys_path, &["x"]).unwrap();
            ColumnIndexBuilder::write_text(&index_path, &[("x", vec![0])]).unwrap();
            let id = mgr.register(&keys_path, &index_path).unwrap();
            assert_eq!(id as usize, i);
        }
    }
}
