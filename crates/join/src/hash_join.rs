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

//! Build/probe hash join (spec.md §4.4). Grounded on
//! `symmetric_hash_join.rs`'s build/probe split, simplified to the
//! non-streaming case: the whole build side is materialized once (the
//! caller picks which side, per SPEC_FULL.md §E.1) and the probe side is
//! drained row by row.
//!
//! This executor returns raw `(left_row, right_row)` pairs; projecting them
//! into a parent schema (`AddPassthroughColumns` order) is `kepler-exec`'s
//! job, not this crate's.

use hashbrown::HashMap;
use kepler_common::Result;
use kepler_expr::Expr;
use kepler_runtime::EnumManager;

use crate::bindings::SingleRowBindings;
use crate::key::JoinKey;
use crate::row::{Row, RowSource};

/// The build-side hash table: key columns evaluated per row, to the list of
/// rows sharing that key (duplicates are kept, per spec.md §4.4's ordinary
/// equi-join semantics).
pub struct HashTable {
    keys: Vec<Expr>,
    buckets: HashMap<JoinKey, Vec<Row>>,
}

impl HashTable {
    /// Drains `source` fully, bucketing each row by `keys` evaluated
    /// against it. Rows with a `NULL` key component are dropped -- they can
    /// never match a probe.
    pub fn build(keys: Vec<Expr>, source: &mut dyn RowSource, enums: &EnumManager) -> Result<HashTable> {
        let mut buckets: HashMap<JoinKey, Vec<Row>> = HashMap::new();
        while let Some(row) = source.next_row()? {
            let bindings = SingleRowBindings::new(&row);
            let mut parts = Vec::with_capacity(keys.len());
            for key in &keys {
                parts.push(key.evaluate(&bindings, enums)?);
            }
            if let Some(join_key) = JoinKey::from_parts(&parts) {
                buckets.entry(join_key).or_default().push(row);
            }
        }
        Ok(HashTable { keys, buckets })
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Probes `build` with every row from `probe_source`, evaluating
/// `probe_keys` against each probe row. Order of the returned pairs is
/// probe-row order, then build-bucket insertion order -- callers that need
/// a specific output order apply `OrderBy` afterward, per spec.md §4.8.
pub struct HashJoinProbe<'a> {
    build: &'a HashTable,
    probe_keys: Vec<Expr>,
    probe_source: Box<dyn RowSource + 'a>,
    pending: std::vec::IntoIter<Row>,
    current_probe_row: Option<Row>,
}

impl<'a> HashJoinProbe<'a> {
    pub fn new(build: &'a HashTable, probe_keys: Vec<Expr>, probe_source: Box<dyn RowSource + 'a>) -> Self {
        HashJoinProbe {
            build,
            probe_keys,
            probe_source,
            pending: Vec::new().into_iter(),
            current_probe_row: None,
        }
    }

    /// Returns the next matching `(left_row, right_row)` pair, or `None`
    /// once the probe side is exhausted. `left_row` always comes from the
    /// build side (the side passed to [`HashTable::build`]); `right_row`
    /// from the probe side -- callers map that back to the operator's
    /// declared build/probe assignment.
    pub fn next_pair(&mut self, enums: &EnumManager) -> Result<Option<(Row, Row)>> {
        loop {
            if let Some(build_row) = self.pending.next() {
                let probe_row = self
                    .current_probe_row
                    .clone()
                    .expect("pending iterator non-empty implies a current probe row");
                return Ok(Some((build_row, probe_row)));
            }

            let Some(probe_row) = self.probe_source.next_row()? else {
                return Ok(None);
            };

            let bindings = SingleRowBindings::new(&probe_row);
            let mut parts = Vec::with_capacity(self.probe_keys.len());
            for key in &self.probe_keys {
                parts.push(key.evaluate(&bindings, enums)?);
            }
            self.current_probe_row = Some(probe_row);

            if let Some(join_key) = JoinKey::from_parts(&parts) {
                if let Some(matches) = self.build.buckets.get(&join_key) {
                    self.pending = matches.clone().into_iter();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::VecRowSource;
    use kepler_expr::Value;

    fn row(vals: Vec<Option<Value>>) -> Row {
        vals
    }

    #[test]
    fn matches_are_returned_per_probe_row() {
        let enums = EnumManager::new();
        let left = vec![
            row(vec![Some(Value::Int(1)), Some(Value::Text("a".into()))]),
            row(vec![Some(Value::Int(2)), Some(Value::Text("b".into()))]),
        ];
        let right = vec![
            row(vec![Some(Value::Int(2)), Some(Value::Text("x".into()))]),
            row(vec![Some(Value::Int(3)), Some(Value::Text("y".into()))]),
        ];

        let key_expr = Expr::virtual_column_ref(0, kepler_catalog::Type::int(false));
        let mut left_source = VecRowSource::new(left);
        let table = HashTable::build(vec![key_expr.clone()], &mut left_source, &enums).unwrap();
        assert_eq!(table.len(), 2);

        let right_source = VecRowSource::new(right);
        let mut probe = HashJoinProbe::new(&table, vec![key_expr], Box::new(right_source));

        let mut out = Vec::new();
        while let Some(pair) = probe.next_pair(&enums).unwrap() {
            out.push(pair);
        }
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0[0], Some(Value::Int(2)));
        assert_eq!(out[0].1[0], Some(Value::Int(2)));
    }

    #[test]
    fn null_keys_never_match() {
        let enums = EnumManager::new();
        let left = vec![row(vec![None])];
        let right = vec![row(vec![None])];

        let key_expr = Expr::virtual_column_ref(0, kepler_catalog::Type::int(true));
        let mut left_source = VecRowSource::new(left);
        let table = HashTable::build(vec![key_expr.clone()], &mut left_source, &enums).unwrap();
        assert!(table.is_empty());

        let right_source = VecRowSource::new(right);
        let mut probe = HashJoinProbe::new(&table, vec![key_expr], Box::new(right_source));
        assert!(probe.next_pair(&enums).unwrap().is_none());
    }
}
