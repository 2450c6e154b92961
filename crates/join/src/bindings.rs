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

//! [`kepler_expr::Bindings`] implementations local to this crate: one row
//! bound at child 0 (for `HashJoin` key expressions, which read only their
//! own side) and a multi-relation view over `SkinnerJoin`'s materialized
//! caches.

use kepler_common::{KeplerError, Result};
use kepler_expr::{Bindings, Value};

use crate::row::Row;

/// Binds a single row as "child 0" -- used to evaluate `HashJoinOp`'s
/// `left_keys`/`right_keys`, which spec.md §4.4 defines as expressions over
/// one side's own row.
pub struct SingleRowBindings<'a> {
    row: &'a Row,
}

impl<'a> SingleRowBindings<'a> {
    pub fn new(row: &'a Row) -> Self {
        SingleRowBindings { row }
    }
}

impl Bindings for SingleRowBindings<'_> {
    fn column(&self, child_idx: usize, column_idx: usize) -> Result<Option<Value>> {
        if child_idx != 0 {
            return Err(KeplerError::type_mismatch(format!(
                "join key expression referenced child {child_idx}, expected 0"
            )));
        }
        Ok(self.row.get(column_idx).cloned().flatten())
    }

    fn virtual_column(&self, column_idx: usize) -> Result<Option<Value>> {
        self.column(0, column_idx)
    }
}

/// Binds the tuples currently under consideration across every relation of
/// a `SkinnerJoin`, keyed by the *original* child index the predicate was
/// written against (not by join-order position) -- spec.md §4.6: "a
/// conjunction of `m` predicates, each a general expression referencing
/// column refs whose `child_idx` ranges over `[0,k)`".
pub struct SkinnerBindings<'a> {
    relations: &'a [Vec<Row>],
    /// `bound[child_idx]` is the tuple id currently bound for that relation,
    /// or `None` if it hasn't been reached yet in the current join-order
    /// prefix.
    bound: &'a [Option<usize>],
}

impl<'a> SkinnerBindings<'a> {
    pub fn new(relations: &'a [Vec<Row>], bound: &'a [Option<usize>]) -> Self {
        SkinnerBindings { relations, bound }
    }
}

impl Bindings for SkinnerBindings<'_> {
    fn column(&self, child_idx: usize, column_idx: usize) -> Result<Option<Value>> {
        let tuple_id = self.bound.get(child_idx).copied().flatten().ok_or_else(|| {
            KeplerError::type_mismatch(format!(
                "predicate referenced relation {child_idx} before it was bound"
            ))
        })?;
        Ok(self.relations[child_idx][tuple_id]
            .get(column_idx)
            .cloned()
            .flatten())
    }

    fn virtual_column(&self, _column_idx: usize) -> Result<Option<Value>> {
        Err(KeplerError::type_mismatch(
            "SkinnerJoin predicates may not reference a virtual column",
        ))
    }
}
