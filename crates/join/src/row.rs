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

//! A materialized input row and the pull interface a join drains its
//! children through. `kepler-join` never evaluates an operator subtree
//! itself -- `kepler-exec` owns the interpreter loop and hands each join a
//! [`RowSource`] wrapping whatever child pipeline produced it, the same
//! producer/consumer seam spec.md §9 describes ("Coroutine-style
//! producer/consumer ... maps cleanly to push-iterator chains").

use kepler_common::Result;
use kepler_expr::Value;

/// One tuple's worth of already-evaluated column values, in schema order.
/// `None` marks SQL NULL.
pub type Row = Vec<Option<Value>>;

/// Pull interface over a child operator's output. Implemented by
/// `kepler-exec`'s interpreter for every operator variant; join executors
/// only ever see this trait, never the operator tree itself.
pub trait RowSource {
    fn next_row(&mut self) -> Result<Option<Row>>;
}

/// A `RowSource` over an already-materialized `Vec<Row>`, used by tests and
/// by [`crate::skinner`] once a relation has been drained into its column
/// cache.
pub struct VecRowSource {
    rows: std::vec::IntoIter<Row>,
}

impl VecRowSource {
    pub fn new(rows: Vec<Row>) -> Self {
        VecRowSource {
            rows: rows.into_iter(),
        }
    }
}

impl RowSource for VecRowSource {
    fn next_row(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.next())
    }
}

/// Drains `source` fully into a `Vec<Row>` (spec.md §4.6: "materialized
/// column cache produced by draining each child exactly once").
pub fn drain_all(source: &mut dyn RowSource) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    while let Some(row) = source.next_row()? {
        rows.push(row);
    }
    Ok(rows)
}
