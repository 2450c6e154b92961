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

//! `Select`: filters a single child by one predicate, passthrough schema
//! (spec.md §4.4). Used for residual predicates a join or group-by can't
//! push down, as well as ad hoc filtering above any operator.

use kepler_common::Result;
use kepler_expr::Expr;
use kepler_join::{Row, RowSource, SingleRowBindings};
use kepler_runtime::EnumManager;

pub struct SelectIter<'a> {
    child: Box<dyn RowSource + 'a>,
    predicate: Expr,
    enums: &'a EnumManager,
}

impl<'a> SelectIter<'a> {
    pub fn new(child: Box<dyn RowSource + 'a>, predicate: Expr, enums: &'a EnumManager) -> Self {
        SelectIter { child, predicate, enums }
    }
}

impl RowSource for SelectIter<'_> {
    fn next_row(&mut self) -> Result<Option<Row>> {
        while let Some(row) = self.child.next_row()? {
            let bindings = SingleRowBindings::new(&row);
            if let Some(true) = self.predicate.evaluate(&bindings, self.enums)?.and_then(|v| v.as_bool()) {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kepler_expr::Value;
    use kepler_plan::builder::{eq, lit, virt_ref};
    use kepler_catalog::Type;

    #[test]
    fn drops_rows_failing_the_predicate() {
        let rows = vec![
            vec![Some(Value::Int(1))],
            vec![Some(Value::Int(2))],
            vec![None],
        ];
        let child = Box::new(kepler_join::VecRowSource::new(rows));
        let predicate = eq(virt_ref(0, Type::int(true)), lit(Value::Int(2))).unwrap();
        let enums = EnumManager::new();
        let mut iter = SelectIter::new(child, predicate, &enums);
        assert_eq!(iter.next_row().unwrap(), Some(vec![Some(Value::Int(2))]));
        assert_eq!(iter.next_row().unwrap(), None);
    }
}
