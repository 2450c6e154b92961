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

//! Glue between `kepler-plan`'s join operators and `kepler-join`'s
//! executors. `HashJoinProbe` borrows its build side (`&'a HashTable`), and
//! a boxed `RowSource` can't hold both the table and a probe borrowing it
//! without self-referencing; the adapters here sidestep that by draining
//! each join eagerly into a `Vec<Row>` and handing it back out as a
//! `VecRowSource` (see DESIGN.md). `kepler-join`'s executors themselves stay
//! streaming -- only this glue materializes.

use kepler_common::Result;
use kepler_join::{drain_all, HashJoinProbe, HashTable, Row, RowSource, SkinnerJoinExecutor, VecRowSource};
use kepler_plan::{CrossProductOp, HashJoinOp, SkinnerJoinOp};
use kepler_runtime::EnumManager;

pub fn hash_join<'a>(op: &HashJoinOp, mut left: Box<dyn RowSource + 'a>, right: Box<dyn RowSource + 'a>, enums: &EnumManager) -> Result<VecRowSource> {
    let table = HashTable::build(op.left_keys.clone(), left.as_mut(), enums)?;
    let mut probe = HashJoinProbe::new(&table, op.right_keys.clone(), right);
    let mut out = Vec::new();
    while let Some((left_row, right_row)) = probe.next_pair(enums)? {
        out.push(concat(left_row, right_row));
    }
    Ok(VecRowSource::new(out))
}

pub fn cross_product<'a>(_op: &CrossProductOp, mut left: Box<dyn RowSource + 'a>, mut right: Box<dyn RowSource + 'a>) -> Result<VecRowSource> {
    let left_rows = drain_all(left.as_mut())?;
    let right_rows = drain_all(right.as_mut())?;
    let mut out = Vec::with_capacity(left_rows.len() * right_rows.len());
    for l in &left_rows {
        for r in &right_rows {
            out.push(concat(l.clone(), r.clone()));
        }
    }
    Ok(VecRowSource::new(out))
}

pub fn skinner_join<'a>(
    op: &SkinnerJoinOp,
    mut children: Vec<Box<dyn RowSource + 'a>>,
    enums: &EnumManager,
    seed: u64,
) -> Result<VecRowSource> {
    let rows = SkinnerJoinExecutor::run(&mut children, &op.predicates, op.budget_per_episode, enums, seed)?;
    Ok(VecRowSource::new(rows))
}

fn concat(mut left: Row, right: Row) -> Row {
    left.extend(right);
    left
}

#[cfg(test)]
mod tests {
    use super::*;
    use kepler_catalog::Type;
    use kepler_expr::Value;
    use kepler_plan::builder::col_ref;

    #[test]
    fn hash_join_pairs_matching_keys() {
        let left = Box::new(VecRowSource::new(vec![
            vec![Some(Value::Int(1)), Some(Value::Text("a".into()))],
            vec![Some(Value::Int(2)), Some(Value::Text("b".into()))],
        ])) as Box<dyn RowSource>;
        let right = Box::new(VecRowSource::new(vec![
            vec![Some(Value::Int(2)), Some(Value::Text("x".into()))],
            vec![Some(Value::Int(3)), Some(Value::Text("y".into()))],
        ])) as Box<dyn RowSource>;

        let op = HashJoinOp {
            schema: kepler_plan::OperatorSchema::new(),
            left: Box::new(kepler_plan::Operator::Scan(kepler_plan::ScanOp {
                schema: kepler_plan::OperatorSchema::new(),
                table: "l".into(),
            })),
            right: Box::new(kepler_plan::Operator::Scan(kepler_plan::ScanOp {
                schema: kepler_plan::OperatorSchema::new(),
                table: "r".into(),
            })),
            left_keys: vec![col_ref(0, 0, Type::int(false))],
            right_keys: vec![col_ref(0, 0, Type::int(false))],
        };
        let enums = EnumManager::new();
        let mut out = hash_join(&op, left, right, &enums).unwrap();
        let row = out.next_row().unwrap().unwrap();
        assert_eq!(row, vec![
            Some(Value::Int(2)),
            Some(Value::Text("b".into())),
            Some(Value::Int(2)),
            Some(Value::Text("x".into())),
        ]);
        assert_eq!(out.next_row().unwrap(), None);
    }
}
