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

//! `OrderBy` (spec.md §4.8): buffers the whole child, sorts by the
//! lexicographic key tuple with a stable sort, NULLs ordering last ascending
//! and first descending.

use std::cmp::Ordering;

use kepler_common::Result;
use kepler_expr::{Expr, Value};
use kepler_join::{Row, RowSource, SingleRowBindings};
use kepler_plan::SortOrder;
use kepler_runtime::EnumManager;

pub fn order_by(
    mut child: Box<dyn RowSource + '_>,
    keys: &[(Expr, SortOrder)],
    enums: &EnumManager,
) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    while let Some(row) = child.next_row()? {
        let bindings = SingleRowBindings::new(&row);
        let mut key = Vec::with_capacity(keys.len());
        for (expr, _) in keys {
            key.push(expr.evaluate(&bindings, enums)?);
        }
        rows.push((key, row));
    }

    let orders: Vec<bool> = keys.iter().map(|(_, order)| *order == SortOrder::Asc).collect();
    rows.sort_by(|a, b| compare_keys(&a.0, &b.0, &orders));
    Ok(rows.into_iter().map(|(_, row)| row).collect())
}

fn compare_keys(a: &[Option<Value>], b: &[Option<Value>], ascending: &[bool]) -> Ordering {
    for ((av, bv), &asc) in a.iter().zip(b.iter()).zip(ascending.iter()) {
        let ord = compare_one(av, bv, asc);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// NULLs last ascending, first descending (spec.md §4.8).
fn compare_one(a: &Option<Value>, b: &Option<Value>, ascending: bool) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => if ascending { Ordering::Greater } else { Ordering::Less },
        (Some(_), None) => if ascending { Ordering::Less } else { Ordering::Greater },
        (Some(x), Some(y)) => {
            let ord = x.compare(y);
            if ascending { ord } else { ord.reverse() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kepler_catalog::Type;
    use kepler_join::VecRowSource;
    use kepler_plan::builder::col_ref;

    #[test]
    fn sorts_ascending_with_nulls_last() {
        let child: Box<dyn RowSource> = Box::new(VecRowSource::new(vec![
            vec![Some(Value::Int(3))],
            vec![None],
            vec![Some(Value::Int(1))],
        ]));
        let keys = vec![(col_ref(0, 0, Type::int(true)), SortOrder::Asc)];
        let enums = EnumManager::new();
        let out = order_by(child, &keys, &enums).unwrap();
        assert_eq!(
            out,
            vec![
                vec![Some(Value::Int(1))],
                vec![Some(Value::Int(3))],
                vec![None],
            ]
        );
    }

    #[test]
    fn sorts_descending_with_nulls_first() {
        let child: Box<dyn RowSource> = Box::new(VecRowSource::new(vec![
            vec![Some(Value::Int(3))],
            vec![None],
            vec![Some(Value::Int(1))],
        ]));
        let keys = vec![(col_ref(0, 0, Type::int(true)), SortOrder::Desc)];
        let enums = EnumManager::new();
        let out = order_by(child, &keys, &enums).unwrap();
        assert_eq!(
            out,
            vec![
                vec![None],
                vec![Some(Value::Int(3))],
                vec![Some(Value::Int(1))],
            ]
        );
    }
}
