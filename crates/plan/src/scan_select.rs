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

//! Index-probe rewrite for `ScanSelect` (spec.md §4.3 point 2): "Predicates
//! referencing a single indexed column with an equality on a constant MAY
//! be rewritten by the operator into an index probe, which walks
//! `GetNextTuple` only over matching tuples." `spec.md`'s prose is made a
//! real pass here (SPEC_FULL.md §C), grounded in `runtime/column_index.cc`'s
//! `GetNextTuple` binary-search contract: an equality against an indexed
//! column can be served by seeking tuple ids directly instead of a full
//! per-tuple scan.

use kepler_catalog::{Table, TypeId};
use kepler_expr::{BinaryOp, Expr};
use kepler_runtime::IndexKey;

use crate::operator::{ScanSelectOp, SkinnerScanSelectOp};

/// One predicate rewritten into a seek over an indexed column: `scan_schema`
/// column `column_idx` probed for `key`.
#[derive(Debug, Clone)]
pub struct IndexedEquality {
    pub column_idx: usize,
    pub key: IndexKey,
}

/// Result of partitioning a `ScanSelect`'s predicates: the subset that can
/// be served by an index seek, and everything else, still evaluated in
/// declared order against the per-tuple binding (spec.md §4.3 point 1).
#[derive(Debug, Clone, Default)]
pub struct ScanSelectPlan {
    pub indexed_equalities: Vec<IndexedEquality>,
    pub residual_predicates: Vec<Expr>,
}

fn literal_index_key(expr: &Expr, type_id: TypeId) -> Option<IndexKey> {
    let Expr::Literal(value, _) = expr else {
        return None;
    };
    match (type_id, value) {
        (TypeId::SmallInt, kepler_expr::Value::SmallInt(v)) => Some(IndexKey::SmallInt(*v)),
        (TypeId::Int, kepler_expr::Value::Int(v)) => Some(IndexKey::Int(*v)),
        (TypeId::BigInt, kepler_expr::Value::BigInt(v)) => Some(IndexKey::BigInt(*v)),
        (TypeId::Real, kepler_expr::Value::Real(v)) => Some(IndexKey::real(*v)),
        (TypeId::Date, kepler_expr::Value::Date(v)) => Some(IndexKey::Date(*v)),
        (TypeId::Boolean, kepler_expr::Value::Boolean(v)) => Some(IndexKey::Boolean(*v)),
        (TypeId::Text, kepler_expr::Value::Text(v)) => Some(IndexKey::Text(v.clone())),
        (TypeId::Enum, kepler_expr::Value::Enum(v)) => Some(IndexKey::Enum(*v)),
        _ => None,
    }
}

/// Tries to read `expr` as "virtual column `k` of `scan_schema` equals a
/// literal", returning `k` and the literal's index key if so.
fn as_indexed_equality(expr: &Expr, scan_schema: &crate::schema::OperatorSchema) -> Option<(usize, IndexKey)> {
    match expr {
        Expr::Binary {
            op: BinaryOp::Eq,
            left,
            right,
            ..
        } => {
            let (col_side, lit_side) = match (left.as_ref(), right.as_ref()) {
                (Expr::VirtualColumnRef { .. }, Expr::Literal(..)) => (left.as_ref(), right.as_ref()),
                (Expr::Literal(..), Expr::VirtualColumnRef { .. }) => (right.as_ref(), left.as_ref()),
                _ => return None,
            };
            let Expr::VirtualColumnRef { column_idx, ty } = col_side else {
                return None;
            };
            let name = &scan_schema.columns().get(*column_idx)?.name;
            let _ = name;
            literal_index_key(lit_side, ty.type_id).map(|k| (*column_idx, k))
        }
        // `EnumIn` with exactly one candidate id is an equality once the
        // enum-literal rewrite (`kepler_expr::resolve_enum_eq`) has run.
        Expr::EnumIn { child, values, .. } if values.len() == 1 => match child.as_ref() {
            Expr::VirtualColumnRef { column_idx, .. } => {
                Some((*column_idx, IndexKey::Enum(values[0])))
            }
            _ => None,
        },
        _ => None,
    }
}

fn is_indexed(scan_schema: &crate::schema::OperatorSchema, table: &Table, column_idx: usize) -> bool {
    scan_schema
        .columns()
        .get(column_idx)
        .and_then(|c| table.get(&c.name).ok())
        .map(|c| c.is_indexed())
        .unwrap_or(false)
}

fn partition(
    predicates: &[Expr],
    scan_schema: &crate::schema::OperatorSchema,
    table: &Table,
) -> ScanSelectPlan {
    let mut plan = ScanSelectPlan::default();
    for predicate in predicates {
        match as_indexed_equality(predicate, scan_schema) {
            Some((column_idx, key)) if is_indexed(scan_schema, table, column_idx) => {
                plan.indexed_equalities.push(IndexedEquality { column_idx, key });
            }
            _ => plan.residual_predicates.push(predicate.clone()),
        }
    }
    plan
}

pub fn rewrite_indexed_equalities(op: &ScanSelectOp, table: &Table) -> ScanSelectPlan {
    partition(&op.predicates, &op.scan_schema, table)
}

pub fn rewrite_indexed_equalities_skinner(op: &SkinnerScanSelectOp, table: &Table) -> ScanSelectPlan {
    partition(&op.predicates, &op.scan_schema, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::OperatorSchema;
    use kepler_catalog::{Column, Type};
    use kepler_expr::Value;

    fn orders_table() -> Table {
        let mut t = Table::new("orders");
        t.insert(
            Column::new("o_orderkey", Type::int(false), "o_orderkey.kdb")
                .with_index_path("o_orderkey.kdbindex"),
        );
        t.insert(Column::new("o_totalprice", Type::real(false), "o_totalprice.kdb"));
        t
    }

    #[test]
    fn equality_on_indexed_column_is_rewritten() {
        let table = orders_table();
        let mut scan_schema = OperatorSchema::new();
        scan_schema.add_generated_columns(&table).unwrap();

        let predicate = Expr::compare(
            BinaryOp::Eq,
            Expr::virtual_column_ref(0, Type::int(false)),
            Expr::literal(Value::Int(42)),
        )
        .unwrap();

        let plan = partition(&[predicate], &scan_schema, &table);
        assert_eq!(plan.indexed_equalities.len(), 1);
        assert_eq!(plan.indexed_equalities[0].column_idx, 0);
        assert_eq!(plan.indexed_equalities[0].key, IndexKey::Int(42));
        assert!(plan.residual_predicates.is_empty());
    }

    #[test]
    fn equality_on_unindexed_column_stays_residual() {
        let table = orders_table();
        let mut scan_schema = OperatorSchema::new();
        scan_schema.add_generated_columns(&table).unwrap();

        let predicate = Expr::compare(
            BinaryOp::Eq,
            Expr::virtual_column_ref(1, Type::real(false)),
            Expr::literal(Value::Real(100.0)),
        )
        .unwrap();

        let plan = partition(&[predicate], &scan_schema, &table);
        assert!(plan.indexed_equalities.is_empty());
        assert_eq!(plan.residual_predicates.len(), 1);
    }

    #[test]
    fn range_predicate_is_never_rewritten() {
        let table = orders_table();
        let mut scan_schema = OperatorSchema::new();
        scan_schema.add_generated_columns(&table).unwrap();

        let predicate = Expr::compare(
            BinaryOp::Geq,
            Expr::virtual_column_ref(0, Type::int(false)),
            Expr::literal(Value::Int(10)),
        )
        .unwrap();

        let plan = partition(&[predicate], &scan_schema, &table);
        assert!(plan.indexed_equalities.is_empty());
        assert_eq!(plan.residual_predicates.len(), 1);
    }
}
