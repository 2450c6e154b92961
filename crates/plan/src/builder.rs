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

//! Terse plan-assembly helpers (SPEC_FULL.md §C), grounded on
//! `tpch/queries/builder.h` in the reference implementation, which exposes
//! free functions (`ColRef`, `VirtColRef`, `Literal`, `Eq`/`Lt`/..., `And`/
//! `Or`, `StartsWith`/...) so benchmark query files can assemble operator
//! trees without spelling out every `Expression` constructor. This module
//! reproduces that ergonomics layer over `kepler_expr::Expr` and the
//! operator constructors in this crate -- it adds no new operator or
//! expression semantics.

use kepler_catalog::{Database, Type};
use kepler_common::Result;
use kepler_expr::{AggregateKind, BinaryOp, Expr, Value};

use crate::operator::{
    AggregateOp, CrossProductOp, GroupByAggregateOp, HashJoinOp, Operator, OrderByOp, OutputOp,
    ScanOp, ScanSelectOp, SelectOp, SkinnerJoinOp, SkinnerMode, SkinnerScanSelectOp, SortOrder,
};
use crate::schema::OperatorSchema;

// -- expression helpers -----------------------------------------------------

pub fn col_ref(child_idx: usize, column_idx: usize, ty: Type) -> Expr {
    Expr::column_ref(child_idx, column_idx, ty)
}

pub fn virt_ref(column_idx: usize, ty: Type) -> Expr {
    Expr::virtual_column_ref(column_idx, ty)
}

pub fn lit(value: Value) -> Expr {
    Expr::literal(value)
}

pub fn eq(l: Expr, r: Expr) -> Result<Expr> {
    Expr::compare(BinaryOp::Eq, l, r)
}
pub fn neq(l: Expr, r: Expr) -> Result<Expr> {
    Expr::compare(BinaryOp::Neq, l, r)
}
pub fn lt(l: Expr, r: Expr) -> Result<Expr> {
    Expr::compare(BinaryOp::Lt, l, r)
}
pub fn leq(l: Expr, r: Expr) -> Result<Expr> {
    Expr::compare(BinaryOp::Leq, l, r)
}
pub fn gt(l: Expr, r: Expr) -> Result<Expr> {
    Expr::compare(BinaryOp::Gt, l, r)
}
pub fn geq(l: Expr, r: Expr) -> Result<Expr> {
    Expr::compare(BinaryOp::Geq, l, r)
}
pub fn and(l: Expr, r: Expr) -> Result<Expr> {
    Expr::logical(BinaryOp::And, l, r)
}
pub fn or(l: Expr, r: Expr) -> Result<Expr> {
    Expr::logical(BinaryOp::Or, l, r)
}
pub fn starts_with(l: Expr, r: Expr) -> Result<Expr> {
    Expr::string_relation(BinaryOp::StartsWith, l, r)
}
pub fn ends_with(l: Expr, r: Expr) -> Result<Expr> {
    Expr::string_relation(BinaryOp::EndsWith, l, r)
}
pub fn contains(l: Expr, r: Expr) -> Result<Expr> {
    Expr::string_relation(BinaryOp::Contains, l, r)
}

/// Conjoins `predicates` with `AND`, or `literal(true)` if empty -- used by
/// `scan_select`/`skinner_scan_select` callers that build up a predicate
/// list incrementally, mirroring how TPC-H query builders fold a `WHERE`
/// clause's conjuncts.
pub fn conjunction(predicates: Vec<Expr>) -> Result<Expr> {
    let mut iter = predicates.into_iter();
    let Some(first) = iter.next() else {
        return Ok(Expr::literal(Value::Boolean(true)));
    };
    iter.try_fold(first, |acc, next| and(acc, next))
}

// -- operator constructors ---------------------------------------------------

/// `Scan(table)`: one generated column per catalog column, in table order
/// (spec.md §4.3).
pub fn scan(db: &Database, table: &str) -> Result<Operator> {
    let t = db.get(table)?;
    let mut schema = OperatorSchema::new();
    schema.add_generated_columns(t)?;
    let op = Operator::Scan(ScanOp {
        schema,
        table: table.to_string(),
    });
    op.validate()?;
    Ok(op)
}

/// `ScanSelect(table, scan_columns, output_columns, predicates)`: opens
/// `scan_columns` (typically every column any predicate or downstream
/// operator needs), exposes only `output_columns` (spec.md §4.3: "an output
/// schema that only exposes columns actually needed downstream").
pub fn scan_select(
    db: &Database,
    table: &str,
    output_columns: &[&str],
    predicates: Vec<Expr>,
) -> Result<Operator> {
    build_scan_select(db, table, output_columns, predicates, false)
}

pub fn simd_scan_select(
    db: &Database,
    table: &str,
    output_columns: &[&str],
    predicates: Vec<Expr>,
) -> Result<Operator> {
    build_scan_select(db, table, output_columns, predicates, true)
}

fn build_scan_select(
    db: &Database,
    table: &str,
    output_columns: &[&str],
    predicates: Vec<Expr>,
    simd: bool,
) -> Result<Operator> {
    let t = db.get(table)?;
    let mut scan_schema = OperatorSchema::new();
    scan_schema.add_generated_columns(t)?;

    let mut output = OperatorSchema::new();
    for name in output_columns {
        let idx = scan_schema.column_index(name)?;
        output.add_derived_column(*name, Expr::virtual_column_ref(idx, scan_schema.columns()[idx].expr.ty()))?;
    }

    let inner = ScanSelectOp {
        output,
        scan_schema,
        table: table.to_string(),
        predicates,
    };
    let op = if simd {
        Operator::SimdScanSelect(inner)
    } else {
        Operator::ScanSelect(inner)
    };
    op.validate()?;
    Ok(op)
}

pub fn skinner_scan_select(
    db: &Database,
    table: &str,
    output_columns: &[&str],
    predicates: Vec<Expr>,
    chunk_size: u32,
) -> Result<Operator> {
    let t = db.get(table)?;
    let mut scan_schema = OperatorSchema::new();
    scan_schema.add_generated_columns(t)?;

    let mut output = OperatorSchema::new();
    for name in output_columns {
        let idx = scan_schema.column_index(name)?;
        output.add_derived_column(*name, Expr::virtual_column_ref(idx, scan_schema.columns()[idx].expr.ty()))?;
    }

    let op = Operator::SkinnerScanSelect(SkinnerScanSelectOp {
        output,
        scan_schema,
        table: table.to_string(),
        predicates,
        chunk_size,
    });
    op.validate()?;
    Ok(op)
}

/// `Select(child, predicate)`: passes every child column through unchanged
/// (spec.md §4.3's Select is the generic single-predicate filter sibling of
/// `ScanSelect`).
pub fn select(child: Operator, predicate: Expr) -> Result<Operator> {
    let mut schema = OperatorSchema::new();
    schema.add_passthrough_columns(child.schema(), 0)?;
    let op = Operator::Select(SelectOp {
        schema,
        child: Box::new(child),
        predicate,
    });
    op.validate()?;
    Ok(op)
}

/// `HashJoin(left, right, left_keys, right_keys)` (spec.md §4.4). Output
/// schema is `left`'s columns followed by `right`'s.
pub fn hash_join(
    left: Operator,
    right: Operator,
    left_keys: Vec<Expr>,
    right_keys: Vec<Expr>,
) -> Result<Operator> {
    let mut schema = OperatorSchema::new();
    schema.add_passthrough_columns(left.schema(), 0)?;
    schema.add_passthrough_columns(right.schema(), 1)?;
    let op = Operator::HashJoin(HashJoinOp {
        schema,
        left: Box::new(left),
        right: Box::new(right),
        left_keys,
        right_keys,
    });
    op.validate()?;
    Ok(op)
}

/// `CrossProduct(left, right)` (spec.md §4.5).
pub fn cross_product(left: Operator, right: Operator) -> Result<Operator> {
    let mut schema = OperatorSchema::new();
    schema.add_passthrough_columns(left.schema(), 0)?;
    schema.add_passthrough_columns(right.schema(), 1)?;
    let op = Operator::CrossProduct(CrossProductOp {
        schema,
        left: Box::new(left),
        right: Box::new(right),
    });
    op.validate()?;
    Ok(op)
}

/// `SkinnerJoin(children, predicates)` (spec.md §4.6). Output schema unions
/// every relation's columns in order.
pub fn skinner_join(
    children: Vec<Operator>,
    predicates: Vec<Expr>,
    budget_per_episode: u32,
    mode: SkinnerMode,
) -> Result<Operator> {
    let mut schema = OperatorSchema::new();
    for (i, child) in children.iter().enumerate() {
        schema.add_passthrough_columns(child.schema(), i)?;
    }
    let op = Operator::SkinnerJoin(SkinnerJoinOp {
        schema,
        children: children.into_iter().map(Box::new).collect(),
        predicates,
        budget_per_episode,
        mode,
    });
    op.validate()?;
    Ok(op)
}

/// `GroupByAggregate(child, group_exprs, (name, kind, expr)*)` (spec.md
/// §4.7). The output schema is `(group columns..., agg columns...)` in that
/// order, each a `VirtualColumnRef` into that same local layout (mirroring
/// `AddVirtualPassthroughColumns` in the reference implementation).
pub fn group_by_aggregate(
    child: Operator,
    group_by: Vec<(&str, Expr)>,
    aggs: Vec<(&str, AggregateKind, Expr)>,
) -> Result<Operator> {
    let mut group_exprs = Vec::with_capacity(group_by.len());
    let mut agg_exprs = Vec::with_capacity(aggs.len());
    let mut schema = OperatorSchema::new();

    for (name, expr) in group_by {
        let idx = group_exprs.len();
        schema.add_derived_column(name, Expr::virtual_column_ref(idx, expr.ty()))?;
        group_exprs.push(expr);
    }
    let base = group_exprs.len();
    for (name, kind, expr) in aggs {
        let agg = Expr::aggregate(kind, expr)?;
        let idx = base + agg_exprs.len();
        schema.add_derived_column(name, Expr::virtual_column_ref(idx, agg.ty()))?;
        agg_exprs.push(agg);
    }

    let op = Operator::GroupByAggregate(GroupByAggregateOp {
        schema,
        child: Box::new(child),
        group_exprs,
        agg_exprs,
    });
    op.validate()?;
    Ok(op)
}

/// `Aggregate(child, (name, kind, expr)*)` (spec.md §4.7: "Empty
/// `group_exprs` collapses to a single cell -- this is what the distinct
/// `Aggregate` operator expresses").
pub fn aggregate(child: Operator, aggs: Vec<(&str, AggregateKind, Expr)>) -> Result<Operator> {
    let mut agg_exprs = Vec::with_capacity(aggs.len());
    let mut schema = OperatorSchema::new();
    for (name, kind, expr) in aggs {
        let agg = Expr::aggregate(kind, expr)?;
        let idx = agg_exprs.len();
        schema.add_derived_column(name, Expr::virtual_column_ref(idx, agg.ty()))?;
        agg_exprs.push(agg);
    }
    let op = Operator::Aggregate(AggregateOp {
        schema,
        child: Box::new(child),
        agg_exprs,
    });
    op.validate()?;
    Ok(op)
}

/// `OrderBy(child, (key_expr, ascending)*)` (spec.md §4.8).
pub fn order_by(child: Operator, keys: Vec<(Expr, bool)>) -> Result<Operator> {
    let mut schema = OperatorSchema::new();
    schema.add_passthrough_columns(child.schema(), 0)?;
    let keys = keys
        .into_iter()
        .map(|(e, asc)| (e, if asc { SortOrder::Asc } else { SortOrder::Desc }))
        .collect();
    let op = Operator::OrderBy(OrderByOp {
        schema,
        child: Box::new(child),
        keys,
    });
    op.validate()?;
    Ok(op)
}

/// `Output(child)` (spec.md §4.9): passes every child column through
/// unchanged; formatting happens in the executor, not the plan.
pub fn output(child: Operator) -> Result<Operator> {
    let mut schema = OperatorSchema::new();
    schema.add_passthrough_columns(child.schema(), 0)?;
    let op = Operator::Output(OutputOp {
        schema,
        child: Box::new(child),
    });
    op.validate()?;
    Ok(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kepler_catalog::{Column, Table};

    fn db_with_orders() -> Database {
        let mut db = Database::new();
        let t = db.insert("orders");
        t.insert(Column::new("o_orderkey", Type::int(false), "o_orderkey.kdb"));
        t.insert(Column::new("o_totalprice", Type::real(false), "o_totalprice.kdb"));
        db
    }

    #[test]
    fn scan_schema_matches_table_order() {
        let db = db_with_orders();
        let op = scan(&db, "orders").unwrap();
        assert_eq!(op.schema().len(), 2);
        assert_eq!(op.schema().column_index("o_totalprice").unwrap(), 1);
    }

    #[test]
    fn select_passes_through_child_schema() {
        let db = db_with_orders();
        let scan_op = scan(&db, "orders").unwrap();
        let pred = gt(
            col_ref(0, 1, Type::real(false)),
            lit(Value::Real(0.0)),
        )
        .unwrap();
        let op = select(scan_op, pred).unwrap();
        assert_eq!(op.schema().len(), 2);
    }

    #[test]
    fn hash_join_unions_schemas_left_then_right() {
        let db = db_with_orders();
        let l = scan(&db, "orders").unwrap();
        let r = scan(&db, "orders").unwrap();
        let keys_l = vec![col_ref(0, 0, Type::int(false))];
        let keys_r = vec![col_ref(0, 0, Type::int(false))];
        let op = hash_join(l, r, keys_l, keys_r).unwrap();
        assert_eq!(op.schema().len(), 4);
    }

    #[test]
    fn group_by_schema_is_keys_then_aggs() {
        let db = db_with_orders();
        let s = scan(&db, "orders").unwrap();
        let op = group_by_aggregate(
            s,
            vec![("o_orderkey", col_ref(0, 0, Type::int(false)))],
            vec![("total", AggregateKind::Sum, col_ref(0, 1, Type::real(false)))],
        )
        .unwrap();
        assert_eq!(op.schema().len(), 2);
        assert_eq!(op.schema().column_index("total").unwrap(), 1);
    }
}
