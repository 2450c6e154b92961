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

//! Named operator-tree programs `kepler-cli` can run, standing in for the
//! individually-compiled `benchmark/*/queries/q*.cc` executables in the
//! reference implementation (spec.md §1: plans are constructed
//! programmatically, not parsed from SQL, so each "query" is a Rust
//! function building an [`Operator`] rather than a string).

use kepler_catalog::{Database, Type};
use kepler_common::{KeplerError, Result};
use kepler_expr::{AggregateKind, BinaryOp, Expr, Value};
use kepler_plan::builder::*;
use kepler_plan::{Operator, SkinnerMode};

/// Every name `kepler --query <name>` accepts.
pub const NAMES: &[&str] = &[
    "scalar_agg",
    "group_order",
    "hash_join",
    "skinner4",
    "date_extract",
    "null_agg",
];

pub fn build(name: &str, db: &Database, budget_per_episode: u32, skinner_mode: SkinnerMode) -> Result<Operator> {
    match name {
        "scalar_agg" => scalar_agg(db),
        "group_order" => group_order(db),
        "hash_join" => hash_join_demo(db),
        "skinner4" => skinner4(db, budget_per_episode, skinner_mode),
        "date_extract" => date_extract(db),
        "null_agg" => null_agg(db),
        other => Err(KeplerError::type_mismatch(format!(
            "unknown query '{other}'; known queries: {}",
            NAMES.join(", ")
        ))),
    }
}

/// spec.md §8 scenario 1: `SUM(l_extendedprice * (1 - l_discount))`.
fn scalar_agg(db: &Database) -> Result<Operator> {
    let child = scan(db, "lineitem")?;
    let price = col_ref(0, 1, Type::real(false));
    let discount = col_ref(0, 2, Type::real(false));
    let one_minus_discount = Expr::arith(BinaryOp::Sub, lit(Value::Real(1.0)), discount)?;
    let extended = Expr::arith(BinaryOp::Mul, price, one_minus_discount)?;
    let op = aggregate(child, vec![("total", AggregateKind::Sum, extended)])?;
    output(op)
}

/// spec.md §8 scenario 2: group by `returnflag`, sum `qty`, ordered by the
/// key ascending.
fn group_order(db: &Database) -> Result<Operator> {
    let child = scan(db, "returns")?;
    let grouped = group_by_aggregate(
        child,
        vec![("returnflag", col_ref(0, 0, Type::text(false)))],
        vec![("qty_sum", AggregateKind::Sum, col_ref(0, 1, Type::int(false)))],
    )?;
    let ordered = order_by(grouped, vec![(col_ref(0, 0, Type::text(false)), true)])?;
    output(ordered)
}

/// spec.md §8 scenario 3: equi hash join on `id`.
fn hash_join_demo(db: &Database) -> Result<Operator> {
    let left = scan(db, "left_ids")?;
    let right = scan(db, "right_ids")?;
    let op = hash_join(
        left,
        right,
        vec![col_ref(0, 0, Type::int(false))],
        vec![col_ref(0, 0, Type::int(false))],
    )?;
    output(op)
}

/// spec.md §8 scenario 4: adaptive 4-way equi-join, diagonal of matching
/// ids across `info0..info3`.
fn skinner4(db: &Database, budget_per_episode: u32, mode: SkinnerMode) -> Result<Operator> {
    let mut children = Vec::with_capacity(4);
    for i in 0..4 {
        children.push(scan(db, &format!("info{i}"))?);
    }
    let predicates = vec![
        eq(col_ref(0, 0, Type::int(false)), col_ref(1, 0, Type::int(false)))?,
        eq(col_ref(1, 0, Type::int(false)), col_ref(2, 0, Type::int(false)))?,
        eq(col_ref(1, 0, Type::int(false)), col_ref(3, 0, Type::int(false)))?,
    ];
    let op = skinner_join(children, predicates, budget_per_episode, mode)?;
    output(op)
}

/// spec.md §8 scenario 5: date range predicate plus `Extract(YEAR, ...)`.
fn date_extract(db: &Database) -> Result<Operator> {
    let t = db.get("orders_date")?;
    let mut scan_schema = kepler_plan::OperatorSchema::new();
    scan_schema.add_generated_columns(t)?;

    let date_idx = scan_schema.column_index("o_orderdate")?;
    let date_ty = scan_schema.columns()[date_idx].expr.ty();

    let predicate = conjunction(vec![
        geq(virt_ref(date_idx, date_ty), lit(Value::Date(epoch_millis(1993, 5, 1))))?,
        lt(virt_ref(date_idx, date_ty), lit(Value::Date(epoch_millis(1993, 6, 1))))?,
    ])?;

    let mut output_schema = kepler_plan::OperatorSchema::new();
    for name in ["o_orderdate", "o_discount", "o_extprice"] {
        let idx = scan_schema.column_index(name)?;
        output_schema.add_derived_column(name, Expr::virtual_column_ref(idx, scan_schema.columns()[idx].expr.ty()))?;
    }
    let year_expr = Expr::extract_year(virt_ref(date_idx, date_ty))?;
    output_schema.add_derived_column("o_year", year_expr)?;

    let scan_select_op = Operator::ScanSelect(kepler_plan::ScanSelectOp {
        output: output_schema,
        scan_schema,
        table: "orders_date".to_string(),
        predicates: vec![predicate],
    });
    output(scan_select_op)
}

fn epoch_millis(year: i32, month: u32, day: u32) -> i64 {
    use chrono::{NaiveDate, TimeZone, Utc};
    let date = NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date");
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()).timestamp_millis()
}

/// spec.md §8 scenario 6: null-skipping `SUM`/`AVG`/`MIN`/`MAX`/`COUNT`.
fn null_agg(db: &Database) -> Result<Operator> {
    let child = scan(db, "scored")?;
    let zscore = col_ref(0, 0, Type::real(true));
    let op = aggregate(
        child,
        vec![
            ("z_sum", AggregateKind::Sum, zscore.clone()),
            ("z_avg", AggregateKind::Avg, zscore.clone()),
            ("z_min", AggregateKind::Min, zscore.clone()),
            ("z_max", AggregateKind::Max, zscore.clone()),
            ("row_count", AggregateKind::Count, lit(Value::Boolean(true))),
            ("z_count", AggregateKind::Count, zscore),
        ],
    )?;
    output(op)
}
