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

//! `Scan` and `ScanSelect`/`SIMDScanSelect` (spec.md §4.3). `SIMDScanSelect`'s
//! 256-bit lane codegen belongs to the out-of-scope native backend
//! (SPEC_FULL.md §D); here it shares `ScanSelectIter` with `ScanSelect`
//! verbatim.

use kepler_catalog::Table;
use kepler_common::Result;
use kepler_expr::Expr;
use kepler_join::{Row, RowSource, SingleRowBindings};
use kepler_plan::{ScanOp, ScanSelectOp};
use kepler_plan::scan_select::rewrite_indexed_equalities;
use kepler_runtime::{ColumnIndex, EnumManager, IndexKey};

use crate::columns::OpenedColumns;
use crate::context::ExecutionContext;

pub struct ScanIter {
    opened: OpenedColumns,
    next: u32,
}

impl ScanIter {
    pub fn new(ctx: &ExecutionContext<'_>, op: &ScanOp) -> Result<Self> {
        let table = ctx.db.get(&op.table)?;
        let opened = OpenedColumns::open(table, &op.schema, ctx.files)?;
        Ok(ScanIter { opened, next: 0 })
    }
}

impl RowSource for ScanIter {
    fn next_row(&mut self) -> Result<Option<Row>> {
        if self.next >= self.opened.size() {
            return Ok(None);
        }
        let row = self.opened.get_row(self.next)?;
        self.next += 1;
        Ok(Some(row))
    }
}

/// Where candidate tuple ids come from: every tuple in declared order, or a
/// seek over one indexed equality (spec.md §4.3 point 2).
enum Cursor {
    FullScan { next: u32 },
    Indexed {
        index: std::sync::Arc<ColumnIndex>,
        key: IndexKey,
        prev: i32,
    },
}

pub struct ScanSelectIter<'a> {
    opened: OpenedColumns,
    predicates: Vec<Expr>,
    output_map: Vec<usize>,
    enums: &'a EnumManager,
    cursor: Cursor,
}

impl<'a> ScanSelectIter<'a> {
    pub fn new(ctx: &ExecutionContext<'a>, op: &ScanSelectOp) -> Result<Self> {
        let table = ctx.db.get(&op.table)?;
        let opened = OpenedColumns::open(table, &op.scan_schema, ctx.files)?;
        let output_map = output_map(op.output.columns());

        let plan = rewrite_indexed_equalities(op, table);
        let cursor = match plan.indexed_equalities.first() {
            Some(equality) => {
                let column = &op.scan_schema.columns()[equality.column_idx];
                let catalog_column = table.get(&column.name)?;
                let index_path = catalog_column
                    .index_path
                    .as_ref()
                    .expect("rewrite only selects columns with an index_path");
                let index = ctx.files.open_index(index_path, column.expr.ty().type_id, opened.size())?;
                Cursor::Indexed {
                    index,
                    key: equality.key.clone(),
                    prev: -1,
                }
            }
            None => Cursor::FullScan { next: 0 },
        };

        Ok(ScanSelectIter {
            opened,
            predicates: op.predicates.clone(),
            output_map,
            enums: ctx.enums,
            cursor,
        })
    }
}

/// Every output column is a `VirtualColumnRef` into `scan_schema` (builder
/// invariant); this reads off the position it refers to.
fn output_map(columns: &[kepler_plan::SchemaColumn]) -> Vec<usize> {
    columns
        .iter()
        .map(|c| match &c.expr {
            Expr::VirtualColumnRef { column_idx, .. } => *column_idx,
            other => unreachable!("ScanSelect output column is not a virtual ref: {other:?}"),
        })
        .collect()
}

impl RowSource for ScanSelectIter<'_> {
    fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            let tuple_id = match &mut self.cursor {
                Cursor::FullScan { next } => {
                    if *next >= self.opened.size() {
                        return Ok(None);
                    }
                    let id = *next;
                    *next += 1;
                    id
                }
                Cursor::Indexed { index, key, prev } => {
                    let candidate = index.get_next_tuple(key, *prev);
                    if candidate as u32 >= self.opened.size() {
                        return Ok(None);
                    }
                    *prev = candidate;
                    candidate as u32
                }
            };

            let row = self.opened.get_row(tuple_id)?;
            let bindings = SingleRowBindings::new(&row);
            let mut passes = true;
            for predicate in &self.predicates {
                match predicate.evaluate(&bindings, self.enums)?.and_then(|v| v.as_bool()) {
                    Some(true) => {}
                    _ => {
                        passes = false;
                        break;
                    }
                }
            }
            if passes {
                let out = self.output_map.iter().map(|&i| row[i].clone()).collect();
                return Ok(Some(out));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kepler_catalog::{Column, Database, Type};
    use kepler_plan::builder::{eq, lit, scan_select, virt_ref};
    use kepler_runtime::builder::{ColumnDataBuilder, ColumnIndexBuilder, Scalar};
    use kepler_runtime::FileManager;

    fn build_orders(dir: &std::path::Path) -> Database {
        let key_path = dir.join("o_orderkey.kdb");
        let price_path = dir.join("o_totalprice.kdb");
        let index_path = dir.join("o_orderkey.kdbindex");
        ColumnDataBuilder::write_fixed(
            &key_path,
            &[Scalar::Int(1), Scalar::Int(2), Scalar::Int(2), Scalar::Int(3)],
        )
        .unwrap();
        ColumnDataBuilder::write_fixed(
            &price_path,
            &[
                Scalar::Real(10.0),
                Scalar::Real(20.0),
                Scalar::Real(30.0),
                Scalar::Real(40.0),
            ],
        )
        .unwrap();
        ColumnIndexBuilder::write_int(&index_path, &[(1, vec![0]), (2, vec![1, 2]), (3, vec![3])]).unwrap();

        let mut db = Database::new();
        let t = db.insert("orders");
        t.insert(
            Column::new("o_orderkey", Type::int(false), key_path.to_str().unwrap())
                .with_index_path(index_path.to_str().unwrap()),
        );
        t.insert(Column::new(
            "o_totalprice",
            Type::real(false),
            price_path.to_str().unwrap(),
        ));
        db
    }

    #[test]
    fn indexed_equality_only_visits_matching_tuples() {
        let dir = tempfile::tempdir().unwrap();
        let db = build_orders(dir.path());
        let files = FileManager::new();
        let enums = EnumManager::new();
        let ctx = ExecutionContext::new(&db, &files, &enums, crate::config::EngineConfig::default());

        let predicate = eq(virt_ref(0, Type::int(false)), lit(kepler_expr::Value::Int(2))).unwrap();
        let op = scan_select(&db, "orders", &["o_orderkey", "o_totalprice"], vec![predicate]).unwrap();
        let kepler_plan::Operator::ScanSelect(inner) = &op else {
            unreachable!()
        };
        let mut iter = ScanSelectIter::new(&ctx, inner).unwrap();
        let mut rows = Vec::new();
        while let Some(row) = iter.next_row().unwrap() {
            rows.push(row);
        }
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row[0], Some(kepler_expr::Value::Int(2)));
        }
    }

    #[test]
    fn unindexed_predicate_falls_back_to_full_scan() {
        let dir = tempfile::tempdir().unwrap();
        let db = build_orders(dir.path());
        let files = FileManager::new();
        let enums = EnumManager::new();
        let ctx = ExecutionContext::new(&db, &files, &enums, crate::config::EngineConfig::default());

        let predicate = eq(
            virt_ref(1, Type::real(false)),
            lit(kepler_expr::Value::Real(30.0)),
        )
        .unwrap();
        let op = scan_select(&db, "orders", &["o_orderkey", "o_totalprice"], vec![predicate]).unwrap();
        let kepler_plan::Operator::ScanSelect(inner) = &op else {
            unreachable!()
        };
        let mut iter = ScanSelectIter::new(&ctx, inner).unwrap();
        let mut rows = Vec::new();
        while let Some(row) = iter.next_row().unwrap() {
            rows.push(row);
        }
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], Some(kepler_expr::Value::Int(2)));
    }
}
