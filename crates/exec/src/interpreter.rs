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

//! Ties every [`kepler_plan::Operator`] variant to the `RowSource` that
//! executes it -- this crate's core interpretation loop. There is no
//! compiled "lowering" here: each variant becomes a pull-based iterator
//! built recursively over its children, matching the single-threaded
//! cooperative model of spec.md §5.

use kepler_common::Result;
use kepler_join::{RowSource, VecRowSource};
use kepler_plan::Operator;

use crate::aggregate;
use crate::context::ExecutionContext;
use crate::join_exec;
use crate::order_by;
use crate::output;
use crate::scan::{ScanIter, ScanSelectIter};
use crate::select::SelectIter;
use crate::skinner_scan::SkinnerScanIter;

/// Builds the `RowSource` for `op`, recursing into children first. Join and
/// aggregate adapters drain their children eagerly (see `join_exec` and
/// `aggregate`'s module docs); scans, selects and order-by stream or buffer
/// as spec.md §4 describes per operator.
pub fn build_row_source<'a>(op: &'a Operator, ctx: &ExecutionContext<'a>) -> Result<Box<dyn RowSource + 'a>> {
    match op {
        Operator::Scan(inner) => Ok(Box::new(ScanIter::new(ctx, inner)?)),
        Operator::ScanSelect(inner) | Operator::SimdScanSelect(inner) => {
            Ok(Box::new(ScanSelectIter::new(ctx, inner)?))
        }
        Operator::SkinnerScanSelect(inner) => Ok(Box::new(SkinnerScanIter::new(ctx, inner)?)),
        Operator::Select(inner) => {
            let child = build_row_source(&inner.child, ctx)?;
            Ok(Box::new(SelectIter::new(child, inner.predicate.clone(), ctx.enums)))
        }
        Operator::HashJoin(inner) => {
            let left = build_row_source(&inner.left, ctx)?;
            let right = build_row_source(&inner.right, ctx)?;
            Ok(Box::new(join_exec::hash_join(inner, left, right, ctx.enums)?))
        }
        Operator::CrossProduct(inner) => {
            let left = build_row_source(&inner.left, ctx)?;
            let right = build_row_source(&inner.right, ctx)?;
            Ok(Box::new(join_exec::cross_product(inner, left, right)?))
        }
        Operator::SkinnerJoin(inner) => {
            let mut children = Vec::with_capacity(inner.children.len());
            for child in &inner.children {
                children.push(build_row_source(child, ctx)?);
            }
            Ok(Box::new(join_exec::skinner_join(inner, children, ctx.enums, ctx.config.skinner_seed)?))
        }
        Operator::GroupByAggregate(inner) => {
            let child = build_row_source(&inner.child, ctx)?;
            let rows = aggregate::group_by_aggregate(inner, child, ctx.enums)?;
            Ok(Box::new(VecRowSource::new(rows)))
        }
        Operator::Aggregate(inner) => {
            let child = build_row_source(&inner.child, ctx)?;
            let rows = aggregate::aggregate(inner, child, ctx.enums)?;
            Ok(Box::new(VecRowSource::new(rows)))
        }
        Operator::OrderBy(inner) => {
            let child = build_row_source(&inner.child, ctx)?;
            let rows = order_by::order_by(child, &inner.keys, ctx.enums)?;
            Ok(Box::new(VecRowSource::new(rows)))
        }
        Operator::Output(inner) => build_row_source(&inner.child, ctx),
    }
}

/// Runs `op` to completion and renders it as spec.md §4.9 text. `op`'s root
/// must be an `Output` node -- that's where the formatting schema comes
/// from; every other root still executes but is not a defined query result.
pub fn execute_to_string<'a>(op: &'a Operator, ctx: &ExecutionContext<'a>) -> Result<String> {
    let schema = op.schema();
    let mut source = build_row_source(op, ctx)?;
    let mut out = String::new();
    while let Some(row) = source.next_row()? {
        output::write_row(&mut out, schema, &row, ctx.enums)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kepler_catalog::{Column, Database, Type};
    use kepler_expr::Value;
    use kepler_plan::builder::{eq, lit, output, scan_select, virt_ref};
    use kepler_runtime::builder::{ColumnDataBuilder, Scalar};
    use kepler_runtime::{EnumManager, FileManager};

    #[test]
    fn scan_select_then_output_renders_matching_rows() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("n_nationkey.kdb");
        ColumnDataBuilder::write_fixed(
            &key_path,
            &[Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)],
        )
        .unwrap();

        let mut db = Database::new();
        let t = db.insert("nation");
        t.insert(Column::new("n_nationkey", Type::int(false), key_path.to_str().unwrap()));

        let predicate = eq(virt_ref(0, Type::int(false)), lit(Value::Int(2))).unwrap();
        let plan = scan_select(&db, "nation", &["n_nationkey"], vec![predicate]).unwrap();
        let plan = output(plan).unwrap();

        let files = FileManager::new();
        let enums = EnumManager::new();
        let ctx = ExecutionContext::new(&db, &files, &enums, crate::config::EngineConfig::default());

        let text = execute_to_string(&plan, &ctx).unwrap();
        assert_eq!(text, "2\n");
    }
}
