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

//! Named, ordered operator output columns (spec.md §3, "Operator schema").
//! Grounded on `plan/operator/operator_schema.cc`'s `AddGeneratedColumns` /
//! `AddPassthroughColumns` / `AddDerivedColumn` / `AddVirtualPassthroughColumns`
//! quartet; ported with one deliberate simplification recorded in
//! `DESIGN.md`: leaf operators express their own row via `VirtualColumnRef`
//! instead of the original's `ColumnRef(0, idx)` self-reference, since a leaf
//! genuinely has no child at index 0.

use indexmap::IndexMap;
use kepler_catalog::Table;
use kepler_common::{KeplerError, Result};
use kepler_expr::Expr;

/// One named output column: a position, a name, and the expression that
/// produces it.
#[derive(Debug, Clone)]
pub struct SchemaColumn {
    pub name: String,
    pub expr: Expr,
}

/// Ordered `(name, Expr)` list plus a name -> position map (spec.md §3).
/// Immutable once an operator is constructed; building one incrementally via
/// `add_*` is how operator constructors populate it.
#[derive(Debug, Clone, Default)]
pub struct OperatorSchema {
    columns: Vec<SchemaColumn>,
    name_to_idx: IndexMap<String, usize>,
}

impl OperatorSchema {
    pub fn new() -> Self {
        OperatorSchema::default()
    }

    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.name_to_idx
            .get(name)
            .copied()
            .ok_or_else(|| KeplerError::type_mismatch(format!("no column named {name} in schema")))
    }

    /// Appends one column under `name` computed by `expr` (spec.md §2:
    /// "Operator Schema ... provides ... `AddDerivedColumn`").
    pub fn add_derived_column(&mut self, name: impl Into<String>, expr: Expr) -> Result<()> {
        let name = name.into();
        if self.name_to_idx.contains_key(&name) {
            return Err(KeplerError::type_mismatch(format!(
                "duplicate column name {name} in schema"
            )));
        }
        let idx = self.columns.len();
        self.name_to_idx.insert(name.clone(), idx);
        self.columns.push(SchemaColumn { name, expr });
        Ok(())
    }

    /// Appends one column per catalog column of `table`, each reading the
    /// physical row at the appended position via `VirtualColumnRef` (spec.md
    /// §2: "`AddGeneratedColumns` (from a catalog table)"). Used by `Scan`
    /// and by `ScanSelect`'s `scan_schema`.
    pub fn add_generated_columns(&mut self, table: &Table) -> Result<()> {
        for column in table.columns() {
            let idx = self.columns.len();
            self.add_derived_column(
                column.name.clone(),
                Expr::virtual_column_ref(idx, column.ty),
            )?;
        }
        Ok(())
    }

    /// Re-expresses every column of `child` as a `ColumnRef(child_idx, i)`
    /// (spec.md §2: "`AddPassthroughColumns`"). Used by `Select`, `OrderBy`,
    /// `Output`, and the join operators to union their children's schemas.
    pub fn add_passthrough_columns(&mut self, child: &OperatorSchema, child_idx: usize) -> Result<()> {
        for (i, col) in child.columns().iter().enumerate() {
            let ty = col.expr.ty();
            self.add_derived_column(col.name.clone(), Expr::column_ref(child_idx, i, ty))?;
        }
        Ok(())
    }

    /// Re-expresses every column of `local` as a `VirtualColumnRef` against
    /// that same local schema's positions (spec.md §2:
    /// "`AddVirtualPassthroughColumns`"). Used by `GroupByAggregate`'s output
    /// to surface its locally materialized `(group keys..., agg results...)`
    /// row.
    pub fn add_virtual_passthrough_columns(&mut self, local: &OperatorSchema) -> Result<()> {
        for (i, col) in local.columns().iter().enumerate() {
            let ty = col.expr.ty();
            self.add_derived_column(col.name.clone(), Expr::virtual_column_ref(i, ty))?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "columns": self.columns.iter().map(|c| serde_json::json!({
                "name": c.name,
                "value": c.expr.to_json(),
            })).collect::<Vec<_>>()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kepler_catalog::{Column, Table, Type};

    fn lineitem() -> Table {
        let mut t = Table::new("lineitem");
        t.insert(Column::new("l_quantity", Type::real(false), "l_quantity.kdb"));
        t.insert(Column::new("l_discount", Type::real(true), "l_discount.kdb"));
        t
    }

    #[test]
    fn generated_columns_are_virtual_refs_in_table_order() {
        let mut schema = OperatorSchema::new();
        schema.add_generated_columns(&lineitem()).unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.column_index("l_discount").unwrap(), 1);
        match &schema.columns()[1].expr {
            Expr::VirtualColumnRef { column_idx, ty } => {
                assert_eq!(*column_idx, 1);
                assert!(ty.nullable);
            }
            other => panic!("expected VirtualColumnRef, got {other:?}"),
        }
    }

    #[test]
    fn passthrough_columns_reference_child_by_index() {
        let mut child = OperatorSchema::new();
        child.add_generated_columns(&lineitem()).unwrap();

        let mut parent = OperatorSchema::new();
        parent.add_passthrough_columns(&child, 0).unwrap();
        match &parent.columns()[0].expr {
            Expr::ColumnRef { child_idx, column_idx, .. } => {
                assert_eq!(*child_idx, 0);
                assert_eq!(*column_idx, 0);
            }
            other => panic!("expected ColumnRef, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut schema = OperatorSchema::new();
        schema.add_generated_columns(&lineitem()).unwrap();
        assert!(schema.add_generated_columns(&lineitem()).is_err());
    }
}
