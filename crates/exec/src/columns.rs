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

//! Opens the physical columns a `scan_schema` names and reads them back as
//! rows. Shared by [`crate::scan`] and [`crate::skinner_scan`] -- both read
//! the same `(ColumnData, Option<NullBitmap>)` pairs, just in a different
//! tuple-id order.

use std::sync::Arc;

use kepler_catalog::Table;
use kepler_common::Result;
use kepler_expr::Value;
use kepler_join::Row;
use kepler_plan::OperatorSchema;
use kepler_runtime::{ColumnData, ColumnValue, FileManager, NullBitmap};

pub struct OpenedColumns {
    columns: Vec<Arc<ColumnData>>,
    nulls: Vec<Option<Arc<NullBitmap>>>,
    size: u32,
}

impl OpenedColumns {
    /// Opens every physical column named by `schema` against `table`, in
    /// schema order. `schema` is expected to be a `scan_schema` built by
    /// `OperatorSchema::add_generated_columns`, so position `i` corresponds
    /// 1:1 with `table`'s `i`-th catalog column.
    pub fn open(table: &Table, schema: &OperatorSchema, files: &FileManager) -> Result<Self> {
        let mut columns = Vec::with_capacity(schema.len());
        let mut nulls = Vec::with_capacity(schema.len());
        let mut size: u32 = 0;
        for column in schema.columns() {
            let catalog_column = table.get(&column.name)?;
            let handle = files.open_column(&catalog_column.data_path, catalog_column.ty.type_id)?;
            size = size.max(handle.size());
            let null_handle = match &catalog_column.null_path {
                Some(path) => Some(files.open_null_bitmap(path)?),
                None => None,
            };
            columns.push(handle);
            nulls.push(null_handle);
        }
        Ok(OpenedColumns { columns, nulls, size })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn column(&self, idx: usize) -> &Arc<ColumnData> {
        &self.columns[idx]
    }

    /// Materializes the row at `tuple_id`, resolving null bitmaps first
    /// (spec.md §3: a column's null bitmap, if present, takes precedence
    /// over whatever the data file happens to hold at that slot).
    pub fn get_row(&self, tuple_id: u32) -> Result<Row> {
        let mut row = Vec::with_capacity(self.columns.len());
        for (column, null) in self.columns.iter().zip(self.nulls.iter()) {
            let is_null = null.as_ref().map(|n| n.is_null(tuple_id)).unwrap_or(false);
            if is_null {
                row.push(None);
            } else {
                row.push(Some(to_value(column.get(tuple_id)?)));
            }
        }
        Ok(row)
    }
}

fn to_value(cv: ColumnValue<'_>) -> Value {
    match cv {
        ColumnValue::SmallInt(v) => Value::SmallInt(v),
        ColumnValue::Int(v) => Value::Int(v),
        ColumnValue::BigInt(v) => Value::BigInt(v),
        ColumnValue::Real(v) => Value::Real(v),
        ColumnValue::Date(v) => Value::Date(v),
        ColumnValue::Text(s) => Value::Text(s.to_string()),
        ColumnValue::Boolean(v) => Value::Boolean(v),
        ColumnValue::Enum(v) => Value::Enum(v),
    }
}
