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

//! `Column` / `Table` / `Database`, grounded on `catalog/catalog.h` in the
//! reference implementation. The C++ version keys tables and columns by
//! `std::unordered_map`, losing insertion order; spec.md §3 requires
//! insertion-ordered lookup, so this port uses `IndexMap` instead.

use indexmap::IndexMap;
use kepler_common::{KeplerError, Result};

use crate::sql_type::Type;

/// `(name, Type, data_path, optional null_path, optional index_path)`
/// (spec.md §3).
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub ty: Type,
    pub data_path: String,
    pub null_path: Option<String>,
    pub index_path: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: Type, data_path: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            ty,
            data_path: data_path.into(),
            null_path: None,
            index_path: None,
        }
    }

    pub fn with_null_path(mut self, path: impl Into<String>) -> Self {
        self.null_path = Some(path.into());
        self
    }

    pub fn with_index_path(mut self, path: impl Into<String>) -> Self {
        self.index_path = Some(path.into());
        self
    }

    pub fn is_indexed(&self) -> bool {
        self.index_path.is_some()
    }
}

/// Insertion-ordered `name -> Column` mapping (spec.md §3).
#[derive(Debug, Clone, Default)]
pub struct Table {
    name: String,
    columns: IndexMap<String, Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            columns: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert(&mut self, column: Column) -> &Column {
        let name = column.name.clone();
        self.columns.insert(name.clone(), column);
        &self.columns[&name]
    }

    pub fn get(&self, name: &str) -> Result<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| KeplerError::resource_missing(format!("column {name}")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Columns in insertion order (spec.md §3: "Insertion-ordered mapping").
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Insertion-ordered `table_name -> Table` mapping (spec.md §3).
#[derive(Debug, Clone, Default)]
pub struct Database {
    tables: IndexMap<String, Table>,
}

impl Database {
    pub fn new() -> Self {
        Database::default()
    }

    /// Inserts a new empty table and returns a mutable handle to populate it,
    /// mirroring `catalog::Database::insert` in the reference implementation.
    pub fn insert(&mut self, name: impl Into<String>) -> &mut Table {
        let name = name.into();
        self.tables.entry(name.clone()).or_insert_with(|| Table::new(name));
        self.tables.get_mut(&name).unwrap()
    }

    pub fn get(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| KeplerError::resource_missing(format!("table {name}")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql_type::Type;

    #[test]
    fn table_lookup_by_name_roundtrips() {
        let mut table = Table::new("lineitem");
        table.insert(Column::new("l_quantity", Type::real(false), "l_quantity.kdb"));
        assert!(table.contains("l_quantity"));
        assert_eq!(table.get("l_quantity").unwrap().name, "l_quantity");
        assert!(table.get("missing").is_err());
    }

    #[test]
    fn database_preserves_insertion_order() {
        let mut db = Database::new();
        db.insert("orders");
        db.insert("customer");
        db.insert("lineitem");
        let names: Vec<&str> = db.tables().map(|t| t.name()).collect();
        assert_eq!(names, vec!["orders", "customer", "lineitem"]);
    }

    #[test]
    fn column_index_path_is_optional() {
        let col = Column::new("o_orderkey", Type::int(false), "o_orderkey.kdb");
        assert!(!col.is_indexed());
        let col = col.with_index_path("o_orderkey.kdbindex");
        assert!(col.is_indexed());
    }
}
