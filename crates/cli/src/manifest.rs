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

//! Loads a [`Database`] from a small JSON manifest describing tables and
//! their column files. The loader programs that produce the column/index
//! files themselves (TPC-H/JCC-H/JOB) are out of scope (spec.md §1); this
//! only resolves a manifest's path strings into a [`kepler_catalog::Database`]
//! the way `benchmark/tpch1/schema.h` resolves the catalog for a loaded
//! TPC-H scale factor, minus the C++ macro boilerplate.

use std::fs;
use std::path::Path;

use kepler_catalog::{Column, Database, Type, TypeId};
use kepler_common::{KeplerError, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ManifestColumn {
    name: String,
    #[serde(rename = "type")]
    type_id: String,
    nullable: Option<bool>,
    enum_id: Option<i32>,
    data_path: String,
    null_path: Option<String>,
    index_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ManifestTable {
    name: String,
    columns: Vec<ManifestColumn>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    tables: Vec<ManifestTable>,
}

fn parse_type_id(s: &str) -> Result<TypeId> {
    match s.to_ascii_uppercase().as_str() {
        "SMALLINT" => Ok(TypeId::SmallInt),
        "INT" => Ok(TypeId::Int),
        "BIGINT" => Ok(TypeId::BigInt),
        "REAL" => Ok(TypeId::Real),
        "DATE" => Ok(TypeId::Date),
        "TEXT" => Ok(TypeId::Text),
        "BOOLEAN" => Ok(TypeId::Boolean),
        "ENUM" => Ok(TypeId::Enum),
        other => Err(KeplerError::type_mismatch(format!("unknown column type '{other}' in catalog manifest"))),
    }
}

/// Reads and resolves `path` into a [`Database`]. Column/index paths in the
/// manifest are resolved relative to the manifest's own directory so a
/// manifest and its data files can be moved together.
pub fn load(path: impl AsRef<Path>) -> Result<Database> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|_| KeplerError::resource_missing(path.display()))?;
    let manifest: Manifest = serde_json::from_str(&text)
        .map_err(|e| KeplerError::corrupt(format!("malformed catalog manifest: {e}")))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut db = Database::new();
    for table in manifest.tables {
        let t = db.insert(table.name);
        for col in table.columns {
            let type_id = parse_type_id(&col.type_id)?;
            let ty = Type {
                type_id,
                enum_id: col.enum_id.unwrap_or(0),
                nullable: col.nullable.unwrap_or(false),
            };
            let mut column = Column::new(col.name, ty, resolve(base, &col.data_path));
            if let Some(p) = col.null_path {
                column = column.with_null_path(resolve(base, &p));
            }
            if let Some(p) = col.index_path {
                column = column.with_index_path(resolve(base, &p));
            }
            t.insert(column);
        }
    }
    Ok(db)
}

fn resolve(base: &Path, p: &str) -> String {
    let candidate = Path::new(p);
    if candidate.is_absolute() {
        p.to_string()
    } else {
        base.join(candidate).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_two_column_table() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("x.kdb");
        std::fs::write(&data_path, []).unwrap();
        let manifest_path = dir.path().join("catalog.json");
        let mut f = fs::File::create(&manifest_path).unwrap();
        write!(
            f,
            r#"{{"tables":[{{"name":"t","columns":[{{"name":"x","type":"int","data_path":"x.kdb"}}]}}]}}"#
        )
        .unwrap();
        drop(f);

        let db = load(&manifest_path).unwrap();
        let table = db.get("t").unwrap();
        let col = table.get("x").unwrap();
        assert_eq!(col.ty.type_id, TypeId::Int);
        assert!(col.data_path.ends_with("x.kdb"));
    }
}
