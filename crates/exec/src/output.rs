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

//! Row-to-text rendering for `Output` (spec.md §4.9): one line per row,
//! columns joined by `|`. ENUM columns are not named in spec.md §4.9's
//! per-type table; resolved here to their dictionary string via
//! `EnumManager::get_key` since a raw dictionary id is not meant to be
//! human-facing (see DESIGN.md).

use std::fmt::Write as _;

use chrono::{TimeZone, Utc};
use kepler_catalog::TypeId;
use kepler_common::Result;
use kepler_expr::Value;
use kepler_plan::OperatorSchema;
use kepler_runtime::EnumManager;

/// Formats one row according to its schema's column types, appending it to
/// `out` with a trailing newline.
pub fn write_row(out: &mut String, schema: &OperatorSchema, row: &[Option<Value>], enums: &EnumManager) -> Result<()> {
    for (i, value) in row.iter().enumerate() {
        if i > 0 {
            out.push('|');
        }
        match value {
            None => {}
            Some(v) => write_value(out, schema, i, v, enums)?,
        }
    }
    out.push('\n');
    Ok(())
}

fn write_value(out: &mut String, schema: &OperatorSchema, col: usize, value: &Value, enums: &EnumManager) -> Result<()> {
    match value {
        Value::SmallInt(v) => {
            let _ = write!(out, "{v}");
        }
        Value::Int(v) => {
            let _ = write!(out, "{v}");
        }
        Value::BigInt(v) => {
            let _ = write!(out, "{v}");
        }
        Value::Real(v) => {
            let _ = write!(out, "{v:.3}");
        }
        Value::Date(millis) => {
            let dt = Utc.timestamp_millis_opt(*millis).single().unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap());
            let _ = write!(out, "{}", dt.format("%Y-%m-%d"));
        }
        Value::Text(s) => out.push_str(s),
        Value::Boolean(b) => out.push_str(if *b { "t" } else { "f" }),
        Value::Enum(id) => {
            let ty = schema.columns()[col].expr.ty();
            debug_assert_eq!(ty.type_id, TypeId::Enum);
            out.push_str(enums.get_key(ty.enum_id, *id)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kepler_plan::builder::virt_ref;
    use kepler_catalog::Type;

    fn schema(types: Vec<Type>) -> OperatorSchema {
        let mut schema = OperatorSchema::new();
        for (i, ty) in types.into_iter().enumerate() {
            schema
                .add_derived_column(format!("c{i}"), virt_ref(i, ty))
                .unwrap();
        }
        schema
    }

    #[test]
    fn formats_every_scalar_kind() {
        let schema = schema(vec![
            Type::int(true),
            Type::real(true),
            Type::date(true),
            Type::text(true),
            Type::boolean(true),
        ]);
        let enums = EnumManager::new();
        let row = vec![
            Some(Value::Int(42)),
            Some(Value::Real(3.14159)),
            Some(Value::Date(0)),
            Some(Value::Text("hello".to_string())),
            Some(Value::Boolean(true)),
        ];
        let mut out = String::new();
        write_row(&mut out, &schema, &row, &enums).unwrap();
        assert_eq!(out, "42|3.142|1970-01-01|hello|t\n");
    }

    #[test]
    fn null_renders_as_empty_field() {
        let schema = schema(vec![Type::int(true), Type::int(true)]);
        let enums = EnumManager::new();
        let row = vec![None, Some(Value::Int(7))];
        let mut out = String::new();
        write_row(&mut out, &schema, &row, &enums).unwrap();
        assert_eq!(out, "|7\n");
    }
}
