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

//! Plan-build-time rewrites that need access to the enum dictionaries
//! (spec.md §4.2: "ENUM vs. TEXT literal is rewritten at plan-build time by
//! resolving the TEXT against the ENUM's dictionary; unresolvable ->
//! always-false without contacting data").

use kepler_catalog::TypeId;
use kepler_common::{KeplerError, Result};
use kepler_runtime::EnumManager;

use crate::expr::Expr;

/// Rewrites `enum_col = 'literal'` into an `EnumIn` node over the resolved
/// dictionary id, or a `false` literal if `literal` isn't in the dictionary.
/// `enum_col` must already type-check as an ENUM-typed expression.
pub fn resolve_enum_eq(enum_col: Expr, literal: &str, enums: &EnumManager) -> Result<Expr> {
    let enum_id = match enum_col.ty().type_id {
        TypeId::Enum => enum_col.ty().enum_id,
        other => {
            return Err(KeplerError::type_mismatch(format!(
                "resolve_enum_eq requires an ENUM-typed column, got {other}"
            )))
        }
    };
    match enums.get_value(enum_id, literal)? {
        Some(value) => Expr::enum_in(enum_col, vec![value]),
        None => Ok(Expr::literal_false()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::value::Value;
    use kepler_catalog::Type;
    use kepler_runtime::builder::{ColumnDataBuilder, ColumnIndexBuilder};
    use kepler_runtime::EnumManager;

    fn build_dictionary(dir: &tempfile::TempDir) -> EnumManager {
        let keys_path = dir.path().join("region.kdb");
        let index_path = dir.path().join("region.kdbindex");
        ColumnDataBuilder::write_text(&keys_path, &["AMERICA", "ASIA", "EUROPE"]).unwrap();
        ColumnIndexBuilder::write_text(
            &index_path,
            &[("AMERICA", vec![0]), ("ASIA", vec![1]), ("EUROPE", vec![2])],
        )
        .unwrap();
        let mut mgr = EnumManager::new();
        mgr.register(&keys_path, &index_path).unwrap();
        mgr
    }

    #[test]
    fn resolvable_literal_becomes_enum_in() {
        let dir = tempfile::tempdir().unwrap();
        let enums = build_dictionary(&dir);
        let col = Expr::column_ref(0, 0, Type::r#enum(0, false));
        let rewritten = resolve_enum_eq(col, "ASIA", &enums).unwrap();
        match rewritten {
            Expr::EnumIn { values, .. } => assert_eq!(values, vec![1]),
            other => panic!("expected EnumIn, got {other:?}"),
        }
    }

    #[test]
    fn unresolvable_literal_becomes_false() {
        let dir = tempfile::tempdir().unwrap();
        let enums = build_dictionary(&dir);
        let col = Expr::column_ref(0, 0, Type::r#enum(0, false));
        let rewritten = resolve_enum_eq(col, "ATLANTIS", &enums).unwrap();
        match rewritten {
            Expr::Literal(Value::Boolean(false), _) => {}
            other => panic!("expected literal false, got {other:?}"),
        }
    }
}
