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

//! A `Hash + Eq` key built from evaluated [`Value`]s, for the build side of
//! [`crate::hash_join`]. `Value` itself carries an `f64` variant and so only
//! implements `PartialEq`; `JoinKey::Real` keeps the bit pattern instead,
//! the same trick `kepler_runtime::IndexKey` uses for its own hash buckets.

use kepler_expr::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinKeyPart {
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Real(u64),
    Date(i64),
    Text(String),
    Boolean(bool),
    Enum(i32),
}

impl From<&Value> for JoinKeyPart {
    fn from(value: &Value) -> Self {
        match value {
            Value::SmallInt(v) => JoinKeyPart::SmallInt(*v),
            Value::Int(v) => JoinKeyPart::Int(*v),
            Value::BigInt(v) => JoinKeyPart::BigInt(*v),
            Value::Real(v) => JoinKeyPart::Real(v.to_bits()),
            Value::Date(v) => JoinKeyPart::Date(*v),
            Value::Text(v) => JoinKeyPart::Text(v.clone()),
            Value::Boolean(v) => JoinKeyPart::Boolean(*v),
            Value::Enum(v) => JoinKeyPart::Enum(*v),
        }
    }
}

/// A composite join key over `n` key expressions. `None` anywhere in the
/// vector of evaluated components means this row can never be a build-side
/// key (spec.md §4.4: "Nulls in keys never match"); callers should check
/// with [`JoinKey::from_parts`] rather than constructing directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinKey(Vec<JoinKeyPart>);

impl JoinKey {
    /// Builds a key from evaluated column values, returning `None` if any
    /// component is `NULL`.
    pub fn from_parts(parts: &[Option<Value>]) -> Option<JoinKey> {
        let mut out = Vec::with_capacity(parts.len());
        for part in parts {
            out.push(JoinKeyPart::from(part.as_ref()?));
        }
        Some(JoinKey(out))
    }
}

/// A hashable fingerprint of an entire emitted row, NULLs included --
/// `SkinnerJoin`'s dedup set (spec.md §4.6: "preserves at-most-once result
/// emission") needs this over whole rows, not just key columns.
pub fn row_fingerprint(row: &[Option<Value>]) -> Vec<Option<JoinKeyPart>> {
    row.iter().map(|v| v.as_ref().map(JoinKeyPart::from)).collect()
}
