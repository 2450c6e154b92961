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

//! Dynamic values produced by evaluating an [`crate::Expr`]. `NULL` is
//! represented one level up as `Option<Value>`, never inside `Value` itself
//! -- a literal is always present (spec.md §4.2: "Literal(v) Produces v,
//! non-null"), so there is no such thing as a typed `Value::Null`.

use kepler_catalog::{Type, TypeId};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Real(f64),
    /// Unix-ms UTC (spec.md §3).
    Date(i64),
    Text(String),
    Boolean(bool),
    Enum(i32),
}

impl Value {
    pub fn type_id(&self) -> TypeId {
        match self {
            Value::SmallInt(_) => TypeId::SmallInt,
            Value::Int(_) => TypeId::Int,
            Value::BigInt(_) => TypeId::BigInt,
            Value::Real(_) => TypeId::Real,
            Value::Date(_) => TypeId::Date,
            Value::Text(_) => TypeId::Text,
            Value::Boolean(_) => TypeId::Boolean,
            Value::Enum(_) => TypeId::Enum,
        }
    }

    /// The non-nullable `Type` this value inhabits; `enum_id` is `0` for
    /// non-ENUM values and must be supplied separately by ENUM-typed
    /// literals (see [`crate::Expr::literal_enum`]).
    pub fn ty(&self) -> Type {
        match self {
            Value::SmallInt(_) => Type::small_int(false),
            Value::Int(_) => Type::int(false),
            Value::BigInt(_) => Type::big_int(false),
            Value::Real(_) => Type::real(false),
            Value::Date(_) => Type::date(false),
            Value::Text(_) => Type::text(false),
            Value::Boolean(_) => Type::boolean(false),
            Value::Enum(id) => Type::r#enum(*id, false),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::SmallInt(v) => Some(*v as f64),
            Value::Int(v) => Some(*v as f64),
            Value::BigInt(v) => Some(*v as f64),
            Value::Real(v) => Some(*v),
            Value::Date(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::SmallInt(v) => Some(*v as i64),
            Value::Int(v) => Some(*v as i64),
            Value::BigInt(v) => Some(*v),
            Value::Date(v) => Some(*v),
            _ => None,
        }
    }

    /// Lexicographic/numeric ordering used by MIN/MAX, ORDER BY and
    /// comparison operators (spec.md §4.2: "lexicographic for TEXT").
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Enum(a), Value::Enum(b)) => a.cmp(b),
            (Value::Real(_), _) | (_, Value::Real(_)) => self
                .as_f64()
                .unwrap()
                .partial_cmp(&other.as_f64().unwrap())
                .unwrap_or(Ordering::Equal),
            _ => self.as_i64().unwrap_or(0).cmp(&other.as_i64().unwrap_or(0)),
        }
    }
}
