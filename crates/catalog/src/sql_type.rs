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

//! The engine's scalar type system (spec.md §3). Grounded on
//! `catalog/sql_type.h` in the reference implementation, which models the
//! same tagged union as a C++ enum class plus an `enum_id` field; here it
//! becomes a Rust sum type so ENUM's dictionary id can't be read on a
//! non-ENUM variant by mistake.

use std::fmt;

/// The tag half of [`Type`]. Kept separate so callers that only care about
/// the shape (e.g. "is this numeric?") don't need to know about `enum_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeId {
    SmallInt,
    Int,
    BigInt,
    Real,
    Date,
    Text,
    Boolean,
    Enum,
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeId::SmallInt => "SMALLINT",
            TypeId::Int => "INT",
            TypeId::BigInt => "BIGINT",
            TypeId::Real => "REAL",
            TypeId::Date => "DATE",
            TypeId::Text => "TEXT",
            TypeId::Boolean => "BOOLEAN",
            TypeId::Enum => "ENUM",
        };
        f.write_str(name)
    }
}

/// A column/expression type: a `TypeId`, an ENUM dictionary id (meaningless
/// for any other `TypeId`), and whether the value may be `NULL` (spec.md §3:
/// "A type also carries a `nullable` flag").
///
/// Two `ENUM` types are equal iff their dictionary ids match (spec.md §3);
/// `enum_id` is ignored by `PartialEq` for every other variant so
/// `Type::int(false) == Type::int(true)` is false only due to `nullable`,
/// never due to stray `enum_id` bits.
#[derive(Debug, Clone, Copy)]
pub struct Type {
    pub type_id: TypeId,
    pub enum_id: i32,
    pub nullable: bool,
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        if self.type_id != other.type_id || self.nullable != other.nullable {
            return false;
        }
        if self.type_id == TypeId::Enum {
            self.enum_id == other.enum_id
        } else {
            true
        }
    }
}
impl Eq for Type {}

impl Type {
    fn new(type_id: TypeId, nullable: bool) -> Self {
        Type {
            type_id,
            enum_id: 0,
            nullable,
        }
    }

    pub fn small_int(nullable: bool) -> Self {
        Type::new(TypeId::SmallInt, nullable)
    }

    pub fn int(nullable: bool) -> Self {
        Type::new(TypeId::Int, nullable)
    }

    pub fn big_int(nullable: bool) -> Self {
        Type::new(TypeId::BigInt, nullable)
    }

    pub fn real(nullable: bool) -> Self {
        Type::new(TypeId::Real, nullable)
    }

    pub fn date(nullable: bool) -> Self {
        Type::new(TypeId::Date, nullable)
    }

    pub fn text(nullable: bool) -> Self {
        Type::new(TypeId::Text, nullable)
    }

    pub fn boolean(nullable: bool) -> Self {
        Type::new(TypeId::Boolean, nullable)
    }

    pub fn r#enum(enum_id: i32, nullable: bool) -> Self {
        Type {
            type_id: TypeId::Enum,
            enum_id,
            nullable,
        }
    }

    /// Returns `self` with `nullable` forced to `value`; used by type
    /// inference when combining operand nullability (spec.md §3).
    pub fn with_nullable(self, value: bool) -> Self {
        Type {
            nullable: value,
            ..self
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.type_id,
            TypeId::SmallInt | TypeId::Int | TypeId::BigInt | TypeId::Real
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.type_id,
            TypeId::SmallInt | TypeId::Int | TypeId::BigInt
        )
    }

    /// Ignores `nullable` -- used for "same underlying type" checks during
    /// expression type inference (e.g. CASE branches, arithmetic operands).
    pub fn same_shape(&self, other: &Type) -> bool {
        self.type_id == other.type_id
            && (self.type_id != TypeId::Enum || self.enum_id == other.enum_id)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_id)?;
        if self.nullable {
            write!(f, " NULL")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_equality_is_by_dictionary_id() {
        assert_eq!(Type::r#enum(1, false), Type::r#enum(1, false));
        assert_ne!(Type::r#enum(1, false), Type::r#enum(2, false));
    }

    #[test]
    fn non_enum_equality_ignores_enum_id() {
        let a = Type::int(false);
        let b = Type { enum_id: 7, ..a };
        assert_eq!(a, b);
    }

    #[test]
    fn nullable_is_part_of_identity() {
        assert_ne!(Type::int(false), Type::int(true));
    }
}
