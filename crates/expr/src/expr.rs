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

//! The typed expression algebra (spec.md §4.2). Every constructor performs
//! type inference immediately and fails with `TypeMismatch` rather than
//! deferring the check to evaluation time (spec.md §4.2: "Type inference
//! (§3 invariants) is performed at construction time; illegal combinations
//! fail immediately").

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{Datelike, TimeZone, Utc};
use kepler_catalog::{Type, TypeId};
use kepler_common::{KeplerError, Result};
use kepler_runtime::EnumManager;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
    StartsWith,
    EndsWith,
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    IsNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractField {
    Year,
}

/// The typed expression tree. Every variant carries (or can derive) its
/// result `Type`; see [`Expr::ty`].
#[derive(Debug, Clone)]
pub enum Expr {
    /// The second field overrides the value's default `Type` -- needed for
    /// ENUM literals, whose dictionary id isn't carried by `Value::Enum`
    /// itself.
    Literal(Value, Type),
    ColumnRef {
        child_idx: usize,
        column_idx: usize,
        ty: Type,
    },
    VirtualColumnRef {
        column_idx: usize,
        ty: Type,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        ty: Type,
    },
    Unary {
        op: UnaryOp,
        child: Box<Expr>,
        ty: Type,
    },
    Extract {
        field: ExtractField,
        child: Box<Expr>,
        ty: Type,
    },
    IntToFloat {
        child: Box<Expr>,
    },
    Case {
        cond: Box<Expr>,
        then: Box<Expr>,
        els: Box<Expr>,
        ty: Type,
    },
    Aggregate {
        kind: AggregateKind,
        child: Box<Expr>,
        ty: Type,
    },
    /// Pattern compiled once at construction (spec.md §4.2: "compiled once
    /// per operator instantiation").
    Regex {
        child: Box<Expr>,
        pattern: String,
        compiled: Arc<regex::Regex>,
        ty: Type,
    },
    EnumIn {
        child: Box<Expr>,
        values: Vec<i32>,
        ty: Type,
    },
}

/// Evaluation-time access to the tuple currently bound by the operator tree.
/// Implemented by the interpreted executor's row cursors.
pub trait Bindings {
    fn column(&self, child_idx: usize, column_idx: usize) -> Result<Option<Value>>;
    fn virtual_column(&self, column_idx: usize) -> Result<Option<Value>>;
}

fn type_mismatch(msg: impl std::fmt::Display) -> KeplerError {
    KeplerError::type_mismatch(msg)
}

impl Expr {
    pub fn ty(&self) -> Type {
        match self {
            Expr::Literal(_, ty) => *ty,
            Expr::ColumnRef { ty, .. } => *ty,
            Expr::VirtualColumnRef { ty, .. } => *ty,
            Expr::Binary { ty, .. } => *ty,
            Expr::Unary { ty, .. } => *ty,
            Expr::Extract { ty, .. } => *ty,
            Expr::IntToFloat { child } => Type::real(child.ty().nullable),
            Expr::Case { ty, .. } => *ty,
            Expr::Aggregate { ty, .. } => *ty,
            Expr::Regex { ty, .. } => *ty,
            Expr::EnumIn { ty, .. } => *ty,
        }
    }

    pub fn literal(value: Value) -> Expr {
        let ty = value.ty();
        Expr::Literal(value, ty)
    }

    /// Debugging dump (spec.md §6: "a JSON dump exists for debugging").
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            Expr::Literal(v, ty) => json!({"op": "literal", "value": format!("{v:?}"), "type": ty.to_string()}),
            Expr::ColumnRef { child_idx, column_idx, ty } => {
                json!({"op": "column_ref", "child": child_idx, "column": column_idx, "type": ty.to_string()})
            }
            Expr::VirtualColumnRef { column_idx, ty } => {
                json!({"op": "virtual_column_ref", "column": column_idx, "type": ty.to_string()})
            }
            Expr::Binary { op, left, right, ty } => {
                json!({"op": format!("{op:?}"), "left": left.to_json(), "right": right.to_json(), "type": ty.to_string()})
            }
            Expr::Unary { op, child, ty } => {
                json!({"op": format!("{op:?}"), "child": child.to_json(), "type": ty.to_string()})
            }
            Expr::Extract { field, child, ty } => {
                json!({"op": format!("extract_{field:?}"), "child": child.to_json(), "type": ty.to_string()})
            }
            Expr::IntToFloat { child } => json!({"op": "int_to_float", "child": child.to_json()}),
            Expr::Case { cond, then, els, ty } => {
                json!({"op": "case", "cond": cond.to_json(), "then": then.to_json(), "else": els.to_json(), "type": ty.to_string()})
            }
            Expr::Aggregate { kind, child, ty } => {
                json!({"op": format!("{kind:?}"), "child": child.to_json(), "type": ty.to_string()})
            }
            Expr::Regex { child, pattern, ty, .. } => {
                json!({"op": "regex", "child": child.to_json(), "pattern": pattern, "type": ty.to_string()})
            }
            Expr::EnumIn { child, values, ty } => {
                json!({"op": "enum_in", "child": child.to_json(), "values": values, "type": ty.to_string()})
            }
        }
    }

    /// An ENUM literal tagged with its dictionary id, used by
    /// [`crate::rewrite::resolve_enum_eq`] once a TEXT literal has been
    /// resolved against the dictionary.
    pub fn literal_enum(enum_id: i32, value: i32) -> Expr {
        Expr::Literal(Value::Enum(value), Type::r#enum(enum_id, false))
    }

    /// A BOOLEAN literal `false`, used for unresolvable ENUM literal
    /// comparisons (spec.md §4.2: "unresolvable -> always-false without
    /// contacting data").
    pub fn literal_false() -> Expr {
        Expr::literal(Value::Boolean(false))
    }

    pub fn column_ref(child_idx: usize, column_idx: usize, ty: Type) -> Expr {
        Expr::ColumnRef {
            child_idx,
            column_idx,
            ty,
        }
    }

    pub fn virtual_column_ref(column_idx: usize, ty: Type) -> Expr {
        Expr::VirtualColumnRef { column_idx, ty }
    }

    pub fn arith(op: BinaryOp, left: Expr, right: Expr) -> Result<Expr> {
        debug_assert!(matches!(
            op,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        ));
        let (lt, rt) = (left.ty(), right.ty());
        if !lt.is_numeric() || !rt.is_numeric() || !lt.same_shape(&rt) {
            return Err(type_mismatch(format!(
                "arithmetic requires matching numeric operands, got {lt} and {rt}"
            )));
        }
        let ty = lt.with_nullable(lt.nullable || rt.nullable);
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty,
        })
    }

    pub fn logical(op: BinaryOp, left: Expr, right: Expr) -> Result<Expr> {
        debug_assert!(matches!(op, BinaryOp::And | BinaryOp::Or));
        let (lt, rt) = (left.ty(), right.ty());
        if lt.type_id != TypeId::Boolean || rt.type_id != TypeId::Boolean {
            return Err(type_mismatch(format!(
                "{op:?} requires BOOLEAN operands, got {lt} and {rt}"
            )));
        }
        let ty = Type::boolean(lt.nullable || rt.nullable);
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty,
        })
    }

    pub fn compare(op: BinaryOp, left: Expr, right: Expr) -> Result<Expr> {
        debug_assert!(matches!(
            op,
            BinaryOp::Eq | BinaryOp::Neq | BinaryOp::Lt | BinaryOp::Leq | BinaryOp::Gt | BinaryOp::Geq
        ));
        let (lt, rt) = (left.ty(), right.ty());
        if !lt.same_shape(&rt) {
            return Err(type_mismatch(format!(
                "comparison requires operands of the same type, got {lt} and {rt}"
            )));
        }
        let ty = Type::boolean(lt.nullable || rt.nullable);
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty,
        })
    }

    pub fn string_relation(op: BinaryOp, left: Expr, right: Expr) -> Result<Expr> {
        debug_assert!(matches!(
            op,
            BinaryOp::StartsWith | BinaryOp::EndsWith | BinaryOp::Contains
        ));
        let (lt, rt) = (left.ty(), right.ty());
        if lt.type_id != TypeId::Text || rt.type_id != TypeId::Text {
            return Err(type_mismatch(format!(
                "{op:?} requires TEXT operands, got {lt} and {rt}"
            )));
        }
        let ty = Type::boolean(lt.nullable || rt.nullable);
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty,
        })
    }

    pub fn not(child: Expr) -> Result<Expr> {
        let ct = child.ty();
        if ct.type_id != TypeId::Boolean {
            return Err(type_mismatch(format!("NOT requires BOOLEAN, got {ct}")));
        }
        let ty = Type::boolean(ct.nullable);
        Ok(Expr::Unary {
            op: UnaryOp::Not,
            child: Box::new(child),
            ty,
        })
    }

    /// `IS_NULL` is always non-null BOOLEAN regardless of the child's own
    /// nullability (spec.md §4.2).
    pub fn is_null(child: Expr) -> Expr {
        Expr::Unary {
            op: UnaryOp::IsNull,
            child: Box::new(child),
            ty: Type::boolean(false),
        }
    }

    pub fn extract_year(child: Expr) -> Result<Expr> {
        let ct = child.ty();
        if ct.type_id != TypeId::Date {
            return Err(type_mismatch(format!("EXTRACT(YEAR) requires DATE, got {ct}")));
        }
        let ty = Type::int(ct.nullable);
        Ok(Expr::Extract {
            field: ExtractField::Year,
            child: Box::new(child),
            ty,
        })
    }

    pub fn int_to_float(child: Expr) -> Result<Expr> {
        let ct = child.ty();
        if !ct.is_integer() {
            return Err(type_mismatch(format!(
                "IntToFloat requires an integer operand, got {ct}"
            )));
        }
        Ok(Expr::IntToFloat {
            child: Box::new(child),
        })
    }

    pub fn case(cond: Expr, then: Expr, els: Expr) -> Result<Expr> {
        let ct = cond.ty();
        if ct.type_id != TypeId::Boolean {
            return Err(type_mismatch(format!("CASE condition must be BOOLEAN, got {ct}")));
        }
        let (tt, et) = (then.ty(), els.ty());
        if !tt.same_shape(&et) {
            return Err(type_mismatch(format!(
                "CASE branches must agree in type, got {tt} and {et}"
            )));
        }
        let ty = tt.with_nullable(tt.nullable || et.nullable);
        Ok(Expr::Case {
            cond: Box::new(cond),
            then: Box::new(then),
            els: Box::new(els),
            ty,
        })
    }

    /// Aggregates are modeled as always non-nullable: spec.md §3's inference
    /// list does not flag aggregate nullability, and an empty group always
    /// produces a defined zero-ish value per §4.7's fixed-layout states.
    pub fn aggregate(kind: AggregateKind, child: Expr) -> Result<Expr> {
        let ct = child.ty();
        let ty = match kind {
            AggregateKind::Sum => {
                if !ct.is_numeric() {
                    return Err(type_mismatch(format!("SUM requires a numeric operand, got {ct}")));
                }
                ct.with_nullable(false)
            }
            // MIN/MAX permit any operand with a total evaluation order:
            // numeric or TEXT (lexicographic, spec.md §4.2).
            AggregateKind::Min | AggregateKind::Max => {
                if !ct.is_numeric() && ct.type_id != TypeId::Text {
                    return Err(type_mismatch(format!(
                        "{kind:?} requires a numeric or TEXT operand, got {ct}"
                    )));
                }
                ct.with_nullable(false)
            }
            AggregateKind::Avg => {
                if !ct.is_numeric() {
                    return Err(type_mismatch(format!("AVG requires a numeric operand, got {ct}")));
                }
                Type::real(false)
            }
            AggregateKind::Count => Type::big_int(false),
        };
        Ok(Expr::Aggregate {
            kind,
            child: Box::new(child),
            ty,
        })
    }

    pub fn regex_match(child: Expr, pattern: impl Into<String>) -> Result<Expr> {
        let ct = child.ty();
        if ct.type_id != TypeId::Text {
            return Err(type_mismatch(format!(
                "regex matching requires a TEXT operand, got {ct}"
            )));
        }
        let pattern = pattern.into();
        let compiled = regex::Regex::new(&pattern)
            .map_err(|e| type_mismatch(format!("invalid regex /{pattern}/: {e}")))?;
        let ty = Type::boolean(ct.nullable);
        Ok(Expr::Regex {
            child: Box::new(child),
            pattern,
            compiled: Arc::new(compiled),
            ty,
        })
    }

    /// Builds an `EnumIn` node directly; see [`crate::rewrite::resolve_enum_eq`]
    /// for the plan-build-time literal-rewrite that produces this from
    /// `enum_col = 'text literal'`.
    pub fn enum_in(child: Expr, values: Vec<i32>) -> Result<Expr> {
        let ct = child.ty();
        if ct.type_id != TypeId::Enum {
            return Err(type_mismatch(format!("EnumIn requires an ENUM operand, got {ct}")));
        }
        let ty = Type::boolean(ct.nullable);
        Ok(Expr::EnumIn {
            child: Box::new(child),
            values,
            ty,
        })
    }

    /// Evaluates this expression against the currently-bound tuple(s).
    /// `enums` resolves `Enum` values for display/comparison where needed.
    pub fn evaluate(&self, bindings: &dyn Bindings, enums: &EnumManager) -> Result<Option<Value>> {
        match self {
            Expr::Literal(v, _) => Ok(Some(v.clone())),
            Expr::ColumnRef {
                child_idx,
                column_idx,
                ..
            } => bindings.column(*child_idx, *column_idx),
            Expr::VirtualColumnRef { column_idx, .. } => bindings.virtual_column(*column_idx),
            Expr::Binary { op, left, right, .. } => {
                eval_binary(*op, left, right, bindings, enums)
            }
            Expr::Unary { op, child, .. } => {
                let v = child.evaluate(bindings, enums)?;
                match op {
                    UnaryOp::IsNull => Ok(Some(Value::Boolean(v.is_none()))),
                    UnaryOp::Not => Ok(match v {
                        None => None,
                        Some(Value::Boolean(b)) => Some(Value::Boolean(!b)),
                        Some(_) => unreachable!("type-checked at construction"),
                    }),
                }
            }
            Expr::Extract { child, .. } => {
                let v = child.evaluate(bindings, enums)?;
                Ok(match v {
                    None => None,
                    Some(Value::Date(ms)) => Some(Value::Int(extract_year(ms))),
                    Some(_) => unreachable!("type-checked at construction"),
                })
            }
            Expr::IntToFloat { child } => {
                let v = child.evaluate(bindings, enums)?;
                Ok(v.map(|v| Value::Real(v.as_f64().expect("type-checked integer operand"))))
            }
            Expr::Case { cond, then, els, .. } => {
                let c = cond.evaluate(bindings, enums)?;
                match c {
                    Some(Value::Boolean(true)) => then.evaluate(bindings, enums),
                    // NULL cond selects `els` (spec.md §4.2).
                    Some(Value::Boolean(false)) | None => els.evaluate(bindings, enums),
                    Some(_) => unreachable!("type-checked at construction"),
                }
            }
            Expr::Aggregate { .. } => Err(KeplerError::unsupported_lowering(
                "Aggregate is evaluated by the aggregation operator's accumulator, not Expr::evaluate",
            )),
            Expr::Regex { child, compiled, .. } => {
                let v = child.evaluate(bindings, enums)?;
                Ok(match v {
                    None => None,
                    Some(Value::Text(s)) => Some(Value::Boolean(compiled.is_match(&s))),
                    Some(_) => unreachable!("type-checked at construction"),
                })
            }
            Expr::EnumIn { child, values, .. } => {
                let v = child.evaluate(bindings, enums)?;
                Ok(match v {
                    None => None,
                    Some(Value::Enum(id)) => Some(Value::Boolean(values.contains(&id))),
                    Some(_) => unreachable!("type-checked at construction"),
                })
            }
        }
    }
}

fn extract_year(unix_ms: i64) -> i32 {
    Utc.timestamp_millis_opt(unix_ms)
        .single()
        .expect("valid DATE value")
        .year()
}

fn eval_binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    bindings: &dyn Bindings,
    enums: &EnumManager,
) -> Result<Option<Value>> {
    match op {
        BinaryOp::And | BinaryOp::Or => {
            let l = left.evaluate(bindings, enums)?.and_then(|v| v.as_bool());
            let r = right.evaluate(bindings, enums)?.and_then(|v| v.as_bool());
            Ok(kleene(op, l, r).map(Value::Boolean))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            let l = left.evaluate(bindings, enums)?;
            let r = right.evaluate(bindings, enums)?;
            match (l, r) {
                (Some(l), Some(r)) => Ok(Some(arith_eval(op, l, r))),
                _ => Ok(None),
            }
        }
        BinaryOp::Eq
        | BinaryOp::Neq
        | BinaryOp::Lt
        | BinaryOp::Leq
        | BinaryOp::Gt
        | BinaryOp::Geq => {
            let l = left.evaluate(bindings, enums)?;
            let r = right.evaluate(bindings, enums)?;
            match (l, r) {
                (Some(l), Some(r)) => {
                    let ord = l.compare(&r);
                    Ok(Some(Value::Boolean(compare_matches(op, ord))))
                }
                _ => Ok(None),
            }
        }
        BinaryOp::StartsWith | BinaryOp::EndsWith | BinaryOp::Contains => {
            let l = left.evaluate(bindings, enums)?;
            let r = right.evaluate(bindings, enums)?;
            match (l, r) {
                (Some(l), Some(r)) => {
                    let (l, r) = (
                        l.as_text().expect("type-checked TEXT operand"),
                        r.as_text().expect("type-checked TEXT operand"),
                    );
                    let result = match op {
                        BinaryOp::StartsWith => l.starts_with(r),
                        BinaryOp::EndsWith => l.ends_with(r),
                        BinaryOp::Contains => l.contains(r),
                        _ => unreachable!(),
                    };
                    Ok(Some(Value::Boolean(result)))
                }
                _ => Ok(None),
            }
        }
    }
}

fn kleene(op: BinaryOp, l: Option<bool>, r: Option<bool>) -> Option<bool> {
    match op {
        BinaryOp::And => match (l, r) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        BinaryOp::Or => match (l, r) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
        _ => unreachable!(),
    }
}

fn arith_eval(op: BinaryOp, l: Value, r: Value) -> Value {
    use Value::*;
    match (l, r) {
        (Real(a), Real(b)) => Real(match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            // REAL DIV by zero -> NaN (IEEE-754 default, spec.md §4.2).
            BinaryOp::Div => a / b,
            _ => unreachable!(),
        }),
        (SmallInt(a), SmallInt(b)) => SmallInt(int_arith(op, a as i64, b as i64) as i16),
        (Int(a), Int(b)) => Int(int_arith(op, a as i64, b as i64) as i32),
        (BigInt(a), BigInt(b)) => BigInt(int_arith(op, a, b)),
        (Date(a), Date(b)) => Date(int_arith(op, a, b)),
        _ => unreachable!("type-checked at construction"),
    }
}

/// Two's-complement wraparound integer arithmetic; DIV by zero yields 0
/// (spec.md §4.2).
fn int_arith(op: BinaryOp, a: i64, b: i64) -> i64 {
    match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div => {
            if b == 0 {
                0
            } else {
                a.wrapping_div(b)
            }
        }
        _ => unreachable!(),
    }
}

fn compare_matches(op: BinaryOp, ord: Ordering) -> bool {
    match op {
        BinaryOp::Eq => ord == Ordering::Equal,
        BinaryOp::Neq => ord != Ordering::Equal,
        BinaryOp::Lt => ord == Ordering::Less,
        BinaryOp::Leq => ord != Ordering::Greater,
        BinaryOp::Gt => ord == Ordering::Greater,
        BinaryOp::Geq => ord != Ordering::Less,
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kepler_runtime::EnumManager;
    use rstest::rstest;
    use std::collections::HashMap;

    struct RowBindings {
        columns: HashMap<(usize, usize), Option<Value>>,
    }

    impl Bindings for RowBindings {
        fn column(&self, child_idx: usize, column_idx: usize) -> Result<Option<Value>> {
            Ok(self
                .columns
                .get(&(child_idx, column_idx))
                .cloned()
                .flatten())
        }
        fn virtual_column(&self, column_idx: usize) -> Result<Option<Value>> {
            self.column(0, column_idx)
        }
    }

    fn bindings(values: &[(usize, usize, Option<Value>)]) -> RowBindings {
        RowBindings {
            columns: values
                .iter()
                .map(|(c, k, v)| ((*c, *k), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn arithmetic_requires_matching_numeric_operands() {
        let a = Expr::literal(Value::Int(1));
        let b = Expr::literal(Value::BigInt(2));
        assert!(Expr::arith(BinaryOp::Add, a, b).is_err());
    }

    #[test]
    fn integer_division_by_zero_is_zero() {
        let expr = Expr::arith(
            BinaryOp::Div,
            Expr::literal(Value::Int(7)),
            Expr::literal(Value::Int(0)),
        )
        .unwrap();
        let enums = EnumManager::new();
        let result = expr.evaluate(&bindings(&[]), &enums).unwrap();
        assert_eq!(result, Some(Value::Int(0)));
    }

    #[test]
    fn real_division_by_zero_is_nan() {
        let expr = Expr::arith(
            BinaryOp::Div,
            Expr::literal(Value::Real(1.0)),
            Expr::literal(Value::Real(0.0)),
        )
        .unwrap();
        let enums = EnumManager::new();
        match expr.evaluate(&bindings(&[]), &enums).unwrap() {
            Some(Value::Real(v)) => assert!(v.is_nan()),
            other => panic!("expected NaN REAL, got {other:?}"),
        }
    }

    #[rstest]
    #[case(None, Some(false), Some(false))]
    #[case(Some(true), None, None)]
    #[case(Some(true), Some(true), Some(true))]
    fn and_is_kleene(#[case] l: Option<bool>, #[case] r: Option<bool>, #[case] expect: Option<bool>) {
        assert_eq!(kleene(BinaryOp::And, l, r), expect);
    }

    #[test]
    fn or_short_circuits_on_true_even_with_null() {
        assert_eq!(kleene(BinaryOp::Or, Some(true), None), Some(true));
        assert_eq!(kleene(BinaryOp::Or, None, Some(false)), None);
    }

    #[test]
    fn comparison_requires_same_shape() {
        let a = Expr::literal(Value::Enum(1));
        let b = Expr::literal(Value::Text("x".into()));
        assert!(Expr::compare(BinaryOp::Eq, a, b).is_err());
    }

    #[test]
    fn case_result_is_nullable_iff_a_branch_is() {
        let cond = Expr::column_ref(0, 0, Type::boolean(false));
        let then = Expr::column_ref(0, 1, Type::int(false));
        let els = Expr::column_ref(0, 2, Type::int(true));
        let case = Expr::case(cond, then, els).unwrap();
        assert!(case.ty().nullable);
    }

    #[test]
    fn null_case_condition_selects_else() {
        let cond = Expr::column_ref(0, 0, Type::boolean(true));
        let then = Expr::literal(Value::Int(1));
        let els = Expr::literal(Value::Int(2));
        let case = Expr::case(cond, then, els).unwrap();
        let enums = EnumManager::new();
        let b = bindings(&[(0, 0, None)]);
        assert_eq!(case.evaluate(&b, &enums).unwrap(), Some(Value::Int(2)));
    }

    #[test]
    fn extract_year_reads_gregorian_year() {
        // 2021-05-17T00:00:00Z
        let millis = 1621209600_i64 * 1000;
        let expr = Expr::extract_year(Expr::literal(Value::Date(millis))).unwrap();
        let enums = EnumManager::new();
        assert_eq!(
            expr.evaluate(&bindings(&[]), &enums).unwrap(),
            Some(Value::Int(2021))
        );
    }

    #[test]
    fn enum_in_matches_listed_dictionary_ids() {
        let child = Expr::column_ref(0, 0, Type::r#enum(3, false));
        let expr = Expr::enum_in(child, vec![1, 2]).unwrap();
        let enums = EnumManager::new();
        let b = bindings(&[(0, 0, Some(Value::Enum(2)))]);
        assert_eq!(expr.evaluate(&b, &enums).unwrap(), Some(Value::Boolean(true)));
    }

    #[test]
    fn enum_in_requires_enum_operand() {
        let child = Expr::literal(Value::Int(1));
        assert!(Expr::enum_in(child, vec![1]).is_err());
    }

    #[test]
    fn count_is_always_bigint_and_non_null() {
        let agg = Expr::aggregate(AggregateKind::Count, Expr::literal(Value::Boolean(true))).unwrap();
        let ty = agg.ty();
        assert_eq!(ty.type_id, TypeId::BigInt);
        assert!(!ty.nullable);
    }

    #[test]
    fn avg_is_always_real() {
        let agg = Expr::aggregate(AggregateKind::Avg, Expr::column_ref(0, 0, Type::int(true))).unwrap();
        assert_eq!(agg.ty().type_id, TypeId::Real);
    }
}
