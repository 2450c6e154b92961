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

//! `GroupByAggregate` and `Aggregate` (spec.md §4.7): a hash table keyed by
//! the evaluated `group_exprs` tuple, one fixed-layout accumulator state per
//! `agg_exprs` entry per key. `Aggregate` is `GroupByAggregate` with an
//! empty key -- a single cell that still exists even if `child` is empty.
//! SUM/MIN/MAX carry a has-value bit so a group whose input is entirely
//! NULL finishes as NULL rather than a zero sentinel (spec.md §4.7).
//!
//! `kepler_join::key::row_fingerprint` isn't public outside `kepler-join`
//! (it builds a join key, whose null-excludes-the-row semantics are wrong
//! here -- spec.md §4.7: "NULL keys form their own group"), so the group key
//! here is built locally the same way, just without dropping `None`s.

use hashbrown::HashMap;

#[cfg(test)]
use kepler_catalog::Type;
use kepler_common::Result;
use kepler_expr::{AggregateKind, Expr, Value};
use kepler_join::{JoinKeyPart, Row, RowSource, SingleRowBindings};
use kepler_plan::{AggregateOp, GroupByAggregateOp};
use kepler_runtime::EnumManager;

type GroupKey = Vec<Option<JoinKeyPart>>;

fn group_key(values: &[Option<Value>]) -> GroupKey {
    values.iter().map(|v| v.as_ref().map(JoinKeyPart::from)).collect()
}

/// One running aggregate state, matching spec.md §4.7's "fixed-layout
/// aggregate state" per kind. SUM and MIN/MAX carry their "not-null flag" /
/// "has-value" bit as `Option<Value>` (`None` until the first non-null input
/// is accumulated) so a group whose aggregated column is entirely NULL
/// finishes as NULL instead of a zero-ish sentinel (spec.md §4.7).
enum AccState {
    Sum { value: Option<Value> },
    Avg { sum: f64, count: i64 },
    Min { value: Option<Value> },
    Max { value: Option<Value> },
    Count { count: i64 },
}

impl AccState {
    fn new(kind: AggregateKind) -> Self {
        match kind {
            AggregateKind::Sum => AccState::Sum { value: None },
            AggregateKind::Avg => AccState::Avg { sum: 0.0, count: 0 },
            AggregateKind::Min => AccState::Min { value: None },
            AggregateKind::Max => AccState::Max { value: None },
            AggregateKind::Count => AccState::Count { count: 0 },
        }
    }

    /// NULL values are skipped by all aggregates (spec.md §4.7).
    fn accumulate(&mut self, value: &Value) {
        match self {
            AccState::Sum { value: acc } => {
                *acc = Some(match acc {
                    Some(prev) => wrapping_add(prev, value),
                    None => value.clone(),
                });
            }
            AccState::Avg { sum, count } => {
                *sum += value.as_f64().expect("AVG operand is numeric by construction");
                *count += 1;
            }
            AccState::Min { value: acc } => {
                if acc.as_ref().map_or(true, |a| value.compare(a) == std::cmp::Ordering::Less) {
                    *acc = Some(value.clone());
                }
            }
            AccState::Max { value: acc } => {
                if acc.as_ref().map_or(true, |a| value.compare(a) == std::cmp::Ordering::Greater) {
                    *acc = Some(value.clone());
                }
            }
            AccState::Count { count } => *count += 1,
        }
    }

    fn finish(self) -> Option<Value> {
        match self {
            AccState::Sum { value } => value,
            AccState::Avg { sum, count } => {
                if count == 0 {
                    None
                } else {
                    Some(Value::Real(sum / count as f64))
                }
            }
            AccState::Min { value } => value,
            AccState::Max { value } => value,
            AccState::Count { count } => Some(Value::BigInt(count)),
        }
    }
}

/// Wraps on overflow, matching the engine's general no-trap integer policy
/// (spec.md §7: "RuntimeOverflow... is not raised").
fn wrapping_add(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::SmallInt(x), Value::SmallInt(y)) => Value::SmallInt(x.wrapping_add(*y)),
        (Value::Int(x), Value::Int(y)) => Value::Int(x.wrapping_add(*y)),
        (Value::BigInt(x), Value::BigInt(y)) => Value::BigInt(x.wrapping_add(*y)),
        (Value::Real(x), Value::Real(y)) => Value::Real(x + y),
        _ => unreachable!("SUM operand type fixed at construction"),
    }
}

struct AggSpec {
    kind: AggregateKind,
    child: Expr,
}

fn agg_specs(agg_exprs: &[Expr]) -> Vec<AggSpec> {
    agg_exprs
        .iter()
        .map(|e| match e {
            Expr::Aggregate { kind, child, .. } => AggSpec {
                kind: *kind,
                child: (**child).clone(),
            },
            other => unreachable!("agg_exprs entry is not Expr::Aggregate: {other:?}"),
        })
        .collect()
}

fn run(
    mut child: Box<dyn RowSource + '_>,
    group_exprs: &[Expr],
    agg_exprs: &[Expr],
    enums: &EnumManager,
) -> Result<Vec<Row>> {
    let specs = agg_specs(agg_exprs);
    let mut groups: HashMap<GroupKey, Vec<AccState>> = HashMap::new();
    // Ensures `Aggregate` (empty group_exprs) always emits one row even if
    // `child` never produces a tuple (spec.md §4.7).
    if group_exprs.is_empty() {
        groups
            .entry(Vec::new())
            .or_insert_with(|| specs.iter().map(|s| AccState::new(s.kind)).collect());
    }

    while let Some(row) = child.next_row()? {
        let bindings = SingleRowBindings::new(&row);
        let mut key_values = Vec::with_capacity(group_exprs.len());
        for expr in group_exprs {
            key_values.push(expr.evaluate(&bindings, enums)?);
        }
        let key = group_key(&key_values);
        let states = groups
            .entry(key)
            .or_insert_with(|| specs.iter().map(|s| AccState::new(s.kind)).collect());
        for (state, spec) in states.iter_mut().zip(&specs) {
            if let Some(value) = spec.child.evaluate(&bindings, enums)? {
                state.accumulate(&value);
            }
        }
    }

    let mut out = Vec::with_capacity(groups.len());
    for (key, states) in groups {
        let mut row = Vec::with_capacity(key.len() + states.len());
        row.extend(key.into_iter().map(|k| k.map(part_to_value)));
        row.extend(states.into_iter().map(|s| s.finish()));
        out.push(row);
    }
    Ok(out)
}

fn part_to_value(part: JoinKeyPart) -> Value {
    match part {
        JoinKeyPart::SmallInt(v) => Value::SmallInt(v),
        JoinKeyPart::Int(v) => Value::Int(v),
        JoinKeyPart::BigInt(v) => Value::BigInt(v),
        JoinKeyPart::Real(bits) => Value::Real(f64::from_bits(bits)),
        JoinKeyPart::Date(v) => Value::Date(v),
        JoinKeyPart::Text(v) => Value::Text(v),
        JoinKeyPart::Boolean(v) => Value::Boolean(v),
        JoinKeyPart::Enum(v) => Value::Enum(v),
    }
}

pub fn group_by_aggregate(op: &GroupByAggregateOp, child: Box<dyn RowSource + '_>, enums: &EnumManager) -> Result<Vec<Row>> {
    run(child, &op.group_exprs, &op.agg_exprs, enums)
}

pub fn aggregate(op: &AggregateOp, child: Box<dyn RowSource + '_>, enums: &EnumManager) -> Result<Vec<Row>> {
    run(child, &[], &op.agg_exprs, enums)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kepler_join::VecRowSource;
    use kepler_plan::builder::col_ref;

    fn rows(vals: &[(i32, i32)]) -> Box<dyn RowSource> {
        Box::new(VecRowSource::new(
            vals.iter()
                .map(|(k, v)| vec![Some(Value::Int(*k)), Some(Value::Int(*v))])
                .collect(),
        ))
    }

    #[test]
    fn groups_and_sums_per_key() {
        let child = rows(&[(1, 10), (2, 20), (1, 5)]);
        let group_exprs = vec![col_ref(0, 0, Type::int(false))];
        let agg_exprs = vec![Expr::aggregate(AggregateKind::Sum, col_ref(0, 1, Type::int(false))).unwrap()];
        let enums = EnumManager::new();
        let mut out = run(child, &group_exprs, &agg_exprs, &enums).unwrap();
        out.sort_by_key(|r| match r[0] {
            Some(Value::Int(k)) => k,
            _ => unreachable!(),
        });
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], vec![Some(Value::Int(1)), Some(Value::Int(15))]);
        assert_eq!(out[1], vec![Some(Value::Int(2)), Some(Value::Int(20))]);
    }

    #[test]
    fn aggregate_over_empty_input_emits_one_zero_row() {
        let child: Box<dyn RowSource> = Box::new(VecRowSource::new(Vec::new()));
        let agg_exprs = vec![Expr::aggregate(AggregateKind::Count, col_ref(0, 0, Type::int(false))).unwrap()];
        let enums = EnumManager::new();
        let out = run(child, &[], &agg_exprs, &enums).unwrap();
        assert_eq!(out, vec![vec![Some(Value::BigInt(0))]]);
    }

    #[test]
    fn null_group_key_forms_its_own_group() {
        let child: Box<dyn RowSource> = Box::new(VecRowSource::new(vec![
            vec![None, Some(Value::Int(1))],
            vec![Some(Value::Int(9)), Some(Value::Int(2))],
        ]));
        let group_exprs = vec![col_ref(0, 0, Type::int(true))];
        let agg_exprs = vec![Expr::aggregate(AggregateKind::Count, col_ref(0, 1, Type::int(false))).unwrap()];
        let enums = EnumManager::new();
        let out = run(child, &group_exprs, &agg_exprs, &enums).unwrap();
        assert_eq!(out.len(), 2);
    }

    /// spec.md §8 scenario 6: `zscore` rows `(null),(1.0),(null),(3.0)` ->
    /// `SUM=4.0, MIN=1.0, MAX=3.0, AVG=2.0, COUNT(*)=4, COUNT(zscore)=2`.
    #[test]
    fn null_skipping_aggregates_match_scenario_six() {
        let zscore = Type::real(true);
        let child: Box<dyn RowSource> = Box::new(VecRowSource::new(vec![
            vec![None],
            vec![Some(Value::Real(1.0))],
            vec![None],
            vec![Some(Value::Real(3.0))],
        ]));
        let col = col_ref(0, 0, zscore);
        let agg_exprs = vec![
            Expr::aggregate(AggregateKind::Sum, col.clone()).unwrap(),
            Expr::aggregate(AggregateKind::Avg, col.clone()).unwrap(),
            Expr::aggregate(AggregateKind::Min, col.clone()).unwrap(),
            Expr::aggregate(AggregateKind::Max, col.clone()).unwrap(),
            Expr::aggregate(AggregateKind::Count, Expr::literal(Value::Boolean(true))).unwrap(),
            Expr::aggregate(AggregateKind::Count, col).unwrap(),
        ];
        let enums = EnumManager::new();
        let out = run(child, &[], &agg_exprs, &enums).unwrap();
        assert_eq!(
            out,
            vec![vec![
                Some(Value::Real(4.0)),
                Some(Value::Real(2.0)),
                Some(Value::Real(1.0)),
                Some(Value::Real(3.0)),
                Some(Value::BigInt(4)),
                Some(Value::BigInt(2)),
            ]]
        );
    }

    /// A group whose aggregated column is entirely NULL finishes as NULL,
    /// not a zero-ish sentinel, for every value-carrying aggregate kind.
    #[test]
    fn all_null_column_yields_null_not_zero() {
        let zscore = Type::real(true);
        let child: Box<dyn RowSource> = Box::new(VecRowSource::new(vec![vec![None], vec![None]]));
        let col = col_ref(0, 0, zscore);
        let agg_exprs = vec![
            Expr::aggregate(AggregateKind::Sum, col.clone()).unwrap(),
            Expr::aggregate(AggregateKind::Avg, col.clone()).unwrap(),
            Expr::aggregate(AggregateKind::Min, col.clone()).unwrap(),
            Expr::aggregate(AggregateKind::Max, col).unwrap(),
        ];
        let enums = EnumManager::new();
        let out = run(child, &[], &agg_exprs, &enums).unwrap();
        assert_eq!(out, vec![vec![None, None, None, None]]);
    }

    /// MIN/MAX must seed from the first accumulated value, not a zero
    /// sentinel -- an all-positive column's MIN must never surface `0`, and
    /// an all-negative column's MAX must never surface `0`.
    #[test]
    fn min_max_seed_from_first_value_not_zero_sentinel() {
        let amount = Type::real(false);
        let child: Box<dyn RowSource> = Box::new(VecRowSource::new(vec![
            vec![Some(Value::Real(-30.0))],
            vec![Some(Value::Real(-10.0))],
            vec![Some(Value::Real(-20.0))],
        ]));
        let col = col_ref(0, 0, amount);
        let agg_exprs = vec![
            Expr::aggregate(AggregateKind::Min, col.clone()).unwrap(),
            Expr::aggregate(AggregateKind::Max, col).unwrap(),
        ];
        let enums = EnumManager::new();
        let out = run(child, &[], &agg_exprs, &enums).unwrap();
        assert_eq!(out, vec![vec![Some(Value::Real(-30.0)), Some(Value::Real(-10.0))]]);
    }
}
