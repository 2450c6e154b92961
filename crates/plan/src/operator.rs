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

//! The physical operator tree (spec.md §2 "Operator Tree" row, §4.3-§4.9).
//! Grounded on the reference implementation's `plan/*_operator.{h,cc}` family
//! (one `final` class per variant under an abstract `Operator` base); here
//! the closed variant set becomes a single sum type per spec.md §9 ("Choose
//! whichever is idiomatic; the operator variant set is closed"), which also
//! gives exhaustive `match` dispatch instead of a visitor double-dispatch.
//!
//! Every node owns its children exclusively and its schema is computed once
//! at construction (spec.md §3 "Lifecycle").

use kepler_common::Result;
use kepler_expr::Expr;

use crate::schema::OperatorSchema;

/// Evaluation policy for `SkinnerJoin`, named directly in spec.md §4.6 /
/// §6's `--skinner` flag: `Recompile` triggers fresh codegen per permutation
/// (handled by the out-of-scope native backend); `Permute` walks a single
/// generic interpreter loop. Both modes are observably identical here since
/// `kepler-exec`'s reference executor always interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkinnerMode {
    Recompile,
    Permute,
}

impl Default for SkinnerMode {
    fn default() -> Self {
        SkinnerMode::Permute
    }
}

/// Ascending/descending flag paired with an `OrderBy` key expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

pub struct ScanOp {
    pub schema: OperatorSchema,
    pub table: String,
}

/// Shared shape of `ScanSelect` and `SIMDScanSelect` (spec.md §4.3): a
/// `scan_schema` naming every physically-opened column and an `output`
/// schema exposing only what's needed downstream, joined by a conjunction of
/// virtual-column predicates evaluated against `scan_schema`'s local row.
pub struct ScanSelectOp {
    pub output: OperatorSchema,
    pub scan_schema: OperatorSchema,
    pub table: String,
    pub predicates: Vec<Expr>,
}

pub struct SkinnerScanSelectOp {
    pub output: OperatorSchema,
    pub scan_schema: OperatorSchema,
    pub table: String,
    pub predicates: Vec<Expr>,
    /// Episode chunk size in tuples (spec.md §4.3: "fixed-size chunks of
    /// tuples (default 4096)").
    pub chunk_size: u32,
}

pub struct SelectOp {
    pub schema: OperatorSchema,
    pub child: Box<Operator>,
    pub predicate: Expr,
}

pub struct HashJoinOp {
    pub schema: OperatorSchema,
    pub left: Box<Operator>,
    pub right: Box<Operator>,
    /// Evaluated against the left row alone (`ColumnRef(0, k)` over `left`'s
    /// own schema); a composite key is multiple entries (spec.md §4.4:
    /// "Multiple `(left_keys, right_keys)` pairs are treated as a composite
    /// key").
    pub left_keys: Vec<Expr>,
    pub right_keys: Vec<Expr>,
}

pub struct CrossProductOp {
    pub schema: OperatorSchema,
    pub left: Box<Operator>,
    pub right: Box<Operator>,
}

pub struct SkinnerJoinOp {
    pub schema: OperatorSchema,
    pub children: Vec<Box<Operator>>,
    /// General expressions over `ColumnRef(child_idx, column_idx)` with
    /// `child_idx` ranging over all of `children` (spec.md §4.6).
    pub predicates: Vec<Expr>,
    pub budget_per_episode: u32,
    pub mode: SkinnerMode,
}

pub struct GroupByAggregateOp {
    pub schema: OperatorSchema,
    pub child: Box<Operator>,
    /// Evaluated against the child's row (`ColumnRef(0, k)`); forms the hash
    /// key. Empty here is legal but callers should prefer the dedicated
    /// [`AggregateOp`] for that case, matching spec.md §4.7's "Empty
    /// `group_exprs` collapses to a single cell -- this is what the
    /// distinct `Aggregate` operator expresses."
    pub group_exprs: Vec<Expr>,
    /// Evaluated against the child's row; `schema`'s columns reference these
    /// positionally via `VirtualColumnRef` over the conceptual local row
    /// `(group_exprs..., agg_exprs...)`.
    pub agg_exprs: Vec<Expr>,
}

pub struct AggregateOp {
    pub schema: OperatorSchema,
    pub child: Box<Operator>,
    pub agg_exprs: Vec<Expr>,
}

pub struct OrderByOp {
    pub schema: OperatorSchema,
    pub child: Box<Operator>,
    pub keys: Vec<(Expr, SortOrder)>,
}

pub struct OutputOp {
    pub schema: OperatorSchema,
    pub child: Box<Operator>,
}

/// The closed operator variant set (spec.md §2 "Operator Tree" row).
pub enum Operator {
    Scan(ScanOp),
    ScanSelect(ScanSelectOp),
    SimdScanSelect(ScanSelectOp),
    SkinnerScanSelect(SkinnerScanSelectOp),
    Select(SelectOp),
    HashJoin(HashJoinOp),
    CrossProduct(CrossProductOp),
    SkinnerJoin(SkinnerJoinOp),
    GroupByAggregate(GroupByAggregateOp),
    Aggregate(AggregateOp),
    OrderBy(OrderByOp),
    Output(OutputOp),
}

impl Operator {
    /// The output schema every operator owns (spec.md §3: "Every node owns
    /// its children and its schema").
    pub fn schema(&self) -> &OperatorSchema {
        match self {
            Operator::Scan(op) => &op.schema,
            Operator::ScanSelect(op) | Operator::SimdScanSelect(op) => &op.output,
            Operator::SkinnerScanSelect(op) => &op.output,
            Operator::Select(op) => &op.schema,
            Operator::HashJoin(op) => &op.schema,
            Operator::CrossProduct(op) => &op.schema,
            Operator::SkinnerJoin(op) => &op.schema,
            Operator::GroupByAggregate(op) => &op.schema,
            Operator::Aggregate(op) => &op.schema,
            Operator::OrderBy(op) => &op.schema,
            Operator::Output(op) => &op.schema,
        }
    }

    pub fn children(&self) -> Vec<&Operator> {
        match self {
            Operator::Scan(_) | Operator::ScanSelect(_) | Operator::SimdScanSelect(_)
            | Operator::SkinnerScanSelect(_) => vec![],
            Operator::Select(op) => vec![&op.child],
            Operator::HashJoin(op) => vec![&op.left, &op.right],
            Operator::CrossProduct(op) => vec![&op.left, &op.right],
            Operator::SkinnerJoin(op) => op.children.iter().map(|c| c.as_ref()).collect(),
            Operator::GroupByAggregate(op) => vec![&op.child],
            Operator::Aggregate(op) => vec![&op.child],
            Operator::OrderBy(op) => vec![&op.child],
            Operator::Output(op) => vec![&op.child],
        }
    }

    pub fn op_name(&self) -> &'static str {
        match self {
            Operator::Scan(_) => "SCAN",
            Operator::ScanSelect(_) => "SCAN_SELECT",
            Operator::SimdScanSelect(_) => "SIMD_SCAN_SELECT",
            Operator::SkinnerScanSelect(_) => "SKINNER_SCAN_SELECT",
            Operator::Select(_) => "SELECT",
            Operator::HashJoin(_) => "HASH_JOIN",
            Operator::CrossProduct(_) => "CROSS_PRODUCT",
            Operator::SkinnerJoin(_) => "SKINNER_JOIN",
            Operator::GroupByAggregate(_) => "GROUP_BY_AGGREGATE",
            Operator::Aggregate(_) => "AGGREGATE",
            Operator::OrderBy(_) => "ORDER_BY",
            Operator::Output(_) => "OUTPUT",
        }
    }

    /// Debugging dump (spec.md §6: "a JSON dump exists for debugging;
    /// fields are `op`, `output`, per-variant payload").
    pub fn to_json(&self) -> serde_json::Value {
        let mut j = serde_json::json!({
            "op": self.op_name(),
            "output": self.schema().to_json(),
        });
        let obj = j.as_object_mut().unwrap();
        match self {
            Operator::Scan(op) => {
                obj.insert("relation".into(), op.table.clone().into());
            }
            Operator::ScanSelect(op) | Operator::SimdScanSelect(op) => {
                obj.insert("relation".into(), op.table.clone().into());
                obj.insert(
                    "predicates".into(),
                    op.predicates.iter().map(Expr::to_json).collect(),
                );
            }
            Operator::SkinnerScanSelect(op) => {
                obj.insert("relation".into(), op.table.clone().into());
                obj.insert(
                    "predicates".into(),
                    op.predicates.iter().map(Expr::to_json).collect(),
                );
                obj.insert("chunk_size".into(), op.chunk_size.into());
            }
            Operator::Select(op) => {
                obj.insert("predicate".into(), op.predicate.to_json());
                obj.insert("child".into(), op.child.to_json());
            }
            Operator::HashJoin(op) => {
                obj.insert("left".into(), op.left.to_json());
                obj.insert("right".into(), op.right.to_json());
                obj.insert(
                    "left_keys".into(),
                    op.left_keys.iter().map(Expr::to_json).collect(),
                );
                obj.insert(
                    "right_keys".into(),
                    op.right_keys.iter().map(Expr::to_json).collect(),
                );
            }
            Operator::CrossProduct(op) => {
                obj.insert("left".into(), op.left.to_json());
                obj.insert("right".into(), op.right.to_json());
            }
            Operator::SkinnerJoin(op) => {
                obj.insert(
                    "relations".into(),
                    op.children.iter().map(|c| c.to_json()).collect(),
                );
                obj.insert(
                    "predicates".into(),
                    op.predicates.iter().map(Expr::to_json).collect(),
                );
                obj.insert("budget_per_episode".into(), op.budget_per_episode.into());
            }
            Operator::GroupByAggregate(op) => {
                obj.insert("child".into(), op.child.to_json());
                obj.insert(
                    "group_by".into(),
                    op.group_exprs.iter().map(Expr::to_json).collect(),
                );
            }
            Operator::Aggregate(op) => {
                obj.insert("child".into(), op.child.to_json());
            }
            Operator::OrderBy(op) => {
                obj.insert("child".into(), op.child.to_json());
                obj.insert(
                    "keys".into(),
                    op.keys
                        .iter()
                        .map(|(e, dir)| {
                            serde_json::json!({"expr": e.to_json(), "ascending": *dir == SortOrder::Asc})
                        })
                        .collect::<Vec<_>>(),
                );
            }
            Operator::Output(op) => {
                obj.insert("child".into(), op.child.to_json());
            }
        }
        j
    }

    /// Validates the schema-stability and column-ref-binding invariants of
    /// spec.md §8 for this node alone (children are assumed already
    /// validated, since they are validated at their own construction time).
    pub fn validate(&self) -> Result<()> {
        let children = self.children();
        for col in self.schema().columns() {
            validate_expr(&col.expr, children.len())?;
        }
        match self {
            Operator::Select(op) => validate_expr(&op.predicate, 1)?,
            Operator::ScanSelect(op) | Operator::SimdScanSelect(op) => {
                for p in &op.predicates {
                    validate_expr(p, 0)?;
                }
            }
            Operator::SkinnerScanSelect(op) => {
                for p in &op.predicates {
                    validate_expr(p, 0)?;
                }
            }
            Operator::HashJoin(op) => {
                for e in op.left_keys.iter().chain(op.right_keys.iter()) {
                    validate_expr(e, 1)?;
                }
            }
            Operator::SkinnerJoin(op) => {
                for p in &op.predicates {
                    validate_expr(p, op.children.len())?;
                }
            }
            Operator::GroupByAggregate(op) => {
                for e in op.group_exprs.iter().chain(op.agg_exprs.iter()) {
                    validate_expr(e, 1)?;
                }
            }
            Operator::Aggregate(op) => {
                for e in &op.agg_exprs {
                    validate_expr(e, 1)?;
                }
            }
            Operator::OrderBy(op) => {
                for (e, _) in &op.keys {
                    validate_expr(e, 1)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Walks `expr` checking every `ColumnRef(child_idx, _)` has `child_idx <
/// num_children` (spec.md §8 "Column-ref binding"). Column/bounds checking
/// within a child's own schema is deferred to runtime (it depends on which
/// row is bound), matching spec.md §7: construction-time errors are types
/// and shapes, not data.
fn validate_expr(expr: &Expr, num_children: usize) -> Result<()> {
    use kepler_expr::Expr::*;
    match expr {
        ColumnRef { child_idx, .. } => {
            if *child_idx >= num_children {
                return Err(kepler_common::KeplerError::type_mismatch(format!(
                    "column ref into child {child_idx}, but operator has {num_children} children"
                )));
            }
            Ok(())
        }
        VirtualColumnRef { .. } | Literal(..) => Ok(()),
        Binary { left, right, .. } => {
            validate_expr(left, num_children)?;
            validate_expr(right, num_children)
        }
        Unary { child, .. }
        | Extract { child, .. }
        | IntToFloat { child }
        | Aggregate { child, .. }
        | Regex { child, .. }
        | EnumIn { child, .. } => validate_expr(child, num_children),
        Case { cond, then, els, .. } => {
            validate_expr(cond, num_children)?;
            validate_expr(then, num_children)?;
            validate_expr(els, num_children)
        }
    }
}
