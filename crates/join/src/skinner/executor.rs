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

//! Adaptive n-ary join (spec.md §4.6). Every relation is drained once into
//! a column cache (`relations: Vec<Vec<Row>>`), then a UCT bandit
//! (`uct::UctTree`) repeatedly picks a join order and runs a
//! budget-bounded, resumable left-deep nested loop over it
//! (`PermutationProgress`), with predicates pushed down to the shallowest
//! depth at which every relation they reference is bound.
//!
//! Termination here is the conservative reading of spec.md §4.6 step 6:
//! since one permutation run to exhaustion already computes the entire
//! natural join, we stop once *every* permutation of the `k` relations has
//! been marked exhausted, rather than the tighter "outermost tuple visited
//! under some order" criterion the prose also allows (documented in
//! DESIGN.md).

use hashbrown::{HashMap, HashSet};
use kepler_common::Result;
use kepler_expr::Expr;
use kepler_runtime::EnumManager;
use rand::{rngs::StdRng, SeedableRng};

use crate::bindings::SkinnerBindings;
use crate::key::row_fingerprint;
use crate::row::{drain_all, Row, RowSource};

use super::uct::UctTree;

/// Saved state for one permutation, so an episode that runs out of budget
/// can be resumed later without redoing work (spec.md §4.6 step 3).
struct PermutationProgress {
    /// `pos[d]` is the next untried row index at depth `d`, or (once
    /// `depth` has advanced past `d`) the currently-bound row at depth `d`.
    pos: Vec<usize>,
    /// How many depths are currently bound; `depth == relations.len()`
    /// momentarily when a full tuple has just been found.
    depth: usize,
    exhausted: bool,
}

impl PermutationProgress {
    fn fresh(k: usize) -> Self {
        PermutationProgress {
            pos: vec![0; k],
            depth: 0,
            exhausted: false,
        }
    }
}

fn referenced_children(expr: &Expr) -> std::collections::BTreeSet<usize> {
    let mut out = std::collections::BTreeSet::new();
    collect_referenced(expr, &mut out);
    out
}

fn collect_referenced(expr: &Expr, out: &mut std::collections::BTreeSet<usize>) {
    match expr {
        Expr::Literal(..) | Expr::VirtualColumnRef { .. } => {}
        Expr::ColumnRef { child_idx, .. } => {
            out.insert(*child_idx);
        }
        Expr::Binary { left, right, .. } => {
            collect_referenced(left, out);
            collect_referenced(right, out);
        }
        Expr::Unary { child, .. }
        | Expr::Extract { child, .. }
        | Expr::IntToFloat { child }
        | Expr::Aggregate { child, .. }
        | Expr::Regex { child, .. }
        | Expr::EnumIn { child, .. } => collect_referenced(child, out),
        Expr::Case { cond, then, els, .. } => {
            collect_referenced(cond, out);
            collect_referenced(then, out);
            collect_referenced(els, out);
        }
    }
}

/// For a given join order, buckets each predicate at the shallowest depth
/// (0-indexed position in `order`) at which every relation it references
/// has been bound, i.e. is a prefix of `order`.
fn predicates_by_depth(predicates: &[Expr], order: &[usize]) -> Vec<Vec<Expr>> {
    let k = order.len();
    let mut by_depth: Vec<Vec<Expr>> = (0..k).map(|_| Vec::new()).collect();
    'predicate: for predicate in predicates {
        let refs = referenced_children(predicate);
        for depth in 0..k {
            let prefix: std::collections::BTreeSet<usize> = order[..=depth].iter().copied().collect();
            if refs.is_subset(&prefix) {
                by_depth[depth].push(predicate.clone());
                continue 'predicate;
            }
        }
        // A predicate referencing a relation outside `order` never happens
        // since `order` is always a full permutation of all relations.
        unreachable!("predicate references a relation not in this join");
    }
    by_depth
}

/// Drives one permutation's nested loop for up to `budget` units of work,
/// newly-emitting distinct tuples into `dedup`/`out`. Returns the number of
/// distinct tuples newly emitted this episode and the budget actually
/// consumed (at least 1, so a reward is always computable).
fn run_episode(
    relations: &[Vec<Row>],
    order: &[usize],
    predicates_by_depth: &[Vec<Expr>],
    progress: &mut PermutationProgress,
    budget: u32,
    dedup: &mut HashSet<Vec<Option<crate::key::JoinKeyPart>>>,
    out: &mut Vec<Row>,
    enums: &EnumManager,
) -> Result<(u32, u32)> {
    let k = order.len();
    let mut spent: u32 = 0;
    let mut emitted: u32 = 0;
    let mut depth = progress.depth;
    // `bound[original_child_idx] = Some(tuple_id)` once that relation has
    // been assigned a row along the current path.
    let mut bound: Vec<Option<usize>> = vec![None; k];
    for d in 0..depth {
        bound[order[d]] = Some(progress.pos[d]);
    }

    while spent < budget {
        if depth == k {
            // Concatenated in original child order, not join order, so the
            // same logical tuple fingerprints identically no matter which
            // permutation discovered it (dedup relies on this).
            let row: Row = (0..k)
                .flat_map(|child| relations[child][bound[child].expect("fully bound path")].clone())
                .collect();
            let fp = row_fingerprint(&row);
            if dedup.insert(fp) {
                out.push(row);
                emitted += 1;
            }
            spent += 1;
            // Backtrack: try the next row at the innermost depth.
            depth -= 1;
            bound[order[depth]] = None;
            progress.pos[depth] += 1;
            continue;
        }

        let relation = order[depth];
        if progress.pos[depth] >= relations[relation].len() {
            if depth == 0 {
                progress.exhausted = true;
                break;
            }
            progress.pos[depth] = 0;
            depth -= 1;
            bound[order[depth]] = None;
            progress.pos[depth] += 1;
            continue;
        }

        bound[relation] = Some(progress.pos[depth]);
        let bindings = SkinnerBindings::new(relations, &bound);
        let mut passes = true;
        for predicate in &predicates_by_depth[depth] {
            match predicate.evaluate(&bindings, enums)?.and_then(|v| v.as_bool()) {
                Some(true) => {}
                _ => {
                    passes = false;
                    break;
                }
            }
        }
        spent += 1;

        if passes {
            depth += 1;
            if depth < k {
                progress.pos[depth] = 0;
            }
        } else {
            bound[relation] = None;
            progress.pos[depth] += 1;
        }
    }

    progress.depth = depth;
    Ok((emitted, spent.max(1)))
}

/// Runs the full adaptive join to completion and returns the distinct
/// result rows, concatenated in original child order (not join order).
pub struct SkinnerJoinExecutor;

impl SkinnerJoinExecutor {
    pub fn run(
        children: &mut [Box<dyn RowSource + '_>],
        predicates: &[Expr],
        budget_per_episode: u32,
        enums: &EnumManager,
        seed: u64,
    ) -> Result<Vec<Row>> {
        let k = children.len();
        let mut relations = Vec::with_capacity(k);
        for child in children.iter_mut() {
            relations.push(drain_all(child.as_mut())?);
        }

        if k == 0 {
            return Ok(Vec::new());
        }
        if k == 1 {
            // A single relation still owns whatever residual predicates
            // apply to it alone.
            let mut out = Vec::new();
            let mut dedup = HashSet::new();
            for (tuple_id, _) in relations[0].iter().enumerate() {
                let bound = vec![Some(tuple_id)];
                let bindings = SkinnerBindings::new(&relations, &bound);
                let mut passes = true;
                for predicate in predicates {
                    match predicate.evaluate(&bindings, enums)?.and_then(|v| v.as_bool()) {
                        Some(true) => {}
                        _ => {
                            passes = false;
                            break;
                        }
                    }
                }
                if passes {
                    let row = relations[0][tuple_id].clone();
                    if dedup.insert(row_fingerprint(&row)) {
                        out.push(row);
                    }
                }
            }
            return Ok(out);
        }

        let total_permutations = (1..=k as u64).product::<u64>();
        let mut tree = UctTree::new(k);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut progress: HashMap<Vec<usize>, PermutationProgress> = HashMap::new();
        let mut exhausted_count: u64 = 0;
        let mut dedup = HashSet::new();
        let mut out = Vec::new();

        while exhausted_count < total_permutations {
            let (order, path) = tree.select(&mut rng);
            let was_exhausted_before = progress
                .get(&order)
                .map(|p| p.exhausted)
                .unwrap_or(false);
            if was_exhausted_before {
                // Already fully explored; still backpropagate a neutral
                // reward so UCB1 doesn't loop forever re-selecting it.
                tree.backpropagate(&path, 0.0);
                continue;
            }

            let by_depth = predicates_by_depth(predicates, &order);
            let entry = progress.entry(order.clone()).or_insert_with(|| PermutationProgress::fresh(k));
            let (emitted, spent) = run_episode(
                &relations,
                &order,
                &by_depth,
                entry,
                budget_per_episode,
                &mut dedup,
                &mut out,
                enums,
            )?;
            if entry.exhausted {
                exhausted_count += 1;
            }
            let reward = emitted as f64 / spent as f64;
            tree.backpropagate(&path, reward);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::VecRowSource;
    use kepler_catalog::Type;
    use kepler_expr::{BinaryOp, Value};

    fn rows(vals: Vec<i32>) -> Vec<Row> {
        vals.into_iter().map(|v| vec![Some(Value::Int(v))]).collect()
    }

    #[test]
    fn four_way_equi_join_finds_matching_diagonal() {
        let enums = EnumManager::new();
        let r0 = rows(vec![1, 2, 3]);
        let r1 = rows(vec![1, 2, 3]);
        let r2 = rows(vec![1, 2, 3]);
        let r3 = rows(vec![1, 2, 3]);

        let mut predicates = Vec::new();
        for (a, b) in [(0, 1), (1, 2), (1, 3)] {
            predicates.push(
                Expr::compare(
                    BinaryOp::Eq,
                    Expr::column_ref(a, 0, Type::int(false)),
                    Expr::column_ref(b, 0, Type::int(false)),
                )
                .unwrap(),
            );
        }

        let mut children: Vec<Box<dyn RowSource>> = vec![
            Box::new(VecRowSource::new(r0)),
            Box::new(VecRowSource::new(r1)),
            Box::new(VecRowSource::new(r2)),
            Box::new(VecRowSource::new(r3)),
        ];

        let result = SkinnerJoinExecutor::run(&mut children, &predicates, 10, &enums, 42).unwrap();
        assert_eq!(result.len(), 3);
        for row in &result {
            let v0 = row[0].clone();
            assert_eq!(v0, row[1]);
            assert_eq!(v0, row[2]);
            assert_eq!(v0, row[3]);
        }
    }

    #[test]
    fn small_budget_still_reaches_full_result_via_resumption() {
        let enums = EnumManager::new();
        let r0 = rows(vec![1, 2, 3]);
        let r1 = rows(vec![1, 2, 3]);
        let predicate = Expr::compare(
            BinaryOp::Eq,
            Expr::column_ref(0, 0, Type::int(false)),
            Expr::column_ref(1, 0, Type::int(false)),
        )
        .unwrap();

        let mut children: Vec<Box<dyn RowSource>> =
            vec![Box::new(VecRowSource::new(r0)), Box::new(VecRowSource::new(r1))];

        let result = SkinnerJoinExecutor::run(&mut children, &[predicate], 1, &enums, 1).unwrap();
        assert_eq!(result.len(), 3);
    }

    /// Rows are always emitted concatenated in original child order, never
    /// join order, so a tuple discovered under two different permutations
    /// fingerprints identically and is deduped rather than emitted twice
    /// with its columns swapped.
    #[test]
    fn emitted_rows_use_original_child_order_regardless_of_join_order() {
        let enums = EnumManager::new();
        // Disjoint value domains (1..=3 vs 101..=103) so a column-order
        // swap is observable: the correct row is always [small, large].
        let r0 = rows(vec![1, 2, 3]);
        let r1 = rows(vec![101, 102, 103]);
        let predicate = Expr::compare(
            BinaryOp::Eq,
            Expr::arith(
                BinaryOp::Add,
                Expr::column_ref(0, 0, Type::int(false)),
                Expr::literal(Value::Int(100)),
            )
            .unwrap(),
            Expr::column_ref(1, 0, Type::int(false)),
        )
        .unwrap();

        let mut children: Vec<Box<dyn RowSource>> =
            vec![Box::new(VecRowSource::new(r0)), Box::new(VecRowSource::new(r1))];

        // A large budget lets the bandit explore both orders (`[0,1]` and
        // `[1,0]`) to exhaustion before the join terminates.
        let result = SkinnerJoinExecutor::run(&mut children, &[predicate], 10_000, &enums, 7).unwrap();
        assert_eq!(result.len(), 3);
        for row in &result {
            match (&row[0], &row[1]) {
                (Some(Value::Int(a)), Some(Value::Int(b))) => {
                    assert!((1..=3).contains(a), "column 0 must hold the left relation's value, got {a}");
                    assert!((101..=103).contains(b), "column 1 must hold the right relation's value, got {b}");
                }
                other => panic!("unexpected row shape: {other:?}"),
            }
        }
    }
}
