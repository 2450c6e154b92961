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

//! `SkinnerScanSelect` (spec.md §4.3): partitions predicates into "cheap"
//! (no regex anywhere in the subtree) and "expensive" (contains one) groups,
//! always evaluates cheap before expensive, and within each group learns an
//! evaluation order with a UCB1-style bandit over fixed-size tuple chunks.
//! Grounded on the join executor's own UCT bandit
//! ([`kepler_join`]'s `skinner::uct`) for the scoring shape, applied here to
//! predicate order instead of join order.

use std::time::Instant;

use kepler_common::Result;
use kepler_expr::Expr;
use kepler_join::{Row, RowSource, SingleRowBindings};
use kepler_plan::SkinnerScanSelectOp;
use kepler_runtime::EnumManager;

use crate::columns::OpenedColumns;

const EXPLORATION_CONSTANT: f64 = 1.41421356237; // sqrt(2), matching kepler_join's UCT bandit.

/// Running reward statistics for one predicate: reject rate divided by
/// average evaluation cost rewards predicates that are both selective and
/// cheap, the ordering spec.md §4.3 calls "steady state."
#[derive(Clone, Copy, Default)]
struct PredicateStats {
    trials: u64,
    rejects: u64,
    total_nanos: u64,
}

impl PredicateStats {
    fn score(&self, total_trials: u64) -> f64 {
        if self.trials == 0 {
            return f64::INFINITY;
        }
        let reject_rate = self.rejects as f64 / self.trials as f64;
        let avg_cost = (self.total_nanos as f64 / self.trials as f64).max(1.0);
        let exploitation = reject_rate / avg_cost * 1_000.0;
        let exploration = EXPLORATION_CONSTANT * ((total_trials as f64).ln() / self.trials as f64).sqrt();
        exploitation + exploration
    }

    fn merge(&mut self, other: &PredicateStats) {
        self.trials += other.trials;
        self.rejects += other.rejects;
        self.total_nanos += other.total_nanos;
    }
}

fn contains_regex(expr: &Expr) -> bool {
    match expr {
        Expr::Regex { .. } => true,
        Expr::Literal(..) | Expr::ColumnRef { .. } | Expr::VirtualColumnRef { .. } => false,
        Expr::Binary { left, right, .. } => contains_regex(left) || contains_regex(right),
        Expr::Unary { child, .. }
        | Expr::Extract { child, .. }
        | Expr::IntToFloat { child }
        | Expr::Aggregate { child, .. }
        | Expr::EnumIn { child, .. } => contains_regex(child),
        Expr::Case { cond, then, els, .. } => contains_regex(cond) || contains_regex(then) || contains_regex(els),
    }
}

/// One predicate group (cheap or expensive), ordered by descending bandit
/// score before each chunk.
struct Group {
    predicates: Vec<Expr>,
    stats: Vec<PredicateStats>,
    /// Buffered this chunk; merged into `stats` only when the chunk
    /// completes (spec.md §4.3: "on stop the current chunk's state is
    /// discarded safely").
    pending: Vec<PredicateStats>,
    order: Vec<usize>,
}

impl Group {
    fn new(predicates: Vec<Expr>) -> Self {
        let n = predicates.len();
        Group {
            predicates,
            stats: vec![PredicateStats::default(); n],
            pending: vec![PredicateStats::default(); n],
            order: (0..n).collect(),
        }
    }

    fn reorder(&mut self) {
        let total: u64 = self.stats.iter().map(|s| s.trials).sum::<u64>().max(1);
        let stats = &self.stats;
        self.order.sort_by(|&a, &b| {
            stats[b]
                .score(total)
                .partial_cmp(&stats[a].score(total))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    fn commit_chunk(&mut self) {
        for (stat, pending) in self.stats.iter_mut().zip(self.pending.iter()) {
            stat.merge(pending);
        }
        for p in &mut self.pending {
            *p = PredicateStats::default();
        }
    }

    fn discard_chunk(&mut self) {
        for p in &mut self.pending {
            *p = PredicateStats::default();
        }
    }
}

pub struct SkinnerScanIter<'a> {
    opened: OpenedColumns,
    output_map: Vec<usize>,
    enums: &'a EnumManager,
    cheap: Group,
    expensive: Group,
    chunk_size: u32,
    next_tuple: u32,
    chunk_remaining: u32,
}

impl<'a> SkinnerScanIter<'a> {
    pub fn new(ctx: &crate::context::ExecutionContext<'a>, op: &SkinnerScanSelectOp) -> Result<Self> {
        let table = ctx.db.get(&op.table)?;
        let opened = OpenedColumns::open(table, &op.scan_schema, ctx.files)?;
        let output_map = op
            .output
            .columns()
            .iter()
            .map(|c| match &c.expr {
                Expr::VirtualColumnRef { column_idx, .. } => *column_idx,
                other => unreachable!("SkinnerScanSelect output column is not a virtual ref: {other:?}"),
            })
            .collect();

        let (cheap, expensive): (Vec<Expr>, Vec<Expr>) = op.predicates.iter().cloned().partition(|p| !contains_regex(p));

        let chunk_size = op.chunk_size.max(1);
        Ok(SkinnerScanIter {
            opened,
            output_map,
            enums: ctx.enums,
            cheap: Group::new(cheap),
            expensive: Group::new(expensive),
            chunk_size,
            next_tuple: 0,
            chunk_remaining: chunk_size,
        })
    }

    fn evaluate_row(&mut self, row: &Row) -> Result<bool> {
        for group in [&mut self.cheap, &mut self.expensive] {
            for &idx in &group.order {
                let start = Instant::now();
                let bindings = SingleRowBindings::new(row);
                let passed = matches!(
                    group.predicates[idx].evaluate(&bindings, self.enums)?.and_then(|v| v.as_bool()),
                    Some(true)
                );
                let elapsed = start.elapsed().as_nanos() as u64;
                let stat = &mut group.pending[idx];
                stat.trials += 1;
                stat.total_nanos += elapsed.max(1);
                if !passed {
                    stat.rejects += 1;
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn end_chunk(&mut self) {
        self.cheap.commit_chunk();
        self.expensive.commit_chunk();
        self.cheap.reorder();
        self.expensive.reorder();
        self.chunk_remaining = self.chunk_size;
    }
}

impl RowSource for SkinnerScanIter<'_> {
    fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            if self.next_tuple >= self.opened.size() {
                self.end_chunk();
                return Ok(None);
            }
            let row = self.opened.get_row(self.next_tuple)?;
            self.next_tuple += 1;
            self.chunk_remaining -= 1;
            let passes = self.evaluate_row(&row)?;

            if self.chunk_remaining == 0 {
                self.end_chunk();
            }

            if passes {
                let out = self.output_map.iter().map(|&i| row[i].clone()).collect();
                return Ok(Some(out));
            }
        }
    }
}

impl Drop for SkinnerScanIter<'_> {
    /// A dropped-mid-chunk iterator discards that chunk's pending stats by
    /// construction -- `pending` simply never gets merged into `stats`.
    /// This exists so cancellation (spec.md §4.3) is documented, not to
    /// perform any extra work.
    fn drop(&mut self) {
        self.cheap.discard_chunk();
        self.expensive.discard_chunk();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kepler_expr::Value;
    use kepler_plan::builder::{eq, lit, virt_ref};
    use kepler_catalog::Type;

    #[test]
    fn cheap_predicate_never_reorders_past_regex() {
        let regex_pred = Expr::regex_match(virt_ref(0, Type::text(false)), "^a").unwrap();
        let cheap_pred = eq(virt_ref(1, Type::int(false)), lit(Value::Int(1))).unwrap();
        assert!(contains_regex(&regex_pred));
        assert!(!contains_regex(&cheap_pred));
    }

    #[test]
    fn predicate_stats_reward_cheap_selective_predicates() {
        let mut selective = PredicateStats::default();
        selective.trials = 100;
        selective.rejects = 90;
        selective.total_nanos = 100;

        let mut cheap_unselective = PredicateStats::default();
        cheap_unselective.trials = 100;
        cheap_unselective.rejects = 1;
        cheap_unselective.total_nanos = 100;

        assert!(selective.score(200) > cheap_unselective.score(200));
    }
}
