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

//! The join-order search tree (spec.md §4.6, §REDESIGN FLAGS: "represent as
//! an indexed arena with parent pointers expressed as integer indices;
//! never expose the arena to operators other than the adaptive executor").
//!
//! A path from the root picking relations `r0, r1, ..., r(k-1)` without
//! repetition is one permutation of `{0..k}`. Each node holds one
//! `(w, n)` pair per still-available relation; descent always applies
//! UCB1 over the *current* node's children, so statistics for "pick `r1`
//! second" are kept separately under every different `r0`.

use rand::Rng;

const EXPLORATION_CONSTANT: f64 = std::f64::consts::SQRT_2;

#[derive(Debug, Clone)]
struct Edge {
    /// Relation index (original child index) this edge commits to.
    relation: usize,
    child: Option<usize>,
    visits: u64,
    reward: f64,
}

#[derive(Debug, Clone)]
struct UctNode {
    edges: Vec<Edge>,
}

impl UctNode {
    fn new(available: &[usize]) -> Self {
        UctNode {
            edges: available
                .iter()
                .map(|&relation| Edge {
                    relation,
                    child: None,
                    visits: 0,
                    reward: 0.0,
                })
                .collect(),
        }
    }

    fn total_visits(&self) -> u64 {
        self.edges.iter().map(|e| e.visits).sum()
    }

    fn unexplored(&self) -> Vec<usize> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.child.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    fn ucb1_best(&self) -> usize {
        let n_total = self.total_visits().max(1) as f64;
        self.edges
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                ucb1_score(a, n_total)
                    .partial_cmp(&ucb1_score(b, n_total))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .expect("node always has at least one edge")
    }
}

fn ucb1_score(edge: &Edge, n_total: f64) -> f64 {
    if edge.visits == 0 {
        return f64::INFINITY;
    }
    let n = edge.visits as f64;
    edge.reward / n + EXPLORATION_CONSTANT * (n_total.ln() / n).sqrt()
}

/// The UCT tree: a vector of nodes, the root always at index 0.
pub struct UctTree {
    nodes: Vec<UctNode>,
    relation_count: usize,
}

impl UctTree {
    pub fn new(relation_count: usize) -> Self {
        let all: Vec<usize> = (0..relation_count).collect();
        UctTree {
            nodes: vec![UctNode::new(&all)],
            relation_count,
        }
    }

    /// Descends from the root, choosing one child at a time -- an
    /// unexplored edge uniformly at random if any remain at this node,
    /// otherwise the UCB1-maximizing edge -- until a full permutation of
    /// all relations has been picked. Returns the permutation and the path
    /// of `(node_idx, edge_idx)` pairs walked, so the caller can
    /// backpropagate the episode's reward.
    pub fn select<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (Vec<usize>, Vec<(usize, usize)>) {
        let mut order = Vec::with_capacity(self.relation_count);
        let mut path = Vec::with_capacity(self.relation_count);
        let mut node_idx = 0;
        let mut available: Vec<usize> = (0..self.relation_count).collect();

        loop {
            let unexplored = self.nodes[node_idx].unexplored();
            let edge_idx = if !unexplored.is_empty() {
                unexplored[rng.gen_range(0..unexplored.len())]
            } else {
                self.nodes[node_idx].ucb1_best()
            };

            let relation = self.nodes[node_idx].edges[edge_idx].relation;
            order.push(relation);
            path.push((node_idx, edge_idx));
            available.retain(|&r| r != relation);

            if available.is_empty() {
                break;
            }

            let next_idx = match self.nodes[node_idx].edges[edge_idx].child {
                Some(idx) => idx,
                None => {
                    let idx = self.nodes.len();
                    self.nodes.push(UctNode::new(&available));
                    self.nodes[node_idx].edges[edge_idx].child = Some(idx);
                    idx
                }
            };
            node_idx = next_idx;
        }

        (order, path)
    }

    /// Backpropagates `reward` along `path`, incrementing each edge's
    /// visit count and cumulative reward (spec.md §4.6 step 4).
    pub fn backpropagate(&mut self, path: &[(usize, usize)], reward: f64) {
        for &(node_idx, edge_idx) in path {
            let edge = &mut self.nodes[node_idx].edges[edge_idx];
            edge.visits += 1;
            edge.reward += reward;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn select_visits_every_relation_exactly_once() {
        let mut tree = UctTree::new(3);
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let (order, path) = tree.select(&mut rng);
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1, 2]);
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn unexplored_edges_are_exhausted_before_ucb1_kicks_in() {
        let mut tree = UctTree::new(2);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let mut seen_orders = std::collections::HashSet::new();
        for _ in 0..2 {
            let (order, path) = tree.select(&mut rng);
            tree.backpropagate(&path, 1.0);
            seen_orders.insert(order);
        }
        assert_eq!(seen_orders.len(), 2);
    }
}
