//! Louvain algorithm for community detection.
//!
//! Fast modularity optimization through local node moves and graph aggregation.
//!
//! ## The Algorithm (Blondel et al. 2008)
//!
//! Louvain is a multi-level, greedy modularity optimization algorithm:
//!
//! 1. **Phase 1 (Local Moving)**: Start with each node in its own community.
//!    Visit nodes in random order and move each to the neighboring community
//!    with the highest modularity gain, until a full sweep moves nothing.
//!
//! 2. **Phase 2 (Aggregation)**: Build a meta-graph where communities become
//!    single nodes. Edge weights are sums of edges between communities.
//!    Self-loops represent internal community edges.
//!
//! 3. **Iterate**: Repeat phases 1-2 on the meta-graph until modularity
//!    stops improving.
//!
//! Edge weights are used throughout. The reported objective is the modularity
//! of the final partition on the input graph.
//!
//! ## References
//!
//! Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! Journal of Statistical Mechanics: Theory and Experiment, P10008.

use super::traits::{CommunityDetection, Detection};
use crate::error::{Error, Result};
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use rand::prelude::*;
use std::collections::BTreeMap;

/// Weighted edge list of one level: `(i, j, w)` with `i < j`, plus self-loop weight per node.
struct Level {
    n: usize,
    edges: Vec<(usize, usize, f64)>,
    self_loops: Vec<f64>,
}

impl Level {
    fn from_graph<N>(graph: &UnGraph<N, f64>) -> Self {
        let n = graph.node_count();
        let mut edges = Vec::with_capacity(graph.edge_count());
        let mut self_loops = vec![0.0; n];
        for edge in graph.edge_references() {
            let (i, j) = (edge.source().index(), edge.target().index());
            let w = *edge.weight();
            if i == j {
                self_loops[i] += w;
            } else {
                edges.push((i.min(j), i.max(j), w));
            }
        }
        Self {
            n,
            edges,
            self_loops,
        }
    }

    /// Total weight, each edge and self-loop counted once.
    fn total_weight(&self) -> f64 {
        self.edges.iter().map(|(_, _, w)| w).sum::<f64>() + self.self_loops.iter().sum::<f64>()
    }

    /// Weighted degrees; a self-loop counts twice.
    fn degrees(&self) -> Vec<f64> {
        let mut degrees: Vec<f64> = self.self_loops.iter().map(|sl| 2.0 * sl).collect();
        for &(i, j, w) in &self.edges {
            degrees[i] += w;
            degrees[j] += w;
        }
        degrees
    }
}

/// Louvain community detection algorithm.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Louvain {
    /// Resolution parameter (gamma).
    resolution: f64,
    /// Maximum sweeps per level.
    max_iter: usize,
    /// Maximum levels of aggregation.
    max_levels: usize,
    /// Minimum modularity improvement to continue.
    min_modularity_gain: f64,
}

impl Louvain {
    /// Create a new Louvain detector with default settings.
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            max_iter: 100,
            max_levels: 10,
            min_modularity_gain: 1e-7,
        }
    }

    /// Set resolution parameter.
    ///
    /// Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set maximum sweeps per level.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set maximum aggregation levels.
    pub fn with_max_levels(mut self, levels: usize) -> Self {
        self.max_levels = levels;
        self
    }

    /// Modularity of a partition of one level.
    ///
    /// ```text
    /// Q = Σ_c [ L_c / m - γ (d_c / 2m)² ]
    /// ```
    fn modularity(&self, level: &Level, communities: &[usize]) -> f64 {
        let m = level.total_weight();
        if m == 0.0 {
            return 0.0;
        }
        let k = communities.iter().max().map_or(0, |&c| c + 1);
        let mut internal = vec![0.0; k];
        let mut degree = vec![0.0; k];

        for (i, d) in level.degrees().into_iter().enumerate() {
            degree[communities[i]] += d;
            internal[communities[i]] += level.self_loops[i];
        }
        for &(i, j, w) in &level.edges {
            if communities[i] == communities[j] {
                internal[communities[i]] += w;
            }
        }

        internal
            .iter()
            .zip(&degree)
            .map(|(l, d)| l / m - self.resolution * (d / (2.0 * m)).powi(2))
            .sum()
    }

    /// Phase 1: Local moving on weighted graph.
    /// Returns (communities, improved).
    fn local_moving<R: Rng + ?Sized>(&self, level: &Level, rng: &mut R) -> (Vec<usize>, bool) {
        let n = level.n;
        let mut adj: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        for &(i, j, w) in &level.edges {
            *adj[i].entry(j).or_insert(0.0) += w;
            *adj[j].entry(i).or_insert(0.0) += w;
        }

        let m = level.total_weight();
        if m == 0.0 {
            return ((0..n).collect(), false);
        }
        let degrees = level.degrees();

        let mut communities: Vec<usize> = (0..n).collect();
        let mut community_degrees = degrees.clone();
        let mut order: Vec<usize> = (0..n).collect();
        let mut any_improved = false;

        for _iter in 0..self.max_iter {
            let mut improved = false;
            order.shuffle(rng);

            for &node in &order {
                let current = communities[node];
                let ki = degrees[node];

                // Temporarily remove node from community
                community_degrees[current] -= ki;

                let mut community_weights: BTreeMap<usize, f64> = BTreeMap::new();
                for (&neighbor, &w) in &adj[node] {
                    *community_weights.entry(communities[neighbor]).or_insert(0.0) += w;
                }

                let gain = |comm: usize, ki_in: f64| {
                    ki_in / m - self.resolution * community_degrees[comm] * ki / (2.0 * m * m)
                };

                let mut best = current;
                let own = community_weights.get(&current).copied().unwrap_or(0.0);
                let mut best_gain = gain(current, own);
                for (&comm, &ki_in) in &community_weights {
                    let g = gain(comm, ki_in);
                    if g > best_gain + 1e-12 {
                        best_gain = g;
                        best = comm;
                    }
                }

                community_degrees[best] += ki;
                if best != current {
                    communities[node] = best;
                    improved = true;
                    any_improved = true;
                }
            }

            if !improved {
                break;
            }
        }

        (communities, any_improved)
    }

    /// Phase 2: Aggregate a level by its communities.
    ///
    /// Returns the contracted level and each old node's new index.
    fn aggregate(level: &Level, communities: &[usize]) -> (Level, Vec<usize>) {
        let mut unique: Vec<usize> = communities.to_vec();
        unique.sort_unstable();
        unique.dedup();
        let relabel: Vec<usize> = communities
            .iter()
            .map(|c| unique.binary_search(c).unwrap_or(0))
            .collect();

        let mut self_loops = vec![0.0; unique.len()];
        for (i, &sl) in level.self_loops.iter().enumerate() {
            self_loops[relabel[i]] += sl;
        }

        let mut weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for &(i, j, w) in &level.edges {
            let (ci, cj) = (relabel[i], relabel[j]);
            if ci == cj {
                self_loops[ci] += w;
            } else {
                *weights.entry((ci.min(cj), ci.max(cj))).or_insert(0.0) += w;
            }
        }

        let next = Level {
            n: unique.len(),
            edges: weights.into_iter().map(|((i, j), w)| (i, j, w)).collect(),
            self_loops,
        };
        (next, relabel)
    }
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for Louvain {
    fn detect<N, R>(&self, graph: &UnGraph<N, f64>, rng: &mut R) -> Result<Detection>
    where
        R: Rng + ?Sized,
    {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        let original = Level::from_graph(graph);
        if original.total_weight() == 0.0 {
            // No edges: each node is its own community
            return Ok(Detection {
                labels: (0..n).collect(),
                objective: Some(0.0),
            });
        }

        // membership[v] = node of the current level that holds original node v
        let mut membership: Vec<usize> = (0..n).collect();
        let mut prev_modularity = f64::NEG_INFINITY;
        let mut current = Level::from_graph(graph);

        for _level in 0..self.max_levels {
            let (partition, improved) = self.local_moving(&current, rng);
            if !improved {
                break;
            }

            let (next, relabel) = Self::aggregate(&current, &partition);
            for m in &mut membership {
                *m = relabel[*m];
            }

            let mod_now = self.modularity(&next, &(0..next.n).collect::<Vec<_>>());
            let stalled = next.n == current.n || mod_now - prev_modularity < self.min_modularity_gain;
            prev_modularity = mod_now;
            current = next;
            if stalled {
                break;
            }
        }

        let objective = self.modularity(&original, &membership);
        Ok(Detection {
            labels: membership,
            objective: Some(objective),
        })
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }
}
