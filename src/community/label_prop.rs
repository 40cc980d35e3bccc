//! Label propagation for community detection.
//!
//! Very fast O(E) algorithm where nodes adopt the label carrying the most
//! edge weight among their neighbors.

use super::traits::{CommunityDetection, Detection};
use crate::error::{Error, Result};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rand::prelude::*;
use std::collections::BTreeMap;

/// Label propagation community detection.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelPropagation {
    /// Maximum iterations.
    max_iter: usize,
}

impl LabelPropagation {
    /// Create a new label propagation detector.
    pub fn new() -> Self {
        Self { max_iter: 100 }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }
}

impl Default for LabelPropagation {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for LabelPropagation {
    fn detect<N, R>(&self, graph: &UnGraph<N, f64>, rng: &mut R) -> Result<Detection>
    where
        R: Rng + ?Sized,
    {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        // Initialize: each node has its own label
        let mut labels: Vec<usize> = (0..n).collect();
        let mut order: Vec<usize> = (0..n).collect();

        for _iter in 0..self.max_iter {
            let mut changed = false;
            order.shuffle(rng);

            for &node in &order {
                let mut label_weights: BTreeMap<usize, f64> = BTreeMap::new();
                for edge in graph.edges(NodeIndex::new(node)) {
                    let neighbor = edge.target().index();
                    if neighbor != node {
                        *label_weights.entry(labels[neighbor]).or_insert(0.0) += *edge.weight();
                    }
                }

                let max_weight = label_weights.values().copied().fold(f64::NEG_INFINITY, f64::max);
                if max_weight <= 0.0 {
                    continue;
                }

                // Ties broken randomly
                let candidates: Vec<usize> = label_weights
                    .iter()
                    .filter(|(_, &w)| w == max_weight)
                    .map(|(&label, _)| label)
                    .collect();
                // Keep the current label when it is among the best.
                if candidates.contains(&labels[node]) {
                    continue;
                }
                let new_label = if candidates.len() == 1 {
                    candidates[0]
                } else {
                    candidates[rng.random_range(0..candidates.len())]
                };

                labels[node] = new_label;
                changed = true;
            }

            if !changed {
                break;
            }
        }

        // Renumber to consecutive integers
        let mut unique: Vec<usize> = labels.to_vec();
        unique.sort_unstable();
        unique.dedup();

        Ok(Detection {
            labels: labels
                .iter()
                .map(|l| unique.binary_search(l).unwrap_or(0))
                .collect(),
            objective: None,
        })
    }
}
