//! Community detection traits.

use crate::error::Result;
use petgraph::graph::UnGraph;
use rand::Rng;

/// Labels found by a detector, plus its objective if it optimizes one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Detection {
    /// Community per node index, numbered `0..k`.
    pub labels: Vec<usize>,
    /// Objective value of the returned partition (e.g. modularity).
    pub objective: Option<f64>,
}

/// Trait for community detection algorithms.
pub trait CommunityDetection {
    /// Detect communities in a weighted graph.
    ///
    /// Randomized choices (visit order, ties) draw from `rng`.
    fn detect<N, R>(&self, graph: &UnGraph<N, f64>, rng: &mut R) -> Result<Detection>
    where
        R: Rng + ?Sized;

    /// Get the resolution parameter (if applicable).
    fn resolution(&self) -> f64 {
        1.0
    }
}
