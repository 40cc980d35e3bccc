//! Stochastic block models fitted to a fixed partition.
//!
//! [`BlockModel::fit`] reads block sizes, edge counts between and within
//! blocks, and node degrees off a network (topology only: weights and
//! self-loops are ignored). [`BlockModel::sample`] draws a fresh simple
//! network with the same node count from the fitted model.
//!
//! Two flavours:
//!
//! ```text
//! Bernoulli        p_ij = e_rs / pairs(r, s)
//! DegreeCorrected  p_ij = min(1, θ_i θ_j ω_rs),   θ_i = k_i / κ_r,
//!                  ω_rs = e_rs (r ≠ s), 2 e_rr (r = s)
//! ```
//!
//! where `r`, `s` are the blocks of `i`, `j`, `e_rs` counts edges between
//! them, `k_i` is the degree of `i` and `κ_r` the total degree of block `r`.
//! The degree-corrected model keeps hubs as hubs in expectation.

use crate::error::{Error, Result};
use crate::network::{Network, NodeKey};
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};
use std::collections::HashMap;

/// Which edge probabilities the model uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockModelKind {
    /// Uniform density per block pair.
    Bernoulli,
    /// Block densities scaled by node degree.
    #[default]
    DegreeCorrected,
}

/// A block model with a fixed node → block assignment.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockModel {
    kind: BlockModelKind,
    /// Block of each node position, numbered `0..B` in first-seen order.
    blocks: Vec<usize>,
    /// Nodes per block.
    sizes: Vec<usize>,
    /// Symmetric `B × B` edge counts; the diagonal counts edges inside a block once.
    edge_counts: Vec<Vec<f64>>,
    /// Degree of each node.
    degrees: Vec<f64>,
    /// Total degree per block.
    block_degrees: Vec<f64>,
}

impl BlockModel {
    /// Fit a degree-corrected model.
    pub fn fit<N: NodeKey>(network: &Network<N>, partition: &[usize]) -> Result<Self> {
        Self::fit_with(network, partition, BlockModelKind::default())
    }

    /// Fit a model of the given kind.
    ///
    /// `partition[i]` is the block of the node at position `i`; label values are arbitrary.
    pub fn fit_with<N: NodeKey>(
        network: &Network<N>,
        partition: &[usize],
        kind: BlockModelKind,
    ) -> Result<Self> {
        let n = network.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if partition.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: partition.len(),
            });
        }

        let mut renumber: HashMap<usize, usize> = HashMap::new();
        let blocks: Vec<usize> = partition
            .iter()
            .map(|&label| {
                let next = renumber.len();
                *renumber.entry(label).or_insert(next)
            })
            .collect();
        let b = renumber.len();

        let mut sizes = vec![0; b];
        for &r in &blocks {
            sizes[r] += 1;
        }

        let adj = network.neighbor_lists();
        let degrees: Vec<f64> = adj.iter().map(|list| list.len() as f64).collect();
        let mut block_degrees = vec![0.0; b];
        for (i, &k) in degrees.iter().enumerate() {
            block_degrees[blocks[i]] += k;
        }

        let mut edge_counts = vec![vec![0.0; b]; b];
        for (i, list) in adj.iter().enumerate() {
            for &j in list.iter().filter(|&&j| j > i) {
                let (r, s) = (blocks[i], blocks[j]);
                edge_counts[r][s] += 1.0;
                if r != s {
                    edge_counts[s][r] += 1.0;
                }
            }
        }

        Ok(Self {
            kind,
            blocks,
            sizes,
            edge_counts,
            degrees,
            block_degrees,
        })
    }

    /// Model flavour.
    pub fn kind(&self) -> BlockModelKind {
        self.kind
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of blocks.
    pub fn block_count(&self) -> usize {
        self.sizes.len()
    }

    /// Block of each node, numbered `0..B` in first-seen order.
    pub fn blocks(&self) -> &[usize] {
        &self.blocks
    }

    /// Edges counted between blocks `r` and `s` (inside `r` when equal).
    pub fn edges_between(&self, r: usize, s: usize) -> f64 {
        self.edge_counts
            .get(r)
            .and_then(|row| row.get(s))
            .copied()
            .unwrap_or(0.0)
    }

    /// Probability of an edge between node positions `i` and `j`.
    pub fn edge_probability(&self, i: usize, j: usize) -> f64 {
        if i == j || i >= self.node_count() || j >= self.node_count() {
            return 0.0;
        }
        let (r, s) = (self.blocks[i], self.blocks[j]);
        let e = self.edge_counts[r][s];
        let p = match self.kind {
            BlockModelKind::Bernoulli => {
                let pairs = if r == s {
                    let m = self.sizes[r] as f64;
                    m * (m - 1.0) / 2.0
                } else {
                    (self.sizes[r] * self.sizes[s]) as f64
                };
                if pairs > 0.0 {
                    e / pairs
                } else {
                    0.0
                }
            }
            BlockModelKind::DegreeCorrected => {
                let theta = |v: usize, block: usize| {
                    let kappa = self.block_degrees[block];
                    if kappa > 0.0 {
                        self.degrees[v] / kappa
                    } else {
                        0.0
                    }
                };
                let omega = if r == s { 2.0 * e } else { e };
                theta(i, r) * theta(j, s) * omega
            }
        };
        p.clamp(0.0, 1.0)
    }

    /// Expected number of edges of a sample.
    pub fn expected_edges(&self) -> f64 {
        let n = self.node_count();
        (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .map(|(i, j)| self.edge_probability(i, j))
            .sum()
    }

    /// Draw a simple unit-weight network over nodes `0..n`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Network<usize>> {
        let n = self.node_count();
        let mut network = Network::new();
        for i in 0..n {
            let _ = network.add_node(i);
        }
        for i in 0..n {
            for j in (i + 1)..n {
                let p = self.edge_probability(i, j);
                if p <= 0.0 {
                    continue;
                }
                let coin = Bernoulli::new(p).map_err(|_| Error::InvalidParameter {
                    name: "probability",
                    message: "edge probability outside [0, 1]",
                })?;
                if coin.sample(rng) {
                    network.add_edge(i, j, 1.0)?;
                }
            }
        }
        Ok(network)
    }
}
