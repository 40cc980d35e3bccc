//! Community detection algorithms for graphs.
//!
//! Given a graph, find natural groupings where nodes within groups are
//! densely connected, and connections between groups are sparse. The
//! consistency test uses these detectors to recover block structure from
//! resampled networks.
//!
//! ## The Modularity Objective
//!
//! Louvain optimizes **modularity** Q, which compares the actual weight
//! within communities to the expected weight in a random graph with the same
//! strength sequence:
//!
//! ```text
//! Q = (1/2m) × Σ[A_ij - γ(k_i × k_j)/(2m)] × δ(c_i, c_j)
//! ```
//!
//! Where:
//! - m = total edge weight (sum of all edges)
//! - A_ij = edge weight between i and j
//! - k_i = weighted degree of node i
//! - γ = resolution parameter
//! - δ(c_i, c_j) = 1 if i and j are in same community
//!
//! ## Algorithms
//!
//! ### Louvain
//!
//! The multi-level modularity heuristic ([Blondel et al. 2008](https://arxiv.org/abs/0803.0476)).
//! Reports the modularity of its partition as the objective.
//!
//! ### Label Propagation
//!
//! O(E) algorithm that spreads labels through the network. Each node adopts
//! the label with the most edge weight among its neighbors. Fast but
//! approximate; no objective.
//!
//! ## Usage
//!
//! ```rust
//! use coarsen::community::{CommunityDetection, Louvain};
//! use petgraph::graph::UnGraph;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let graph = UnGraph::<(), f64>::from_edges([(0u32, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0)]);
//! let mut rng = StdRng::seed_from_u64(1);
//! let detection = Louvain::new().detect(&graph, &mut rng).unwrap();
//! assert_eq!(detection.labels, vec![0, 0, 0]);
//! ```
//!
//! ## References
//!
//! - Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! - Raghavan, Albert, Kumara (2007). "Near linear time algorithm to detect
//!   community structures in large-scale networks."

mod label_prop;
mod louvain;
mod traits;

pub use label_prop::LabelPropagation;
pub use louvain::Louvain;
pub use traits::{CommunityDetection, Detection};
