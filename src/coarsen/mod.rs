//! Node-grouping strategies that turn a micro network into a macro network.
//!
//! Every strategy produces a [`Mapping`] from micro nodes to supernodes; the
//! shared [`aggregate`](crate::aggregate()) step then collapses the edges. The
//! strategies are independent heuristics, none of them claims an optimal
//! partition.
//!
//! ## Strategies
//!
//! ### Spectral coarse graining
//!
//! Gfeller & De Los Rios (2007). Nodes whose entries in the leading non-trivial
//! left eigenvectors of the random-walk matrix fall into the same intervals are
//! merged. Finer intervals or more eigenvectors give a finer macro network.
//!
//! ### Laplacian renormalization
//!
//! Villegas et al. (2023). The heat kernel `exp(-τL)` describes diffusion up to
//! time τ; a node is absorbed by any partner that holds at least as much of
//! its diffused mass as the node itself. Larger τ merges more.
//!
//! ### Supernodes
//!
//! Seeds come from the 2-core (CoreHD order); regions grow breadth-first from
//! all seeds at once, and contested nodes are settled by a tie-break policy.
//!
//! ### Network quotients
//!
//! Xiao et al. (2008). Nodes that are interchangeable under a graph
//! automorphism (same orbit) collapse into one supernode.
//!
//! ### Random burning
//!
//! Song et al. (2005). Box covering: repeatedly burn a random ball of radius r
//! out of the remaining network.
//!
//! ## Usage
//!
//! ```rust
//! use coarsen::{Coarsener, Network, SupernodePartitioner};
//!
//! let network = Network::from_edges([(0, 1), (1, 2), (2, 0), (2, 3), (3, 4)]);
//! let reduction = SupernodePartitioner::new(1)
//!     .with_seed(7)
//!     .reduce(&network)
//!     .unwrap();
//! assert_eq!(reduction.coarsening.mapping.len(), 5);
//! ```

mod burning;
mod diffusion;
mod orbit;
mod spectral;
mod supernode;

pub use burning::{burning_partition, BurningPartitioner};
pub use diffusion::{diffusion_partition, DiffusionPartitioner};
pub use orbit::{orbit_partition, OrbitPartitioner};
pub use spectral::{spectral_partition, RandomWalkSpectrum, SpectralPartitioner};
pub use supernode::{supernode_partition, SupernodePartitioner, TieBreak};

use crate::aggregate::{aggregate_with, Aggregation, EdgeWeighting};
use crate::error::Result;
use crate::mapping::{MacroId, Mapping};
use crate::network::{Network, NodeKey};
use petgraph::unionfind::UnionFind;

/// Informational conditions attached to a valid result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Fewer informative eigenvectors than requested were available.
    DegenerateSpectrum {
        /// Eigenvectors requested.
        requested: usize,
        /// Eigenvectors actually used.
        used: usize,
    },
    /// The 2-core emptied before all seeds were chosen.
    SeedsExhausted {
        /// Seeds requested.
        requested: usize,
        /// Seeds found.
        found: usize,
    },
    /// Growth stopped with nodes left unreached; they share the catch-all group.
    GrowthHalted {
        /// Last radius that labeled at least one node.
        radius: usize,
        /// Nodes sent to the catch-all group.
        unassigned: usize,
    },
    /// Every node ended up in a single supernode.
    Collapsed,
}

/// Mapping plus whatever the strategy wants the caller to know.
#[derive(Debug, Clone)]
pub struct Coarsening<N: Ord> {
    /// Micro → macro assignment covering every node.
    pub mapping: Mapping<N>,
    /// Soft conditions hit along the way.
    pub notices: Vec<Notice>,
}

impl<N: NodeKey> Coarsening<N> {
    pub(crate) fn new(mapping: Mapping<N>) -> Self {
        Self {
            mapping,
            notices: Vec::new(),
        }
    }
}

/// Coarsening together with its aggregated macro edges.
#[derive(Debug, Clone)]
pub struct Reduction<N: Ord> {
    /// The grouping.
    pub coarsening: Coarsening<N>,
    /// The collapsed network.
    pub aggregation: Aggregation<N>,
}

/// Trait for node-grouping strategies.
pub trait Coarsener {
    /// Group the nodes of a network into supernodes.
    fn coarsen<N: NodeKey>(&self, network: &Network<N>) -> Result<Coarsening<N>>;

    /// How this strategy weights collapsed edges.
    fn edge_weighting(&self) -> EdgeWeighting {
        EdgeWeighting::Sum
    }

    /// Coarsen, then aggregate with [`Coarsener::edge_weighting`].
    fn reduce<N: NodeKey>(&self, network: &Network<N>) -> Result<Reduction<N>> {
        let coarsening = self.coarsen(network)?;
        let aggregation = aggregate_with(network, &coarsening.mapping, self.edge_weighting())?;
        Ok(Reduction {
            coarsening,
            aggregation,
        })
    }
}

/// Members of each union-find set, sets ordered by smallest member.
pub(crate) fn disjoint_sets(sets: UnionFind<usize>) -> Vec<Vec<usize>> {
    let labels = sets.into_labeling();
    let mut slot: Vec<Option<usize>> = vec![None; labels.len()];
    let mut members: Vec<Vec<usize>> = Vec::new();
    for (x, &root) in labels.iter().enumerate() {
        match slot[root] {
            Some(s) => members[s].push(x),
            None => {
                slot[root] = Some(members.len());
                members.push(vec![x]);
            }
        }
    }
    members
}

/// Mapping from position components: multi-node components become
/// `Group(0..)` in order, singletons keep their own key.
pub(crate) fn component_mapping<N: NodeKey>(
    network: &Network<N>,
    components: &[Vec<usize>],
) -> Mapping<N> {
    let mut next_group = 0;
    let mut pairs = Vec::with_capacity(network.node_count());
    for component in components {
        let group = (component.len() > 1).then(|| {
            next_group += 1;
            next_group - 1
        });
        for key in component.iter().filter_map(|&pos| network.key(pos)) {
            let id = match group {
                Some(k) => MacroId::Group(k),
                None => MacroId::Node(key.clone()),
            };
            pairs.push((key.clone(), id));
        }
    }
    Mapping::from_pairs(pairs)
}

/// Nodes of the 2-core of the graph restricted to `alive`, found by peeling.
///
/// Returns per-node membership and the degree of each member inside the core.
pub(crate) fn two_core(adj: &[Vec<usize>], alive: &[bool]) -> (Vec<bool>, Vec<usize>) {
    let n = adj.len();
    let mut in_core = alive.to_vec();
    let mut degree: Vec<usize> = (0..n)
        .map(|i| {
            if in_core[i] {
                adj[i].iter().filter(|&&j| in_core[j]).count()
            } else {
                0
            }
        })
        .collect();

    let mut stack: Vec<usize> = (0..n).filter(|&i| in_core[i] && degree[i] < 2).collect();
    while let Some(u) = stack.pop() {
        if !in_core[u] {
            continue;
        }
        in_core[u] = false;
        for &v in &adj[u] {
            if in_core[v] {
                degree[v] -= 1;
                if degree[v] < 2 {
                    stack.push(v);
                }
            }
        }
    }
    for i in 0..n {
        if !in_core[i] {
            degree[i] = 0;
        }
    }
    (in_core, degree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disjoint_sets_order_by_smallest_member() {
        let mut sets = UnionFind::new(6);
        sets.union(4, 1);
        sets.union(3, 2);
        sets.union(2, 4);
        assert_eq!(
            disjoint_sets(sets),
            vec![vec![0], vec![1, 2, 3, 4], vec![5]]
        );
    }

    #[test]
    fn test_two_core_peels_trees() {
        // Triangle 0-1-2 with a pendant path 2-3-4.
        let adj = vec![vec![1, 2], vec![0, 2], vec![0, 1, 3], vec![2, 4], vec![3]];
        let (core, degree) = two_core(&adj, &[true; 5]);
        assert_eq!(core, vec![true, true, true, false, false]);
        assert_eq!(degree[2], 2);

        let (core, _) = two_core(&adj, &[false, true, true, true, true]);
        assert!(core.iter().all(|&c| !c));
    }
}
