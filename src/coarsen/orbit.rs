//! Network quotients by automorphism orbits (Xiao, Wu & Wang 2008).
//!
//! Nodes that a symmetry of the network can exchange are structurally
//! indistinguishable; each orbit collapses into one supernode. Edge weights
//! are ignored and a self-loop acts as a node color, so only looped nodes can
//! be exchanged with looped nodes. The quotient keeps one unit-weight edge per
//! distinct pair of orbits.

use super::{component_mapping, Coarsener, Coarsening, Notice};
use crate::aggregate::EdgeWeighting;
use crate::automorphism::{AutomorphismSolver, RefinementSearch};
use crate::error::{Error, Result};
use crate::network::{Network, NodeKey};
use tracing::debug;

/// Orbit (quotient) partitioner.
#[derive(Debug, Clone, Default)]
pub struct OrbitPartitioner<A = RefinementSearch> {
    solver: A,
}

impl OrbitPartitioner {
    /// Partitioner using [`RefinementSearch`].
    pub fn new() -> Self {
        Self {
            solver: RefinementSearch,
        }
    }
}

impl<A: AutomorphismSolver> OrbitPartitioner<A> {
    /// Swap the automorphism backend.
    pub fn with_solver<B: AutomorphismSolver>(self, solver: B) -> OrbitPartitioner<B> {
        OrbitPartitioner { solver }
    }
}

impl<A: AutomorphismSolver> Coarsener for OrbitPartitioner<A> {
    fn coarsen<N: NodeKey>(&self, network: &Network<N>) -> Result<Coarsening<N>> {
        if network.is_empty() {
            return Err(Error::EmptyInput);
        }
        let n = network.node_count();
        let colors: Vec<usize> = network.self_loops().into_iter().map(usize::from).collect();
        let labels = self.solver.orbits(&network.neighbor_lists(), &colors);

        let mut orbits: Vec<Vec<usize>> = Vec::new();
        let mut slot: Vec<Option<usize>> = vec![None; n];
        for (v, &label) in labels.iter().enumerate() {
            if label >= n {
                return Err(Error::Numerical(format!("orbit label {label} out of range")));
            }
            match slot[label] {
                Some(s) => orbits[s].push(v),
                None => {
                    slot[label] = Some(orbits.len());
                    orbits.push(vec![v]);
                }
            }
        }

        let mut coarsening = Coarsening::new(component_mapping(network, &orbits));
        if n > 1 && orbits.len() == 1 {
            coarsening.notices.push(Notice::Collapsed);
        }
        debug!(nodes = n, orbits = orbits.len(), "orbit quotient done");
        Ok(coarsening)
    }

    fn edge_weighting(&self) -> EdgeWeighting {
        EdgeWeighting::Unit
    }
}

/// Orbit quotient with the default solver.
pub fn orbit_partition<N: NodeKey>(network: &Network<N>) -> Result<Coarsening<N>> {
    OrbitPartitioner::new().coarsen(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MacroId;

    #[test]
    fn test_star_quotient() {
        let star = Network::from_edges([("hub", "a"), ("hub", "b"), ("hub", "c")]);
        let reduction = OrbitPartitioner::new().reduce(&star).unwrap();
        let m = &reduction.coarsening.mapping;
        assert_eq!(m.get(&"hub"), Some(&MacroId::Node("hub")));
        assert_eq!(m.get(&"a"), Some(&MacroId::Group(0)));
        assert_eq!(m.get(&"c"), Some(&MacroId::Group(0)));

        // Three micro edges collapse into a single unit edge.
        assert_eq!(reduction.aggregation.edges.len(), 1);
        assert_eq!(reduction.aggregation.edges[0].weight, 1.0);
    }

    #[test]
    fn test_cycle_collapses() {
        let cycle = Network::from_edges([(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]);
        let coarsening = orbit_partition(&cycle).unwrap();
        assert_eq!(coarsening.mapping.group_count(), 1);
        assert_eq!(coarsening.notices, vec![Notice::Collapsed]);
    }

    #[test]
    fn test_self_loop_breaks_symmetry() {
        let mut path = Network::from_edges([(0, 1), (1, 2)]);
        assert_eq!(orbit_partition(&path).unwrap().mapping.group_count(), 2);

        path.add_edge(0, 0, 1.0).unwrap();
        let coarsening = orbit_partition(&path).unwrap();
        assert_eq!(coarsening.mapping.group_count(), 3);
        assert!(coarsening.mapping.iter().all(|(_, id)| !id.is_group()));
    }

    #[test]
    fn test_weights_are_ignored() {
        let path = Network::from_weighted_edges([(0, 1, 1.0), (1, 2, 7.5)]).unwrap();
        let m = orbit_partition(&path).unwrap().mapping;
        assert_eq!(m.get(&0), m.get(&2));
    }
}
