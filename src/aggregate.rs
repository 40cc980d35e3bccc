//! Collapse a network into its macro network given a mapping.
//!
//! Every micro edge `(u, v, w)` whose endpoints land in different supernodes
//! contributes to the unordered macro pair `{map(u), map(v)}`; edges inside a
//! supernode are removed from the edge list and kept as that supernode's
//! `internal_weight`. The result is sorted, so it does not depend on the
//! order edges were inserted in.
//!
//! Invariant (weight conservation, [`EdgeWeighting::Sum`]):
//!
//! ```text
//! Σ macro edge weights + Σ internal weights = Σ micro edge weights
//! ```

use crate::error::Result;
use crate::mapping::{MacroId, Mapping};
use crate::network::{Network, NodeKey};
use std::collections::BTreeMap;

/// How collapsed edges are weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeWeighting {
    /// Sum the micro weights crossing between two supernodes.
    #[default]
    Sum,
    /// One unit-weight edge per distinct macro pair.
    Unit,
}

/// One edge of the macro network. `source < target` always holds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MacroEdge<M> {
    /// Smaller endpoint.
    pub source: M,
    /// Larger endpoint.
    pub target: M,
    /// Aggregated weight.
    pub weight: f64,
}

/// Result of collapsing a network.
#[derive(Debug, Clone)]
pub struct Aggregation<N: Ord> {
    /// Macro edges sorted by `(source, target)`; no self-pairs.
    pub edges: Vec<MacroEdge<MacroId<N>>>,
    /// Number of micro nodes per supernode.
    pub group_sizes: BTreeMap<MacroId<N>, usize>,
    /// Summed weight of micro edges inside each supernode (self-weight attribute).
    pub internal_weight: BTreeMap<MacroId<N>, f64>,
}

impl<N: NodeKey> Aggregation<N> {
    /// Number of supernodes.
    pub fn group_count(&self) -> usize {
        self.group_sizes.len()
    }

    /// Sum of macro edge weights.
    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.weight).sum()
    }

    /// Materialize the macro network. Every supernode becomes a node, isolated ones included.
    pub fn to_network(&self) -> Result<Network<MacroId<N>>> {
        let mut network = Network::new();
        for id in self.group_sizes.keys() {
            let _ = network.add_node(id.clone());
        }
        for edge in &self.edges {
            network.add_edge(edge.source.clone(), edge.target.clone(), edge.weight)?;
        }
        Ok(network)
    }

    /// Like [`Aggregation::to_network`], with each supernode's internal weight as a self-loop.
    pub fn to_network_with_self_loops(&self) -> Result<Network<MacroId<N>>> {
        let mut network = self.to_network()?;
        for (id, &w) in &self.internal_weight {
            if w > 0.0 {
                network.add_edge(id.clone(), id.clone(), w)?;
            }
        }
        Ok(network)
    }
}

/// Collapse `network` by `mapping`, summing crossing weights.
pub fn aggregate<N: NodeKey>(network: &Network<N>, mapping: &Mapping<N>) -> Result<Aggregation<N>> {
    aggregate_with(network, mapping, EdgeWeighting::Sum)
}

/// Collapse `network` by `mapping` with an explicit weighting policy.
///
/// Fails if the mapping does not cover exactly the nodes of the network.
pub fn aggregate_with<N: NodeKey>(
    network: &Network<N>,
    mapping: &Mapping<N>,
    weighting: EdgeWeighting,
) -> Result<Aggregation<N>> {
    mapping.validate(network)?;

    let mut group_sizes: BTreeMap<MacroId<N>, usize> = BTreeMap::new();
    for key in network.keys() {
        if let Some(id) = mapping.get(key) {
            *group_sizes.entry(id.clone()).or_insert(0) += 1;
        }
    }

    let mut pair_weights: BTreeMap<(MacroId<N>, MacroId<N>), f64> = BTreeMap::new();
    let mut internal_weight: BTreeMap<MacroId<N>, f64> = BTreeMap::new();

    for (u, v, w) in network.edges() {
        let (Some(mu), Some(mv)) = (mapping.get(u), mapping.get(v)) else {
            continue;
        };
        if mu == mv {
            *internal_weight.entry(mu.clone()).or_insert(0.0) += w;
            continue;
        }
        let key = if mu < mv {
            (mu.clone(), mv.clone())
        } else {
            (mv.clone(), mu.clone())
        };
        *pair_weights.entry(key).or_insert(0.0) += w;
    }

    let edges = pair_weights
        .into_iter()
        .map(|((source, target), w)| MacroEdge {
            source,
            target,
            weight: match weighting {
                EdgeWeighting::Sum => w,
                EdgeWeighting::Unit => 1.0,
            },
        })
        .collect();

    Ok(Aggregation {
        edges,
        group_sizes,
        internal_weight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_path_two_groups() {
        let network = Network::from_edges([(0, 1), (1, 2), (2, 3)]);
        let mapping = Mapping::from_pairs([
            (0, MacroId::Group(0)),
            (1, MacroId::Group(0)),
            (2, MacroId::Group(1)),
            (3, MacroId::Group(1)),
        ]);

        let agg = aggregate(&network, &mapping).unwrap();
        assert_eq!(
            agg.edges,
            vec![MacroEdge {
                source: MacroId::Group(0),
                target: MacroId::Group(1),
                weight: 1.0
            }]
        );
        assert_eq!(agg.group_sizes[&MacroId::Group(0)], 2);
        assert_eq!(agg.internal_weight[&MacroId::Group(1)], 1.0);
    }

    #[test]
    fn test_parallel_crossings_are_summed() {
        let network =
            Network::from_weighted_edges([("a", "c", 1.5), ("b", "c", 2.0), ("a", "b", 4.0)]).unwrap();
        let mapping = Mapping::from_pairs([
            ("a", MacroId::Group(0)),
            ("b", MacroId::Group(0)),
            ("c", MacroId::Node("c")),
        ]);

        let summed = aggregate(&network, &mapping).unwrap();
        assert_eq!(summed.edges.len(), 1);
        assert!((summed.edges[0].weight - 3.5).abs() < 1e-12);
        assert!((summed.internal_weight[&MacroId::Group(0)] - 4.0).abs() < 1e-12);

        let unit = aggregate_with(&network, &mapping, EdgeWeighting::Unit).unwrap();
        assert_eq!(unit.edges[0].weight, 1.0);
    }

    #[test]
    fn test_edge_order_does_not_matter() {
        let forward = Network::from_edges([(0, 1), (1, 2), (2, 3), (3, 0)]);
        let backward = Network::from_edges([(0, 3), (3, 2), (2, 1), (1, 0)]);
        let pairs = [
            (0, MacroId::Group(0)),
            (1, MacroId::Group(1)),
            (2, MacroId::Group(0)),
            (3, MacroId::Group(2)),
        ];
        let a = aggregate(&forward, &Mapping::from_pairs(pairs.clone())).unwrap();
        let b = aggregate(&backward, &Mapping::from_pairs(pairs)).unwrap();
        assert_eq!(a.edges, b.edges);
    }

    #[test]
    fn test_missing_node_is_rejected() {
        let network = Network::from_edges([(0, 1), (1, 2)]);
        let mapping = Mapping::from_pairs([(0, MacroId::Group(0)), (1, MacroId::Group(0))]);
        assert!(matches!(
            aggregate(&network, &mapping),
            Err(Error::UnmappedNode { .. })
        ));
    }

    #[test]
    fn test_to_network_keeps_isolated_supernodes() {
        let network = Network::from_edges([(0, 1), (2, 3)]);
        let mapping = Mapping::from_pairs([
            (0, MacroId::Group(0)),
            (1, MacroId::Group(0)),
            (2, MacroId::Group(1)),
            (3, MacroId::Group(1)),
        ]);
        let agg = aggregate(&network, &mapping).unwrap();
        let macro_net = agg.to_network().unwrap();
        assert_eq!(macro_net.node_count(), 2);
        assert_eq!(macro_net.edge_count(), 0);

        let with_loops = agg.to_network_with_self_loops().unwrap();
        assert_eq!(with_loops.edge_count(), 2);
        assert_eq!(with_loops.self_loops(), vec![true, true]);
        assert!((with_loops.total_weight() - network.total_weight()).abs() < 1e-12);
    }
}
