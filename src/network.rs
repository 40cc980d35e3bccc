//! Weighted undirected networks keyed by opaque node identifiers.
//!
//! [`Network`] wraps a `petgraph::UnGraph<N, f64>` and keeps a key → index
//! lookup next to it. Every node has a stable **position** `0..n` (its
//! insertion order), which is the row/column used by every matrix built from
//! the network and the index used by partition vectors.
//!
//! Invariants:
//! - At most one edge per unordered pair: adding an existing edge replaces its weight.
//! - Weights are finite and non-negative.
//! - Self-loops are allowed on input; each algorithm documents how it treats them.

use crate::error::{Error, Result};
use ndarray::Array2;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Requirements on node identifiers.
///
/// Blanket-implemented for anything cloneable, totally ordered and hashable
/// (integers, strings, tuples, [`MacroId`](crate::MacroId) from a previous pass).
pub trait NodeKey: Clone + Ord + Hash + fmt::Debug {}

impl<T: Clone + Ord + Hash + fmt::Debug> NodeKey for T {}

/// A weighted undirected network.
#[derive(Debug, Clone)]
pub struct Network<N> {
    graph: UnGraph<N, f64>,
    index: HashMap<N, NodeIndex>,
}

impl<N: NodeKey> Network<N> {
    /// Create an empty network.
    pub fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            index: HashMap::new(),
        }
    }

    /// Build a network from unweighted edges (each gets weight 1.0).
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (N, N)>,
    {
        let mut network = Self::new();
        for (u, v) in edges {
            network.insert_edge(u, v, 1.0);
        }
        network
    }

    /// Build a network from weighted edges.
    pub fn from_weighted_edges<I>(edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, N, f64)>,
    {
        let mut network = Self::new();
        for (u, v, w) in edges {
            network.add_edge(u, v, w)?;
        }
        Ok(network)
    }

    /// Add a node if absent. Returns its position.
    pub fn add_node(&mut self, key: N) -> usize {
        if let Some(&idx) = self.index.get(&key) {
            return idx.index();
        }
        let idx = self.graph.add_node(key.clone());
        self.index.insert(key, idx);
        idx.index()
    }

    /// Add (or re-weight) the edge `{u, v}`, creating missing endpoints.
    pub fn add_edge(&mut self, u: N, v: N, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidParameter {
                name: "weight",
                message: "edge weights must be finite and non-negative",
            });
        }
        self.insert_edge(u, v, weight);
        Ok(())
    }

    fn insert_edge(&mut self, u: N, v: N, weight: f64) {
        let a = NodeIndex::new(self.add_node(u));
        let b = NodeIndex::new(self.add_node(v));
        let _ = self.graph.update_edge(a, b, weight);
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges (self-loops included).
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True when the network has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Position of a node key.
    pub fn position(&self, key: &N) -> Option<usize> {
        self.index.get(key).map(|idx| idx.index())
    }

    /// Node key at a position.
    pub fn key(&self, position: usize) -> Option<&N> {
        self.graph.node_weight(NodeIndex::new(position))
    }

    /// True if the key belongs to this network.
    pub fn contains(&self, key: &N) -> bool {
        self.index.contains_key(key)
    }

    /// Node keys in position order.
    pub fn keys(&self) -> impl Iterator<Item = &N> + '_ {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Edges as `(u, v, weight)` over node keys, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&N, &N, f64)> + '_ {
        self.graph
            .edge_references()
            .map(move |e| (&self.graph[e.source()], &self.graph[e.target()], *e.weight()))
    }

    /// Edges as `(u, v, weight)` over node positions.
    pub fn edge_positions(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), *e.weight()))
    }

    /// Sum of all edge weights (each undirected edge counted once).
    pub fn total_weight(&self) -> f64 {
        self.graph.edge_references().map(|e| *e.weight()).sum()
    }

    /// Sorted, deduplicated neighbor positions per node. Self-loops are left out.
    pub fn neighbor_lists(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.node_count()];
        for (i, j, _) in self.edge_positions() {
            if i != j {
                adj[i].push(j);
                adj[j].push(i);
            }
        }
        for list in &mut adj {
            list.sort_unstable();
            list.dedup();
        }
        adj
    }

    /// Per-node flag: does the node carry a self-loop?
    pub fn self_loops(&self) -> Vec<bool> {
        let mut flags = vec![false; self.node_count()];
        for (i, j, _) in self.edge_positions() {
            if i == j {
                flags[i] = true;
            }
        }
        flags
    }

    /// Dense symmetric weight matrix indexed by node position.
    ///
    /// A self-loop of weight `w` contributes `w` to the diagonal.
    pub fn adjacency_matrix(&self) -> Array2<f64> {
        let n = self.node_count();
        let mut a = Array2::zeros((n, n));
        for (i, j, w) in self.edge_positions() {
            a[[i, j]] = w;
            a[[j, i]] = w;
        }
        a
    }

    /// True for a non-empty network with a single connected component.
    ///
    /// Only edges of positive weight link nodes.
    pub fn is_connected(&self) -> bool {
        let n = self.node_count();
        if n == 0 {
            return false;
        }
        let mut sets = UnionFind::new(n);
        let mut merged = 0;
        for (i, j, w) in self.edge_positions() {
            if w > 0.0 && sets.union(i, j) {
                merged += 1;
            }
        }
        merged == n - 1
    }

    /// Borrow the underlying petgraph graph.
    pub fn as_graph(&self) -> &UnGraph<N, f64> {
        &self.graph
    }
}

impl<N: NodeKey> Default for Network<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_follow_insertion_order() {
        let network = Network::from_edges([("b", "a"), ("a", "c")]);
        assert_eq!(network.position(&"b"), Some(0));
        assert_eq!(network.position(&"a"), Some(1));
        assert_eq!(network.position(&"c"), Some(2));
        assert_eq!(network.key(2), Some(&"c"));
        assert_eq!(network.keys().copied().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_duplicate_edge_replaces_weight() {
        let mut network = Network::new();
        network.add_edge(0, 1, 2.0).unwrap();
        network.add_edge(1, 0, 5.0).unwrap();
        assert_eq!(network.edge_count(), 1);
        assert!((network.total_weight() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_negative_weight() {
        let mut network = Network::new();
        assert!(network.add_edge(0, 1, -1.0).is_err());
        assert!(network.add_edge(0, 1, f64::NAN).is_err());
        assert!(network.is_empty());
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let network = Network::from_weighted_edges([(0, 1, 2.0), (1, 2, 3.0), (2, 2, 1.0)]).unwrap();
        let a = network.adjacency_matrix();
        assert_eq!(a[[0, 1]], 2.0);
        assert_eq!(a[[1, 0]], 2.0);
        assert_eq!(a[[2, 1]], 3.0);
        assert_eq!(a[[2, 2]], 1.0);
        assert_eq!(network.neighbor_lists()[2], vec![1]);
        assert_eq!(network.self_loops(), vec![false, false, true]);
    }

    #[test]
    fn test_connectivity() {
        let mut network = Network::from_edges([(0, 1), (2, 3)]);
        assert!(!network.is_connected());
        network.add_edge(1, 2, 1.0).unwrap();
        assert!(network.is_connected());
        assert!(!Network::<u32>::new().is_connected());
    }

    #[test]
    fn test_zero_weight_edge_does_not_connect() {
        let mut network = Network::from_weighted_edges([(0, 1, 1.0), (2, 3, 1.0), (1, 2, 0.0)]).unwrap();
        assert!(!network.is_connected());
        network.add_edge(1, 2, 0.5).unwrap();
        assert!(network.is_connected());
    }
}
