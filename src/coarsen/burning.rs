//! Random burning box covering (Song, Havlin & Makse 2005).
//!
//! While nodes remain: pick one uniformly at random, burn every remaining node
//! within `radius` hops of it (distances measured in the remaining network),
//! and make the burned set one box. Boxes are numbered in the order they are
//! burned.

use super::{Coarsener, Coarsening};
use crate::error::{Error, Result};
use crate::mapping::{MacroId, Mapping};
use crate::network::{Network, NodeKey};
use rand::prelude::*;
use std::collections::VecDeque;
use tracing::debug;

/// Random burning box covering.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BurningPartitioner {
    /// Box radius in hops.
    radius: usize,
    /// Random seed.
    seed: Option<u64>,
}

impl BurningPartitioner {
    /// Boxes of the given radius.
    pub fn new(radius: usize) -> Self {
        Self { radius, seed: None }
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Coarsen with an explicit random source.
    pub fn coarsen_with_rng<N, R>(&self, network: &Network<N>, rng: &mut R) -> Result<Coarsening<N>>
    where
        N: NodeKey,
        R: Rng + ?Sized,
    {
        if network.is_empty() {
            return Err(Error::EmptyInput);
        }
        let n = network.node_count();
        let adj = network.neighbor_lists();

        let mut box_of: Vec<Option<usize>> = vec![None; n];
        let mut remaining: Vec<usize> = (0..n).collect();
        let mut boxes = 0;

        while !remaining.is_empty() {
            let center = remaining[rng.random_range(0..remaining.len())];

            let mut hops: Vec<Option<usize>> = vec![None; n];
            hops[center] = Some(0);
            box_of[center] = Some(boxes);
            let mut queue = VecDeque::from([center]);
            while let Some(u) = queue.pop_front() {
                let d = hops[u].unwrap_or(0);
                if d == self.radius {
                    continue;
                }
                for &v in &adj[u] {
                    if box_of[v].is_none() {
                        hops[v] = Some(d + 1);
                        box_of[v] = Some(boxes);
                        queue.push_back(v);
                    }
                }
            }

            remaining.retain(|&v| box_of[v].is_none());
            boxes += 1;
        }

        debug!(nodes = n, radius = self.radius, boxes, "random burning done");
        let pairs = network
            .keys()
            .zip(&box_of)
            .map(|(key, b)| (key.clone(), MacroId::Group(b.unwrap_or(0))));
        Ok(Coarsening::new(Mapping::from_pairs(pairs)))
    }
}

impl Coarsener for BurningPartitioner {
    fn coarsen<N: NodeKey>(&self, network: &Network<N>) -> Result<Coarsening<N>> {
        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        self.coarsen_with_rng(network, &mut rng)
    }
}

/// Random burning with boxes of `radius` hops.
pub fn burning_partition<N, R>(network: &Network<N>, radius: usize, rng: &mut R) -> Result<Coarsening<N>>
where
    N: NodeKey,
    R: Rng + ?Sized,
{
    BurningPartitioner::new(radius).coarsen_with_rng(network, rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(n: u32) -> Network<u32> {
        Network::from_edges((0..n).map(|i| (i, (i + 1) % n)))
    }

    #[test]
    fn test_radius_zero_is_one_box_per_node() {
        let coarsening = BurningPartitioner::new(0).with_seed(3).coarsen(&ring(5)).unwrap();
        assert_eq!(coarsening.mapping.group_count(), 5);
    }

    #[test]
    fn test_boxes_have_bounded_diameter() {
        let network = ring(12);
        let coarsening = BurningPartitioner::new(1).with_seed(11).coarsen(&network).unwrap();
        for members in coarsening.mapping.groups().values() {
            // A radius-1 ball on a ring has at most three nodes.
            assert!(members.len() <= 3);
        }
        // Covering 12 nodes with boxes of at most 3 needs at least 4 boxes.
        assert!(coarsening.mapping.group_count() >= 4);
    }

    #[test]
    fn test_large_radius_burns_component() {
        let network = Network::from_edges([(0, 1), (1, 2), (5, 6)]);
        let mut rng = StdRng::seed_from_u64(0);
        let coarsening = burning_partition(&network, 10, &mut rng).unwrap();
        let m = &coarsening.mapping;
        assert_eq!(m.get(&0), m.get(&2));
        assert_ne!(m.get(&0), m.get(&5));
        assert_eq!(m.group_count(), 2);
    }

    #[test]
    fn test_weights_sum_across_boxes() {
        let network = Network::from_weighted_edges([(0, 1, 2.0), (1, 2, 3.0)]).unwrap();
        let reduction = BurningPartitioner::new(0).with_seed(1).reduce(&network).unwrap();
        assert!((reduction.aggregation.total_weight() - 5.0).abs() < 1e-12);
    }
}
