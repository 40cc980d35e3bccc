//! Supernodes grown from CoreHD seeds.
//!
//! Seeds are picked one at a time: strip the seeds chosen so far, take the
//! 2-core of what is left and pick its highest-degree node. Once the 2-core is
//! empty no further seeds exist and fewer than `k` are returned.
//!
//! Regions then grow from every seed at once. At radius `o` each still
//! unlabeled node at distance exactly `o` from one or more seeds joins one of
//! them. Nodes no seed reaches within `max_hops` share a catch-all supernode
//! `Group(n)`, `n` being the node count.
//!
//! Edge weights play no part in seeding or growth.

use super::{two_core, Coarsener, Coarsening, Notice};
use crate::error::{Error, Result};
use crate::mapping::{MacroId, Mapping};
use crate::network::{Network, NodeKey};
use rand::prelude::*;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, warn};

/// How a node reached by several seeds in the same round picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TieBreak {
    /// Uniformly among the contending seeds.
    #[default]
    Random,
    /// The seed chosen first wins.
    LowestSeed,
}

/// Seed-and-grow supernode partitioner.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SupernodePartitioner {
    /// Number of seeds requested.
    k_seeds: usize,
    /// Largest growth radius.
    max_hops: usize,
    /// Contention policy.
    tie_break: TieBreak,
    /// Random seed.
    seed: Option<u64>,
}

impl SupernodePartitioner {
    /// Grow `k_seeds` supernodes.
    pub fn new(k_seeds: usize) -> Self {
        Self {
            k_seeds,
            max_hops: 6,
            tie_break: TieBreak::Random,
            seed: None,
        }
    }

    /// Set the largest growth radius.
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Set the contention policy.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Seed positions in selection order.
    pub fn seeds<N: NodeKey>(&self, network: &Network<N>) -> Vec<usize> {
        choose_seeds(&network.neighbor_lists(), self.k_seeds)
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
        if self.k_seeds == 0 {
            return Err(Error::InvalidParameter {
                name: "k_seeds",
                message: "at least one seed is required",
            });
        }

        let n = network.node_count();
        let adj = network.neighbor_lists();
        let seeds = choose_seeds(&adj, self.k_seeds);

        let mut notices = Vec::new();
        if seeds.len() < self.k_seeds {
            warn!(
                requested = self.k_seeds,
                found = seeds.len(),
                "2-core exhausted before all seeds were chosen"
            );
            notices.push(Notice::SeedsExhausted {
                requested: self.k_seeds,
                found: seeds.len(),
            });
        }

        let distances: Vec<Vec<Option<usize>>> =
            seeds.iter().map(|&s| hop_distances(&adj, s)).collect();

        // owner[i] = index into `seeds`
        let mut owner: Vec<Option<usize>> = vec![None; n];
        for (k, &s) in seeds.iter().enumerate() {
            owner[s] = Some(k);
        }
        let mut assigned = seeds.len();
        let mut last_radius = 0;

        for radius in 1..=self.max_hops {
            if assigned == n {
                break;
            }
            let mut contenders: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
            for (k, dist) in distances.iter().enumerate() {
                for (node, d) in dist.iter().enumerate() {
                    if *d == Some(radius) && owner[node].is_none() {
                        contenders.entry(node).or_default().push(k);
                    }
                }
            }
            if contenders.is_empty() {
                break;
            }
            for (node, candidates) in contenders {
                let pick = match self.tie_break {
                    TieBreak::LowestSeed => candidates[0],
                    TieBreak::Random if candidates.len() == 1 => candidates[0],
                    TieBreak::Random => candidates[rng.random_range(0..candidates.len())],
                };
                owner[node] = Some(pick);
                assigned += 1;
            }
            last_radius = radius;
        }

        if assigned < n {
            notices.push(Notice::GrowthHalted {
                radius: last_radius,
                unassigned: n - assigned,
            });
        }

        let mut pairs = Vec::with_capacity(n);
        for (pos, key) in network.keys().enumerate() {
            let id = match owner[pos].and_then(|k| network.key(seeds[k])) {
                Some(seed_key) => MacroId::Node(seed_key.clone()),
                None => MacroId::Group(n),
            };
            pairs.push((key.clone(), id));
        }

        debug!(
            seeds = seeds.len(),
            radius = last_radius,
            unassigned = n - assigned,
            "supernode growth done"
        );
        Ok(Coarsening {
            mapping: Mapping::from_pairs(pairs),
            notices,
        })
    }
}

impl Default for SupernodePartitioner {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Coarsener for SupernodePartitioner {
    fn coarsen<N: NodeKey>(&self, network: &Network<N>) -> Result<Coarsening<N>> {
        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        self.coarsen_with_rng(network, &mut rng)
    }
}

/// Supernodes with `k_seeds` seeds, growth capped at `max_hops`, random tie-breaks from `rng`.
pub fn supernode_partition<N, R>(
    network: &Network<N>,
    k_seeds: usize,
    max_hops: usize,
    rng: &mut R,
) -> Result<Coarsening<N>>
where
    N: NodeKey,
    R: Rng + ?Sized,
{
    SupernodePartitioner::new(k_seeds)
        .with_max_hops(max_hops)
        .coarsen_with_rng(network, rng)
}

/// CoreHD: highest core degree of the 2-core left after removing earlier seeds.
fn choose_seeds(adj: &[Vec<usize>], k: usize) -> Vec<usize> {
    let mut alive = vec![true; adj.len()];
    let mut seeds = Vec::with_capacity(k);
    while seeds.len() < k {
        let (in_core, degree) = two_core(adj, &alive);
        let mut best: Option<usize> = None;
        for i in (0..adj.len()).filter(|&i| in_core[i]) {
            if best.map_or(true, |b| degree[i] > degree[b]) {
                best = Some(i);
            }
        }
        let Some(seed) = best else {
            break;
        };
        alive[seed] = false;
        seeds.push(seed);
    }
    seeds
}

/// BFS hop counts from `source`; `None` when unreachable.
fn hop_distances(adj: &[Vec<usize>], source: usize) -> Vec<Option<usize>> {
    let mut dist = vec![None; adj.len()];
    dist[source] = Some(0);
    let mut queue = VecDeque::from([source]);
    while let Some(u) = queue.pop_front() {
        let next = dist[u].map_or(0, |d| d + 1);
        for &v in &adj[u] {
            if dist[v].is_none() {
                dist[v] = Some(next);
                queue.push_back(v);
            }
        }
    }
    dist
}
