//! Random edge noise scaled by network density.
//!
//! `perturb` rewires a network at noise level ε, scaled by its edge density
//! ρ = M / C(N, 2). Each existing edge survives with probability `(1 − ε) + q`
//! and each absent pair appears with probability `q`, where
//!
//! ```text
//! q = ρε / (1 + ρε − ρ)
//! ```
//!
//! ε = 0 returns the topology unchanged; ε = 1 gives an Erdős–Rényi graph of
//! the same density.

use crate::error::{Error, Result};
use crate::network::{Network, NodeKey};
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};
use tracing::debug;

/// Noisy copy of `network` with unit weights and no self-loops. Node keys and positions are kept.
pub fn perturb<N, R>(network: &Network<N>, epsilon: f64, rng: &mut R) -> Result<Network<N>>
where
    N: NodeKey,
    R: Rng + ?Sized,
{
    if !(0.0..=1.0).contains(&epsilon) {
        return Err(Error::InvalidParameter {
            name: "epsilon",
            message: "must lie in [0, 1]",
        });
    }

    let n = network.node_count();
    let mut noisy = Network::new();
    for key in network.keys() {
        let _ = noisy.add_node(key.clone());
    }
    if n < 2 {
        return Ok(noisy);
    }

    let adj = network.neighbor_lists();
    let edges: usize = adj.iter().map(Vec::len).sum::<usize>() / 2;
    let possible = (n * (n - 1) / 2) as f64;
    let rho = edges as f64 / possible;
    let spurious = rho * epsilon / (1.0 + rho * epsilon - rho);
    let keep = ((1.0 - epsilon) + spurious).clamp(0.0, 1.0);

    let invalid = |_| Error::InvalidParameter {
        name: "epsilon",
        message: "noise probabilities outside [0, 1]",
    };
    let keep_coin = Bernoulli::new(keep).map_err(invalid)?;
    let add_coin = Bernoulli::new(spurious.clamp(0.0, 1.0)).map_err(invalid)?;

    let mut kept = 0usize;
    let mut added = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            let present = adj[i].binary_search(&j).is_ok();
            let coin = if present { &keep_coin } else { &add_coin };
            if !coin.sample(rng) {
                continue;
            }
            if let (Some(u), Some(v)) = (network.key(i), network.key(j)) {
                noisy.add_edge(u.clone(), v.clone(), 1.0)?;
                if present {
                    kept += 1;
                } else {
                    added += 1;
                }
            }
        }
    }

    debug!(epsilon, edges, kept, added, "perturbed network");
    Ok(noisy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ring(n: u32) -> Network<u32> {
        Network::from_edges((0..n).map(|i| (i, (i + 1) % n)))
    }

    #[test]
    fn test_zero_noise_keeps_edges() {
        let network = Network::from_weighted_edges([(0, 1, 2.5), (1, 2, 1.0), (2, 2, 4.0)]).unwrap();
        let noisy = perturb(&network, 0.0, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(noisy.node_count(), 3);
        assert_eq!(noisy.edge_count(), 2);
        assert!(noisy.edges().all(|(_, _, w)| w == 1.0));
        assert_eq!(noisy.position(&2), network.position(&2));
    }

    #[test]
    fn test_full_noise_keeps_density() {
        let network = ring(40);
        let mut rng = StdRng::seed_from_u64(3);
        let trials = 200;
        let total: usize = (0..trials)
            .map(|_| perturb(&network, 1.0, &mut rng).unwrap().edge_count())
            .sum();
        let mean = total as f64 / trials as f64;
        // Expected edge count stays at 40.
        assert!((mean - 40.0).abs() < 2.0, "mean {mean}");
    }

    #[test]
    fn test_rejects_out_of_range_epsilon() {
        let network = ring(5);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(perturb(&network, -0.1, &mut rng).is_err());
        assert!(perturb(&network, 1.5, &mut rng).is_err());
        assert!(perturb(&network, f64::NAN, &mut rng).is_err());
    }
}
