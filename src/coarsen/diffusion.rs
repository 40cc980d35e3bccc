//! Laplacian renormalization (Villegas, Gili, Caldarelli & Gabrielli 2023).
//!
//! # Algorithm
//!
//! ```text
//! L = D - A
//! ρ = exp(-τL) / tr(exp(-τL))            (density matrix)
//! i ~ j  iff  ρ_ij ≥ ρ_jj  or  ρ_ij ≥ ρ_ii
//! supernodes = connected components of ~
//! ```
//!
//! ρ_ij measures how much of a unit of mass released at i sits at j after
//! diffusing for time τ. When the cross term reaches either diagonal term, one
//! of the two nodes cannot be told apart from its partner at that scale, and
//! they merge.
//!
//! Small τ leaves every node on its own. Large τ pushes ρ toward its single
//! dominant mode and the whole network collapses into one supernode; that is
//! reported as [`Notice::Collapsed`], not as an error.
//!
//! # References
//!
//! Villegas, Gili, Caldarelli, Gabrielli (2023). "Laplacian renormalization
//! group for heterogeneous networks." Nature Physics 19, 445–450.

use super::{component_mapping, disjoint_sets, Coarsener, Coarsening, Notice};
use crate::error::{Error, Result};
use crate::linalg::{Eigensolver, FaerEigensolver};
use crate::network::{Network, NodeKey};
use ndarray::{Array2, Axis};
use petgraph::unionfind::UnionFind;
use tracing::debug;

/// Slack on the absorption comparisons; ρ entries are O(1/n).
const ABSORPTION_TOLERANCE: f64 = 1e-12;

/// Laplacian renormalization at a fixed diffusion time.
#[derive(Debug, Clone)]
pub struct DiffusionPartitioner<S = FaerEigensolver> {
    /// Diffusion time τ.
    tau: f64,
    solver: S,
}

impl DiffusionPartitioner {
    /// Renormalize at diffusion time `tau`.
    pub fn new(tau: f64) -> Self {
        Self {
            tau,
            solver: FaerEigensolver,
        }
    }
}

impl<S: Eigensolver> DiffusionPartitioner<S> {
    /// Swap the eigensolver backend.
    pub fn with_solver<T: Eigensolver>(self, solver: T) -> DiffusionPartitioner<T> {
        DiffusionPartitioner {
            tau: self.tau,
            solver,
        }
    }

    /// Diffusion time τ.
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// The density matrix `exp(-τL) / tr(exp(-τL))`, indexed by node position.
    pub fn density_matrix<N: NodeKey>(&self, network: &Network<N>) -> Result<Array2<f64>> {
        if !self.tau.is_finite() || self.tau <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "tau",
                message: "must be finite and positive",
            });
        }
        if network.is_empty() {
            return Err(Error::EmptyInput);
        }

        let a = network.adjacency_matrix();
        let strength = a.sum_axis(Axis(1));
        let mut laplacian = -a;
        for (i, s) in strength.iter().enumerate() {
            laplacian[[i, i]] += s;
        }

        let kernel = self.solver.heat_kernel(&laplacian, self.tau)?;
        let trace = kernel.diag().sum();
        if !(trace.is_finite() && trace > 0.0) {
            return Err(Error::Numerical(format!("heat kernel trace is {trace}")));
        }
        Ok(kernel / trace)
    }
}

impl<S: Eigensolver> Coarsener for DiffusionPartitioner<S> {
    fn coarsen<N: NodeKey>(&self, network: &Network<N>) -> Result<Coarsening<N>> {
        if network.is_empty() {
            return Err(Error::EmptyInput);
        }
        if !network.is_connected() {
            return Err(Error::DisconnectedGraph);
        }
        let rho = self.density_matrix(network)?;

        let n = network.node_count();
        let mut sets = UnionFind::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                let cross = rho[[i, j]];
                if cross >= rho[[j, j]] - ABSORPTION_TOLERANCE
                    || cross >= rho[[i, i]] - ABSORPTION_TOLERANCE
                {
                    sets.union(i, j);
                }
            }
        }

        let components = disjoint_sets(sets);
        let mut coarsening = Coarsening::new(component_mapping(network, &components));
        if n > 1 && components.len() == 1 {
            coarsening.notices.push(Notice::Collapsed);
        }

        debug!(
            tau = self.tau,
            nodes = n,
            supernodes = components.len(),
            "laplacian renormalization done"
        );
        Ok(coarsening)
    }
}

/// Laplacian renormalization with the default eigensolver.
pub fn diffusion_partition<N: NodeKey>(network: &Network<N>, tau: f64) -> Result<Coarsening<N>> {
    DiffusionPartitioner::new(tau).coarsen(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MacroId;

    fn barbell() -> Network<u32> {
        Network::from_edges([(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)])
    }

    #[test]
    fn test_density_matrix_has_unit_trace() {
        let rho = DiffusionPartitioner::new(0.8).density_matrix(&barbell()).unwrap();
        assert!((rho.diag().sum() - 1.0).abs() < 1e-12);
        for i in 0..6 {
            for j in 0..6 {
                assert!((rho[[i, j]] - rho[[j, i]]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_short_time_keeps_every_node() {
        let coarsening = diffusion_partition(&barbell(), 0.05).unwrap();
        for k in 0..6 {
            assert_eq!(coarsening.mapping.get(&k), Some(&MacroId::Node(k)));
        }
        assert!(coarsening.notices.is_empty());
    }

    #[test]
    fn test_barbell_merges_triangles() {
        let coarsening = diffusion_partition(&barbell(), 1.0).unwrap();
        let m = &coarsening.mapping;
        assert_eq!(m.get(&0), Some(&MacroId::Group(0)));
        assert_eq!(m.get(&2), Some(&MacroId::Group(0)));
        assert_eq!(m.get(&3), Some(&MacroId::Group(1)));
        assert_eq!(m.get(&5), Some(&MacroId::Group(1)));
    }

    #[test]
    fn test_path_pairs_then_collapses() {
        let path = Network::from_edges([(0, 1), (1, 2), (2, 3)]);

        let paired = diffusion_partition(&path, 2.0).unwrap();
        assert_eq!(paired.mapping.group_count(), 2);
        assert_eq!(paired.mapping.get(&0), paired.mapping.get(&1));
        assert_eq!(paired.mapping.get(&2), paired.mapping.get(&3));

        let collapsed = diffusion_partition(&path, 50.0).unwrap();
        assert_eq!(collapsed.mapping.group_count(), 1);
        assert_eq!(collapsed.notices, vec![Notice::Collapsed]);
    }

    #[test]
    fn test_zero_weight_bridge_is_disconnected() {
        let mut network = barbell();
        network.add_edge(2, 3, 0.0).unwrap();
        assert_eq!(
            diffusion_partition(&network, 1.0).unwrap_err(),
            Error::DisconnectedGraph
        );
        // Connectivity is checked before τ.
        assert_eq!(
            diffusion_partition(&network, 0.0).unwrap_err(),
            Error::DisconnectedGraph
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(diffusion_partition(&barbell(), 0.0).is_err());
        assert!(diffusion_partition(&barbell(), f64::NAN).is_err());
        assert_eq!(
            diffusion_partition(&Network::from_edges([(0, 1), (2, 3)]), 1.0).unwrap_err(),
            Error::DisconnectedGraph
        );
    }
}
