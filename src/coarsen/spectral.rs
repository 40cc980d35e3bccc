//! Spectral coarse graining (Gfeller & De Los Rios 2007).
//!
//! # Algorithm
//!
//! ```text
//! 1. W = A D^{-1}                   (columns sum to 1)
//! 2. eigenpairs of W, sorted by descending eigenvalue
//! 3. keep the first k left eigenvectors whose entries are not all equal
//!    (compared after rounding to 4 decimals)
//! 4. cut each kept eigenvector into I equal-width intervals over [min, max]
//! 5. nodes with the same interval in every kept eigenvector merge
//! ```
//!
//! `W` is not symmetric, but it is similar to `S = D^{-1/2} A D^{-1/2}`: if
//! `S u = λ u` then `D^{-1/2} u` is a left and `D^{1/2} u` a right eigenvector
//! of `W` for the same λ. One symmetric eigendecomposition gives both sides
//! with real arithmetic.
//!
//! # Tuning
//!
//! Both `k` and `I` set the resolution: the number of supernodes is at most
//! `I^k`, and large values drift toward the identity mapping. Choosing them
//! for the network size is the caller's job; nothing is validated beyond
//! `k, I ≥ 1`.
//!
//! # References
//!
//! Gfeller, De Los Rios (2007). "Spectral Coarse Graining of Complex Networks."
//! Physical Review Letters 99, 038701.

use super::{Coarsener, Coarsening, Notice};
use crate::error::{Error, Result};
use crate::linalg::{Eigensolver, FaerEigensolver};
use crate::mapping::{MacroId, Mapping};
use crate::network::{Network, NodeKey};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Decimals used to decide that an eigenvector is constant.
const TRIVIAL_DECIMALS: i32 = 4;

/// Spectral coarse graining configuration.
#[derive(Debug, Clone)]
pub struct SpectralPartitioner<S = FaerEigensolver> {
    /// Number of non-trivial left eigenvectors to use.
    n_eigenvectors: usize,
    /// Number of intervals per eigenvector.
    n_intervals: usize,
    solver: S,
}

/// Random-walk spectrum, sorted by descending eigenvalue.
#[derive(Debug, Clone)]
pub struct RandomWalkSpectrum {
    /// Eigenvalues of `W = A D^{-1}`, largest first.
    pub eigenvalues: Vec<f64>,
    /// Unit-length left eigenvectors as columns.
    pub left: Array2<f64>,
    /// Unit-length right eigenvectors as columns.
    pub right: Array2<f64>,
}

impl SpectralPartitioner {
    /// Use `n_eigenvectors` eigenvectors cut into `n_intervals` intervals each.
    pub fn new(n_eigenvectors: usize, n_intervals: usize) -> Self {
        Self {
            n_eigenvectors,
            n_intervals,
            solver: FaerEigensolver,
        }
    }
}

impl Default for SpectralPartitioner {
    fn default() -> Self {
        Self::new(3, 2)
    }
}

impl<S: Eigensolver> SpectralPartitioner<S> {
    /// Swap the eigensolver backend.
    pub fn with_solver<T: Eigensolver>(self, solver: T) -> SpectralPartitioner<T> {
        SpectralPartitioner {
            n_eigenvectors: self.n_eigenvectors,
            n_intervals: self.n_intervals,
            solver,
        }
    }

    /// Set the number of eigenvectors.
    pub fn with_eigenvectors(mut self, n_eigenvectors: usize) -> Self {
        self.n_eigenvectors = n_eigenvectors;
        self
    }

    /// Set the number of intervals.
    pub fn with_intervals(mut self, n_intervals: usize) -> Self {
        self.n_intervals = n_intervals;
        self
    }

    /// Sorted spectrum of the random-walk matrix with left and right eigenvectors.
    ///
    /// Requires a connected network without isolated nodes.
    pub fn spectrum<N: NodeKey>(&self, network: &Network<N>) -> Result<RandomWalkSpectrum> {
        let (a, d) = walk_matrix(network)?;
        let n = d.len();
        let inv_sqrt = d.mapv(|x| 1.0 / x.sqrt());
        let s = Array2::from_shape_fn((n, n), |(i, j)| a[[i, j]] * inv_sqrt[i] * inv_sqrt[j]);

        let eig = self.solver.symmetric_eigen(&s)?;
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&x, &y| eig.values[y].total_cmp(&eig.values[x]));

        let mut left = Array2::zeros((n, n));
        let mut right = Array2::zeros((n, n));
        for (col, &k) in order.iter().enumerate() {
            let u = eig.vectors.column(k);
            left.column_mut(col).assign(&unit(&(&u * &inv_sqrt)));
            right.column_mut(col).assign(&unit(&(&u / &inv_sqrt)));
        }

        Ok(RandomWalkSpectrum {
            eigenvalues: order.iter().map(|&k| eig.values[k]).collect(),
            left,
            right,
        })
    }
}

impl<S: Eigensolver> Coarsener for SpectralPartitioner<S> {
    fn coarsen<N: NodeKey>(&self, network: &Network<N>) -> Result<Coarsening<N>> {
        if self.n_eigenvectors == 0 {
            return Err(Error::InvalidParameter {
                name: "n_eigenvectors",
                message: "must be at least 1",
            });
        }
        if self.n_intervals == 0 {
            return Err(Error::InvalidParameter {
                name: "n_intervals",
                message: "must be at least 1",
            });
        }

        let spectrum = self.spectrum(network)?;
        let n = network.node_count();

        let relevant: Vec<ArrayView1<'_, f64>> = spectrum
            .left
            .axis_iter(Axis(1))
            .filter(|v| !is_trivial(v))
            .take(self.n_eigenvectors)
            .collect();

        let mut notices = Vec::new();
        if relevant.len() < self.n_eigenvectors {
            warn!(
                requested = self.n_eigenvectors,
                available = relevant.len(),
                "not enough informative eigenvectors; using what is available"
            );
            notices.push(Notice::DegenerateSpectrum {
                requested: self.n_eigenvectors,
                used: relevant.len(),
            });
        }

        let bins: Vec<Vec<usize>> = relevant
            .iter()
            .map(|v| interval_bins(v, self.n_intervals))
            .collect();

        let mut ids: HashMap<Vec<usize>, usize> = HashMap::new();
        let mut pairs = Vec::with_capacity(n);
        for (pos, key) in network.keys().enumerate() {
            let id = if relevant.is_empty() {
                // Nothing to bin on: every node stays on its own.
                pos
            } else {
                let composite: Vec<usize> = bins.iter().map(|b| b[pos]).collect();
                let next = ids.len();
                *ids.entry(composite).or_insert(next)
            };
            pairs.push((key.clone(), MacroId::Group(id)));
        }

        debug!(
            nodes = n,
            eigenvectors = relevant.len(),
            supernodes = if relevant.is_empty() { n } else { ids.len() },
            "spectral coarse graining done"
        );

        Ok(Coarsening {
            mapping: Mapping::from_pairs(pairs),
            notices,
        })
    }
}

/// Spectral coarse graining with the default eigensolver.
pub fn spectral_partition<N: NodeKey>(
    network: &Network<N>,
    n_eigenvectors: usize,
    n_intervals: usize,
) -> Result<Coarsening<N>> {
    SpectralPartitioner::new(n_eigenvectors, n_intervals).coarsen(network)
}

/// Adjacency matrix and column sums, after checking the walk is well defined.
fn walk_matrix<N: NodeKey>(network: &Network<N>) -> Result<(Array2<f64>, Array1<f64>)> {
    if network.is_empty() {
        return Err(Error::EmptyInput);
    }
    let a = network.adjacency_matrix();
    let d = a.sum_axis(Axis(0));
    if let Some(position) = d.iter().position(|&x| x <= 0.0) {
        return Err(Error::IsolatedNode { position });
    }
    if !network.is_connected() {
        return Err(Error::DisconnectedGraph);
    }
    Ok((a, d))
}

fn unit(v: &Array1<f64>) -> Array1<f64> {
    let norm = v.dot(v).sqrt();
    if norm > 0.0 {
        v / norm
    } else {
        v.clone()
    }
}

fn is_trivial(v: &ArrayView1<'_, f64>) -> bool {
    let scale = 10f64.powi(TRIVIAL_DECIMALS);
    let first = (v[0] * scale).round();
    v.iter().all(|&x| (x * scale).round() == first)
}

/// Equal-width bins over `[min, max]`: half-open, last one closed.
fn interval_bins(v: &ArrayView1<'_, f64>, n_intervals: usize) -> Vec<usize> {
    let min = v.iter().copied().fold(f64::INFINITY, f64::min);
    let max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / n_intervals as f64;
    v.iter()
        .map(|&x| {
            if width > 0.0 {
                (((x - min) / width).floor() as usize).min(n_intervals - 1)
            } else {
                0
            }
        })
        .collect()
}
