//! Dense linear algebra used by the spectral and diffusion partitioners.
//!
//! Both partitioners only need the eigendecomposition of a real symmetric
//! matrix: the random-walk matrix is similar to `D^{-1/2} A D^{-1/2}`, and the
//! heat kernel of a symmetric Laplacian is `U diag(e^{-τλ}) Uᵀ`. The
//! [`Eigensolver`] trait is the seam for swapping the backend; the default,
//! [`FaerEigensolver`], delegates to `faer`.

use crate::error::{Error, Result};
use faer::{Mat, Side};
use ndarray::{Array1, Array2};

/// Eigenpairs of a real symmetric matrix.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Eigenvalues, in the order the backend produced them.
    pub values: Array1<f64>,
    /// Orthonormal eigenvectors as columns; column `j` belongs to `values[j]`.
    pub vectors: Array2<f64>,
}

/// Matrix in → eigenpairs out.
pub trait Eigensolver {
    /// Full eigendecomposition of a real symmetric matrix.
    fn symmetric_eigen(&self, matrix: &Array2<f64>) -> Result<SymmetricEigen>;

    /// `exp(-τ M)` for a real symmetric `M`.
    fn heat_kernel(&self, matrix: &Array2<f64>, tau: f64) -> Result<Array2<f64>> {
        let eig = self.symmetric_eigen(matrix)?;
        let decay = eig.values.mapv(|lambda| (-tau * lambda).exp());
        let scaled = &eig.vectors * &decay;
        Ok(scaled.dot(&eig.vectors.t()))
    }
}

/// Eigensolver backed by `faer`'s self-adjoint eigendecomposition.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaerEigensolver;

impl Eigensolver for FaerEigensolver {
    fn symmetric_eigen(&self, matrix: &Array2<f64>) -> Result<SymmetricEigen> {
        let n = matrix.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if matrix.ncols() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: matrix.ncols(),
            });
        }

        // Symmetrize to absorb rounding noise from the caller's construction.
        let mat = Mat::<f64>::from_fn(n, n, |i, j| 0.5 * (matrix[[i, j]] + matrix[[j, i]]));
        let evd = mat.selfadjoint_eigendecomposition(Side::Lower);
        let s = evd.s();
        let u = evd.u();

        let values = Array1::from_shape_fn(n, |i| s.column_vector().read(i));
        let vectors = Array2::from_shape_fn((n, n), |(i, j)| u[(i, j)]);

        if values.iter().chain(vectors.iter()).any(|x| !x.is_finite()) {
            return Err(Error::Numerical(
                "eigendecomposition produced non-finite values".to_string(),
            ));
        }
        Ok(SymmetricEigen { values, vectors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_eigenpairs_reconstruct_matrix() {
        let m = array![[2.0, 1.0, 0.0], [1.0, 2.0, 1.0], [0.0, 1.0, 2.0]];
        let eig = FaerEigensolver.symmetric_eigen(&m).unwrap();

        for j in 0..3 {
            let v = eig.vectors.column(j);
            let mv = m.dot(&v);
            for i in 0..3 {
                assert!((mv[i] - eig.values[j] * v[i]).abs() < 1e-10);
            }
        }

        let mut sorted: Vec<f64> = eig.values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let r2 = 2.0_f64.sqrt();
        assert!((sorted[0] - (2.0 - r2)).abs() < 1e-10);
        assert!((sorted[1] - 2.0).abs() < 1e-10);
        assert!((sorted[2] - (2.0 + r2)).abs() < 1e-10);
    }

    #[test]
    fn test_heat_kernel_of_zero_is_identity() {
        let zero = Array2::<f64>::zeros((3, 3));
        let k = FaerEigensolver.heat_kernel(&zero, 5.0).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((k[[i, j]] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_heat_kernel_single_edge() {
        // L = [[1,-1],[-1,1]] has eigenvalues 0 and 2.
        let l = array![[1.0, -1.0], [-1.0, 1.0]];
        let tau = 0.7;
        let k = FaerEigensolver.heat_kernel(&l, tau).unwrap();
        let e = (-2.0 * tau).exp();
        assert!((k[[0, 0]] - 0.5 * (1.0 + e)).abs() < 1e-12);
        assert!((k[[0, 1]] - 0.5 * (1.0 - e)).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_square() {
        let m = Array2::<f64>::zeros((2, 3));
        assert!(FaerEigensolver.symmetric_eigen(&m).is_err());
    }
}
