//! Dense LU factorization with partial pivoting
//!
//! Used as the direct linear solver for small systems and as an exact
//! sub-solver inside field-split preconditioning.

use crate::sparse::CsrMatrix;
use crate::traits::{ComplexField, Preconditioner};
use ndarray::{Array1, Array2};
use num_traits::{Float, FromPrimitive, Zero};
use thiserror::Error;

/// Errors that can occur during LU factorization
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LuError {
    #[error("Matrix is singular or nearly singular (zero pivot in column {column})")]
    SingularMatrix { column: usize },
    #[error("Matrix dimensions mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

fn pivot_tolerance<R: Float + FromPrimitive>() -> R {
    R::from_f64(1e-30).unwrap_or_else(R::min_positive_value)
}

/// LU factors of a square matrix, `P A = L U`
///
/// L is unit lower triangular and stored below the diagonal of `lu`.
#[derive(Debug, Clone)]
pub struct LuFactorization<T: ComplexField> {
    lu: Array2<T>,
    pivots: Vec<usize>,
}

impl<T: ComplexField> LuFactorization<T> {
    /// Factorize a sparse matrix by densifying it
    pub fn from_csr(matrix: &CsrMatrix<T>) -> Result<Self, LuError> {
        lu_factorize(&matrix.to_dense())
    }

    /// Matrix dimension
    pub fn dim(&self) -> usize {
        self.pivots.len()
    }

    /// Solve Ax = b using the pre-computed factors
    pub fn solve(&self, b: &Array1<T>) -> Result<Array1<T>, LuError> {
        let n = self.dim();
        if b.len() != n {
            return Err(LuError::DimensionMismatch {
                expected: n,
                got: b.len(),
            });
        }

        let mut x: Array1<T> = self.pivots.iter().map(|&p| b[p]).collect();

        // Ly = Pb
        for i in 0..n {
            for j in 0..i {
                let l_ij = self.lu[[i, j]];
                let x_j = x[j];
                x[i] -= l_ij * x_j;
            }
        }

        // Ux = y
        for i in (0..n).rev() {
            for j in (i + 1)..n {
                let u_ij = self.lu[[i, j]];
                let x_j = x[j];
                x[i] -= u_ij * x_j;
            }
            let u_ii = self.lu[[i, i]];
            if u_ii.norm() < pivot_tolerance() {
                return Err(LuError::SingularMatrix { column: i });
            }
            x[i] *= u_ii.inv();
        }

        Ok(x)
    }
}

impl<T: ComplexField> Preconditioner<T> for LuFactorization<T> {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        // factors are nonsingular by construction, so only a size mismatch can fail
        self.solve(r).unwrap_or_else(|_| r.clone())
    }
}

/// Compute the LU factorization with partial pivoting
pub fn lu_factorize<T: ComplexField>(a: &Array2<T>) -> Result<LuFactorization<T>, LuError> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(LuError::DimensionMismatch {
            expected: n,
            got: a.ncols(),
        });
    }

    let mut lu = a.clone();
    // pivots[i] is the original row now sitting in row i
    let mut pivots: Vec<usize> = (0..n).collect();

    for k in 0..n {
        let (max_row, max_val) = (k..n)
            .map(|i| (i, lu[[i, k]].norm()))
            .fold((k, T::Real::zero()), |best, cand| {
                if cand.1 > best.1 { cand } else { best }
            });

        if max_val < pivot_tolerance() {
            return Err(LuError::SingularMatrix { column: k });
        }

        if max_row != k {
            for j in 0..n {
                lu.swap([k, j], [max_row, j]);
            }
            pivots.swap(k, max_row);
        }

        let pivot_inv = lu[[k, k]].inv();
        for i in (k + 1)..n {
            let mult = lu[[i, k]] * pivot_inv;
            lu[[i, k]] = mult;
            for j in (k + 1)..n {
                let u_kj = lu[[k, j]];
                lu[[i, j]] -= mult * u_kj;
            }
        }
    }

    Ok(LuFactorization { lu, pivots })
}

/// Solve Ax = b in one call
pub fn lu_solve<T: ComplexField>(a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>, LuError> {
    lu_factorize(a)?.solve(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use num_complex::Complex64;

    #[test]
    fn test_lu_solve_real() {
        let a = array![[4.0_f64, 1.0], [1.0, 3.0]];
        let b = array![1.0_f64, 2.0];

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        let ax = a.dot(&x);
        for i in 0..2 {
            assert_relative_eq!(ax[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_solve_complex() {
        let a = array![
            [Complex64::new(1.0, 1.0), Complex64::new(0.0, 0.0)],
            [Complex64::new(0.0, 0.0), Complex64::new(2.0, 0.0)],
        ];
        let b = array![Complex64::new(2.0, 0.0), Complex64::new(2.0, 0.0)];

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        assert_relative_eq!(x[0].re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[0].im, -1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_lu_needs_pivoting() {
        let a = array![[0.0_f64, 1.0], [1.0, 0.0]];
        let b = array![3.0_f64, 5.0];
        let x = lu_solve(&a, &b).expect("pivoting handles the zero diagonal");
        assert_relative_eq!(x[0], 5.0);
        assert_relative_eq!(x[1], 3.0);
    }

    #[test]
    fn test_lu_singular() {
        let a = array![[1.0_f64, 2.0], [2.0, 4.0]];
        let b = array![1.0_f64, 2.0];

        assert_eq!(
            lu_solve(&a, &b),
            Err(LuError::SingularMatrix { column: 1 })
        );
    }

    #[test]
    fn test_lu_factorize_from_csr_reused() {
        let dense = array![[4.0_f64, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0]];
        let factorization =
            LuFactorization::from_csr(&CsrMatrix::from_dense(&dense, 0.0)).expect("nonsingular");
        assert_eq!(factorization.dim(), 3);

        for b in [array![1.0_f64, 2.0, 3.0], array![4.0_f64, 5.0, 6.0]] {
            let x = factorization.solve(&b).expect("Solve should succeed");
            let ax = dense.dot(&x);
            for i in 0..3 {
                assert_relative_eq!(ax[i], b[i], epsilon = 1e-10);
            }
        }

        assert!(matches!(
            factorization.solve(&array![1.0_f64]),
            Err(LuError::DimensionMismatch { expected: 3, got: 1 })
        ));
    }
}
