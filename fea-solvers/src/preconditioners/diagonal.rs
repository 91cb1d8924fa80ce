//! Diagonal (Jacobi) preconditioner
//!
//! Scales each component by the inverse of the matching diagonal entry.
//! Zero diagonal entries (the off-diagonal coupling blocks of a real 2x2
//! block system can make these appear) fall back to identity scaling.

use crate::sparse::CsrMatrix;
use crate::traits::{ComplexField, Preconditioner};
use ndarray::Array1;
use num_traits::{Float, FromPrimitive};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Diagonal (Jacobi) preconditioner
///
/// M = diag(A), so M^(-1) scales each component by 1/A_ii
#[derive(Debug, Clone)]
pub struct DiagonalPreconditioner<T: ComplexField> {
    inv_diag: Array1<T>,
}

impl<T: ComplexField> DiagonalPreconditioner<T> {
    /// Create a diagonal preconditioner from a CSR matrix
    pub fn from_csr(matrix: &CsrMatrix<T>) -> Self {
        Self::from_diagonal(&matrix.diagonal())
    }

    /// Create from a diagonal vector directly
    pub fn from_diagonal(diag: &Array1<T>) -> Self {
        let tol = T::Real::from_f64(1e-30).unwrap_or_else(T::Real::min_positive_value);
        let inv_diag = diag.mapv(|d| if d.norm() > tol { d.inv() } else { T::one() });
        Self { inv_diag }
    }

    /// Inverse diagonal entries
    pub fn inverse_diagonal(&self) -> &Array1<T> {
        &self.inv_diag
    }
}

impl<T: ComplexField> Preconditioner<T> for DiagonalPreconditioner<T> {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        #[cfg(feature = "rayon")]
        {
            if r.len() >= 1000 {
                if let (Some(r_slice), Some(inv_slice)) = (r.as_slice(), self.inv_diag.as_slice()) {
                    let results: Vec<T> = r_slice
                        .par_iter()
                        .zip(inv_slice.par_iter())
                        .map(|(&ri, &di)| ri * di)
                        .collect();
                    return Array1::from_vec(results);
                }
            }
        }

        r.iter()
            .zip(self.inv_diag.iter())
            .map(|(&ri, &di)| ri * di)
            .collect()
    }
}
