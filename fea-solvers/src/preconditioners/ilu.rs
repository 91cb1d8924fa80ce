//! ILU(0) preconditioner
//!
//! Incomplete LU factorization with no fill-in. Requires sorted column
//! indices within each row, which every `CsrMatrix` constructor guarantees.

use crate::sparse::CsrMatrix;
use crate::traits::{ComplexField, Preconditioner};
use ndarray::Array1;
use num_traits::{Float, FromPrimitive};

/// ILU(0) preconditioner
///
/// L and U share the sparsity pattern of the factored matrix. L has a unit
/// diagonal and is stored strictly below the diagonal.
#[derive(Debug, Clone)]
pub struct IluPreconditioner<T: ComplexField> {
    lower: CsrMatrix<T>,
    upper: CsrMatrix<T>,
    u_diag: Vec<T>,
}

impl<T: ComplexField> IluPreconditioner<T> {
    /// Create ILU(0) preconditioner from a CSR matrix
    pub fn from_csr(matrix: &CsrMatrix<T>) -> Self {
        let n = matrix.num_rows;
        let tol = T::Real::from_f64(1e-30).unwrap_or_else(T::Real::min_positive_value);
        let col_indices = &matrix.col_indices;
        let row_ptrs = &matrix.row_ptrs;

        let diag_indices: Vec<Option<usize>> = (0..n)
            .map(|i| (row_ptrs[i]..row_ptrs[i + 1]).find(|&idx| col_indices[idx] == i))
            .collect();

        let mut values = matrix.values.clone();

        for i in 0..n {
            for idx in row_ptrs[i]..row_ptrs[i + 1] {
                let k = col_indices[idx];
                if k >= i {
                    break;
                }
                let Some(kk) = diag_indices[k] else {
                    continue;
                };
                let u_kk = values[kk];
                if u_kk.norm() < tol {
                    continue;
                }

                let l_ik = values[idx] * u_kk.inv();
                values[idx] = l_ik;

                // a_ij -= l_ik * u_kj for j > k restricted to the pattern of row i
                for j_idx in (idx + 1)..row_ptrs[i + 1] {
                    let j = col_indices[j_idx];
                    let row_k = &col_indices[kk + 1..row_ptrs[k + 1]];
                    if let Ok(pos) = row_k.binary_search(&j) {
                        let u_kj = values[kk + 1 + pos];
                        values[j_idx] -= l_ik * u_kj;
                    }
                }
            }
        }

        let mut lower = Vec::new();
        let mut upper = Vec::new();
        let mut u_diag = vec![T::one(); n];
        for i in 0..n {
            for idx in row_ptrs[i]..row_ptrs[i + 1] {
                let j = col_indices[idx];
                if j < i {
                    lower.push((i, j, values[idx]));
                } else if j == i {
                    u_diag[i] = values[idx];
                } else {
                    upper.push((i, j, values[idx]));
                }
            }
        }

        Self {
            lower: CsrMatrix::from_triplets(n, n, lower),
            upper: CsrMatrix::from_triplets(n, n, upper),
            u_diag,
        }
    }
}

impl<T: ComplexField> Preconditioner<T> for IluPreconditioner<T> {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        let n = self.u_diag.len();
        let tol = T::Real::from_f64(1e-30).unwrap_or_else(T::Real::min_positive_value);
        let mut x = r.clone();

        // Ly = r, unit diagonal
        for i in 0..n {
            let mut acc = x[i];
            for (j, l_ij) in self.lower.row_entries(i) {
                acc -= l_ij * x[j];
            }
            x[i] = acc;
        }

        // Ux = y
        for i in (0..n).rev() {
            let mut acc = x[i];
            for (j, u_ij) in self.upper.row_entries(i) {
                acc -= u_ij * x[j];
            }
            let u_ii = self.u_diag[i];
            x[i] = if u_ii.norm() > tol { acc * u_ii.inv() } else { acc };
        }

        x
    }
}
