//! Compressed Sparse Row (CSR) matrix format
//!
//! CSR format stores:
//! - `values`: Non-zero entries in row-major order
//! - `col_indices`: Column index for each value (sorted within a row)
//! - `row_ptrs`: Index into values/col_indices where each row starts

use crate::traits::{ComplexField, LinearOperator};
use ndarray::{Array1, Array2};
use num_traits::Zero;
use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Rows below this count are multiplied sequentially even with `rayon`
#[cfg(feature = "rayon")]
const PARALLEL_MATVEC_ROWS: usize = 256;

/// Compressed Sparse Row (CSR) matrix
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T: ComplexField> {
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
    /// Non-zero values in row-major order
    pub values: Vec<T>,
    /// Column indices for each value
    pub col_indices: Vec<usize>,
    /// Row pointers: row_ptrs[i] is the start index in values/col_indices for row i
    /// row_ptrs[num_rows] = nnz
    pub row_ptrs: Vec<usize>,
}

impl<T: ComplexField> CsrMatrix<T> {
    /// Create a new empty CSR matrix
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptrs: vec![0; num_rows + 1],
        }
    }

    /// Create a CSR matrix from a dense matrix
    ///
    /// Only stores entries with magnitude > threshold
    pub fn from_dense(dense: &Array2<T>, threshold: T::Real) -> Self {
        let (num_rows, num_cols) = dense.dim();
        let mut values = Vec::new();
        let mut col_indices = Vec::new();
        let mut row_ptrs = Vec::with_capacity(num_rows + 1);
        row_ptrs.push(0);

        for row in dense.rows() {
            for (j, &val) in row.iter().enumerate() {
                if val.norm() > threshold {
                    values.push(val);
                    col_indices.push(j);
                }
            }
            row_ptrs.push(values.len());
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Create a CSR matrix from COO (Coordinate) format triplets
    ///
    /// Triplets are (row, col, value). Duplicate entries are summed and kept
    /// even when the sum is zero, so the sparsity pattern only depends on
    /// which positions were touched.
    pub fn from_triplets(
        num_rows: usize,
        num_cols: usize,
        mut triplets: Vec<(usize, usize, T)>,
    ) -> Self {
        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut values: Vec<T> = Vec::with_capacity(triplets.len());
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut row_counts = vec![0usize; num_rows];
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            assert!(
                row < num_rows && col < num_cols,
                "Triplet ({row}, {col}) outside a {num_rows}x{num_cols} matrix"
            );
            if last == Some((row, col)) {
                if let Some(v) = values.last_mut() {
                    *v += val;
                }
            } else {
                values.push(val);
                col_indices.push(col);
                row_counts[row] += 1;
                last = Some((row, col));
            }
        }

        let mut row_ptrs = Vec::with_capacity(num_rows + 1);
        row_ptrs.push(0);
        for count in row_counts {
            let prev = row_ptrs[row_ptrs.len() - 1];
            row_ptrs.push(prev + count);
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Create identity matrix in CSR format
    pub fn identity(n: usize) -> Self {
        Self::from_diagonal(&Array1::from_elem(n, T::one()))
    }

    /// Create diagonal matrix from vector
    pub fn from_diagonal(diag: &Array1<T>) -> Self {
        let n = diag.len();
        Self {
            num_rows: n,
            num_cols: n,
            values: diag.to_vec(),
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Get the range of indices in values/col_indices for a given row
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.row_ptrs[row]..self.row_ptrs[row + 1]
    }

    /// Get the (col, value) pairs for a row
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let range = self.row_range(row);
        self.col_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Iterate over all stored (row, col, value) entries
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.num_rows).flat_map(move |i| self.row_entries(i).map(move |(j, v)| (i, j, v)))
    }

    /// Matrix-vector product: y = A * x
    pub fn matvec(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.num_cols, "Input vector size mismatch");

        #[cfg(feature = "rayon")]
        {
            if self.num_rows >= PARALLEL_MATVEC_ROWS {
                return self.matvec_parallel(x);
            }
        }

        self.matvec_sequential(x)
    }

    fn row_dot(&self, i: usize, x: &Array1<T>) -> T {
        self.row_entries(i)
            .fold(T::zero(), |acc, (j, v)| acc + v * x[j])
    }

    fn matvec_sequential(&self, x: &Array1<T>) -> Array1<T> {
        (0..self.num_rows).map(|i| self.row_dot(i, x)).collect()
    }

    #[cfg(feature = "rayon")]
    fn matvec_parallel(&self, x: &Array1<T>) -> Array1<T> {
        let results: Vec<T> = (0..self.num_rows)
            .into_par_iter()
            .map(|i| self.row_dot(i, x))
            .collect();
        Array1::from_vec(results)
    }

    /// Transpose matrix-vector product: y = A^T * x
    pub fn matvec_transpose(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.num_rows, "Input vector size mismatch");

        let mut y = Array1::from_elem(self.num_cols, T::zero());
        for (i, j, v) in self.triplets() {
            y[j] += v * x[i];
        }
        y
    }

    /// Get element at (i, j), returns 0 if not stored
    pub fn get(&self, i: usize, j: usize) -> T {
        let range = self.row_range(i);
        match self.col_indices[range.clone()].binary_search(&j) {
            Ok(pos) => self.values[range.start + pos],
            Err(_) => T::zero(),
        }
    }

    /// Extract diagonal elements
    pub fn diagonal(&self) -> Array1<T> {
        let n = self.num_rows.min(self.num_cols);
        (0..n).map(|i| self.get(i, i)).collect()
    }

    /// Scale all values by a scalar
    pub fn scale(&mut self, scalar: T) {
        for val in &mut self.values {
            *val *= scalar;
        }
    }

    /// Return a copy with every value multiplied by `scalar`
    pub fn scaled(&self, scalar: T) -> Self {
        let mut out = self.clone();
        out.scale(scalar);
        out
    }

    /// Compute self + alpha * other over the union of both patterns
    pub fn add_scaled(&self, alpha: T, other: &CsrMatrix<T>) -> Self {
        assert_eq!(
            (self.num_rows, self.num_cols),
            (other.num_rows, other.num_cols),
            "Matrix shapes must match for addition"
        );
        let triplets = self
            .triplets()
            .chain(other.triplets().map(|(i, j, v)| (i, j, alpha * v)))
            .collect();
        Self::from_triplets(self.num_rows, self.num_cols, triplets)
    }

    /// Union of the sparsity patterns of two equally-shaped matrices
    ///
    /// Returns, per row, the sorted column indices present in either matrix.
    pub fn pattern_union(&self, other: &CsrMatrix<T>) -> Vec<Vec<usize>> {
        assert_eq!(
            (self.num_rows, self.num_cols),
            (other.num_rows, other.num_cols),
            "Matrix shapes must match for pattern union"
        );
        (0..self.num_rows)
            .map(|i| {
                let mut cols: Vec<usize> = self.col_indices[self.row_range(i)]
                    .iter()
                    .chain(other.col_indices[other.row_range(i)].iter())
                    .copied()
                    .collect();
                cols.sort_unstable();
                cols.dedup();
                cols
            })
            .collect()
    }

    /// Convert to dense matrix (for debugging/small matrices)
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.num_rows, self.num_cols), T::zero());
        for (i, j, v) in self.triplets() {
            dense[[i, j]] = v;
        }
        dense
    }

    /// True when every stored value is exactly zero
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| v.is_zero())
    }
}

impl<T: ComplexField> LinearOperator<T> for CsrMatrix<T> {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn num_cols(&self) -> usize {
        self.num_cols
    }

    fn apply(&self, x: &Array1<T>) -> Array1<T> {
        self.matvec(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use num_complex::Complex64;

    #[test]
    fn test_csr_from_dense() {
        let dense = array![[1.0_f64, 0.0, 2.0], [0.0, 3.0, 0.0], [4.0, 0.0, 5.0]];
        let csr = CsrMatrix::from_dense(&dense, 1e-15);

        assert_eq!(csr.num_rows, 3);
        assert_eq!(csr.num_cols, 3);
        assert_eq!(csr.nnz(), 5);
        assert_relative_eq!(csr.get(0, 2), 2.0);
        assert_relative_eq!(csr.get(2, 0), 4.0);
        assert_relative_eq!(csr.get(1, 0), 0.0);
    }

    #[test]
    fn test_csr_matvec() {
        let dense = array![[1.0_f64, 2.0], [3.0, 4.0]];
        let csr = CsrMatrix::from_dense(&dense, 1e-15);
        let y = csr.matvec(&array![1.0, 2.0]);

        // [1 2] * [1]   [5]
        // [3 4]   [2] = [11]
        assert_relative_eq!(y[0], 5.0, epsilon = 1e-12);
        assert_relative_eq!(y[1], 11.0, epsilon = 1e-12);
    }

    #[test]
    fn test_csr_triplets_duplicate_and_empty_rows() {
        let triplets = vec![
            (2, 2, 5.0_f64),
            (0, 0, 1.0),
            (0, 0, 2.0),
            (2, 0, 4.0),
        ];
        let csr = CsrMatrix::from_triplets(4, 3, triplets);

        assert_eq!(csr.row_ptrs, vec![0, 1, 1, 3, 3]);
        assert_relative_eq!(csr.get(0, 0), 3.0);
        assert_relative_eq!(csr.get(2, 0), 4.0);
        assert_relative_eq!(csr.get(2, 2), 5.0);
    }

    #[test]
    fn test_add_scaled_builds_union_pattern() {
        let a = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 1.0_f64)]);
        let b = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 1.0), (1, 0, 2.0)]);
        let c = a.add_scaled(-1.0, &b);

        assert_eq!(c.nnz(), 2);
        assert_relative_eq!(c.get(0, 0), 0.0);
        assert_relative_eq!(c.get(1, 0), -2.0);
        assert_eq!(a.pattern_union(&b), vec![vec![0], vec![0]]);
    }

    #[test]
    fn test_transpose_matvec() {
        let dense = array![[1.0_f64, 2.0], [3.0, 4.0]];
        let csr = CsrMatrix::from_dense(&dense, 0.0);
        let y = csr.matvec_transpose(&array![1.0, 1.0]);
        assert_relative_eq!(y[0], 4.0);
        assert_relative_eq!(y[1], 6.0);
    }

    #[test]
    fn test_complex_csr_operator() {
        let dense = array![
            [Complex64::new(1.0, 1.0), Complex64::new(0.0, 0.0)],
            [Complex64::new(0.0, 0.0), Complex64::new(2.0, 0.0)],
        ];
        let csr = CsrMatrix::from_dense(&dense, 1e-15);
        let y = csr.apply(&array![Complex64::new(1.0, -1.0), Complex64::new(1.0, 0.0)]);

        assert_relative_eq!(y[0].re, 2.0);
        assert_relative_eq!(y[0].im, 0.0);
        assert!(csr.is_square());
    }
}
