//! Block Compressed Sparse Row (BSR) matrix format
//!
//! Every stored entry is a dense `b x b` block (row-major). The block
//! sparsity pattern is fixed when the matrix is created from a per-block-row
//! column list, mirroring a preallocate-then-insert workflow: inserting into
//! a block that was not preallocated is a programming error.

use crate::sparse::CsrMatrix;
use crate::traits::{ComplexField, LinearOperator};
use ndarray::{Array1, Array2};

/// Block-CSR matrix with a uniform square block size
#[derive(Debug, Clone, PartialEq)]
pub struct BsrMatrix<T: ComplexField> {
    /// Edge length of every block
    pub block_size: usize,
    /// Number of block rows
    pub num_block_rows: usize,
    /// Number of block columns
    pub num_block_cols: usize,
    /// Block row pointers into `block_col_indices`
    pub block_row_ptrs: Vec<usize>,
    /// Block column index of every stored block (sorted within a block row)
    pub block_col_indices: Vec<usize>,
    /// Block values, `block_size * block_size` per stored block, row-major
    pub values: Vec<T>,
}

impl<T: ComplexField> BsrMatrix<T> {
    /// Preallocate a zero matrix with the given block pattern
    ///
    /// `pattern[i]` lists the block columns stored in block row `i`.
    pub fn with_pattern(block_size: usize, num_block_cols: usize, pattern: &[Vec<usize>]) -> Self {
        assert!(block_size > 0, "Block size must be positive");
        let mut block_row_ptrs = Vec::with_capacity(pattern.len() + 1);
        block_row_ptrs.push(0);
        let mut block_col_indices = Vec::new();

        for cols in pattern {
            let mut cols = cols.clone();
            cols.sort_unstable();
            cols.dedup();
            assert!(
                cols.last().is_none_or(|&c| c < num_block_cols),
                "Block column outside the matrix"
            );
            block_col_indices.extend(cols);
            block_row_ptrs.push(block_col_indices.len());
        }

        let values = vec![T::zero(); block_col_indices.len() * block_size * block_size];
        Self {
            block_size,
            num_block_rows: pattern.len(),
            num_block_cols,
            block_row_ptrs,
            block_col_indices,
            values,
        }
    }

    /// Number of stored blocks
    pub fn num_blocks(&self) -> usize {
        self.block_col_indices.len()
    }

    /// Number of stored blocks per block row (the preallocation counts)
    pub fn blocks_per_row(&self) -> Vec<usize> {
        self.block_row_ptrs.windows(2).map(|w| w[1] - w[0]).collect()
    }

    fn block_index(&self, block_row: usize, block_col: usize) -> Option<usize> {
        let start = self.block_row_ptrs[block_row];
        let end = self.block_row_ptrs[block_row + 1];
        self.block_col_indices[start..end]
            .binary_search(&block_col)
            .ok()
            .map(|pos| start + pos)
    }

    /// Add a dense block into the preallocated position (block_row, block_col)
    ///
    /// # Panics
    ///
    /// Panics if the position was not part of the preallocated pattern or if
    /// the block has the wrong shape.
    pub fn add_block(&mut self, block_row: usize, block_col: usize, block: &Array2<T>) {
        let b = self.block_size;
        assert_eq!(block.dim(), (b, b), "Block shape mismatch");
        let idx = self
            .block_index(block_row, block_col)
            .unwrap_or_else(|| {
                panic!("New nonzero block ({block_row}, {block_col}) was not preallocated")
            });
        let dst = &mut self.values[idx * b * b..(idx + 1) * b * b];
        for (d, &v) in dst.iter_mut().zip(block.iter()) {
            *d += v;
        }
    }

    /// Copy of the stored block at (block_row, block_col), zero if absent
    pub fn block(&self, block_row: usize, block_col: usize) -> Array2<T> {
        let b = self.block_size;
        match self.block_index(block_row, block_col) {
            Some(idx) => {
                let start = idx * b * b;
                Array2::from_shape_fn((b, b), |(i, j)| self.values[start + i * b + j])
            }
            None => Array2::from_elem((b, b), T::zero()),
        }
    }

    /// Diagonal blocks, zero blocks where the diagonal is not stored
    pub fn diagonal_blocks(&self) -> Vec<Array2<T>> {
        (0..self.num_block_rows.min(self.num_block_cols))
            .map(|i| self.block(i, i))
            .collect()
    }

    /// Matrix-vector product: y = A * x
    pub fn matvec(&self, x: &Array1<T>) -> Array1<T> {
        let b = self.block_size;
        assert_eq!(x.len(), self.num_block_cols * b, "Input vector size mismatch");

        let mut y = Array1::from_elem(self.num_block_rows * b, T::zero());
        for bi in 0..self.num_block_rows {
            for idx in self.block_row_ptrs[bi]..self.block_row_ptrs[bi + 1] {
                let bj = self.block_col_indices[idx];
                let block = &self.values[idx * b * b..(idx + 1) * b * b];
                for r in 0..b {
                    let mut sum = T::zero();
                    for c in 0..b {
                        sum += block[r * b + c] * x[bj * b + c];
                    }
                    y[bi * b + r] += sum;
                }
            }
        }
        y
    }

    /// Expand into scalar CSR form (explicit zeros inside stored blocks are kept)
    pub fn to_csr(&self) -> CsrMatrix<T> {
        let b = self.block_size;
        let mut triplets = Vec::with_capacity(self.values.len());
        for bi in 0..self.num_block_rows {
            for idx in self.block_row_ptrs[bi]..self.block_row_ptrs[bi + 1] {
                let bj = self.block_col_indices[idx];
                for r in 0..b {
                    for c in 0..b {
                        triplets.push((bi * b + r, bj * b + c, self.values[idx * b * b + r * b + c]));
                    }
                }
            }
        }
        CsrMatrix::from_triplets(self.num_block_rows * b, self.num_block_cols * b, triplets)
    }
}

impl<T: ComplexField> LinearOperator<T> for BsrMatrix<T> {
    fn num_rows(&self) -> usize {
        self.num_block_rows * self.block_size
    }

    fn num_cols(&self) -> usize {
        self.num_block_cols * self.block_size
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

    fn two_by_two() -> BsrMatrix<f64> {
        let mut m = BsrMatrix::with_pattern(2, 2, &[vec![0, 1], vec![1]]);
        m.add_block(0, 0, &array![[1.0, 2.0], [3.0, 4.0]]);
        m.add_block(0, 1, &array![[0.0, 1.0], [1.0, 0.0]]);
        m.add_block(1, 1, &array![[5.0, 0.0], [0.0, 6.0]]);
        m
    }

    #[test]
    fn test_bsr_matvec_matches_scalar_form() {
        let m = two_by_two();
        let x = array![1.0, -1.0, 2.0, 0.5];
        let y = m.matvec(&x);
        let y_csr = m.to_csr().matvec(&x);

        for (a, b) in y.iter().zip(y_csr.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-14);
        }
        // first row: 1*1 + 2*(-1) + 0*2 + 1*0.5
        assert_relative_eq!(y[0], -0.5);
    }

    #[test]
    fn test_bsr_preallocation_counts() {
        let m = two_by_two();
        assert_eq!(m.blocks_per_row(), vec![2, 1]);
        assert_eq!(m.num_blocks(), 3);
        assert_relative_eq!(m.block(1, 0)[[0, 0]], 0.0);
        assert_relative_eq!(m.diagonal_blocks()[1][[1, 1]], 6.0);
    }

    #[test]
    #[should_panic(expected = "not preallocated")]
    fn test_bsr_rejects_new_nonzero() {
        let mut m = two_by_two();
        m.add_block(1, 0, &array![[1.0, 0.0], [0.0, 1.0]]);
    }
}
