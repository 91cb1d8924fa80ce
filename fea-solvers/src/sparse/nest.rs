//! Nested block operators addressed through index sets
//!
//! A [`NestMatrix`] keeps each sub-block as its own CSR matrix and exposes the
//! whole arrangement as one operator. Index sets name the global rows that
//! belong to each field, which is what a field-split preconditioner needs to
//! pull sub-vectors in and out of the combined vector.

use crate::sparse::CsrMatrix;
use crate::traits::{ComplexField, LinearOperator};
use ndarray::Array1;

/// Ordered set of global indices identifying one field of a combined vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSet {
    indices: Vec<usize>,
}

impl IndexSet {
    /// Build from explicit global indices
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    /// Contiguous range `start..start + len`
    pub fn contiguous(start: usize, len: usize) -> Self {
        Self {
            indices: (start..start + len).collect(),
        }
    }

    /// Every `stride`-th index starting at `offset`, `count` entries
    pub fn strided(offset: usize, stride: usize, count: usize) -> Self {
        Self {
            indices: (0..count).map(|k| offset + k * stride).collect(),
        }
    }

    /// Number of indices in the set
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True when the set is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Global indices
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Gather the entries of `v` named by this set
    pub fn extract<T: ComplexField>(&self, v: &Array1<T>) -> Array1<T> {
        self.indices.iter().map(|&i| v[i]).collect()
    }

    /// Scatter `sub` into the entries of `v` named by this set
    pub fn scatter<T: ComplexField>(&self, sub: &Array1<T>, v: &mut Array1<T>) {
        assert_eq!(sub.len(), self.len(), "Sub-vector size mismatch");
        for (&i, &s) in self.indices.iter().zip(sub.iter()) {
            v[i] = s;
        }
    }
}

/// Square arrangement of CSR sub-blocks acting as one operator
///
/// Missing blocks (`None`) act as zero. All blocks in a block row share a row
/// count and all blocks in a block column share a column count.
#[derive(Debug, Clone)]
pub struct NestMatrix<T: ComplexField> {
    blocks: Vec<Vec<Option<CsrMatrix<T>>>>,
    row_sets: Vec<IndexSet>,
    col_sets: Vec<IndexSet>,
    num_rows: usize,
    num_cols: usize,
}

impl<T: ComplexField> NestMatrix<T> {
    /// Nest `blocks[i][j]` with contiguous index sets derived from block sizes
    ///
    /// # Panics
    ///
    /// Panics if the grid is ragged, a block row or column is entirely empty,
    /// or block dimensions disagree within a block row or column.
    pub fn new(blocks: Vec<Vec<Option<CsrMatrix<T>>>>) -> Self {
        let n_block_rows = blocks.len();
        assert!(n_block_rows > 0, "Nest needs at least one block row");
        let n_block_cols = blocks[0].len();
        assert!(
            blocks.iter().all(|row| row.len() == n_block_cols),
            "Nest block grid must be rectangular"
        );

        let row_sizes: Vec<usize> = (0..n_block_rows)
            .map(|i| {
                let sizes: Vec<usize> = blocks[i].iter().flatten().map(|b| b.num_rows).collect();
                assert!(!sizes.is_empty(), "Block row {i} has no blocks");
                assert!(
                    sizes.iter().all(|&s| s == sizes[0]),
                    "Block row {i} has inconsistent row counts"
                );
                sizes[0]
            })
            .collect();
        let col_sizes: Vec<usize> = (0..n_block_cols)
            .map(|j| {
                let sizes: Vec<usize> = blocks
                    .iter()
                    .filter_map(|row| row[j].as_ref())
                    .map(|b| b.num_cols)
                    .collect();
                assert!(!sizes.is_empty(), "Block column {j} has no blocks");
                assert!(
                    sizes.iter().all(|&s| s == sizes[0]),
                    "Block column {j} has inconsistent column counts"
                );
                sizes[0]
            })
            .collect();

        let row_sets = contiguous_sets(&row_sizes);
        let col_sets = contiguous_sets(&col_sizes);

        Self {
            blocks,
            row_sets,
            col_sets,
            num_rows: row_sizes.iter().sum(),
            num_cols: col_sizes.iter().sum(),
        }
    }

    /// Index sets of the block rows (the fields of the residual)
    pub fn row_index_sets(&self) -> &[IndexSet] {
        &self.row_sets
    }

    /// Index sets of the block columns (the fields of the solution)
    pub fn col_index_sets(&self) -> &[IndexSet] {
        &self.col_sets
    }

    /// Number of block rows
    pub fn num_block_rows(&self) -> usize {
        self.blocks.len()
    }

    /// Sub-block (i, j), if stored
    pub fn block(&self, i: usize, j: usize) -> Option<&CsrMatrix<T>> {
        self.blocks[i][j].as_ref()
    }

    /// Flatten into one scalar CSR matrix
    pub fn to_csr(&self) -> CsrMatrix<T> {
        let mut triplets = Vec::new();
        for (i, row) in self.blocks.iter().enumerate() {
            for (j, block) in row.iter().enumerate() {
                if let Some(block) = block {
                    let rows = self.row_sets[i].indices();
                    let cols = self.col_sets[j].indices();
                    triplets.extend(block.triplets().map(|(r, c, v)| (rows[r], cols[c], v)));
                }
            }
        }
        CsrMatrix::from_triplets(self.num_rows, self.num_cols, triplets)
    }

    /// Matrix-vector product: y = A * x
    pub fn matvec(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.num_cols, "Input vector size mismatch");
        let x_parts: Vec<Array1<T>> = self.col_sets.iter().map(|s| s.extract(x)).collect();

        let mut y = Array1::from_elem(self.num_rows, T::zero());
        for (i, row) in self.blocks.iter().enumerate() {
            let mut y_i = Array1::from_elem(self.row_sets[i].len(), T::zero());
            for (block, x_j) in row.iter().zip(x_parts.iter()) {
                if let Some(block) = block {
                    y_i = y_i + block.matvec(x_j);
                }
            }
            self.row_sets[i].scatter(&y_i, &mut y);
        }
        y
    }
}

fn contiguous_sets(sizes: &[usize]) -> Vec<IndexSet> {
    let mut start = 0;
    sizes
        .iter()
        .map(|&len| {
            let set = IndexSet::contiguous(start, len);
            start += len;
            set
        })
        .collect()
}

impl<T: ComplexField> LinearOperator<T> for NestMatrix<T> {
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
