//! Field-split preconditioner for nested block operators
//!
//! Each field (block row of a [`NestMatrix`]) gets its own sub-solver built
//! from the diagonal block. Fields are combined either additively (block
//! Jacobi) or multiplicatively (block Gauss-Seidel, forward sweep). For the
//! real form `[[J_R, -J_I], [J_I, J_R]]` both diagonal blocks are `J_R`.

use super::{DiagonalPreconditioner, IluPreconditioner, PreconditionerError};
use crate::direct::LuFactorization;
use crate::sparse::{CsrMatrix, NestMatrix};
use crate::traits::{ComplexField, Preconditioner};
use ndarray::Array1;

/// How field corrections are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldSplitType {
    /// Independent solves per field
    Additive,
    /// Later fields see the corrections of earlier ones
    #[default]
    Multiplicative,
}

/// Solver applied to each diagonal block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubSolver {
    Jacobi,
    #[default]
    Ilu,
    Lu,
}

impl SubSolver {
    fn build<T: ComplexField>(
        self,
        block: &CsrMatrix<T>,
    ) -> Result<Box<dyn Preconditioner<T>>, PreconditionerError> {
        Ok(match self {
            SubSolver::Jacobi => Box::new(DiagonalPreconditioner::from_csr(block)),
            SubSolver::Ilu => Box::new(IluPreconditioner::from_csr(block)),
            SubSolver::Lu => Box::new(LuFactorization::from_csr(block)?),
        })
    }
}

/// Field-split preconditioner holding one sub-solver per field
pub struct FieldSplitPreconditioner<T: ComplexField> {
    split_type: FieldSplitType,
    sub_solvers: Vec<Box<dyn Preconditioner<T>>>,
    operator: NestMatrix<T>,
}

impl<T: ComplexField> FieldSplitPreconditioner<T> {
    /// Build sub-solvers for every diagonal block of `matrix`
    pub fn new(
        matrix: &NestMatrix<T>,
        split_type: FieldSplitType,
        sub_solver: SubSolver,
    ) -> Result<Self, PreconditionerError> {
        let sub_solvers = (0..matrix.num_block_rows())
            .map(|field| {
                let block = matrix
                    .block(field, field)
                    .ok_or(PreconditionerError::MissingDiagonalBlock { field })?;
                sub_solver.build(block)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            split_type,
            sub_solvers,
            operator: matrix.clone(),
        })
    }

    /// Number of fields
    pub fn num_fields(&self) -> usize {
        self.sub_solvers.len()
    }
}

impl<T: ComplexField> Preconditioner<T> for FieldSplitPreconditioner<T> {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        let row_sets = self.operator.row_index_sets();
        let col_sets = self.operator.col_index_sets();
        let mut corrections: Vec<Array1<T>> = Vec::with_capacity(self.num_fields());

        for (i, solver) in self.sub_solvers.iter().enumerate() {
            let mut r_i = row_sets[i].extract(r);
            if self.split_type == FieldSplitType::Multiplicative {
                for (j, z_j) in corrections.iter().enumerate() {
                    if let Some(coupling) = self.operator.block(i, j) {
                        r_i = r_i - coupling.matvec(z_j);
                    }
                }
            }
            corrections.push(solver.apply(&r_i));
        }

        let mut z = Array1::from_elem(r.len(), T::zero());
        for (set, z_i) in col_sets.iter().zip(corrections.iter()) {
            set.scatter(z_i, &mut z);
        }
        z
    }
}

impl<T: ComplexField> std::fmt::Debug for FieldSplitPreconditioner<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSplitPreconditioner")
            .field("split_type", &self.split_type)
            .field("num_fields", &self.num_fields())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn complex_scalar_nest(a: f64, b: f64) -> NestMatrix<f64> {
        // real form of (a + ib)
        let re = CsrMatrix::from_dense(&array![[a]], 0.0);
        let im = CsrMatrix::from_dense(&array![[b]], 0.0);
        NestMatrix::new(vec![
            vec![Some(re.clone()), Some(im.scaled(-1.0))],
            vec![Some(im), Some(re)],
        ])
    }

    #[test]
    fn test_additive_split_ignores_coupling() {
        let nest = complex_scalar_nest(2.0, 1.0);
        let precond =
            FieldSplitPreconditioner::new(&nest, FieldSplitType::Additive, SubSolver::Lu).unwrap();
        let z = precond.apply(&array![4.0, 2.0]);
        assert_relative_eq!(z[0], 2.0);
        assert_relative_eq!(z[1], 1.0);
    }

    #[test]
    fn test_multiplicative_split_forward_sweep() {
        let nest = complex_scalar_nest(2.0, 1.0);
        let precond =
            FieldSplitPreconditioner::new(&nest, FieldSplitType::Multiplicative, SubSolver::Jacobi)
                .unwrap();
        // z0 = 4 / 2 = 2, z1 = (2 - 1 * 2) / 2 = 0
        let z = precond.apply(&array![4.0, 2.0]);
        assert_relative_eq!(z[0], 2.0);
        assert_relative_eq!(z[1], 0.0);
        assert_eq!(precond.num_fields(), 2);
    }

    #[test]
    fn test_missing_diagonal_block() {
        let c = CsrMatrix::<f64>::identity(1);
        let nest = NestMatrix::new(vec![vec![None, Some(c.clone())], vec![Some(c), None]]);
        let err = FieldSplitPreconditioner::new(&nest, FieldSplitType::Additive, SubSolver::Ilu)
            .unwrap_err();
        assert_eq!(err, PreconditionerError::MissingDiagonalBlock { field: 0 });
    }
}
