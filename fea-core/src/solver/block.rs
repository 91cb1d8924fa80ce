//! Real block form of a complex linear system
//!
//! `(J_R + iJ_I)(x_R + ix_I) + (r_R + ir_I) = 0` is solved as the real system
//!
//! ```text
//! [ J_R  -J_I ] [ x_R ]     [ r_R ]
//! [ J_I   J_R ] [ x_I ]  =  [ r_I ]   (right-hand side negated)
//! ```
//!
//! in one of two storage layouts:
//!
//! - **Field split**: a 2x2 nested operator with index sets `0..n` (real) and
//!   `n..2n` (imaginary)
//! - **Interleaved**: a block-CSR matrix with 2x2 blocks; unknown `2k` is the
//!   real part and `2k+1` the imaginary part of dof `k`

use super::{LinearSolution, LinearSolverConfig, SolverError, solve_field_split, solve_interleaved};
use crate::assembly::{ComplexAssembly, ComplexResidual};
use ndarray::{Array1, Axis, array, concatenate, s};
use solvers::{BsrMatrix, IndexSet, NestMatrix};

/// Storage layout of the real block system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockRepresentation {
    /// Nested 2x2 operator, solved with a field-split preconditioner
    #[default]
    FieldSplit,
    /// Block-CSR with 2x2 blocks, solved with point-block Jacobi
    Interleaved,
}

/// Interleave real and imaginary parts: `[re0, im0, re1, im1, ...]`
pub fn interleave(re: &Array1<f64>, im: &Array1<f64>) -> Array1<f64> {
    assert_eq!(re.len(), im.len(), "Real and imaginary parts differ in length");
    let mut out = Array1::zeros(2 * re.len());
    out.slice_mut(s![0..;2]).assign(re);
    out.slice_mut(s![1..;2]).assign(im);
    out
}

/// Split an interleaved vector into its real and imaginary parts
pub fn deinterleave(v: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
    assert!(v.len() % 2 == 0, "Interleaved vector has odd length {}", v.len());
    (v.slice(s![0..;2]).to_owned(), v.slice(s![1..;2]).to_owned())
}

/// Real block system as a 2x2 nested operator
#[derive(Debug, Clone)]
pub struct FieldSplitSystem {
    pub matrix: NestMatrix<f64>,
    /// Stacked residual `{r_R; r_I}`
    pub residual: Array1<f64>,
}

impl FieldSplitSystem {
    pub fn from_parts(parts: &ComplexResidual) -> Self {
        let jac_re = &parts.jac_re;
        let jac_im = &parts.jac_im;
        let matrix = NestMatrix::new(vec![
            vec![Some(jac_re.clone()), Some(jac_im.scaled(-1.0))],
            vec![Some(jac_im.clone()), Some(jac_re.clone())],
        ]);
        let residual = concatenate![Axis(0), parts.res_re.view(), parts.res_im.view()];
        Self { matrix, residual }
    }

    /// Index set of the real field
    pub fn real_index_set(&self) -> &IndexSet {
        &self.matrix.row_index_sets()[0]
    }

    /// Index set of the imaginary field
    pub fn imag_index_set(&self) -> &IndexSet {
        &self.matrix.row_index_sets()[1]
    }

    pub fn split_solution(&self, v: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        (
            self.real_index_set().extract(v),
            self.imag_index_set().extract(v),
        )
    }
}

/// Real block system as an interleaved block-CSR matrix
#[derive(Debug, Clone)]
pub struct InterleavedSystem {
    pub matrix: BsrMatrix<f64>,
    /// Interleaved residual `[r_R0, r_I0, r_R1, r_I1, ...]`
    pub residual: Array1<f64>,
}

impl InterleavedSystem {
    /// Build from the complex parts
    ///
    /// The block pattern is the union of the `J_R` and `J_I` patterns, so an
    /// entry present in only one of them still gets a full 2x2 block.
    pub fn from_parts(parts: &ComplexResidual) -> Self {
        let jac_re = &parts.jac_re;
        let jac_im = &parts.jac_im;
        let pattern = jac_re.pattern_union(jac_im);

        let mut matrix = BsrMatrix::with_pattern(2, jac_re.num_cols, &pattern);
        for (row, cols) in pattern.iter().enumerate() {
            for &col in cols {
                let a = jac_re.get(row, col);
                let b = jac_im.get(row, col);
                matrix.add_block(row, col, &array![[a, -b], [b, a]]);
            }
        }

        Self {
            matrix,
            residual: interleave(&parts.res_re, &parts.res_im),
        }
    }
}

/// Real block system in either layout
#[derive(Debug, Clone)]
pub enum BlockSystem {
    FieldSplit(FieldSplitSystem),
    Interleaved(InterleavedSystem),
}

impl BlockSystem {
    pub fn representation(&self) -> BlockRepresentation {
        match self {
            BlockSystem::FieldSplit(_) => BlockRepresentation::FieldSplit,
            BlockSystem::Interleaved(_) => BlockRepresentation::Interleaved,
        }
    }

    /// Residual in the layout of the system
    pub fn residual(&self) -> &Array1<f64> {
        match self {
            BlockSystem::FieldSplit(system) => &system.residual,
            BlockSystem::Interleaved(system) => &system.residual,
        }
    }

    /// Combine real and imaginary parts into the layout of the system
    pub fn combine(&self, re: &Array1<f64>, im: &Array1<f64>) -> Array1<f64> {
        match self {
            BlockSystem::FieldSplit(_) => concatenate![Axis(0), re.view(), im.view()],
            BlockSystem::Interleaved(_) => interleave(re, im),
        }
    }

    /// Split a vector in the layout of the system into real and imaginary parts
    pub fn split_solution(&self, v: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        match self {
            BlockSystem::FieldSplit(system) => system.split_solution(v),
            BlockSystem::Interleaved(_) => deinterleave(v),
        }
    }

    /// Solve for the Newton update `δ` with `A δ = -r`
    pub fn solve_update(&self, config: &LinearSolverConfig) -> Result<LinearSolution, SolverError> {
        let rhs = self.residual().mapv(|r| -r);
        match self {
            BlockSystem::FieldSplit(system) => solve_field_split(&system.matrix, &rhs, config),
            BlockSystem::Interleaved(system) => solve_interleaved(&system.matrix, &rhs, config),
        }
    }
}

/// Evaluate the complex residual and Jacobian at (`sol_re`, `sol_im`)
pub fn assemble<A>(assembly: &mut A, sol_re: &Array1<f64>, sol_im: &Array1<f64>) -> ComplexResidual
where
    A: ComplexAssembly + ?Sized,
{
    assembly.residual_and_jacobian(sol_re, sol_im)
}

/// Field-split block residual and Jacobian at (`sol_re`, `sol_im`)
pub fn residual_and_jacobian_field_split<A>(
    assembly: &mut A,
    sol_re: &Array1<f64>,
    sol_im: &Array1<f64>,
) -> FieldSplitSystem
where
    A: ComplexAssembly + ?Sized,
{
    FieldSplitSystem::from_parts(&assemble(assembly, sol_re, sol_im))
}

/// Interleaved block residual and Jacobian at (`sol_re`, `sol_im`)
pub fn residual_and_jacobian_blocked<A>(
    assembly: &mut A,
    sol_re: &Array1<f64>,
    sol_im: &Array1<f64>,
) -> InterleavedSystem
where
    A: ComplexAssembly + ?Sized,
{
    InterleavedSystem::from_parts(&assemble(assembly, sol_re, sol_im))
}

/// Build the block system in the requested layout
pub fn build<A>(
    representation: BlockRepresentation,
    assembly: &mut A,
    sol_re: &Array1<f64>,
    sol_im: &Array1<f64>,
) -> BlockSystem
where
    A: ComplexAssembly + ?Sized,
{
    match representation {
        BlockRepresentation::FieldSplit => {
            BlockSystem::FieldSplit(residual_and_jacobian_field_split(assembly, sol_re, sol_im))
        }
        BlockRepresentation::Interleaved => {
            BlockSystem::Interleaved(residual_and_jacobian_blocked(assembly, sol_re, sol_im))
        }
    }
}
