//! Linear-solve service and the nonlinear/complex solvers built on it
//!
//! Linear systems arrive in one of three storage forms: a scalar CSR matrix
//! (Newton steps), an interleaved block-CSR matrix or a nested 2x2 operator
//! (the real form of a complex system). All of them are solved with GMRES
//! from the `fea-solvers` crate or, for small problems, a dense LU.
//!
//! # Solver Types
//!
//! - **Direct**: LU factorization (for small problems)
//! - **GMRES**: restarted GMRES, optionally preconditioned with Jacobi, ILU(0),
//!   point-block Jacobi (block-CSR only) or field-split (nested only)

pub mod block;
pub mod complex;
pub mod newton;

pub use block::{
    BlockRepresentation, BlockSystem, FieldSplitSystem, InterleavedSystem, deinterleave,
    interleave,
};
pub use complex::{
    AlternatingConfig, ComplexSolveReport, ComplexSolver, ComplexStrategy, MonolithicConfig,
    TerminationReason,
};
pub use newton::{NewtonConfig, NewtonSolution, NonlinearProblem, newton_solve};

use ndarray::Array1;
use solvers::{
    BsrMatrix, CsrMatrix, DiagonalPreconditioner, FieldSplitPreconditioner, FieldSplitType,
    GmresConfig, IdentityPreconditioner, IluPreconditioner, LinearOperator, LuError, NestMatrix,
    PointBlockJacobi, Preconditioner, PreconditionerError, SubSolver, gmres_preconditioned,
    lu_solve,
};
use std::time::Instant;
use thiserror::Error;

/// GMRES solver configuration with f64 tolerance
pub type GmresConfigF64 = GmresConfig<f64>;

/// Type of linear solver to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearSolverType {
    /// Direct LU factorization (best for small problems)
    Direct,
    /// GMRES without preconditioning
    Gmres,
    /// GMRES with Jacobi (diagonal) preconditioning
    GmresJacobi,
    /// GMRES with ILU(0) preconditioning
    GmresIlu,
    /// GMRES with point-block Jacobi; interleaved block matrices only
    GmresBlockJacobi,
    /// GMRES with a field-split preconditioner; nested operators only
    GmresFieldSplit,
}

impl LinearSolverType {
    fn name(self) -> &'static str {
        match self {
            LinearSolverType::Direct => "direct",
            LinearSolverType::Gmres => "gmres",
            LinearSolverType::GmresJacobi => "gmres+jacobi",
            LinearSolverType::GmresIlu => "gmres+ilu",
            LinearSolverType::GmresBlockJacobi => "gmres+block-jacobi",
            LinearSolverType::GmresFieldSplit => "gmres+fieldsplit",
        }
    }
}

/// Field-split preconditioner options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldSplitOptions {
    pub split_type: FieldSplitType,
    pub sub_solver: SubSolver,
}

/// Linear solver configuration
#[derive(Debug, Clone)]
pub struct LinearSolverConfig {
    /// Solver type to use
    pub solver_type: LinearSolverType,
    /// GMRES configuration (used for iterative solvers)
    pub gmres: GmresConfigF64,
    /// Field-split options (used by `GmresFieldSplit`)
    pub field_split: FieldSplitOptions,
}

impl Default for LinearSolverConfig {
    fn default() -> Self {
        Self {
            solver_type: LinearSolverType::GmresIlu,
            gmres: GmresConfigF64 {
                max_iterations: 100,
                restart: 50,
                tolerance: 1e-10,
                print_interval: 0,
            },
            field_split: FieldSplitOptions::default(),
        }
    }
}

impl LinearSolverConfig {
    /// Default configuration with the preconditioner suited to `representation`
    pub fn for_representation(representation: BlockRepresentation) -> Self {
        let solver_type = match representation {
            BlockRepresentation::FieldSplit => LinearSolverType::GmresFieldSplit,
            BlockRepresentation::Interleaved => LinearSolverType::GmresBlockJacobi,
        };
        Self {
            solver_type,
            ..Self::default()
        }
    }
}

/// Solution of one linear solve
#[derive(Debug, Clone)]
pub struct LinearSolution {
    /// Solution vector
    pub values: Array1<f64>,
    /// Number of iterations (0 for direct solver)
    pub iterations: usize,
    /// Final relative residual
    pub residual: f64,
    /// Whether the solver converged
    pub converged: bool,
}

/// Solver errors
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Direct solver failed: {0}")]
    SingularMatrix(#[from] LuError),
    #[error("Matrix dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Linear solver {solver} is not available for {storage} storage")]
    UnsupportedPreconditioner {
        solver: &'static str,
        storage: &'static str,
    },
    #[error("Preconditioner setup failed: {0}")]
    Preconditioner(#[from] PreconditionerError),
}

fn check_dimension(operator: &dyn LinearOperator<f64>, rhs: &Array1<f64>) -> Result<(), SolverError> {
    if operator.num_rows() != rhs.len() || !operator.is_square() {
        return Err(SolverError::DimensionMismatch {
            expected: operator.num_rows(),
            actual: rhs.len(),
        });
    }
    Ok(())
}

fn unsupported(config: &LinearSolverConfig, storage: &'static str) -> SolverError {
    SolverError::UnsupportedPreconditioner {
        solver: config.solver_type.name(),
        storage,
    }
}

/// Solve a scalar CSR system
pub fn solve_csr(
    matrix: &CsrMatrix<f64>,
    rhs: &Array1<f64>,
    config: &LinearSolverConfig,
) -> Result<LinearSolution, SolverError> {
    check_dimension(matrix, rhs)?;
    match config.solver_type {
        LinearSolverType::Direct => solve_direct(matrix, rhs),
        LinearSolverType::Gmres => Ok(solve_gmres(matrix, &IdentityPreconditioner, rhs, config)),
        LinearSolverType::GmresJacobi => {
            let precond = DiagonalPreconditioner::from_csr(matrix);
            Ok(solve_gmres(matrix, &precond, rhs, config))
        }
        LinearSolverType::GmresIlu => {
            let precond = IluPreconditioner::from_csr(matrix);
            Ok(solve_gmres(matrix, &precond, rhs, config))
        }
        LinearSolverType::GmresBlockJacobi | LinearSolverType::GmresFieldSplit => {
            Err(unsupported(config, "scalar CSR"))
        }
    }
}

/// Solve an interleaved block-CSR system
pub fn solve_interleaved(
    matrix: &BsrMatrix<f64>,
    rhs: &Array1<f64>,
    config: &LinearSolverConfig,
) -> Result<LinearSolution, SolverError> {
    check_dimension(matrix, rhs)?;
    match config.solver_type {
        LinearSolverType::Direct => solve_direct(&matrix.to_csr(), rhs),
        LinearSolverType::Gmres => Ok(solve_gmres(matrix, &IdentityPreconditioner, rhs, config)),
        LinearSolverType::GmresJacobi => {
            let precond = DiagonalPreconditioner::from_csr(&matrix.to_csr());
            Ok(solve_gmres(matrix, &precond, rhs, config))
        }
        LinearSolverType::GmresIlu => {
            let precond = IluPreconditioner::from_csr(&matrix.to_csr());
            Ok(solve_gmres(matrix, &precond, rhs, config))
        }
        LinearSolverType::GmresBlockJacobi => {
            let precond = PointBlockJacobi::from_bsr(matrix);
            Ok(solve_gmres(matrix, &precond, rhs, config))
        }
        LinearSolverType::GmresFieldSplit => Err(unsupported(config, "interleaved block-CSR")),
    }
}

/// Solve a nested block system
pub fn solve_field_split(
    matrix: &NestMatrix<f64>,
    rhs: &Array1<f64>,
    config: &LinearSolverConfig,
) -> Result<LinearSolution, SolverError> {
    check_dimension(matrix, rhs)?;
    match config.solver_type {
        LinearSolverType::Direct => solve_direct(&matrix.to_csr(), rhs),
        LinearSolverType::Gmres => Ok(solve_gmres(matrix, &IdentityPreconditioner, rhs, config)),
        LinearSolverType::GmresJacobi => {
            let precond = DiagonalPreconditioner::from_csr(&matrix.to_csr());
            Ok(solve_gmres(matrix, &precond, rhs, config))
        }
        LinearSolverType::GmresIlu => {
            let precond = IluPreconditioner::from_csr(&matrix.to_csr());
            Ok(solve_gmres(matrix, &precond, rhs, config))
        }
        LinearSolverType::GmresFieldSplit => {
            let options = config.field_split;
            let precond =
                FieldSplitPreconditioner::new(matrix, options.split_type, options.sub_solver)?;
            Ok(solve_gmres(matrix, &precond, rhs, config))
        }
        LinearSolverType::GmresBlockJacobi => Err(unsupported(config, "nested")),
    }
}

/// Solve using direct LU factorization
fn solve_direct(csr: &CsrMatrix<f64>, rhs: &Array1<f64>) -> Result<LinearSolution, SolverError> {
    let start = Instant::now();
    let values = lu_solve(&csr.to_dense(), rhs)?;

    let rhs_norm = solvers::vector_ops::vector_norm(rhs);
    let residual_vec = rhs - &csr.matvec(&values);
    let residual = solvers::vector_ops::vector_norm(&residual_vec) / rhs_norm.max(f64::MIN_POSITIVE);

    log::debug!(
        "Direct LU: {} dofs, {} nnz, residual {:.2e}, time {:.1}ms",
        csr.num_rows,
        csr.nnz(),
        residual,
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(LinearSolution {
        values,
        iterations: 0,
        residual,
        converged: true,
    })
}

/// Solve with preconditioned GMRES from a zero initial guess
fn solve_gmres<A, P>(
    operator: &A,
    precond: &P,
    rhs: &Array1<f64>,
    config: &LinearSolverConfig,
) -> LinearSolution
where
    A: LinearOperator<f64> + ?Sized,
    P: Preconditioner<f64> + ?Sized,
{
    let start = Instant::now();
    let solution = gmres_preconditioned(operator, precond, rhs, &config.gmres);

    log::debug!(
        "{}: {} dofs, {} iters, residual {:.2e}, time {:.1}ms",
        config.solver_type.name(),
        operator.num_rows(),
        solution.iterations,
        solution.residual,
        start.elapsed().as_secs_f64() * 1000.0
    );
    if !solution.converged {
        log::warn!(
            "{} did not converge after {} iterations (residual {:.2e})",
            config.solver_type.name(),
            solution.iterations,
            solution.residual
        );
    }

    LinearSolution {
        values: solution.x,
        iterations: solution.iterations,
        residual: solution.residual,
        converged: solution.converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn block_form() -> CsrMatrix<f64> {
        // real form of (1 + i)
        CsrMatrix::from_dense(&array![[1.0, -1.0], [1.0, 1.0]], 0.0)
    }

    #[test]
    fn test_solve_csr_every_scalar_type() {
        let a = block_form();
        let b = array![2.0, 0.0];
        for solver_type in [
            LinearSolverType::Direct,
            LinearSolverType::Gmres,
            LinearSolverType::GmresJacobi,
            LinearSolverType::GmresIlu,
        ] {
            let config = LinearSolverConfig {
                solver_type,
                ..LinearSolverConfig::default()
            };
            let solution = solve_csr(&a, &b, &config).expect("solve should succeed");
            assert!(solution.converged);
            assert_relative_eq!(solution.values[0], 1.0, epsilon = 1e-9);
            assert_relative_eq!(solution.values[1], -1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_solve_csr_rejects_block_preconditioners() {
        let config = LinearSolverConfig::for_representation(BlockRepresentation::Interleaved);
        let err = solve_csr(&block_form(), &array![1.0, 0.0], &config).unwrap_err();
        assert!(matches!(err, SolverError::UnsupportedPreconditioner { .. }));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err =
            solve_csr(&block_form(), &array![1.0], &LinearSolverConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            SolverError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_direct_singular_is_error() {
        let a = CsrMatrix::from_dense(&array![[1.0, 2.0], [2.0, 4.0]], 0.0);
        let config = LinearSolverConfig {
            solver_type: LinearSolverType::Direct,
            ..LinearSolverConfig::default()
        };
        assert!(matches!(
            solve_csr(&a, &array![1.0, 1.0], &config),
            Err(SolverError::SingularMatrix(_))
        ));
    }

    #[test]
    fn test_solve_interleaved_and_nested() {
        let mut bsr = BsrMatrix::with_pattern(2, 1, &[vec![0]]);
        bsr.add_block(0, 0, &array![[1.0, -1.0], [1.0, 1.0]]);
        let solution = solve_interleaved(
            &bsr,
            &array![2.0, 0.0],
            &LinearSolverConfig::for_representation(BlockRepresentation::Interleaved),
        )
        .expect("solve should succeed");
        assert_relative_eq!(solution.values[1], -1.0, epsilon = 1e-9);

        let one = CsrMatrix::from_dense(&array![[1.0]], 0.0);
        let nest = NestMatrix::new(vec![
            vec![Some(one.clone()), Some(one.scaled(-1.0))],
            vec![Some(one.clone()), Some(one)],
        ]);
        let solution = solve_field_split(
            &nest,
            &array![2.0, 0.0],
            &LinearSolverConfig::for_representation(BlockRepresentation::FieldSplit),
        )
        .expect("solve should succeed");
        assert_relative_eq!(solution.values[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(solution.values[1], -1.0, epsilon = 1e-9);
    }
}
