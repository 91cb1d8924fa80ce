//! Preconditioners for iterative solvers
//!
//! Preconditioners approximate A^(-1) to accelerate convergence of iterative methods.
//!
//! # Available Preconditioners
//!
//! - **DiagonalPreconditioner** (Jacobi): diagonal scaling, fully parallel
//! - **IluPreconditioner**: sequential ILU(0)
//! - **PointBlockJacobi**: inverse of the diagonal blocks of a block-CSR matrix
//! - **FieldSplitPreconditioner**: per-field sub-solvers over a nested operator

mod block_jacobi;
mod diagonal;
mod fieldsplit;
mod ilu;

use crate::direct::LuError;
use thiserror::Error;

pub use block_jacobi::PointBlockJacobi;
pub use diagonal::DiagonalPreconditioner;
pub use fieldsplit::{FieldSplitPreconditioner, FieldSplitType, SubSolver};
pub use ilu::IluPreconditioner;

// Re-export IdentityPreconditioner from traits
pub use crate::traits::IdentityPreconditioner;

/// Errors raised while setting up a preconditioner
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionerError {
    #[error("Field {field} has no diagonal block to build a sub-solver from")]
    MissingDiagonalBlock { field: usize },
    #[error("Sub-solver factorization failed: {0}")]
    Factorization(#[from] LuError),
}
