//! Sparse storage, Krylov and direct solvers for real block systems
//!
//! This crate provides the linear-algebra layer under the frequency-domain
//! solvers in `fea-core`: a complex system `(J_R + iJ_I)x = b` is solved in its
//! real 2x2 block form, stored either as a nested operator (one CSR block per
//! field) or as an interleaved block-CSR matrix with 2x2 blocks.
//!
//! # Features
//!
//! - **Sparse Matrices**: CSR, block-CSR (BSR) and nested block operators with index sets
//! - **Iterative Solvers**: restarted GMRES with left preconditioning
//! - **Direct Solvers**: dense LU with partial pivoting
//! - **Preconditioners**: Jacobi, ILU(0), point-block Jacobi, field-split
//! - **Generic Scalar Types**: works with f64 and Complex64
//!
//! # Example
//!
//! ```
//! use fea_solvers::{CsrMatrix, GmresConfig, gmres};
//! use ndarray::array;
//!
//! // real form of (1 + i) x = 2
//! let a = CsrMatrix::from_dense(&array![[1.0, -1.0], [1.0, 1.0]], 0.0);
//! let solution = gmres(&a, &array![2.0, 0.0], &GmresConfig::default());
//! assert!(solution.converged);
//! ```

pub mod direct;
pub mod iterative;
pub mod preconditioners;
pub mod sparse;
pub mod traits;
pub mod vector_ops;

// Re-export main types
pub use sparse::{BsrMatrix, CsrMatrix, IndexSet, NestMatrix};
pub use traits::{ComplexField, LinearOperator, Preconditioner};

// Re-export iterative solvers
pub use iterative::{
    GmresConfig, GmresSolution, gmres, gmres_preconditioned, gmres_preconditioned_with_guess,
};

// Re-export direct solvers
pub use direct::{LuError, LuFactorization, lu_factorize, lu_solve};

// Re-export preconditioners
pub use preconditioners::{
    DiagonalPreconditioner, FieldSplitPreconditioner, FieldSplitType, IdentityPreconditioner,
    IluPreconditioner, PointBlockJacobi, PreconditionerError, SubSolver,
};
