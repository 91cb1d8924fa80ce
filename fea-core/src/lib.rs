//! Frequency-domain complex solver and element-operations toolkit
//!
//! This crate solves complex-valued nonlinear finite element systems
//! `(J_R + iJ_I)(x_R + ix_I) + r = 0` assembled from real element kernels,
//! and checks element Jacobians against finite differences.
//!
//! # Features
//!
//! - **Element contract**: [`element::ElementOperations`] with per-kernel state
//!   and a few reference kernels (axial bar, nonlinear conduction, Burgers)
//! - **Jacobian verification**: forward-difference comparison of the
//!   stiffness Jacobian and mass matrix of any kernel
//! - **Complex solver**: alternating real/imaginary Newton relaxation, or a
//!   single solve of the real block system in field-split or interleaved form
//! - **JSON configuration**: [`config::AnalysisConfig`]
//!
//! # Example
//!
//! ```
//! use fea_core::assembly::LinearComplexAssembly;
//! use fea_core::solver::{BlockRepresentation, ComplexSolver, ComplexStrategy, MonolithicConfig};
//! use fea_core::system::AnalysisSystem;
//! use ndarray::array;
//! use num_complex::Complex64;
//! use solvers::CsrMatrix;
//!
//! // (1 + i) x = 2
//! let one = CsrMatrix::from_dense(&array![[1.0]], 0.0);
//! let mut assembly =
//!     LinearComplexAssembly::new(one.clone(), one, array![Complex64::new(2.0, 0.0)]);
//! let mut system = AnalysisSystem::new("demo", 1);
//!
//! let strategy = ComplexStrategy::Monolithic(MonolithicConfig::new(BlockRepresentation::Interleaved));
//! let report = ComplexSolver::new(strategy).solve(&mut system, &mut assembly).unwrap();
//! assert!(report.residual < 1e-9);
//! assert!((ComplexSolver::imag_solution(&mut system)[0] + 1.0).abs() < 1e-9);
//! ```

pub mod assembly;
pub mod config;
pub mod element;
pub mod mesh;
pub mod solver;
pub mod system;
pub mod verification;

pub use config::{AnalysisConfig, ConfigError};
pub use solver::{ComplexSolveReport, ComplexSolver, ComplexStrategy, SolverError};
pub use system::AnalysisSystem;

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
