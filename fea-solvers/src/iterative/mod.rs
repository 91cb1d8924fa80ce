//! Iterative solvers for linear systems
//!
//! - [`gmres`]: GMRES(m) with restart, the general non-symmetric workhorse

mod gmres;

pub use gmres::{
    GmresConfig, GmresSolution, gmres, gmres_preconditioned, gmres_preconditioned_with_guess,
};
