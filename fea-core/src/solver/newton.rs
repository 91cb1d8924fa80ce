//! Newton iteration for real nonlinear systems
//!
//! Used by the alternating complex strategy to solve each part with the
//! other part held fixed.

use super::{LinearSolverConfig, LinearSolverType, SolverError, solve_csr};
use ndarray::Array1;
use solvers::CsrMatrix;
use solvers::vector_ops::vector_norm;

/// Real nonlinear problem `r(x) = 0`
pub trait NonlinearProblem {
    /// Residual and Jacobian at `x`
    fn residual_and_jacobian(&mut self, x: &Array1<f64>) -> (Array1<f64>, CsrMatrix<f64>);
}

/// Newton solver configuration
#[derive(Debug, Clone)]
pub struct NewtonConfig {
    pub max_iterations: usize,
    /// Stop when `‖r‖` drops below this value
    pub abs_tolerance: f64,
    /// Stop when `‖r‖ / ‖r₀‖` drops below this value
    pub rel_tolerance: f64,
    /// Linear solver for the Newton steps
    pub linear: LinearSolverConfig,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            abs_tolerance: 1e-10,
            rel_tolerance: 1e-8,
            linear: LinearSolverConfig {
                solver_type: LinearSolverType::GmresIlu,
                ..LinearSolverConfig::default()
            },
        }
    }
}

/// Result of a Newton solve
#[derive(Debug, Clone)]
pub struct NewtonSolution {
    pub x: Array1<f64>,
    pub iterations: usize,
    /// Final residual norm
    pub residual: f64,
    pub converged: bool,
}

/// Solve `r(x) = 0` by Newton's method from `x0`
///
/// Non-convergence is reported through [`NewtonSolution::converged`]; only
/// linear solver failures are errors.
pub fn newton_solve<P>(
    problem: &mut P,
    x0: &Array1<f64>,
    config: &NewtonConfig,
) -> Result<NewtonSolution, SolverError>
where
    P: NonlinearProblem + ?Sized,
{
    let mut x = x0.clone();
    let (mut residual, mut jacobian) = problem.residual_and_jacobian(&x);
    let initial_norm = vector_norm(&residual);
    let mut norm = initial_norm;
    let mut iterations = 0;

    let is_converged = |norm: f64| {
        norm <= config.abs_tolerance || norm <= config.rel_tolerance * initial_norm
    };

    while !is_converged(norm) && iterations < config.max_iterations {
        let rhs = residual.mapv(|r| -r);
        let step = solve_csr(&jacobian, &rhs, &config.linear)?;
        x += &step.values;
        iterations += 1;

        (residual, jacobian) = problem.residual_and_jacobian(&x);
        norm = vector_norm(&residual);
        log::debug!("  Newton iteration {iterations}: |r| = {norm:.3e}");
    }

    let converged = is_converged(norm);
    if !converged {
        log::warn!(
            "Newton did not converge after {iterations} iterations: |r| = {norm:.3e} (|r0| = {initial_norm:.3e})"
        );
    }

    Ok(NewtonSolution {
        x,
        iterations,
        residual: norm,
        converged,
    })
}
