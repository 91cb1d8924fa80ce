//! Frequency-domain complex solver
//!
//! Solves `(J_R + iJ_I)(x_R + ix_I) + (r_R + ir_I) = 0` for a
//! [`ComplexAssembly`] with one of two strategies:
//!
//! - **Alternating**: block Gauss-Seidel over the real and imaginary parts.
//!   Each part is solved by Newton with the other part frozen, using `J_R` as
//!   the Jacobian of both parts. Convergence is checked after each full pass.
//! - **Monolithic**: one Newton step on the real block system in either the
//!   field-split or the interleaved layout.
//!
//! The solution lives in two named vectors of the [`AnalysisSystem`],
//! `"<name>real_sol"` and `"<name>imag_sol"`, created on first access.

use super::block::{self, BlockRepresentation};
use super::newton::{NewtonConfig, NonlinearProblem, newton_solve};
use super::{LinearSolverConfig, SolverError};
use crate::assembly::{ComplexAssembly, ComplexPart};
use crate::system::AnalysisSystem;
use ndarray::Array1;
use solvers::CsrMatrix;
use std::fmt;

/// Alternating (block Gauss-Seidel) strategy settings
#[derive(Debug, Clone)]
pub struct AlternatingConfig {
    /// Combined residual tolerance checked after each full pass
    pub tol: f64,
    /// Maximum number of full real+imaginary passes
    pub max_iters: usize,
    /// Under-relaxation factor θ applied to each part update (1.0 = none)
    ///
    /// Strongly coupled systems (`|J_I| ≳ |J_R|`) need `relaxation < 1`;
    /// without it the sweep can oscillate without converging.
    pub relaxation: f64,
    /// Newton settings for the per-part solves
    pub newton: NewtonConfig,
}

impl Default for AlternatingConfig {
    fn default() -> Self {
        Self {
            tol: 1e-3,
            max_iters: 20,
            relaxation: 1.0,
            newton: NewtonConfig::default(),
        }
    }
}

/// Monolithic (single block system) strategy settings
#[derive(Debug, Clone)]
pub struct MonolithicConfig {
    pub representation: BlockRepresentation,
    pub linear: LinearSolverConfig,
}

impl MonolithicConfig {
    /// Defaults for `representation`, with its matching preconditioner
    pub fn new(representation: BlockRepresentation) -> Self {
        Self {
            representation,
            linear: LinearSolverConfig::for_representation(representation),
        }
    }
}

impl Default for MonolithicConfig {
    fn default() -> Self {
        Self::new(BlockRepresentation::default())
    }
}

/// Complex solution strategy
#[derive(Debug, Clone)]
pub enum ComplexStrategy {
    Alternating(AlternatingConfig),
    Monolithic(MonolithicConfig),
}

impl Default for ComplexStrategy {
    fn default() -> Self {
        ComplexStrategy::Alternating(AlternatingConfig::default())
    }
}

impl ComplexStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ComplexStrategy::Alternating(_) => "alternating",
            ComplexStrategy::Monolithic(config) => match config.representation {
                BlockRepresentation::FieldSplit => "monolithic (field split)",
                BlockRepresentation::Interleaved => "monolithic (interleaved)",
            },
        }
    }
}

/// Why a complex solve stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Residual dropped to the tolerance
    Converged,
    /// Iteration cap reached first
    MaxIterExceeded,
    /// Single block solve, no outer iteration
    SingleShot,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Converged => write!(f, "converged"),
            TerminationReason::MaxIterExceeded => write!(f, "maximum iterations exceeded"),
            TerminationReason::SingleShot => write!(f, "single block solve"),
        }
    }
}

/// Outcome of [`ComplexSolver::solve`]
#[derive(Debug, Clone)]
pub struct ComplexSolveReport {
    pub strategy: &'static str,
    /// Outer passes (alternating) or 1 (monolithic)
    pub iterations: usize,
    /// Combined residual L2 norm at the returned solution
    pub residual: f64,
    pub termination: TerminationReason,
    /// Combined residual after each outer pass
    pub residual_history: Vec<f64>,
    /// Iterations of the block linear solve (monolithic only)
    pub linear_iterations: Option<usize>,
    /// Convergence flag of the block linear solve (monolithic only)
    pub linear_converged: Option<bool>,
}

impl ComplexSolveReport {
    pub fn converged(&self) -> bool {
        match self.termination {
            TerminationReason::Converged => true,
            TerminationReason::MaxIterExceeded => false,
            TerminationReason::SingleShot => self.linear_converged.unwrap_or(true),
        }
    }
}

/// One part of the complex residual as a real nonlinear problem
struct PartProblem<'a, A: ?Sized> {
    assembly: &'a mut A,
    part: ComplexPart,
    frozen: &'a Array1<f64>,
}

impl<A: ComplexAssembly + ?Sized> NonlinearProblem for PartProblem<'_, A> {
    fn residual_and_jacobian(&mut self, x: &Array1<f64>) -> (Array1<f64>, CsrMatrix<f64>) {
        match self.part {
            ComplexPart::Real => self
                .assembly
                .part_residual_and_jacobian(ComplexPart::Real, x, self.frozen),
            ComplexPart::Imaginary => {
                self.assembly
                    .part_residual_and_jacobian(ComplexPart::Imaginary, self.frozen, x)
            }
        }
    }
}

/// Complex solver bound to one strategy
#[derive(Debug, Clone, Default)]
pub struct ComplexSolver {
    strategy: ComplexStrategy,
    iterations: usize,
}

impl ComplexSolver {
    pub fn new(strategy: ComplexStrategy) -> Self {
        Self {
            strategy,
            iterations: 0,
        }
    }

    pub fn strategy(&self) -> &ComplexStrategy {
        &self.strategy
    }

    /// Outer iterations of the last solve
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn real_solution_name(system: &AnalysisSystem) -> String {
        format!("{}real_sol", system.name())
    }

    pub fn imag_solution_name(system: &AnalysisSystem) -> String {
        format!("{}imag_sol", system.name())
    }

    /// Persisted real part, created zero-filled on first access
    pub fn real_solution(system: &mut AnalysisSystem) -> &mut Array1<f64> {
        let name = Self::real_solution_name(system);
        system.get_or_add_vector(&name)
    }

    /// Persisted imaginary part, created zero-filled on first access
    pub fn imag_solution(system: &mut AnalysisSystem) -> &mut Array1<f64> {
        let name = Self::imag_solution_name(system);
        system.get_or_add_vector(&name)
    }

    /// Solve from the persisted solution and store the result back into it
    ///
    /// # Panics
    ///
    /// Panics if the assembly and the system disagree on the dof count.
    pub fn solve<A>(
        &mut self,
        system: &mut AnalysisSystem,
        assembly: &mut A,
    ) -> Result<ComplexSolveReport, SolverError>
    where
        A: ComplexAssembly + ?Sized,
    {
        assert_eq!(
            assembly.n_dofs(),
            system.n_dofs(),
            "Assembly and system dof counts differ"
        );
        self.iterations = 0;

        log::info!(
            "Complex solve of system {} ({} dofs), strategy {}",
            system.name(),
            system.n_dofs(),
            self.strategy.name()
        );

        let strategy = self.strategy.clone();
        match &strategy {
            ComplexStrategy::Alternating(config) => self.solve_alternating(system, assembly, config),
            ComplexStrategy::Monolithic(config) => self.solve_monolithic(system, assembly, config),
        }
    }

    fn solve_alternating<A>(
        &mut self,
        system: &mut AnalysisSystem,
        assembly: &mut A,
        config: &AlternatingConfig,
    ) -> Result<ComplexSolveReport, SolverError>
    where
        A: ComplexAssembly + ?Sized,
    {
        let mut history = Vec::with_capacity(config.max_iters);

        let (residual, termination) = loop {
            log::info!("Solving Real Part");
            let sol_im = Self::imag_solution(system).clone();
            let sol_re = self.solve_part(system, assembly, ComplexPart::Real, &sol_im, config)?;
            Self::real_solution(system).assign(&sol_re);

            log::info!("Solving Imaginary Part");
            let sol_im = self.solve_part(system, assembly, ComplexPart::Imaginary, &sol_re, config)?;
            Self::imag_solution(system).assign(&sol_im);

            self.iterations += 1;
            let residual = assembly.residual_l2_norm(&sol_re, &sol_im);
            history.push(residual);
            log::info!("Complex solve iteration {}: residual = {residual:.6e}", self.iterations);

            if residual <= config.tol {
                log::info!(
                    "Terminating complex solver iterations: residual {residual:.3e} <= tolerance {:.3e}",
                    config.tol
                );
                break (residual, TerminationReason::Converged);
            }
            if self.iterations >= config.max_iters {
                log::info!(
                    "Terminating complex solver iterations: reached maximum of {} iterations (residual {residual:.3e})",
                    config.max_iters
                );
                break (residual, TerminationReason::MaxIterExceeded);
            }
        };

        let sol_re = Self::real_solution(system).clone();
        system.set_solution(&sol_re);

        Ok(ComplexSolveReport {
            strategy: self.strategy.name(),
            iterations: self.iterations,
            residual,
            termination,
            residual_history: history,
            linear_iterations: None,
            linear_converged: None,
        })
    }

    /// Newton solve of one part with the other frozen, then relaxation
    fn solve_part<A>(
        &self,
        system: &mut AnalysisSystem,
        assembly: &mut A,
        part: ComplexPart,
        frozen: &Array1<f64>,
        config: &AlternatingConfig,
    ) -> Result<Array1<f64>, SolverError>
    where
        A: ComplexAssembly + ?Sized,
    {
        let previous = match part {
            ComplexPart::Real => Self::real_solution(system).clone(),
            ComplexPart::Imaginary => Self::imag_solution(system).clone(),
        };
        system.set_solution(&previous);

        let mut problem = PartProblem {
            assembly,
            part,
            frozen,
        };
        let newton = newton_solve(&mut problem, &previous, &config.newton)?;
        log::debug!(
            "  {part:?} part: {} Newton iterations, |r| = {:.3e}",
            newton.iterations,
            newton.residual
        );

        let theta = config.relaxation;
        let updated = if theta == 1.0 {
            newton.x
        } else {
            &previous + &((newton.x - &previous) * theta)
        };
        system.set_solution(&updated);
        Ok(updated)
    }

    fn solve_monolithic<A>(
        &mut self,
        system: &mut AnalysisSystem,
        assembly: &mut A,
        config: &MonolithicConfig,
    ) -> Result<ComplexSolveReport, SolverError>
    where
        A: ComplexAssembly + ?Sized,
    {
        let sol_re = Self::real_solution(system).clone();
        let sol_im = Self::imag_solution(system).clone();

        let (new_re, new_im, linear) = {
            let block_system = block::build(config.representation, assembly, &sol_re, &sol_im);
            let linear = block_system.solve_update(&config.linear)?;
            let x = block_system.combine(&sol_re, &sol_im) + &linear.values;
            let (re, im) = block_system.split_solution(&x);
            (re, im, linear)
        };

        Self::real_solution(system).assign(&new_re);
        Self::imag_solution(system).assign(&new_im);
        system.set_solution(&new_re);
        self.iterations = 1;

        let residual = assembly.residual_l2_norm(&new_re, &new_im);
        if !linear.converged {
            log::warn!(
                "Block linear solve did not converge: {} iterations, relative residual {:.3e}",
                linear.iterations,
                linear.residual
            );
        }
        log::info!(
            "Terminating complex solver iterations: single block solve, residual = {residual:.6e}"
        );

        Ok(ComplexSolveReport {
            strategy: self.strategy.name(),
            iterations: 1,
            residual,
            termination: TerminationReason::SingleShot,
            residual_history: vec![residual],
            linear_iterations: Some(linear.iterations),
            linear_converged: Some(linear.converged),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::LinearComplexAssembly;
    use crate::solver::LinearSolverType;
    use approx::assert_relative_eq;
    use ndarray::array;
    use num_complex::Complex64;

    /// (1 + i) x = 2
    fn scalar_problem() -> LinearComplexAssembly {
        LinearComplexAssembly::new(
            CsrMatrix::from_dense(&array![[1.0]], 0.0),
            CsrMatrix::from_dense(&array![[1.0]], 0.0),
            array![Complex64::new(2.0, 0.0)],
        )
    }

    #[test]
    fn test_lazy_solution_vectors() {
        let mut system = AnalysisSystem::new("wave", 2);
        assert!(!system.have_vector("wavereal_sol"));
        ComplexSolver::real_solution(&mut system)[0] = 3.0;
        assert!(system.have_vector("wavereal_sol"));
        assert!(!system.have_vector("waveimag_sol"));
        assert_eq!(*ComplexSolver::imag_solution(&mut system), array![0.0, 0.0]);
        assert_eq!(ComplexSolver::real_solution(&mut system)[0], 3.0);
    }

    #[test]
    fn test_pure_alternating_hits_iteration_cap() {
        // without relaxation the Gauss-Seidel sweep oscillates on (1 + i) x = 2
        let mut system = AnalysisSystem::new("s", 1);
        let mut assembly = scalar_problem();
        let mut solver = ComplexSolver::new(ComplexStrategy::Alternating(AlternatingConfig {
            max_iters: 5,
            ..AlternatingConfig::default()
        }));

        let report = solver.solve(&mut system, &mut assembly).unwrap();
        assert_eq!(report.termination, TerminationReason::MaxIterExceeded);
        assert_eq!(report.iterations, 5);
        assert_eq!(report.residual_history.len(), 5);
        assert!(!report.converged());
    }

    #[test]
    fn test_relaxed_alternating_converges() {
        let mut system = AnalysisSystem::new("s", 1);
        let mut assembly = scalar_problem();
        let mut solver = ComplexSolver::new(ComplexStrategy::Alternating(AlternatingConfig {
            relaxation: 0.5,
            ..AlternatingConfig::default()
        }));

        let report = solver.solve(&mut system, &mut assembly).unwrap();
        assert_eq!(report.termination, TerminationReason::Converged);
        assert!(report.iterations <= 20);
        assert!(report.residual <= 1e-3);
        let re = ComplexSolver::real_solution(&mut system)[0];
        let im = ComplexSolver::imag_solution(&mut system)[0];
        assert_relative_eq!(re, 1.0, epsilon = 1e-2);
        assert_relative_eq!(im, -1.0, epsilon = 1e-2);
        // working slot holds the real part
        assert_eq!(system.solution()[0], re);
    }

    #[test]
    fn test_counters_reset_per_solve() {
        let mut system = AnalysisSystem::new("s", 1);
        let mut assembly = scalar_problem();
        let mut solver = ComplexSolver::new(ComplexStrategy::Alternating(AlternatingConfig {
            max_iters: 3,
            ..AlternatingConfig::default()
        }));
        solver.solve(&mut system, &mut assembly).unwrap();
        let report = solver.solve(&mut system, &mut assembly).unwrap();
        assert_eq!(report.iterations, 3);
        assert_eq!(solver.iterations(), 3);
    }

    #[test]
    fn test_monolithic_both_layouts() {
        for representation in [BlockRepresentation::FieldSplit, BlockRepresentation::Interleaved] {
            let mut system = AnalysisSystem::new("s", 1);
            let mut assembly = scalar_problem();
            let mut solver =
                ComplexSolver::new(ComplexStrategy::Monolithic(MonolithicConfig::new(representation)));

            let report = solver.solve(&mut system, &mut assembly).unwrap();
            assert_eq!(report.termination, TerminationReason::SingleShot);
            assert_eq!(report.linear_converged, Some(true));
            assert!(report.residual < 1e-9);
            assert_relative_eq!(ComplexSolver::real_solution(&mut system)[0], 1.0, epsilon = 1e-9);
            assert_relative_eq!(ComplexSolver::imag_solution(&mut system)[0], -1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_monolithic_direct_singular_is_error() {
        let mut system = AnalysisSystem::new("s", 1);
        let mut assembly = LinearComplexAssembly::new(
            CsrMatrix::from_dense(&array![[0.0]], 0.0),
            CsrMatrix::from_dense(&array![[0.0]], 0.0),
            array![Complex64::new(1.0, 0.0)],
        );
        let mut config = MonolithicConfig::new(BlockRepresentation::FieldSplit);
        config.linear.solver_type = LinearSolverType::Direct;
        let mut solver = ComplexSolver::new(ComplexStrategy::Monolithic(config));
        assert!(matches!(
            solver.solve(&mut system, &mut assembly),
            Err(SolverError::SingularMatrix(_))
        ));
    }
}
