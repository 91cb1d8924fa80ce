//! End-to-end tests of the complex frequency-domain solver

use approx::assert_relative_eq;
use fea_core::assembly::{ComplexAssembly, HarmonicAssembly, LinearComplexAssembly};
use fea_core::element::NonlinearConduction;
use fea_core::mesh::line_1d;
use fea_core::solver::{
    AlternatingConfig, BlockRepresentation, ComplexSolver, ComplexStrategy, LinearSolverType,
    MonolithicConfig, TerminationReason,
};
use fea_core::system::AnalysisSystem;
use ndarray::{Array1, array};
use num_complex::Complex64;
use solvers::CsrMatrix;

/// (1 + i) x = 2, solution x = 1 - i
fn one_plus_i() -> LinearComplexAssembly {
    let one = CsrMatrix::from_dense(&array![[1.0]], 0.0);
    LinearComplexAssembly::new(one.clone(), one, array![Complex64::new(2.0, 0.0)])
}

/// Damped conduction line driven at its free end, clamped at node 0
fn harmonic_line(n_elements: usize, omega: f64) -> HarmonicAssembly<NonlinearConduction> {
    let n = n_elements + 1;
    let mut forcing = Array1::from_elem(n, Complex64::new(0.0, 0.0));
    forcing[n - 1] = Complex64::new(1.0, 0.5);
    HarmonicAssembly::new(NonlinearConduction::new(1.0, 0.0, 1.0), line_1d(n_elements, 1.0), 1, omega)
        .with_forcing(forcing)
        .with_fixed_dofs(&[0])
}

fn solution_of(system: &mut AnalysisSystem) -> (Array1<f64>, Array1<f64>) {
    (
        ComplexSolver::real_solution(system).clone(),
        ComplexSolver::imag_solution(system).clone(),
    )
}

#[test]
fn test_relaxed_alternating_reaches_tolerance() {
    let mut system = AnalysisSystem::new("scalar", 1);
    let mut assembly = one_plus_i();
    let mut solver = ComplexSolver::new(ComplexStrategy::Alternating(AlternatingConfig {
        relaxation: 0.5,
        ..AlternatingConfig::default()
    }));

    let report = solver.solve(&mut system, &mut assembly).unwrap();

    assert_eq!(report.termination, TerminationReason::Converged);
    assert!(report.iterations <= 20, "took {} passes", report.iterations);
    assert!(report.residual <= 1e-3);
    assert_eq!(report.residual_history.len(), report.iterations);
    // the relaxed sweep contracts every pass
    for pair in report.residual_history.windows(2) {
        assert!(pair[1] < pair[0]);
    }
}

#[test]
fn test_alternating_idempotent_at_convergence() {
    let mut system = AnalysisSystem::new("scalar", 1);
    let mut assembly = one_plus_i();
    let config = AlternatingConfig {
        relaxation: 0.5,
        ..AlternatingConfig::default()
    };
    let first = ComplexSolver::new(ComplexStrategy::Alternating(config.clone()))
        .solve(&mut system, &mut assembly)
        .unwrap();

    // one more pass from the persisted solution
    let second = ComplexSolver::new(ComplexStrategy::Alternating(AlternatingConfig {
        max_iters: 1,
        ..config
    }))
    .solve(&mut system, &mut assembly)
    .unwrap();

    assert_eq!(second.iterations, 1);
    assert!((second.residual - first.residual).abs() < 1e-3);
}

#[test]
fn test_monolithic_gives_one_minus_i() {
    for representation in [BlockRepresentation::FieldSplit, BlockRepresentation::Interleaved] {
        let mut system = AnalysisSystem::new("scalar", 1);
        let mut assembly = one_plus_i();
        let mut solver =
            ComplexSolver::new(ComplexStrategy::Monolithic(MonolithicConfig::new(representation)));

        let report = solver.solve(&mut system, &mut assembly).unwrap();

        assert_eq!(report.iterations, 1);
        assert_eq!(report.termination, TerminationReason::SingleShot);
        assert!(report.converged());
        let (re, im) = solution_of(&mut system);
        assert_relative_eq!(re[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(im[0], -1.0, epsilon = 1e-9);
    }
}

#[test]
fn test_monolithic_starts_from_persisted_solution() {
    let mut system = AnalysisSystem::new("scalar", 1);
    ComplexSolver::real_solution(&mut system)[0] = 5.0;
    ComplexSolver::imag_solution(&mut system)[0] = -3.0;
    let mut assembly = one_plus_i();

    ComplexSolver::new(ComplexStrategy::Monolithic(MonolithicConfig::default()))
        .solve(&mut system, &mut assembly)
        .unwrap();

    let (re, im) = solution_of(&mut system);
    assert_relative_eq!(re[0], 1.0, epsilon = 1e-9);
    assert_relative_eq!(im[0], -1.0, epsilon = 1e-9);
    assert_relative_eq!(system.solution()[0], 1.0, epsilon = 1e-9);
}

#[test]
fn test_harmonic_line_layouts_agree() {
    let omega = 3.0;
    let mut results = Vec::new();

    for representation in [BlockRepresentation::FieldSplit, BlockRepresentation::Interleaved] {
        let mut assembly = harmonic_line(8, omega);
        let mut system = AnalysisSystem::new("line", assembly.n_dofs());
        let report =
            ComplexSolver::new(ComplexStrategy::Monolithic(MonolithicConfig::new(representation)))
                .solve(&mut system, &mut assembly)
                .unwrap();

        assert_eq!(report.linear_converged, Some(true));
        assert!(report.residual < 1e-7, "residual {}", report.residual);
        results.push(solution_of(&mut system));
    }

    // reference: dense LU on the field-split layout
    let mut assembly = harmonic_line(8, omega);
    let mut system = AnalysisSystem::new("line", assembly.n_dofs());
    let mut config = MonolithicConfig::new(BlockRepresentation::FieldSplit);
    config.linear.solver_type = LinearSolverType::Direct;
    ComplexSolver::new(ComplexStrategy::Monolithic(config))
        .solve(&mut system, &mut assembly)
        .unwrap();
    let (ref_re, ref_im) = solution_of(&mut system);

    // clamped node stays at rest, the driven end responds
    assert_relative_eq!(ref_re[0], 0.0, epsilon = 1e-12);
    assert_relative_eq!(ref_im[0], 0.0, epsilon = 1e-12);
    assert!(ref_re[8].hypot(ref_im[8]) > 1e-3);

    for (re, im) in &results {
        for i in 0..re.len() {
            assert_relative_eq!(re[i], ref_re[i], epsilon = 1e-7);
            assert_relative_eq!(im[i], ref_im[i], epsilon = 1e-7);
        }
    }
}

#[test]
fn test_solution_vectors_created_on_first_solve() {
    let mut system = AnalysisSystem::new("duct", 1);
    assert!(!system.have_vector("ductreal_sol"));
    assert!(!system.have_vector("ductimag_sol"));

    let mut assembly = one_plus_i();
    ComplexSolver::new(ComplexStrategy::Monolithic(MonolithicConfig::default()))
        .solve(&mut system, &mut assembly)
        .unwrap();

    assert!(system.have_vector("ductreal_sol"));
    assert!(system.have_vector("ductimag_sol"));
    assert_relative_eq!(
        system.vector("ductimag_sol").map_or(0.0, |v| v[0]),
        -1.0,
        epsilon = 1e-9
    );
}

#[test]
#[should_panic(expected = "dof counts differ")]
fn test_size_mismatch_panics() {
    let mut system = AnalysisSystem::new("s", 2);
    let _ = ComplexSolver::default().solve(&mut system, &mut one_plus_i());
}
