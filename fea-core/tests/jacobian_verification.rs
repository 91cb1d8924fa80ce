//! Numerical verification of element and assembled Jacobians

use approx::assert_relative_eq;
use fea_core::assembly::assemble_elements;
use fea_core::element::{
    AxialBar, ElementOperations, ElementOutput, ElementState, LocalFrame, NonlinearConduction,
    ViscousBurgers,
};
use fea_core::mesh::{DofMap, Element, Point, line_1d, line_3d};
use fea_core::verification::{
    FiniteDifferenceCheck, VerificationConfig, check_element_numerical_jacobian, check_jacobian,
};
use ndarray::{Array1, Array2, array};

/// Cubic spring `f_x = k x³` whose Jacobian drops the factor 3
struct WrongCubicSpring {
    stiffness: f64,
    state: ElementState,
}

impl ElementOperations for WrongCubicSpring {
    fn state(&self) -> &ElementState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ElementState {
        &mut self.state
    }

    fn init(&mut self, _elem: &Element) {
        self.state.bind(2);
    }

    fn elem_calculations(&mut self, request_jacobian: bool, out: &mut ElementOutput) {
        out.reset();
        let x = self.state.solution();
        out.f_x.assign(&x.mapv(|v| self.stiffness * v.powi(3)));
        if request_jacobian {
            for i in 0..2 {
                out.dfx_dx[[i, i]] = self.stiffness * x[i] * x[i];
            }
        }
    }
}

fn bound<E: ElementOperations>(mut kernel: E, elem: &Element, sol: &Array1<f64>, vel: &Array1<f64>) -> E {
    kernel.init(elem);
    kernel.set_solution(sol);
    kernel.set_velocity(vel);
    kernel
}

#[test]
fn test_axial_bar_in_skewed_frame() {
    let mesh = line_3d(1, Point::new_3d(0.0, 0.0, 0.0), Point::new_3d(1.0, 2.0, -0.5));
    let sol = array![0.1, -0.2, 0.05, 0.3, 0.0, -0.1];
    let vel = array![1.0, 0.5, -0.25, 0.0, 2.0, 1.0];
    let mut bar = bound(AxialBar::new(210.0, 7.8), &mesh.element(0), &sol, &vel);

    assert!(bar.if_use_local_elem());
    let mut frame = LocalFrame::default();
    bar.set_local_frame_data(&mut frame);
    let axis = frame.axis();
    assert_relative_eq!(axis[1], 2.0 * axis[0], epsilon = 1e-12);

    let report = check_element_numerical_jacobian(&mut bar, &VerificationConfig::default());
    assert!(report.passed, "stiffness failures: {:?}", report.stiffness.failures);
    assert_eq!(report.mass.n_passes, 36);
}

#[test]
fn test_all_kernels_pass_default_tolerances() {
    let elem = line_1d(1, 0.2).element(0);
    let sol = array![0.4, 1.1];
    let vel = array![-0.5, 0.3];
    let config = VerificationConfig::default();

    let mut conduction = bound(NonlinearConduction::new(2.0, 0.3, 4.0), &elem, &sol, &vel);
    assert!(check_element_numerical_jacobian(&mut conduction, &config).passed);

    let mut burgers = bound(ViscousBurgers::new(0.01), &elem, &sol, &vel);
    assert!(check_element_numerical_jacobian(&mut burgers, &config).passed);
}

#[test]
fn test_wrong_derivative_is_reported() {
    let elem = line_1d(1, 1.0).element(0);
    let sol = array![1.0, -2.0];
    let mut spring = bound(
        WrongCubicSpring {
            stiffness: 5.0,
            state: ElementState::default(),
        },
        &elem,
        &sol,
        &Array1::zeros(2),
    );

    let config = VerificationConfig {
        stiffness_tolerance: 1e-3,
        ..VerificationConfig::default()
    };
    let report = check_element_numerical_jacobian(&mut spring, &config);

    assert!(!report.passed);
    assert!(report.mass.all_passed());
    let failed: Vec<(usize, usize)> = report
        .stiffness
        .failures
        .iter()
        .map(|f| (f.row, f.col))
        .collect();
    assert_eq!(failed, vec![(0, 0), (1, 1)]);
    // numerical reference 3 k x² against analytical k x²
    assert_relative_eq!(report.stiffness.failures[0].expected, 15.0, max_relative = 1e-5);
    assert_relative_eq!(report.stiffness.failures[0].computed, 5.0);
    assert_eq!(spring.state().solution(), &sol);
}

#[test]
fn test_stabilized_burgers_jacobian_is_approximate() {
    let elem = line_1d(1, 0.5).element(0);
    let sol = array![2.0, 1.0];
    let mut burgers = bound(
        ViscousBurgers::new(1e-3).with_stabilization(1.0),
        &elem,
        &sol,
        &Array1::zeros(2),
    );

    let strict = VerificationConfig {
        stiffness_tolerance: 1e-6,
        ..VerificationConfig::default()
    };
    let report = check_element_numerical_jacobian(&mut burgers, &strict);
    assert!(!report.stiffness.all_passed());
    assert!(report.stiffness.max_abs_error > 0.0);
}

#[test]
fn test_assembled_conduction_jacobian() {
    let mesh = line_1d(6, 1.0);
    let dofs = DofMap::from_mesh(&mesh, 1);
    let mut kernel = NonlinearConduction::new(1.0, 0.8, 1.0);
    let vel = Array1::zeros(dofs.n_dofs());
    let x = Array1::from_iter((0..dofs.n_dofs()).map(|i| (i as f64 * 0.7).sin()));

    let report = check_jacobian(
        |u: &Array1<f64>| {
            let system = assemble_elements(&mut kernel, &mesh, &dofs, u, &vel, true);
            (system.f_x, system.dfx_dx.to_dense())
        },
        &x,
        &FiniteDifferenceCheck::default(),
    );

    assert!(report.all_passed(), "failures: {:?}", report.failures);
    assert_eq!(report.n_entries(), 49);
}

#[test]
fn test_check_jacobian_detects_missing_coupling() {
    let x = array![0.5, 1.5];
    let report = check_jacobian(
        |u: &Array1<f64>| {
            let r = array![u[0] * u[1], u[1] * u[1]];
            // ∂r0/∂u1 deliberately omitted
            let jac: Array2<f64> = array![[u[1], 0.0], [0.0, 2.0 * u[1]]];
            (r, jac)
        },
        &x,
        &FiniteDifferenceCheck::default(),
    );

    assert_eq!(report.failures.len(), 1);
    assert_eq!((report.failures[0].row, report.failures[0].col), (0, 1));
    assert_eq!(report.passing_columns(), 1);
}
