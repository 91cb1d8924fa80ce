//! Finite-difference verification of element Jacobians
//!
//! [`check_element_numerical_jacobian`] perturbs a kernel's bound solution and
//! velocity one dof at a time and compares the forward-difference columns
//! against the analytical stiffness Jacobian and mass matrix. Two entries are
//! judged equal when both are numerically zero, when their difference is, or
//! when their relative difference (scaled by the finite-difference value) is
//! within the caller's tolerance.

use crate::element::{ElementOperations, ElementOutput};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Absolute threshold below which a value counts as zero
pub const NUMERICAL_ZERO_EPS: f64 = 1e-7;

/// `|v| <= eps`
pub fn is_numerical_zero(v: f64, eps: f64) -> bool {
    v.abs() <= eps
}

/// Hybrid absolute/relative comparison of a reference value `v1` and `v2`
pub fn compare_values(v1: f64, v2: f64, tol: f64) -> bool {
    let eps = NUMERICAL_ZERO_EPS;
    if is_numerical_zero(v1, eps) && is_numerical_zero(v2, eps) {
        true
    } else if is_numerical_zero(v1 - v2, eps) {
        true
    } else if v1.abs() > 0.0 {
        ((v1 - v2) / v1).abs() <= tol
    } else {
        false
    }
}

/// Step sizes and tolerances for element verification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Forward-difference step
    pub delta: f64,
    /// Relative tolerance for the stiffness Jacobian
    pub stiffness_tolerance: f64,
    /// Relative tolerance for the mass matrix
    pub mass_tolerance: f64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            delta: 1e-8,
            stiffness_tolerance: 1e1,
            mass_tolerance: 1e-1,
        }
    }
}

/// One entry that failed comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryMismatch {
    pub row: usize,
    pub col: usize,
    pub expected: f64,
    pub computed: f64,
}

/// Entrywise comparison of a reference matrix against a computed one
#[derive(Debug, Clone)]
pub struct JacobianComparisonReport {
    /// Signed error `reference - computed`
    pub errors: Array2<f64>,
    /// Whether each entry passed on its own
    pub passed: Array2<bool>,
    /// Failing entries in row-major order
    pub failures: Vec<EntryMismatch>,
    pub max_abs_error: f64,
    pub min_abs_error: f64,
    pub mean_abs_error: f64,
    /// Entries within tolerance
    pub n_passes: usize,
    pub tolerance: f64,
}

impl JacobianComparisonReport {
    /// Total entries compared
    pub fn n_entries(&self) -> usize {
        self.errors.len()
    }

    /// True if every entry passed
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of columns whose entries all passed
    pub fn passing_columns(&self) -> usize {
        self.passed
            .columns()
            .into_iter()
            .filter(|col| col.iter().all(|&p| p))
            .count()
    }
}

/// Compare `reference` against `computed` entrywise
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn compare_matrix(
    reference: &Array2<f64>,
    computed: &Array2<f64>,
    tol: f64,
) -> JacobianComparisonReport {
    assert_eq!(
        reference.dim(),
        computed.dim(),
        "Compared matrices must have the same shape"
    );

    let errors = reference - computed;
    let mut passed = Array2::from_elem(reference.dim(), false);
    let mut failures = Vec::new();

    for ((i, j), &expected) in reference.indexed_iter() {
        let value = computed[[i, j]];
        let ok = compare_values(expected, value, tol);
        passed[[i, j]] = ok;
        if !ok {
            log::warn!(
                "Failed comparison at ({i}, {j}): expected {expected:e}, computed {value:e}, diff {:e}, tol {tol:e}",
                expected - value
            );
            failures.push(EntryMismatch {
                row: i,
                col: j,
                expected,
                computed: value,
            });
        }
    }

    let abs = errors.mapv(f64::abs);
    let max_abs_error = abs.iter().copied().fold(0.0, f64::max);
    let min_abs_error = abs.iter().copied().fold(f64::INFINITY, f64::min);
    let mean_abs_error = abs.mean().unwrap_or(0.0);
    let n_passes = passed.iter().filter(|&&p| p).count();

    log::info!(
        "Max error: {max_abs_error:e}, min error: {min_abs_error:e}, mean error: {mean_abs_error:e}, {n_passes}/{} entries within tolerance",
        errors.len()
    );

    JacobianComparisonReport {
        errors,
        passed,
        failures,
        max_abs_error,
        min_abs_error: if min_abs_error.is_finite() { min_abs_error } else { 0.0 },
        mean_abs_error,
        n_passes,
        tolerance: tol,
    }
}

/// Result of verifying one element kernel
#[derive(Debug, Clone)]
pub struct ElementVerificationReport {
    /// Numerical vs analytical ∂f_x/∂x
    pub stiffness: JacobianComparisonReport,
    /// Numerical vs analytical ∂f_m/∂ẋ
    pub mass: JacobianComparisonReport,
    pub passed: bool,
}

/// Verify a kernel's stiffness Jacobian and mass matrix by forward differences
///
/// The kernel must be initialised with a solution and velocity bound. Both
/// are restored before returning.
pub fn check_element_numerical_jacobian<E>(
    kernel: &mut E,
    config: &VerificationConfig,
) -> ElementVerificationReport
where
    E: ElementOperations + ?Sized,
{
    let sol = kernel.state().solution().clone();
    let vel = kernel.state().velocity().clone();
    let n = sol.len();
    let delta = config.delta;

    let mut baseline = ElementOutput::zeros(n);
    kernel.elem_calculations(true, &mut baseline);

    let mut perturbed = ElementOutput::zeros(n);
    let mut jac = Array2::zeros((n, n));
    for i in 0..n {
        let mut dsol = sol.clone();
        dsol[i] += delta;
        kernel.set_solution(&dsol);
        kernel.elem_calculations(false, &mut perturbed);
        jac.column_mut(i)
            .assign(&((&perturbed.f_x - &baseline.f_x) / delta));
    }
    kernel.set_solution(&sol);

    let mut mass = Array2::zeros((n, n));
    for i in 0..n {
        let mut dvel = vel.clone();
        dvel[i] += delta;
        kernel.set_velocity(&dvel);
        kernel.elem_calculations(false, &mut perturbed);
        mass.column_mut(i)
            .assign(&((&perturbed.f_m - &baseline.f_m) / delta));
    }

    kernel.set_solution(&sol);
    kernel.set_velocity(&vel);

    log::info!("Checking stiffness Jacobian ({n} dofs)");
    let stiffness = compare_matrix(&jac, &baseline.dfx_dx, config.stiffness_tolerance);
    log::info!("Checking mass matrix ({n} dofs)");
    let mass = compare_matrix(&mass, &baseline.dfm_dxdot, config.mass_tolerance);

    let passed = stiffness.all_passed() && mass.all_passed();
    ElementVerificationReport {
        stiffness,
        mass,
        passed,
    }
}

/// Step and tolerance for verifying an arbitrary residual function
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiniteDifferenceCheck {
    /// Step as a fraction of `|x_i|`
    pub frac: f64,
    /// Minimum step
    pub delta: f64,
    pub tolerance: f64,
}

impl Default for FiniteDifferenceCheck {
    fn default() -> Self {
        Self {
            frac: 1e-4,
            delta: 1e-4,
            tolerance: 1e-6,
        }
    }
}

/// Verify the Jacobian returned by `f` with central differences
///
/// `f` maps a state to its residual and analytical Jacobian. The step for dof
/// `i` is `max(frac * |x_i|, delta)`.
pub fn check_jacobian<F>(
    mut f: F,
    x: &Array1<f64>,
    check: &FiniteDifferenceCheck,
) -> JacobianComparisonReport
where
    F: FnMut(&Array1<f64>) -> (Array1<f64>, Array2<f64>),
{
    let (r0, analytical) = f(x);
    let n = x.len();
    let mut numerical = Array2::zeros((r0.len(), n));

    for i in 0..n {
        let h = (check.frac * x[i].abs()).max(check.delta);
        let mut xp = x.clone();
        let mut xm = x.clone();
        xp[i] += h;
        xm[i] -= h;
        let (rp, _) = f(&xp);
        let (rm, _) = f(&xm);
        numerical.column_mut(i).assign(&((rp - rm) / (2.0 * h)));
    }

    compare_matrix(&numerical, &analytical, check.tolerance)
}
