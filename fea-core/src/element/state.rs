//! Per-element state and calculation outputs

use ndarray::{Array1, Array2};

/// State vectors bound to one element
///
/// Every vector has the element's local dof count; setters assert it.
#[derive(Debug, Clone, Default)]
pub struct ElementState {
    n_dofs: usize,
    bound: bool,
    has_solution: bool,
    sol: Array1<f64>,
    sol_sens: Array1<f64>,
    perturbed_sol: Array1<f64>,
    vel: Array1<f64>,
    vel_sens: Array1<f64>,
    perturbed_vel: Array1<f64>,
    accel: Array1<f64>,
    perturbed_accel: Array1<f64>,
}

macro_rules! state_vector {
    ($getter:ident, $setter:ident, $field:ident, $what:literal) => {
        #[doc = concat!("Bound ", $what)]
        pub fn $getter(&self) -> &Array1<f64> {
            &self.$field
        }

        #[doc = concat!("Install the ", $what, " (length must equal the local dof count)")]
        pub fn $setter(&mut self, v: &Array1<f64>) {
            assert_eq!(
                v.len(),
                self.n_dofs,
                concat!($what, " length does not match the element dof count")
            );
            self.$field.assign(v);
        }
    };
}

impl ElementState {
    /// Bind to an element with `n_dofs` local dofs, zero-filling every vector
    ///
    /// # Panics
    ///
    /// Panics if the state is already bound.
    pub fn bind(&mut self, n_dofs: usize) {
        assert!(
            !self.bound,
            "Element already initialised; call clear_elem before init"
        );
        self.resize(n_dofs);
        self.bound = true;
    }

    /// Release the element and drop all state
    pub fn release(&mut self) {
        *self = Self::default();
    }

    /// Resize every vector to `n_dofs` and zero it
    pub fn resize(&mut self, n_dofs: usize) {
        self.n_dofs = n_dofs;
        self.has_solution = false;
        for v in [
            &mut self.sol,
            &mut self.sol_sens,
            &mut self.perturbed_sol,
            &mut self.vel,
            &mut self.vel_sens,
            &mut self.perturbed_vel,
            &mut self.accel,
            &mut self.perturbed_accel,
        ] {
            *v = Array1::zeros(n_dofs);
        }
    }

    /// Local dof count
    pub fn n_dofs(&self) -> usize {
        self.n_dofs
    }

    /// Whether `init` has been called
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Whether the element can be evaluated (bound with a solution installed)
    pub fn is_ready(&self) -> bool {
        self.bound && self.has_solution
    }

    /// Bound solution
    pub fn solution(&self) -> &Array1<f64> {
        &self.sol
    }

    /// Install the solution (length must equal the local dof count)
    pub fn set_solution(&mut self, sol: &Array1<f64>) {
        assert_eq!(
            sol.len(),
            self.n_dofs,
            "solution length does not match the element dof count"
        );
        self.sol.assign(sol);
        self.has_solution = true;
    }

    state_vector!(solution_sensitivity, set_solution_sensitivity, sol_sens, "solution sensitivity");
    state_vector!(perturbed_solution, set_perturbed_solution, perturbed_sol, "perturbed solution");
    state_vector!(velocity, set_velocity, vel, "velocity");
    state_vector!(velocity_sensitivity, set_velocity_sensitivity, vel_sens, "velocity sensitivity");
    state_vector!(perturbed_velocity, set_perturbed_velocity, perturbed_vel, "perturbed velocity");
    state_vector!(acceleration, set_acceleration, accel, "acceleration");
    state_vector!(
        perturbed_acceleration,
        set_perturbed_acceleration,
        perturbed_accel,
        "perturbed acceleration"
    );
}

/// Outputs of one `elem_calculations` call
#[derive(Debug, Clone, PartialEq)]
pub struct ElementOutput {
    /// Mass-term residual f_m
    pub f_m: Array1<f64>,
    /// Stiffness (internal force) residual f_x
    pub f_x: Array1<f64>,
    /// ∂f_m/∂ẋ
    pub dfm_dxdot: Array2<f64>,
    /// ∂f_m/∂x
    pub dfm_dx: Array2<f64>,
    /// ∂f_x/∂x
    pub dfx_dx: Array2<f64>,
}

impl ElementOutput {
    /// Zeroed outputs for an element with `n` local dofs
    pub fn zeros(n: usize) -> Self {
        Self {
            f_m: Array1::zeros(n),
            f_x: Array1::zeros(n),
            dfm_dxdot: Array2::zeros((n, n)),
            dfm_dx: Array2::zeros((n, n)),
            dfx_dx: Array2::zeros((n, n)),
        }
    }

    /// Zero every output in place
    pub fn reset(&mut self) {
        self.f_m.fill(0.0);
        self.f_x.fill(0.0);
        self.dfm_dxdot.fill(0.0);
        self.dfm_dx.fill(0.0);
        self.dfx_dx.fill(0.0);
    }

    /// Local dof count the outputs are sized for
    pub fn n_dofs(&self) -> usize {
        self.f_x.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_bind_and_set() {
        let mut state = ElementState::default();
        assert!(!state.is_ready());
        state.bind(2);
        assert!(state.is_bound());
        assert!(!state.is_ready());

        state.set_solution(&array![1.0, 2.0]);
        state.set_velocity(&array![0.5, 0.0]);
        assert!(state.is_ready());
        assert_eq!(state.solution(), &array![1.0, 2.0]);
        assert_eq!(state.velocity(), &array![0.5, 0.0]);
        assert_eq!(state.acceleration(), &array![0.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "does not match the element dof count")]
    fn test_setter_rejects_wrong_length() {
        let mut state = ElementState::default();
        state.bind(3);
        state.set_perturbed_velocity(&array![1.0]);
    }

    #[test]
    #[should_panic(expected = "call clear_elem")]
    fn test_double_bind_panics() {
        let mut state = ElementState::default();
        state.bind(2);
        state.bind(2);
    }

    #[test]
    fn test_release_allows_rebind() {
        let mut state = ElementState::default();
        state.release();
        state.bind(2);
        state.release();
        state.bind(4);
        assert_eq!(state.n_dofs(), 4);
    }

    #[test]
    fn test_output_reset() {
        let mut out = ElementOutput::zeros(2);
        out.f_x[0] = 3.0;
        out.dfx_dx[[1, 1]] = 1.0;
        out.reset();
        assert_eq!(out, ElementOutput::zeros(2));
        assert_eq!(out.n_dofs(), 2);
    }
}
