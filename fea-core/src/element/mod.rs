//! Element operations contract
//!
//! Any physics kernel (structural, fluid, thermal) supplies residual, Jacobian
//! and mass-matrix contributions through [`ElementOperations`]. Each kernel
//! owns its [`ElementState`]; the state setters are provided by the trait and
//! forward to it, so a kernel only implements geometry binding and the
//! calculation itself.
//!
//! The first-order element system is `f_m(ẋ, x) + f_x(x) = f`, with `f_m` the
//! mass term and `f_x` the stiffness (internal force) term.

mod frame;
pub mod kernels;
mod state;

pub use frame::LocalFrame;
pub use kernels::{AxialBar, NonlinearConduction, ViscousBurgers};
pub use state::{ElementOutput, ElementState};

use crate::mesh::Element;
use ndarray::Array1;

/// Elemental assembly operations implemented by every physics kernel
pub trait ElementOperations {
    /// Kernel state
    fn state(&self) -> &ElementState;

    /// Mutable kernel state
    fn state_mut(&mut self) -> &mut ElementState;

    /// Bind element geometry
    ///
    /// # Panics
    ///
    /// Panics if an element is already bound and `clear_elem` was not called.
    fn init(&mut self, elem: &Element);

    /// Release the bound element; safe to call when nothing is bound
    fn clear_elem(&mut self) {
        self.state_mut().release();
    }

    /// Local dof count of the bound element
    fn n_dofs(&self) -> usize {
        self.state().n_dofs()
    }

    fn set_solution(&mut self, sol: &Array1<f64>) {
        self.state_mut().set_solution(sol);
    }

    fn set_solution_sensitivity(&mut self, sol: &Array1<f64>) {
        self.state_mut().set_solution_sensitivity(sol);
    }

    fn set_perturbed_solution(&mut self, sol: &Array1<f64>) {
        self.state_mut().set_perturbed_solution(sol);
    }

    fn set_velocity(&mut self, vel: &Array1<f64>) {
        self.state_mut().set_velocity(vel);
    }

    fn set_velocity_sensitivity(&mut self, vel: &Array1<f64>) {
        self.state_mut().set_velocity_sensitivity(vel);
    }

    fn set_perturbed_velocity(&mut self, vel: &Array1<f64>) {
        self.state_mut().set_perturbed_velocity(vel);
    }

    fn set_acceleration(&mut self, accel: &Array1<f64>) {
        self.state_mut().set_acceleration(accel);
    }

    fn set_perturbed_acceleration(&mut self, accel: &Array1<f64>) {
        self.state_mut().set_perturbed_acceleration(accel);
    }

    /// Compute residuals and, if `request_jacobian`, their Jacobians
    ///
    /// Overwrites `out` with the contribution of the bound state. The result
    /// depends only on the bound state. Calling this before `init` and
    /// `set_solution` is a programming error (checked in debug builds).
    fn elem_calculations(&mut self, request_jacobian: bool, out: &mut ElementOutput);

    /// Whether the element works in a local (rotated) frame
    fn if_use_local_elem(&self) -> bool {
        false
    }

    /// Fill `frame` for kernels that use a local frame
    fn set_local_frame_data(&self, _frame: &mut LocalFrame) {}
}
