//! Reference physics kernels
//!
//! Small two-node kernels covering the three physics families the contract
//! is used for: a structural bar, nonlinear heat conduction and a viscous
//! Burgers flux standing in for a fluid kernel.

use super::{ElementOperations, ElementOutput, ElementState, LocalFrame};
use crate::mesh::Element;
use ndarray::{Array2, array};

fn two_node_length(elem: &Element) -> f64 {
    assert_eq!(elem.num_nodes(), 2, "Kernel expects a two-node element");
    let length = elem.length();
    assert!(length > 0.0, "Element {} has zero length", elem.id);
    length
}

/// Two-node axial bar in 3D, three translational dofs per node
///
/// Stiffness `EA/L` acts along the element axis only; the consistent
/// translational mass `ρAL/6 [2 1; 1 2]` acts on the velocity.
#[derive(Debug, Clone)]
pub struct AxialBar {
    /// Axial rigidity EA
    pub axial_stiffness: f64,
    /// Mass per unit length ρA
    pub mass_per_length: f64,
    state: ElementState,
    frame: LocalFrame,
    length: f64,
}

impl AxialBar {
    pub fn new(axial_stiffness: f64, mass_per_length: f64) -> Self {
        Self {
            axial_stiffness,
            mass_per_length,
            state: ElementState::default(),
            frame: LocalFrame::default(),
            length: 0.0,
        }
    }

    fn stiffness_matrix(&self) -> Array2<f64> {
        let axis = self.frame.axis();
        let k = self.axial_stiffness / self.length;
        let mut stiffness = Array2::zeros((6, 6));
        for i in 0..3 {
            for j in 0..3 {
                let t = k * axis[i] * axis[j];
                stiffness[[i, j]] = t;
                stiffness[[i + 3, j + 3]] = t;
                stiffness[[i, j + 3]] = -t;
                stiffness[[i + 3, j]] = -t;
            }
        }
        stiffness
    }

    fn mass_matrix(&self) -> Array2<f64> {
        let m = self.mass_per_length * self.length / 6.0;
        let mut mass = Array2::zeros((6, 6));
        for i in 0..3 {
            mass[[i, i]] = 2.0 * m;
            mass[[i + 3, i + 3]] = 2.0 * m;
            mass[[i, i + 3]] = m;
            mass[[i + 3, i]] = m;
        }
        mass
    }
}

impl ElementOperations for AxialBar {
    fn state(&self) -> &ElementState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ElementState {
        &mut self.state
    }

    fn init(&mut self, elem: &Element) {
        self.length = two_node_length(elem);
        self.state.bind(6);
        self.frame = LocalFrame::from_line(&elem.points[0], &elem.points[1]);
    }

    fn elem_calculations(&mut self, request_jacobian: bool, out: &mut ElementOutput) {
        debug_assert!(self.state.is_ready(), "AxialBar evaluated before init/set_solution");
        out.reset();

        let stiffness = self.stiffness_matrix();
        let mass = self.mass_matrix();
        out.f_x.assign(&stiffness.dot(self.state.solution()));
        out.f_m.assign(&mass.dot(self.state.velocity()));

        if request_jacobian {
            out.dfx_dx.assign(&stiffness);
            out.dfm_dxdot.assign(&mass);
        }
    }

    fn if_use_local_elem(&self) -> bool {
        true
    }

    fn set_local_frame_data(&self, frame: &mut LocalFrame) {
        frame.clone_from(&self.frame);
    }
}

/// Two-node 1D conduction with temperature-dependent conductivity
///
/// `k(u) = k0 (1 + β ū)` with `ū` the element mean temperature; heat capacity
/// is lumped onto the nodes.
#[derive(Debug, Clone)]
pub struct NonlinearConduction {
    pub conductivity: f64,
    pub conductivity_slope: f64,
    pub capacity: f64,
    state: ElementState,
    length: f64,
}

impl NonlinearConduction {
    pub fn new(conductivity: f64, conductivity_slope: f64, capacity: f64) -> Self {
        Self {
            conductivity,
            conductivity_slope,
            capacity,
            state: ElementState::default(),
            length: 0.0,
        }
    }
}

impl ElementOperations for NonlinearConduction {
    fn state(&self) -> &ElementState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ElementState {
        &mut self.state
    }

    fn init(&mut self, elem: &Element) {
        self.length = two_node_length(elem);
        self.state.bind(2);
    }

    fn elem_calculations(&mut self, request_jacobian: bool, out: &mut ElementOutput) {
        debug_assert!(
            self.state.is_ready(),
            "NonlinearConduction evaluated before init/set_solution"
        );
        out.reset();

        let u = self.state.solution();
        let l = self.length;
        let mean = 0.5 * (u[0] + u[1]);
        let k = self.conductivity * (1.0 + self.conductivity_slope * mean);
        let gradient = (u[1] - u[0]) / l;
        let flux = k * gradient;

        out.f_x[0] = -flux;
        out.f_x[1] = flux;

        let lumped = 0.5 * self.capacity * l;
        out.f_m.assign(&(self.state.velocity() * lumped));

        if request_jacobian {
            let dk = 0.5 * self.conductivity * self.conductivity_slope * gradient;
            let dflux = [dk - k / l, dk + k / l];
            for j in 0..2 {
                out.dfx_dx[[0, j]] = -dflux[j];
                out.dfx_dx[[1, j]] = dflux[j];
            }
            out.dfm_dxdot[[0, 0]] = lumped;
            out.dfm_dxdot[[1, 1]] = lumped;
        }
    }
}

/// Two-node 1D viscous Burgers kernel, `u_t + (u²/2)_x = ν u_xx`
///
/// Galerkin weak form with linear shape functions and a consistent mass. The
/// optional artificial diffusion `τ |ū| L / 2` is linearised with a frozen
/// coefficient, so its Jacobian is approximate by construction.
#[derive(Debug, Clone)]
pub struct ViscousBurgers {
    pub viscosity: f64,
    pub stabilization: Option<f64>,
    state: ElementState,
    length: f64,
}

impl ViscousBurgers {
    pub fn new(viscosity: f64) -> Self {
        Self {
            viscosity,
            stabilization: None,
            state: ElementState::default(),
            length: 0.0,
        }
    }

    /// Enable artificial diffusion with coefficient `tau`
    pub fn with_stabilization(mut self, tau: f64) -> Self {
        self.stabilization = Some(tau);
        self
    }
}

impl ElementOperations for ViscousBurgers {
    fn state(&self) -> &ElementState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ElementState {
        &mut self.state
    }

    fn init(&mut self, elem: &Element) {
        self.length = two_node_length(elem);
        self.state.bind(2);
    }

    fn elem_calculations(&mut self, request_jacobian: bool, out: &mut ElementOutput) {
        debug_assert!(
            self.state.is_ready(),
            "ViscousBurgers evaluated before init/set_solution"
        );
        out.reset();

        let u = self.state.solution();
        let l = self.length;
        let (u0, u1) = (u[0], u[1]);

        // -∫ (u²/2) φ_i' dx, exact for linear u
        let q = u0 * u0 + u0 * u1 + u1 * u1;
        let diffusivity = self.viscosity
            + self
                .stabilization
                .map_or(0.0, |tau| 0.5 * tau * (0.5 * (u0 + u1)).abs() * l);
        let diffusion = diffusivity * (u1 - u0) / l;

        out.f_x[0] = q / 6.0 - diffusion;
        out.f_x[1] = -q / 6.0 + diffusion;

        let m = l / 6.0;
        let mass = array![[2.0 * m, m], [m, 2.0 * m]];
        out.f_m.assign(&mass.dot(self.state.velocity()));

        if request_jacobian {
            let dconv = [(2.0 * u0 + u1) / 6.0, (u0 + 2.0 * u1) / 6.0];
            let d = diffusivity / l;
            out.dfx_dx[[0, 0]] = dconv[0] + d;
            out.dfx_dx[[0, 1]] = dconv[1] - d;
            out.dfx_dx[[1, 0]] = -dconv[0] - d;
            out.dfx_dx[[1, 1]] = -dconv[1] + d;
            out.dfm_dxdot.assign(&mass);
        }
    }
}
