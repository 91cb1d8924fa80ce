//! Complex-valued physics assembly
//!
//! A [`ComplexAssembly`] evaluates the residual and Jacobian of
//! `(J_R + iJ_I)(x_R + ix_I) + (r_R + ir_I) = 0` at a given real/imaginary
//! solution pair. The block-system builder and the complex solver only see
//! this trait.

use super::global::assemble_elements;
use crate::element::ElementOperations;
use crate::mesh::{DofMap, Mesh};
use ndarray::Array1;
use num_complex::Complex64;
use solvers::CsrMatrix;
use solvers::vector_ops::stacked_norm;

/// Which half of the complex residual to assemble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplexPart {
    Real,
    Imaginary,
}

/// Real and imaginary residuals with the two Jacobian parts
#[derive(Debug, Clone)]
pub struct ComplexResidual {
    pub res_re: Array1<f64>,
    pub res_im: Array1<f64>,
    pub jac_re: CsrMatrix<f64>,
    pub jac_im: CsrMatrix<f64>,
}

impl ComplexResidual {
    /// Euclidean norm of `{r_R; r_I}`
    pub fn l2_norm(&self) -> f64 {
        stacked_norm(&self.res_re, &self.res_im)
    }
}

/// Physics assembly of a complex residual and Jacobian
pub trait ComplexAssembly {
    /// Scalar dof count (size of each of the real and imaginary parts)
    fn n_dofs(&self) -> usize;

    /// Residual and Jacobian at (`sol_re`, `sol_im`)
    fn residual_and_jacobian(
        &mut self,
        sol_re: &Array1<f64>,
        sol_im: &Array1<f64>,
    ) -> ComplexResidual;

    /// Residual of one part and the Jacobian `J_R` it is solved with
    ///
    /// `J_R` is the Jacobian of the real residual with respect to `x_R` and
    /// of the imaginary residual with respect to `x_I`.
    fn part_residual_and_jacobian(
        &mut self,
        part: ComplexPart,
        sol_re: &Array1<f64>,
        sol_im: &Array1<f64>,
    ) -> (Array1<f64>, CsrMatrix<f64>) {
        let full = self.residual_and_jacobian(sol_re, sol_im);
        match part {
            ComplexPart::Real => (full.res_re, full.jac_re),
            ComplexPart::Imaginary => (full.res_im, full.jac_re),
        }
    }

    /// Euclidean norm of the stacked residual
    fn residual_l2_norm(&mut self, sol_re: &Array1<f64>, sol_im: &Array1<f64>) -> f64 {
        self.residual_and_jacobian(sol_re, sol_im).l2_norm()
    }
}

fn check_sizes(n: usize, sol_re: &Array1<f64>, sol_im: &Array1<f64>) {
    assert_eq!(sol_re.len(), n, "Real solution size mismatch");
    assert_eq!(sol_im.len(), n, "Imaginary solution size mismatch");
}

/// Residual `J x - b` of a fixed complex linear system
fn linear_residual(
    jac_re: &CsrMatrix<f64>,
    jac_im: &CsrMatrix<f64>,
    load: &Array1<Complex64>,
    sol_re: &Array1<f64>,
    sol_im: &Array1<f64>,
) -> (Array1<f64>, Array1<f64>) {
    let load_re = load.mapv(|b| b.re);
    let load_im = load.mapv(|b| b.im);
    let res_re = jac_re.matvec(sol_re) - jac_im.matvec(sol_im) - load_re;
    let res_im = jac_im.matvec(sol_re) + jac_re.matvec(sol_im) - load_im;
    (res_re, res_im)
}

/// Complex linear system `(J_R + iJ_I) x = b`
#[derive(Debug, Clone)]
pub struct LinearComplexAssembly {
    jac_re: CsrMatrix<f64>,
    jac_im: CsrMatrix<f64>,
    load: Array1<Complex64>,
}

impl LinearComplexAssembly {
    /// # Panics
    ///
    /// Panics unless both Jacobian parts are square and match the load size.
    pub fn new(jac_re: CsrMatrix<f64>, jac_im: CsrMatrix<f64>, load: Array1<Complex64>) -> Self {
        let n = load.len();
        for (part, m) in [("real", &jac_re), ("imaginary", &jac_im)] {
            assert!(
                m.num_rows == n && m.num_cols == n,
                "{part} Jacobian is {}x{}, expected {n}x{n}",
                m.num_rows,
                m.num_cols
            );
        }
        Self {
            jac_re,
            jac_im,
            load,
        }
    }

    /// Split a complex CSR matrix into its real and imaginary parts
    pub fn from_complex(matrix: &CsrMatrix<Complex64>, load: Array1<Complex64>) -> Self {
        let split = |f: fn(&Complex64) -> f64| CsrMatrix {
            num_rows: matrix.num_rows,
            num_cols: matrix.num_cols,
            values: matrix.values.iter().map(f).collect(),
            col_indices: matrix.col_indices.clone(),
            row_ptrs: matrix.row_ptrs.clone(),
        };
        Self::new(split(|z| z.re), split(|z| z.im), load)
    }
}

impl ComplexAssembly for LinearComplexAssembly {
    fn n_dofs(&self) -> usize {
        self.load.len()
    }

    fn residual_and_jacobian(
        &mut self,
        sol_re: &Array1<f64>,
        sol_im: &Array1<f64>,
    ) -> ComplexResidual {
        check_sizes(self.n_dofs(), sol_re, sol_im);
        let (res_re, res_im) =
            linear_residual(&self.jac_re, &self.jac_im, &self.load, sol_re, sol_im);
        ComplexResidual {
            res_re,
            res_im,
            jac_re: self.jac_re.clone(),
            jac_im: self.jac_im.clone(),
        }
    }
}

/// Small-disturbance harmonic response of an element model
///
/// For `f_m(ẋ) + f_x(x) = f` linearised about a base state, a disturbance
/// `x = Re(X e^{iωt})` satisfies `(∂f_x/∂x + iω ∂f_m/∂ẋ) X = F`, so
/// `J_R = ∂f_x/∂x` and `J_I = ω ∂f_m/∂ẋ`, both evaluated at the base state.
#[derive(Debug, Clone)]
pub struct HarmonicAssembly<E> {
    kernel: E,
    mesh: Mesh,
    dofs: DofMap,
    omega: f64,
    base_solution: Array1<f64>,
    forcing: Array1<Complex64>,
    fixed_dofs: Vec<usize>,
    jac_re: CsrMatrix<f64>,
    jac_im: CsrMatrix<f64>,
}

impl<E: ElementOperations> HarmonicAssembly<E> {
    /// Linearise `kernel` over `mesh` about a zero base state
    pub fn new(kernel: E, mesh: Mesh, dofs_per_node: usize, omega: f64) -> Self {
        let dofs = DofMap::from_mesh(&mesh, dofs_per_node);
        let n = dofs.n_dofs();
        let mut assembly = Self {
            kernel,
            mesh,
            dofs,
            omega,
            base_solution: Array1::zeros(n),
            forcing: Array1::zeros(n),
            fixed_dofs: Vec::new(),
            jac_re: CsrMatrix::new(n, n),
            jac_im: CsrMatrix::new(n, n),
        };
        assembly.linearize();
        assembly
    }

    /// Linearise about `base` instead of the zero state
    pub fn with_base_solution(mut self, base: Array1<f64>) -> Self {
        assert_eq!(base.len(), self.dofs.n_dofs(), "Base state size mismatch");
        self.base_solution = base;
        self.linearize();
        self
    }

    /// Complex forcing amplitude `F`
    pub fn with_forcing(mut self, forcing: Array1<Complex64>) -> Self {
        assert_eq!(forcing.len(), self.dofs.n_dofs(), "Forcing size mismatch");
        self.forcing = forcing;
        self.apply_constraints();
        self
    }

    /// Clamp `dofs` to zero response
    pub fn with_fixed_dofs(mut self, dofs: &[usize]) -> Self {
        self.fixed_dofs.extend_from_slice(dofs);
        self.apply_constraints();
        self
    }

    /// Angular frequency
    pub fn omega(&self) -> f64 {
        self.omega
    }

    pub fn dof_map(&self) -> &DofMap {
        &self.dofs
    }

    fn linearize(&mut self) {
        let n = self.dofs.n_dofs();
        let system = assemble_elements(
            &mut self.kernel,
            &self.mesh,
            &self.dofs,
            &self.base_solution,
            &Array1::zeros(n),
            true,
        );
        self.jac_re = system.dfx_dx;
        self.jac_im = system.dfm_dxdot.scaled(self.omega);
        self.apply_constraints();
    }

    /// Row elimination: fixed rows become `x_i = 0` in both parts
    fn apply_constraints(&mut self) {
        for &dof in &self.fixed_dofs {
            for (jac, diag) in [(&mut self.jac_re, 1.0), (&mut self.jac_im, 0.0)] {
                for idx in jac.row_range(dof) {
                    jac.values[idx] = if jac.col_indices[idx] == dof { diag } else { 0.0 };
                }
            }
            self.forcing[dof] = Complex64::new(0.0, 0.0);
        }
    }
}

impl<E: ElementOperations> ComplexAssembly for HarmonicAssembly<E> {
    fn n_dofs(&self) -> usize {
        self.dofs.n_dofs()
    }

    fn residual_and_jacobian(
        &mut self,
        sol_re: &Array1<f64>,
        sol_im: &Array1<f64>,
    ) -> ComplexResidual {
        check_sizes(self.n_dofs(), sol_re, sol_im);
        let (res_re, res_im) =
            linear_residual(&self.jac_re, &self.jac_im, &self.forcing, sol_re, sol_im);
        ComplexResidual {
            res_re,
            res_im,
            jac_re: self.jac_re.clone(),
            jac_im: self.jac_im.clone(),
        }
    }
}
