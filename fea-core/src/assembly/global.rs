//! Global assembly of element contributions
//!
//! Loops over the mesh, binds each element to the kernel, gathers its local
//! state from the global vectors and scatters residuals and Jacobians back in
//! triplet form.

use crate::element::{ElementOperations, ElementOutput, LocalFrame};
use crate::mesh::{DofMap, Mesh};
use ndarray::Array1;
use solvers::CsrMatrix;

/// Matrix in triplet format, duplicates summed on conversion
#[derive(Debug, Clone)]
pub struct TripletMatrix {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub values: Vec<f64>,
    pub dim: usize,
}

impl TripletMatrix {
    pub fn new(dim: usize) -> Self {
        Self {
            rows: Vec::new(),
            cols: Vec::new(),
            values: Vec::new(),
            dim,
        }
    }

    /// Add a triplet (i, j, value)
    pub fn add(&mut self, i: usize, j: usize, value: f64) {
        self.rows.push(i);
        self.cols.push(j);
        self.values.push(value);
    }

    /// Number of stored triplets
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let triplets = self
            .rows
            .iter()
            .zip(&self.cols)
            .zip(&self.values)
            .map(|((&i, &j), &v)| (i, j, v));
        CsrMatrix::from_triplets(self.dim, self.dim, triplets.collect())
    }
}

/// Globally assembled residuals and Jacobians
#[derive(Debug, Clone)]
pub struct GlobalSystem {
    pub f_m: Array1<f64>,
    pub f_x: Array1<f64>,
    /// ∂f_m/∂ẋ
    pub dfm_dxdot: CsrMatrix<f64>,
    /// ∂f_m/∂x
    pub dfm_dx: CsrMatrix<f64>,
    /// ∂f_x/∂x
    pub dfx_dx: CsrMatrix<f64>,
    /// Local frame of every element whose kernel works in one, by element id
    pub local_frames: Vec<(usize, LocalFrame)>,
}

/// Assemble every element of `mesh` with `kernel` at state (`sol`, `vel`)
///
/// The kernel is left unbound on return.
pub fn assemble_elements<E>(
    kernel: &mut E,
    mesh: &Mesh,
    dofs: &DofMap,
    sol: &Array1<f64>,
    vel: &Array1<f64>,
    request_jacobian: bool,
) -> GlobalSystem
where
    E: ElementOperations + ?Sized,
{
    let n = dofs.n_dofs();
    assert_eq!(sol.len(), n, "Solution size mismatch");
    assert_eq!(vel.len(), n, "Velocity size mismatch");

    let mut f_m = Array1::zeros(n);
    let mut f_x = Array1::zeros(n);
    let mut dfm_dxdot = TripletMatrix::new(n);
    let mut dfm_dx = TripletMatrix::new(n);
    let mut dfx_dx = TripletMatrix::new(n);
    let mut local_frames = Vec::new();

    for elem in mesh.elements() {
        let local_dofs = dofs.element_dofs(elem.id);
        kernel.clear_elem();
        kernel.init(&elem);
        assert_eq!(
            kernel.n_dofs(),
            local_dofs.len(),
            "Kernel dof count does not match the dof map"
        );
        if kernel.if_use_local_elem() {
            let mut frame = LocalFrame::default();
            kernel.set_local_frame_data(&mut frame);
            local_frames.push((elem.id, frame));
        }

        let local_sol: Array1<f64> = local_dofs.iter().map(|&d| sol[d]).collect();
        let local_vel: Array1<f64> = local_dofs.iter().map(|&d| vel[d]).collect();
        kernel.set_solution(&local_sol);
        kernel.set_velocity(&local_vel);

        let mut out = ElementOutput::zeros(local_dofs.len());
        kernel.elem_calculations(request_jacobian, &mut out);

        for (a, &i) in local_dofs.iter().enumerate() {
            f_m[i] += out.f_m[a];
            f_x[i] += out.f_x[a];
            if request_jacobian {
                for (b, &j) in local_dofs.iter().enumerate() {
                    dfm_dxdot.add(i, j, out.dfm_dxdot[[a, b]]);
                    dfm_dx.add(i, j, out.dfm_dx[[a, b]]);
                    dfx_dx.add(i, j, out.dfx_dx[[a, b]]);
                }
            }
        }
    }
    kernel.clear_elem();

    log::debug!(
        "Assembled {} elements ({} in local frames), {} dofs, {} stiffness triplets",
        mesh.num_elements(),
        local_frames.len(),
        n,
        dfx_dx.nnz()
    );

    GlobalSystem {
        f_m,
        f_x,
        dfm_dxdot: dfm_dxdot.to_csr(),
        dfm_dx: dfm_dx.to_csr(),
        dfx_dx: dfx_dx.to_csr(),
        local_frames,
    }
}
