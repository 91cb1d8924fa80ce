//! Degree-of-freedom numbering
//!
//! Dofs are numbered node-major: node `n` owns dofs
//! `n * dofs_per_node .. (n + 1) * dofs_per_node`, and an element's local dof
//! order is its node order with components innermost.

use super::Mesh;
use std::collections::BTreeSet;

/// Map from elements to global dof indices
#[derive(Debug, Clone)]
pub struct DofMap {
    dofs_per_node: usize,
    n_dofs: usize,
    element_dofs: Vec<Vec<usize>>,
}

impl DofMap {
    /// Number the dofs of `mesh` with `dofs_per_node` components per node
    pub fn from_mesh(mesh: &Mesh, dofs_per_node: usize) -> Self {
        assert!(dofs_per_node > 0, "Need at least one dof per node");
        let element_dofs = mesh
            .connectivity
            .iter()
            .map(|nodes| {
                nodes
                    .iter()
                    .flat_map(|&n| (0..dofs_per_node).map(move |c| n * dofs_per_node + c))
                    .collect()
            })
            .collect();

        Self {
            dofs_per_node,
            n_dofs: mesh.num_nodes() * dofs_per_node,
            element_dofs,
        }
    }

    /// Total number of dofs
    pub fn n_dofs(&self) -> usize {
        self.n_dofs
    }

    /// Components per node
    pub fn dofs_per_node(&self) -> usize {
        self.dofs_per_node
    }

    /// Global dofs of element `id`, in local order
    pub fn element_dofs(&self, id: usize) -> &[usize] {
        &self.element_dofs[id]
    }

    /// Sorted column indices coupled to each row through shared elements
    pub fn sparsity_pattern(&self) -> Vec<Vec<usize>> {
        let mut rows: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); self.n_dofs];
        for dofs in &self.element_dofs {
            for &i in dofs {
                rows[i].extend(dofs.iter().copied());
            }
        }
        rows.into_iter().map(|r| r.into_iter().collect()).collect()
    }

    /// Per-row nonzero counts, used to preallocate system matrices
    pub fn n_nz(&self) -> Vec<usize> {
        self.sparsity_pattern().iter().map(Vec::len).collect()
    }
}
