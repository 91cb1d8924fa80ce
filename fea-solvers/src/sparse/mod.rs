//! Sparse matrix structures
//!
//! - [`CsrMatrix`]: scalar compressed sparse row storage
//! - [`BsrMatrix`]: block CSR with dense square blocks (interleaved complex systems)
//! - [`NestMatrix`]: grid of CSR sub-blocks addressed through [`IndexSet`]s

mod bsr;
mod csr;
mod nest;

pub use bsr::BsrMatrix;
pub use csr::CsrMatrix;
pub use nest::{IndexSet, NestMatrix};
