//! Assembly layer
//!
//! - [`global`]: element loop producing global residuals and Jacobians
//! - [`complex`]: the complex residual/Jacobian interface used by the
//!   frequency-domain solver, with a fixed linear system and a harmonic
//!   element assembly

pub mod complex;
pub mod global;

pub use complex::{
    ComplexAssembly, ComplexPart, ComplexResidual, HarmonicAssembly, LinearComplexAssembly,
};
pub use global::{GlobalSystem, TripletMatrix, assemble_elements};
