//! Mesh and degree-of-freedom layer
//!
//! A minimal line-element mesh and the dof numbering that element assembly
//! and block-matrix preallocation work from.

mod dof_map;
mod generators;
mod types;

pub use dof_map::DofMap;
pub use generators::{line_1d, line_3d};
pub use types::{Element, Mesh, Point};
