//! Unstructured finite element meshes: topology computed on demand, canonical cell ordering,
//! boundary extraction and assembly of global tensors from local element tensors.
use nalgebra::RealField;

pub mod assembly;
pub mod cell;
pub mod domains;
pub mod editor;
pub mod error;
pub mod generation;
pub mod geometry;
pub mod mesh;
pub mod topology;

#[cfg(feature = "proptest-support")]
pub mod proptest;

pub mod csg {
    pub use fenris_csg::*;
}

pub use error::MeshError;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

/// Scalar type of mesh coordinates and assembled tensors.
///
/// Used as a trait alias for the traits needed by generic routines.
pub trait Real: RealField + Copy {}

impl<T> Real for T where T: RealField + Copy {}
