//! Constructive solid geometry (CSG) descriptions of planar domains and the driver that turns
//! them into triangle meshes.
//!
//! The exact-geometry work (Boolean resolution of the primitives, constrained Delaunay
//! triangulation and refinement) is delegated to a [`TriangulationBackend`]. This crate owns
//! everything around that boundary: the CSG tree, its polygonal approximation, the mesh
//! parameters and the classification of triangles into inside/outside of the resolved domain.
use thiserror::Error;

mod circle;
mod generator;
mod geometry;
mod parameters;
mod primitives;
mod triangulation;

pub use circle::min_enclosing_circle;
pub use generator::{CsgMeshGenerator, RawTriangleMesh};
pub use geometry::CsgGeometry;
pub use parameters::MeshParameters;
pub use primitives::{Circle, Ellipse, Polygon, Rectangle};
pub use triangulation::{ConstrainedTriangulation, TriangulationBackend};

pub extern crate nalgebra;

/// Errors raised while describing CSG geometries or generating meshes from them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CsgError {
    #[error("invalid {primitive}: {reason}")]
    InvalidPrimitive { primitive: &'static str, reason: String },
    #[error("invalid mesh parameters: {0}")]
    InvalidParameters(String),
    #[error("mesh generation requires a triangulation backend, but none was supplied")]
    BackendUnavailable,
    #[error("triangulation backend failed: {0}")]
    Backend(String),
    #[error("malformed triangulation: {0}")]
    MalformedTriangulation(String),
}
