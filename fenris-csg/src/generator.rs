use crate::{CsgError, CsgGeometry, MeshParameters, TriangulationBackend};
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// A flat triangle mesh: vertex coordinates and vertex-index triples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTriangleMesh {
    pub vertices: Vec<Point2<f64>>,
    pub triangles: Vec<[usize; 3]>,
}

/// Generates triangle meshes of CSG geometries with a pluggable triangulation backend.
///
/// A generator without a backend can be constructed and configured, but [`generate`](Self::generate)
/// fails with [`CsgError::BackendUnavailable`].
pub struct CsgMeshGenerator<'a> {
    geometry: CsgGeometry,
    parameters: MeshParameters,
    backend: Option<&'a dyn TriangulationBackend>,
}

impl<'a> CsgMeshGenerator<'a> {
    pub fn new(geometry: CsgGeometry) -> Self {
        Self {
            geometry,
            parameters: MeshParameters::default(),
            backend: None,
        }
    }

    pub fn with_parameters(self, parameters: MeshParameters) -> Self {
        Self { parameters, ..self }
    }

    pub fn with_backend(self, backend: &'a dyn TriangulationBackend) -> Self {
        Self {
            backend: Some(backend),
            ..self
        }
    }

    pub fn geometry(&self) -> &CsgGeometry {
        &self.geometry
    }

    pub fn parameters(&self) -> &MeshParameters {
        &self.parameters
    }

    pub fn generate(&self) -> Result<RawTriangleMesh, CsgError> {
        let backend = self.backend.ok_or(CsgError::BackendUnavailable)?;
        let cell_size = self.parameters.effective_cell_size(&self.geometry)?;
        debug!(
            "Triangulating CSG geometry with shape bound {} and cell size {}",
            self.parameters.triangle_shape_bound, cell_size
        );
        let triangulation = backend.triangulate(&self.geometry, self.parameters.triangle_shape_bound, cell_size)?;
        let in_domain = triangulation.in_domain()?;

        // Keep only triangles inside the domain and renumber their vertices in order of appearance
        let mut vertex_map = vec![usize::MAX; triangulation.vertices.len()];
        let mut mesh = RawTriangleMesh::default();
        for (triangle, _) in triangulation
            .triangles
            .iter()
            .zip(&in_domain)
            .filter(|&(_, &inside)| inside)
        {
            let mut new_triangle = [0; 3];
            for (new_index, &v) in new_triangle.iter_mut().zip(triangle) {
                if vertex_map[v] == usize::MAX {
                    vertex_map[v] = mesh.vertices.len();
                    mesh.vertices.push(triangulation.vertices[v]);
                }
                *new_index = vertex_map[v];
            }
            mesh.triangles.push(new_triangle);
        }

        debug!(
            "Kept {} of {} triangles ({} vertices) inside the CSG domain",
            mesh.triangles.len(),
            triangulation.triangles.len(),
            mesh.vertices.len()
        );
        Ok(mesh)
    }
}
