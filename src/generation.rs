//! Triangle meshes generated from constructive solid geometry.
use crate::cell::CellType;
use crate::editor::MeshEditor;
use crate::mesh::Mesh;
use crate::{MeshError, Real};
use fenris_csg::{CsgError, CsgGeometry, CsgMeshGenerator, MeshParameters, RawTriangleMesh, TriangulationBackend};
use log::debug;

/// Builds an ordered triangle mesh from the output of a CSG mesh generator.
pub fn mesh_from_raw_triangles<T: Real>(raw: &RawTriangleMesh) -> Result<Mesh<T>, MeshError> {
    let mut editor = MeshEditor::open(CellType::Triangle, 2)?;
    editor.init_vertices(raw.vertices.len())?;
    for (i, p) in raw.vertices.iter().enumerate() {
        let x = [T::from_f64(p.x), T::from_f64(p.y)];
        match x {
            [Some(x), Some(y)] => editor.add_vertex(i, &[x, y])?,
            _ => {
                return Err(MeshError::MalformedInput(format!(
                    "vertex {} cannot be represented in the mesh scalar type",
                    i
                )))
            }
        }
    }
    editor.init_cells(raw.triangles.len())?;
    for (i, triangle) in raw.triangles.iter().enumerate() {
        editor.add_cell(i, triangle)?;
    }
    editor.close(true)
}

/// Generates a triangle mesh of a planar CSG geometry.
///
/// Fails with [`MeshError::Unsupported`] if no triangulation backend is supplied.
pub fn generate_mesh<T: Real>(
    geometry: CsgGeometry,
    parameters: MeshParameters,
    backend: Option<&dyn TriangulationBackend>,
) -> Result<Mesh<T>, MeshError> {
    let mut generator = CsgMeshGenerator::new(geometry).with_parameters(parameters);
    if let Some(backend) = backend {
        generator = generator.with_backend(backend);
    }
    let raw = generator.generate().map_err(|err| match err {
        CsgError::BackendUnavailable => MeshError::Unsupported {
            operation: "generate_mesh",
            reason: err.to_string(),
        },
        other => MeshError::from(other),
    })?;
    let mesh = mesh_from_raw_triangles(&raw)?;
    debug!("Generated {}", mesh);
    Ok(mesh)
}
