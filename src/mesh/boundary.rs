use crate::cell::{midpoint, CellType};
use crate::editor::MeshEditor;
use crate::mesh::Mesh;
use crate::{MeshError, Real};
use log::trace;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Which facets make up a boundary mesh.
///
/// A facet is a boundary candidate when it is incident to exactly one local cell. Facets shared
/// with another process have a second incident cell there.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    /// Candidates that are not shared with another process: the boundary of the whole domain.
    Exterior,
    /// Candidates shared with another process: the seams between partitions.
    Interior,
    /// All candidates.
    Local,
}

impl BoundaryKind {
    fn keeps(&self, num_global_cells: usize) -> bool {
        match self {
            Self::Exterior => num_global_cells == 1,
            Self::Interior => num_global_cells > 1,
            Self::Local => true,
        }
    }
}

impl Display for BoundaryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exterior => "exterior",
            Self::Interior => "interior",
            Self::Local => "local",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for BoundaryKind {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exterior" => Ok(Self::Exterior),
            "interior" => Ok(Self::Interior),
            "local" => Ok(Self::Local),
            _ => Err(MeshError::MalformedInput(format!(
                "unknown boundary type \"{}\", expected \"exterior\", \"interior\" or \"local\"",
                s
            ))),
        }
    }
}

/// A mesh of the boundary facets of another mesh.
///
/// Boundary vertex `i` is parent vertex `vertex_map[i]` and boundary cell `j` is parent facet
/// `cell_map[j]`. When the parent mesh is not embedded in a higher dimension, every boundary
/// cell is oriented so that its normal points out of the parent cell.
#[derive(Debug, Clone)]
pub struct BoundaryMesh<T: Real> {
    mesh: Mesh<T>,
    vertex_map: Vec<usize>,
    cell_map: Vec<usize>,
}

impl<T: Real> BoundaryMesh<T> {
    pub fn mesh(&self) -> &Mesh<T> {
        &self.mesh
    }

    pub fn vertex_map(&self) -> &[usize] {
        &self.vertex_map
    }

    pub fn cell_map(&self) -> &[usize] {
        &self.cell_map
    }

    pub fn into_parts(self) -> (Mesh<T>, Vec<usize>, Vec<usize>) {
        (self.mesh, self.vertex_map, self.cell_map)
    }

    /// Extracts the boundary of the given kind.
    pub fn compute(mesh: &Mesh<T>, kind: BoundaryKind) -> Result<Self, MeshError> {
        let tdim = mesh.dim();
        if tdim == 0 {
            return Err(MeshError::Unsupported {
                operation: "compute_boundary",
                reason: "a mesh of points has no facets".to_string(),
            });
        }
        let facet_dim = tdim - 1;
        let topology = mesh.topology();
        let num_facets = topology.init(facet_dim)?;
        let facet_cells = topology.connectivity(facet_dim, tdim)?;
        let facet_vertices = topology.connectivity(facet_dim, 0)?;
        let cell_vertices = topology.cells();

        let mut facets = Vec::new();
        for f in (0..num_facets).filter(|&f| facet_cells.row(f).len() == 1) {
            if kind.keeps(topology.num_global_cells_of_facet(f)?) {
                facets.push(f);
            }
        }

        let mut vertex_map = Vec::new();
        let mut boundary_index = vec![None; mesh.num_vertices()];
        for &f in &facets {
            for &v in facet_vertices.row(f) {
                boundary_index[v].get_or_insert_with(|| {
                    vertex_map.push(v);
                    vertex_map.len() - 1
                });
            }
        }

        let facet_type = mesh.cell_type().facet_type()?;
        let gdim = mesh.gdim();
        let mut editor = MeshEditor::open(facet_type, gdim)?;
        editor.init_vertices(vertex_map.len())?;
        for (i, &v) in vertex_map.iter().enumerate() {
            let global_index = topology.global_index(0, v).unwrap_or(v);
            editor.add_vertex_global(i, global_index, mesh.geometry().x(v))?;
        }

        let reorient = gdim == tdim;
        let mut points = Vec::new();
        let mut cell_points = Vec::new();
        editor.init_cells(facets.len())?;
        for (i, &f) in facets.iter().enumerate() {
            let mut vertices = facet_vertices.row(f).to_vec();
            if reorient {
                let cell = facet_cells.row(f)[0];
                mesh.geometry().gather_points(&vertices, &mut points)?;
                mesh.geometry()
                    .gather_points(cell_vertices.row(cell), &mut cell_points)?;
                let n = facet_normal(facet_type, &points);
                if n.dot(&(midpoint(&cell_points) - points[0])) > T::zero() {
                    flip(facet_type, &mut vertices);
                }
            }
            let boundary_vertices: Vec<usize> = vertices
                .iter()
                .filter_map(|&v| boundary_index[v])
                .collect();
            editor.add_cell(i, &boundary_vertices)?;
        }

        // Reordering would undo the orientation
        let boundary = editor.close(false)?;
        trace!(
            "Computed {} boundary with {} vertices and {} {}",
            kind,
            boundary.num_vertices(),
            boundary.num_cells(),
            facet_type.description(true)
        );
        Ok(Self {
            mesh: boundary,
            vertex_map,
            cell_map: facets,
        })
    }
}

/// Normal of a facet determined by its vertex order.
fn facet_normal<T: Real>(facet_type: CellType, p: &[Point3<T>]) -> Vector3<T> {
    match facet_type {
        CellType::Interval => {
            let t = p[1] - p[0];
            Vector3::new(t.y, -t.x, T::zero())
        }
        CellType::Triangle | CellType::Quadrilateral => (p[1] - p[0]).cross(&(p[2] - p[0])),
        _ => Vector3::zeros(),
    }
}

fn flip(facet_type: CellType, vertices: &mut [usize]) {
    match facet_type {
        CellType::Quadrilateral => vertices.swap(1, 2),
        CellType::Interval | CellType::Triangle => vertices.swap(0, 1),
        _ => {}
    }
}

impl<T: Real> Mesh<T> {
    /// Extracts a boundary mesh, see [`BoundaryMesh`].
    pub fn compute_boundary(&self, kind: BoundaryKind) -> Result<BoundaryMesh<T>, MeshError> {
        BoundaryMesh::compute(self, kind)
    }
}
