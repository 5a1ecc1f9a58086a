//! Incremental construction of meshes.
use crate::cell::CellType;
use crate::geometry::MeshGeometry;
use crate::mesh::Mesh;
use crate::topology::{ConnectivityTable, MeshTopology};
use crate::{MeshError, Real};
use log::trace;

/// Builds a [`Mesh`] by adding vertices and cells in index order.
///
/// The editor is used as `open` → `init_vertices` → `add_vertex` (for every vertex) →
/// `init_cells` → `add_cell` (for every cell) → `close`.
///
/// ```
/// use fenris_topology::cell::CellType;
/// use fenris_topology::editor::MeshEditor;
///
/// let mut editor = MeshEditor::open(CellType::Triangle, 2).unwrap();
/// editor.init_vertices(3).unwrap();
/// editor.add_vertex(0, &[0.0, 0.0]).unwrap();
/// editor.add_vertex(1, &[1.0, 0.0]).unwrap();
/// editor.add_vertex(2, &[0.0, 1.0]).unwrap();
/// editor.init_cells(1).unwrap();
/// editor.add_cell(0, &[0, 1, 2]).unwrap();
/// let mesh = editor.close(true).unwrap();
/// assert_eq!(mesh.num_cells(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MeshEditor<T> {
    cell_type: CellType,
    gdim: usize,
    num_vertices: Option<usize>,
    num_cells: Option<usize>,
    coordinates: Vec<T>,
    vertex_indices: Vec<usize>,
    cell_vertices: Vec<usize>,
    cell_indices: Vec<usize>,
}

fn editor_error(message: impl Into<String>) -> MeshError {
    MeshError::Editor(message.into())
}

impl<T: Real> MeshEditor<T> {
    /// Starts editing a mesh of the given cell type embedded in R^gdim.
    pub fn open(cell_type: CellType, gdim: usize) -> Result<Self, MeshError> {
        if !(1..=3).contains(&gdim) {
            return Err(editor_error(format!("geometric dimension must be 1, 2 or 3, got {}", gdim)));
        }
        if gdim < cell_type.dim() {
            return Err(editor_error(format!(
                "cannot embed {} cells in R^{}",
                cell_type.description(false),
                gdim
            )));
        }
        Ok(Self {
            cell_type,
            gdim,
            num_vertices: None,
            num_cells: None,
            coordinates: Vec::new(),
            vertex_indices: Vec::new(),
            cell_vertices: Vec::new(),
            cell_indices: Vec::new(),
        })
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn gdim(&self) -> usize {
        self.gdim
    }

    pub fn init_vertices(&mut self, num_vertices: usize) -> Result<(), MeshError> {
        if self.num_vertices.is_some() {
            return Err(editor_error("vertices have already been initialized"));
        }
        self.num_vertices = Some(num_vertices);
        self.coordinates.reserve(num_vertices * self.gdim);
        self.vertex_indices.reserve(num_vertices);
        Ok(())
    }

    pub fn init_cells(&mut self, num_cells: usize) -> Result<(), MeshError> {
        if self.num_cells.is_some() {
            return Err(editor_error("cells have already been initialized"));
        }
        let num_vertices = self
            .num_vertices
            .ok_or_else(|| editor_error("vertices must be initialized before cells"))?;
        if self.vertex_indices.len() != num_vertices {
            return Err(editor_error(format!(
                "only {} of {} vertices were added before initializing cells",
                self.vertex_indices.len(),
                num_vertices
            )));
        }
        self.num_cells = Some(num_cells);
        self.cell_vertices
            .reserve(num_cells * self.cell_type.num_cell_vertices());
        self.cell_indices.reserve(num_cells);
        Ok(())
    }

    /// Adds vertex `index`, which must be the next vertex in order.
    pub fn add_vertex(&mut self, index: usize, x: &[T]) -> Result<(), MeshError> {
        self.add_vertex_global(index, index, x)
    }

    /// Adds vertex `index` with the given global index.
    pub fn add_vertex_global(&mut self, index: usize, global_index: usize, x: &[T]) -> Result<(), MeshError> {
        let num_vertices = self
            .num_vertices
            .ok_or_else(|| editor_error("vertices must be initialized before they are added"))?;
        let next = self.vertex_indices.len();
        if index != next || index >= num_vertices {
            return Err(editor_error(format!(
                "expected vertex {} of {}, got vertex {}",
                next, num_vertices, index
            )));
        }
        if x.len() != self.gdim {
            return Err(editor_error(format!(
                "vertex {} has {} coordinates, expected {}",
                index,
                x.len(),
                self.gdim
            )));
        }
        self.coordinates.extend_from_slice(x);
        self.vertex_indices.push(global_index);
        Ok(())
    }

    /// Adds cell `index`, which must be the next cell in order.
    pub fn add_cell(&mut self, index: usize, vertices: &[usize]) -> Result<(), MeshError> {
        self.add_cell_global(index, index, vertices)
    }

    pub fn add_cell_global(&mut self, index: usize, global_index: usize, vertices: &[usize]) -> Result<(), MeshError> {
        let num_cells = self
            .num_cells
            .ok_or_else(|| editor_error("cells must be initialized before they are added"))?;
        let next = self.cell_indices.len();
        if index != next || index >= num_cells {
            return Err(editor_error(format!("expected cell {} of {}, got cell {}", next, num_cells, index)));
        }
        let n = self.cell_type.num_cell_vertices();
        if vertices.len() != n {
            return Err(editor_error(format!(
                "cell {} has {} vertices, a {} has {}",
                index,
                vertices.len(),
                self.cell_type.description(false),
                n
            )));
        }
        let num_vertices = self.vertex_indices.len();
        if let Some(&v) = vertices.iter().find(|&&v| v >= num_vertices) {
            return Err(editor_error(format!(
                "cell {} refers to vertex {}, but the mesh has {} vertices",
                index, v, num_vertices
            )));
        }
        self.cell_vertices.extend_from_slice(vertices);
        self.cell_indices.push(global_index);
        Ok(())
    }

    /// Finishes editing, optionally bringing the mesh into canonical order.
    pub fn close(self, order: bool) -> Result<Mesh<T>, MeshError> {
        let num_vertices = self
            .num_vertices
            .ok_or_else(|| editor_error("vertices were never initialized"))?;
        let num_cells = self
            .num_cells
            .ok_or_else(|| editor_error("cells were never initialized"))?;
        if self.cell_indices.len() != num_cells {
            return Err(editor_error(format!(
                "only {} of {} cells were added",
                self.cell_indices.len(),
                num_cells
            )));
        }

        let geometry = MeshGeometry::from_coordinates(self.gdim, self.coordinates)?;
        let cells = ConnectivityTable::from_uniform_rows(self.cell_type.num_cell_vertices(), self.cell_vertices)?;
        let mut topology = MeshTopology::new(self.cell_type, num_vertices, cells)?;
        let tdim = self.cell_type.dim();
        topology.set_global_indices(0, self.vertex_indices)?;
        topology.set_global_indices(tdim, self.cell_indices)?;

        let mut mesh = Mesh::new(geometry, topology)?;
        if order {
            mesh.order()?;
        }
        trace!(
            "Closed mesh editor with {} vertices and {} {}",
            num_vertices,
            num_cells,
            self.cell_type.description(true)
        );
        Ok(mesh)
    }
}
