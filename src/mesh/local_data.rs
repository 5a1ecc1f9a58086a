use crate::cell::CellType;
use crate::editor::MeshEditor;
use crate::mesh::Mesh;
use crate::topology::local_range;
use crate::{MeshError, Real};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// The part of a mesh read by one process, before any topology has been built.
///
/// Vertices and cells are distributed in contiguous ranges of their global indices. Cells may
/// refer to vertices outside the local vertex range; the coordinates of those vertices are
/// stored in `ghost_vertices`. Domain markers are given as `(cell, local entity, label)`
/// triples per entity dimension, where `cell` is a global cell index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct LocalMeshData<T> {
    pub cell_type: CellType,
    pub gdim: usize,
    pub num_global_vertices: usize,
    pub num_global_cells: usize,
    pub vertex_range: Range<usize>,
    /// Coordinates of the vertices in `vertex_range`, `gdim` per vertex.
    pub vertex_coordinates: Vec<T>,
    /// Coordinates of vertices outside `vertex_range` referenced by local cells.
    pub ghost_vertices: BTreeMap<usize, Vec<T>>,
    pub cell_range: Range<usize>,
    /// Global vertex indices of the cells in `cell_range`.
    pub cell_vertices: Vec<Vec<usize>>,
    pub domain_data: BTreeMap<usize, Vec<(usize, usize, usize)>>,
}

impl<T: Real> LocalMeshData<T> {
    pub fn new(cell_type: CellType, gdim: usize) -> Self {
        Self {
            cell_type,
            gdim,
            num_global_vertices: 0,
            num_global_cells: 0,
            vertex_range: 0..0,
            vertex_coordinates: Vec::new(),
            ghost_vertices: BTreeMap::new(),
            cell_range: 0..0,
            cell_vertices: Vec::new(),
            domain_data: BTreeMap::new(),
        }
    }

    /// Splits a complete mesh description into the parts read by each of `num_processes`
    /// processes, including the ghost vertices each part needs.
    pub fn partition(
        cell_type: CellType,
        gdim: usize,
        coordinates: &[T],
        cells: &[Vec<usize>],
        num_processes: usize,
    ) -> Result<Vec<Self>, MeshError> {
        if num_processes == 0 || gdim == 0 || coordinates.len() % gdim != 0 {
            return Err(MeshError::MalformedInput(format!(
                "cannot partition {} coordinates of dimension {} across {} processes",
                coordinates.len(),
                gdim,
                num_processes
            )));
        }
        let num_vertices = coordinates.len() / gdim;
        let parts = (0..num_processes)
            .map(|process| {
                let vertex_range = local_range(process, num_processes, num_vertices);
                let cell_range = local_range(process, num_processes, cells.len());
                let mut data = Self::new(cell_type, gdim);
                data.num_global_vertices = num_vertices;
                data.num_global_cells = cells.len();
                data.vertex_coordinates = coordinates[gdim * vertex_range.start..gdim * vertex_range.end].to_vec();
                data.cell_vertices = cells[cell_range.clone()].to_vec();
                for &v in data.cell_vertices.iter().flatten() {
                    if !vertex_range.contains(&v) && v < num_vertices {
                        data.ghost_vertices
                            .insert(v, coordinates[gdim * v..gdim * (v + 1)].to_vec());
                    }
                }
                data.vertex_range = vertex_range;
                data.cell_range = cell_range;
                data
            })
            .collect::<Vec<_>>();
        for part in &parts {
            part.validate()?;
        }
        Ok(parts)
    }

    /// Records a domain marker for the local entity `local_entity` of dimension `dim` of the
    /// global cell `cell`.
    pub fn add_marker(&mut self, dim: usize, cell: usize, local_entity: usize, label: usize) {
        self.domain_data
            .entry(dim)
            .or_default()
            .push((cell, local_entity, label));
    }

    fn num_local_vertices(&self) -> usize {
        self.vertex_range.len()
    }

    /// Coordinates of the vertex with the given global index.
    pub fn vertex(&self, global_index: usize) -> Option<&[T]> {
        if self.vertex_range.contains(&global_index) {
            let local = global_index - self.vertex_range.start;
            self.vertex_coordinates
                .get(self.gdim * local..self.gdim * (local + 1))
        } else {
            self.ghost_vertices.get(&global_index).map(Vec::as_slice)
        }
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        let malformed = |message: String| Err(MeshError::MalformedInput(message));
        if !(1..=3).contains(&self.gdim) || self.gdim < self.cell_type.dim() {
            return malformed(format!(
                "cannot embed {} cells in R^{}",
                self.cell_type.description(false),
                self.gdim
            ));
        }
        if self.vertex_range.end > self.num_global_vertices || self.cell_range.end > self.num_global_cells {
            return malformed("local ranges exceed the global number of entities".to_string());
        }
        if self.vertex_coordinates.len() != self.gdim * self.num_local_vertices() {
            return malformed(format!(
                "{} coordinates given for {} vertices of dimension {}",
                self.vertex_coordinates.len(),
                self.num_local_vertices(),
                self.gdim
            ));
        }
        if self.cell_vertices.len() != self.cell_range.len() {
            return malformed(format!(
                "{} cells given for the cell range {:?}",
                self.cell_vertices.len(),
                self.cell_range
            ));
        }
        if let Some((v, x)) = self.ghost_vertices.iter().find(|(_, x)| x.len() != self.gdim) {
            return malformed(format!("ghost vertex {} has {} coordinates", v, x.len()));
        }
        let n = self.cell_type.num_cell_vertices();
        for (i, vertices) in self.cell_vertices.iter().enumerate() {
            if vertices.len() != n {
                return malformed(format!(
                    "cell {} has {} vertices, a {} has {}",
                    self.cell_range.start + i,
                    vertices.len(),
                    self.cell_type.description(false),
                    n
                ));
            }
            if let Some(&v) = vertices.iter().find(|&&v| self.vertex(v).is_none()) {
                return malformed(format!(
                    "cell {} refers to vertex {} whose coordinates are not available",
                    self.cell_range.start + i,
                    v
                ));
            }
        }
        for (&dim, entries) in &self.domain_data {
            let num_entities = self.cell_type.num_entities(dim)?;
            if let Some(&(cell, entity, _)) = entries.iter().find(|&&(_, e, _)| e >= num_entities) {
                return malformed(format!(
                    "marker refers to local entity {} of dimension {} of cell {}, but a {} has {}",
                    entity,
                    dim,
                    cell,
                    self.cell_type.description(false),
                    num_entities
                ));
            }
        }
        Ok(())
    }
}

impl<T: Real> Mesh<T> {
    /// Builds the local mesh of one process.
    ///
    /// Local vertices are the vertices referenced by local cells, numbered in order of first
    /// reference. Vertices and cells keep their global indices. The mesh is not ordered, so that
    /// local entity numbers of domain markers refer to the cells as given.
    pub fn from_local_data(data: &LocalMeshData<T>) -> Result<Self, MeshError> {
        data.validate()?;
        if data.cell_vertices.is_empty() {
            warn!("Local mesh data for cell range {:?} contains no cells", data.cell_range);
        }

        let mut local_index = BTreeMap::new();
        let mut vertex_indices = Vec::new();
        for &v in data.cell_vertices.iter().flatten() {
            local_index.entry(v).or_insert_with(|| {
                vertex_indices.push(v);
                vertex_indices.len() - 1
            });
        }

        let mut editor = MeshEditor::open(data.cell_type, data.gdim)?;
        editor.init_vertices(vertex_indices.len())?;
        for (i, &v) in vertex_indices.iter().enumerate() {
            let x = data
                .vertex(v)
                .ok_or_else(|| MeshError::out_of_bounds("from_local_data", v, data.num_global_vertices))?;
            editor.add_vertex_global(i, v, x)?;
        }
        editor.init_cells(data.cell_vertices.len())?;
        let mut cell = Vec::new();
        for (i, vertices) in data.cell_vertices.iter().enumerate() {
            cell.clear();
            cell.extend(vertices.iter().map(|v| local_index[v]));
            editor.add_cell_global(i, data.cell_range.start + i, &cell)?;
        }
        let mut mesh = editor.close(false)?;

        let tdim = mesh.dim();
        let topology = mesh.topology_mut();
        topology.set_num_global_entities(0, data.num_global_vertices)?;
        topology.set_num_global_entities(tdim, data.num_global_cells)?;
        for (&dim, entries) in &data.domain_data {
            for &(cell, local_entity, label) in entries {
                if !data.cell_range.contains(&cell) {
                    continue;
                }
                let local_cell = cell - data.cell_range.start;
                let entity = if dim == tdim {
                    local_cell
                } else {
                    mesh.topology().connectivity(tdim, dim)?.row(local_cell)[local_entity]
                };
                mesh.domains_mut().set_marker(dim, entity, label);
            }
        }
        debug!(
            "Built local mesh with {} vertices and {} cells (global cells {:?})",
            mesh.num_vertices(),
            mesh.num_cells(),
            data.cell_range
        );
        Ok(mesh)
    }
}
