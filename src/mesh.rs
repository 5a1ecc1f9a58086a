//! The mesh aggregate: geometry, topology and domain markers of a single cell type.
use crate::cell::{CellOrientation, CellType};
use crate::domains::MeshDomains;
use crate::geometry::MeshGeometry;
use crate::topology::{ConnectivityTable, MeshTopology};
use crate::{MeshError, Real};
use log::trace;
use nalgebra::{Scalar, Vector3};
use rayon::prelude::*;
use std::fmt;
use std::fmt::{Display, Formatter};

mod boundary;
mod coloring;
mod entity;
mod local_data;
pub mod procedural;
mod refinement;
mod search;

pub use boundary::{BoundaryKind, BoundaryMesh};
pub use entity::MeshEntity;
pub use local_data::LocalMeshData;
pub use search::MeshSearch;

/// An unstructured mesh with cells of a single type.
///
/// Entities other than vertices and cells are computed on demand by the topology. The mesh is
/// *ordered* when the local numbering of every cell follows the canonical convention described
/// in [`CellType::order`]; assembly relies on this.
#[derive(Debug, Clone)]
pub struct Mesh<T: Scalar> {
    geometry: MeshGeometry<T>,
    topology: MeshTopology,
    domains: MeshDomains,
    /// The `up` direction and the orientation of every cell relative to it.
    cell_orientations: Option<(Vector3<T>, Vec<CellOrientation>)>,
}

impl<T: Real> Mesh<T> {
    pub fn new(geometry: MeshGeometry<T>, topology: MeshTopology) -> Result<Self, MeshError> {
        if geometry.num_vertices() != topology.num_vertices() {
            return Err(MeshError::MalformedInput(format!(
                "geometry has {} vertices, topology has {}",
                geometry.num_vertices(),
                topology.num_vertices()
            )));
        }
        if geometry.dim() < topology.dim() {
            return Err(MeshError::MalformedInput(format!(
                "cannot embed {} cells in R^{}",
                topology.cell_type(),
                geometry.dim()
            )));
        }
        Ok(Self {
            geometry,
            topology,
            domains: MeshDomains::default(),
            cell_orientations: None,
        })
    }

    /// Creates a mesh from flat vertex coordinates and cell-vertex rows.
    pub fn from_vertices_and_cells(
        cell_type: CellType,
        gdim: usize,
        coordinates: Vec<T>,
        cell_vertices: Vec<usize>,
    ) -> Result<Self, MeshError> {
        let geometry = MeshGeometry::from_coordinates(gdim, coordinates)?;
        let cells = ConnectivityTable::from_uniform_rows(cell_type.num_cell_vertices(), cell_vertices)?;
        let topology = MeshTopology::new(cell_type, geometry.num_vertices(), cells)?;
        Self::new(geometry, topology)
    }

    pub fn geometry(&self) -> &MeshGeometry<T> {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut MeshGeometry<T> {
        &mut self.geometry
    }

    pub fn topology(&self) -> &MeshTopology {
        &self.topology
    }

    pub fn topology_mut(&mut self) -> &mut MeshTopology {
        &mut self.topology
    }

    pub fn domains(&self) -> &MeshDomains {
        &self.domains
    }

    pub fn domains_mut(&mut self) -> &mut MeshDomains {
        &mut self.domains
    }

    pub fn cell_type(&self) -> CellType {
        self.topology.cell_type()
    }

    /// Topological dimension.
    pub fn dim(&self) -> usize {
        self.topology.dim()
    }

    /// Geometric dimension.
    pub fn gdim(&self) -> usize {
        self.geometry.dim()
    }

    pub fn num_vertices(&self) -> usize {
        self.topology.num_vertices()
    }

    pub fn num_cells(&self) -> usize {
        self.topology.num_cells()
    }

    /// Number of facets, computing them if necessary.
    pub fn num_facets(&self) -> Result<usize, MeshError> {
        match self.dim() {
            0 => Ok(0),
            d => self.topology.init(d - 1),
        }
    }

    /// Number of entities of the given dimension, computing them if necessary.
    pub fn num_entities(&self, dim: usize) -> Result<usize, MeshError> {
        self.topology.init(dim)
    }

    pub fn entity(&self, dim: usize, index: usize) -> Result<MeshEntity<'_, T>, MeshError> {
        let n = self.topology.init(dim)?;
        if index < n {
            Ok(MeshEntity::new(self, dim, index))
        } else {
            Err(MeshError::out_of_bounds("entity", index, n))
        }
    }

    pub fn cell(&self, index: usize) -> Result<MeshEntity<'_, T>, MeshError> {
        self.entity(self.dim(), index)
    }

    pub fn cells(&self) -> impl '_ + Iterator<Item = MeshEntity<'_, T>> {
        let dim = self.dim();
        (0..self.num_cells()).map(move |index| MeshEntity::new(self, dim, index))
    }

    /// All entities of the given dimension.
    pub fn entities(&self, dim: usize) -> Result<impl '_ + Iterator<Item = MeshEntity<'_, T>>, MeshError> {
        let n = self.topology.init(dim)?;
        Ok((0..n).map(move |index| MeshEntity::new(self, dim, index)))
    }

    /// Computes the entities of the given dimension and returns their number.
    pub fn init(&self, dim: usize) -> Result<usize, MeshError> {
        self.topology.init(dim)
    }

    pub fn init_connectivity(&self, d0: usize, d1: usize) -> Result<(), MeshError> {
        self.topology.init_connectivity(d0, d1)
    }

    pub fn init_all(&self) -> Result<(), MeshError> {
        self.topology.init_all()
    }

    /// Discards all derived entities and connectivity.
    pub fn clean(&mut self) {
        self.topology.clean();
    }

    /// Global vertex numbering, used as the key of the canonical ordering.
    fn local_to_global_vertices(&self) -> Vec<usize> {
        self.topology
            .global_indices(0)
            .unwrap_or_else(|| (0..self.num_vertices()).collect())
    }

    /// Brings every cell into canonical local order.
    pub fn order(&mut self) -> Result<(), MeshError> {
        let cell_type = self.cell_type();
        let local_to_global = self.local_to_global_vertices();
        trace!("Ordering {} {}", self.num_cells(), cell_type.description(true));
        for cell in 0..self.num_cells() {
            cell_type.order(cell, &mut self.topology, &local_to_global)?;
        }
        // Reordering vertices may reverse the orientation of a cell
        if let Some((up, _)) = self.cell_orientations.take() {
            self.init_cell_orientations(&up)?;
        }
        Ok(())
    }

    /// Whether every cell is in canonical local order.
    pub fn ordered(&self) -> Result<bool, MeshError> {
        let cell_type = self.cell_type();
        let local_to_global = self.local_to_global_vertices();
        for cell in 0..self.num_cells() {
            if !cell_type.ordered(cell, &self.topology, &local_to_global)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Evaluates `f` on every cell in parallel and folds the results with `combine`.
    fn reduce_cells(
        &self,
        f: impl Sync + Fn(&MeshEntity<'_, T>) -> Result<T, MeshError>,
        combine: fn(T, T) -> T,
    ) -> Result<T, MeshError> {
        let dim = self.dim();
        let values = (0..self.num_cells())
            .into_par_iter()
            .map(|index| f(&MeshEntity::new(self, dim, index)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(values.into_iter().reduce(combine).unwrap_or_else(T::zero))
    }

    /// Smallest cell diameter, or zero for meshes without cells.
    pub fn hmin(&self) -> Result<T, MeshError> {
        self.reduce_cells(|cell| cell.diameter(), |a, b| a.min(b))
    }

    /// Largest cell diameter.
    pub fn hmax(&self) -> Result<T, MeshError> {
        self.reduce_cells(|cell| cell.diameter(), |a, b| a.max(b))
    }

    /// Smallest inradius.
    pub fn rmin(&self) -> Result<T, MeshError> {
        self.reduce_cells(|cell| cell.inradius(), |a, b| a.min(b))
    }

    /// Largest inradius.
    pub fn rmax(&self) -> Result<T, MeshError> {
        self.reduce_cells(|cell| cell.inradius(), |a, b| a.max(b))
    }

    pub fn radius_ratio_min(&self) -> Result<T, MeshError> {
        self.reduce_cells(|cell| cell.radius_ratio(), |a, b| a.min(b))
    }

    pub fn radius_ratio_max(&self) -> Result<T, MeshError> {
        self.reduce_cells(|cell| cell.radius_ratio(), |a, b| a.max(b))
    }

    /// Computes the orientation of every cell relative to the `up` direction.
    ///
    /// Only meaningful for manifold meshes of co-dimension one.
    pub fn init_cell_orientations(&mut self, up: &Vector3<T>) -> Result<(), MeshError> {
        let orientations = self
            .cells()
            .map(|cell| cell.orientation(up))
            .collect::<Result<Vec<_>, _>>()?;
        self.cell_orientations = Some((*up, orientations));
        Ok(())
    }

    pub fn cell_orientations(&self) -> Option<&[CellOrientation]> {
        self.cell_orientations
            .as_ref()
            .map(|(_, orientations)| orientations.as_slice())
    }

    /// A new mesh consisting of the given cells.
    ///
    /// Vertices are renumbered in the order in which the cells reference them. Global indices
    /// of vertices and cells, together with the global entity counts, cell markers and vertex
    /// markers are carried over.
    pub fn keep_cells(&self, cells: &[usize]) -> Result<Self, MeshError> {
        let tdim = self.dim();
        let cell_vertices = self.topology.cells();
        let mut vertex_map = vec![None; self.num_vertices()];
        let mut kept_vertices = Vec::new();
        let mut new_cells = ConnectivityTable::new();
        let mut row = Vec::new();
        for &cell in cells {
            let vertices = cell_vertices
                .get(cell)
                .ok_or_else(|| MeshError::out_of_bounds("keep_cells", cell, cell_vertices.len()))?;
            row.clear();
            for &v in vertices {
                let new_index = *vertex_map[v].get_or_insert_with(|| {
                    kept_vertices.push(v);
                    kept_vertices.len() - 1
                });
                row.push(new_index);
            }
            new_cells.push_row(&row);
        }

        let mut geometry = MeshGeometry::new(self.gdim())?;
        for &v in &kept_vertices {
            geometry.push(self.geometry.x(v));
        }
        let mut topology = MeshTopology::new(self.cell_type(), kept_vertices.len(), new_cells)?;
        let vertex_indices = self.local_to_global_vertices();
        topology.set_global_indices(0, kept_vertices.iter().map(|&v| vertex_indices[v]).collect())?;
        let cell_indices = self
            .topology
            .global_indices(tdim)
            .unwrap_or_else(|| (0..self.num_cells()).collect());
        topology.set_global_indices(tdim, cells.iter().map(|&c| cell_indices[c]).collect())?;
        topology.set_num_global_entities(0, self.topology.size_global(0))?;
        topology.set_num_global_entities(tdim, self.topology.size_global(tdim))?;

        let mut mesh = Self::new(geometry, topology)?;
        for (new_index, &cell) in cells.iter().enumerate() {
            if let Some(label) = self.domains.get_marker(tdim, cell) {
                mesh.domains.set_marker(tdim, new_index, label);
            }
        }
        for (new_index, &v) in kept_vertices.iter().enumerate() {
            if let Some(label) = self.domains.get_marker(0, v) {
                mesh.domains.set_marker(0, new_index, label);
            }
        }
        Ok(mesh)
    }
}

impl<T: Real> Display for Mesh<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Mesh of topological dimension {} ({}) in R^{} with {} vertices and {} cells>",
            self.dim(),
            self.cell_type().description(true),
            self.gdim(),
            self.num_vertices(),
            self.num_cells()
        )
    }
}
