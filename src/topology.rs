//! Mesh topology: entity counts and incidence relations between entities of all dimensions.
//!
//! The cell-vertex incidence (D, 0) is given at construction. Every other entity set and
//! connectivity (d0, d1) is computed on first request and cached. The cache is an arena of
//! optional tables indexed by `(d0, d1)`, so [`MeshTopology::clean`] is a bulk reset.
use crate::cell::CellType;
use crate::MeshError;
use log::trace;
use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;

mod compute;
pub mod distributed;

pub use distributed::{local_range, reconcile_global_numbering, GlobalNumbering};

/// Compressed rows of entity indices: row `i` lists the entities incident to entity `i`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityTable {
    offsets: Vec<usize>,
    indices: Vec<usize>,
}

impl Debug for ConnectivityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows()).finish()
    }
}

impl Default for ConnectivityTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityTable {
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            indices: Vec::new(),
        }
    }

    pub fn from_offsets_and_indices(offsets: Vec<usize>, indices: Vec<usize>) -> Result<Self, MeshError> {
        let valid = offsets.first() == Some(&0)
            && offsets.last() == Some(&indices.len())
            && offsets.windows(2).all(|w| w[0] <= w[1]);
        if valid {
            Ok(Self { offsets, indices })
        } else {
            Err(MeshError::MalformedInput(
                "connectivity offsets must start at zero, be non-decreasing and end at the number of indices"
                    .to_string(),
            ))
        }
    }

    /// Creates a table where every row has the same length.
    pub fn from_uniform_rows(row_len: usize, indices: Vec<usize>) -> Result<Self, MeshError> {
        if row_len == 0 || indices.len() % row_len != 0 {
            return Err(MeshError::MalformedInput(format!(
                "{} indices cannot be split into rows of length {}",
                indices.len(),
                row_len
            )));
        }
        let offsets = (0..=indices.len() / row_len).map(|i| i * row_len).collect();
        Ok(Self { offsets, indices })
    }

    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a [usize]>) -> Self {
        let mut table = Self::new();
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of stored connections.
    pub fn num_connections(&self) -> usize {
        self.indices.len()
    }

    pub fn get(&self, row: usize) -> Option<&[usize]> {
        let begin = *self.offsets.get(row)?;
        let end = *self.offsets.get(row + 1)?;
        self.indices.get(begin..end)
    }

    /// # Panics
    ///
    /// Panics if the row index is out of bounds.
    pub fn row(&self, row: usize) -> &[usize] {
        &self.indices[self.offsets[row]..self.offsets[row + 1]]
    }

    pub(crate) fn row_mut(&mut self, row: usize) -> &mut [usize] {
        &mut self.indices[self.offsets[row]..self.offsets[row + 1]]
    }

    pub fn rows(&self) -> impl '_ + Iterator<Item = &[usize]> {
        self.offsets
            .windows(2)
            .map(move |w| &self.indices[w[0]..w[1]])
    }

    pub fn push_row(&mut self, row: &[usize]) {
        self.indices.extend_from_slice(row);
        self.offsets.push(self.indices.len());
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The transposed relation, with `num_columns` rows. Rows of the result are sorted.
    pub fn transpose(&self, num_columns: usize) -> Self {
        let mut counts = vec![0; num_columns + 1];
        for &j in &self.indices {
            counts[j + 1] += 1;
        }
        for j in 0..num_columns {
            counts[j + 1] += counts[j];
        }
        let offsets = counts.clone();
        let mut next = counts;
        let mut indices = vec![0; self.indices.len()];
        // Visiting rows in ascending order leaves every transposed row sorted
        for (i, row) in self.rows().enumerate() {
            for &j in row {
                indices[next[j]] = i;
                next[j] += 1;
            }
        }
        Self { offsets, indices }
    }
}

/// Cached topology state guarded by the lock inside [`MeshTopology`].
#[derive(Debug, Clone)]
pub(crate) struct TopologyData {
    pub(crate) cell_type: CellType,
    pub(crate) num_entities: Vec<Option<usize>>,
    pub(crate) num_global_entities: Vec<Option<usize>>,
    pub(crate) global_indices: Vec<Option<Vec<usize>>>,
    pub(crate) shared_entities: Vec<BTreeSet<usize>>,
    connectivity: Vec<Option<Arc<ConnectivityTable>>>,
}

impl TopologyData {
    pub(crate) fn tdim(&self) -> usize {
        self.cell_type.dim()
    }

    fn slot(&self, d0: usize, d1: usize) -> usize {
        d0 * (self.tdim() + 1) + d1
    }

    pub(crate) fn table(&self, d0: usize, d1: usize) -> Option<&Arc<ConnectivityTable>> {
        self.connectivity[self.slot(d0, d1)].as_ref()
    }

    pub(crate) fn set_table(&mut self, d0: usize, d1: usize, table: ConnectivityTable) {
        let slot = self.slot(d0, d1);
        self.connectivity[slot] = Some(Arc::new(table));
    }

    /// Mutable access to a cached table, cloning it first if it is shared with a reader.
    pub(crate) fn table_mut(&mut self, d0: usize, d1: usize) -> Option<&mut ConnectivityTable> {
        let slot = self.slot(d0, d1);
        self.connectivity[slot].as_mut().map(Arc::make_mut)
    }

    pub(crate) fn size(&self, dim: usize) -> Option<usize> {
        self.num_entities.get(dim).copied().flatten()
    }

    pub(crate) fn check_dim(&self, operation: &'static str, dim: usize) -> Result<(), MeshError> {
        if dim <= self.tdim() {
            Ok(())
        } else {
            Err(MeshError::IllegalDimension {
                operation,
                cell_type: self.cell_type,
                dim,
                tdim: self.tdim(),
            })
        }
    }
}

/// Entities and connectivity of a mesh with cells of a single type.
pub struct MeshTopology {
    cell_type: CellType,
    data: RwLock<TopologyData>,
}

impl Debug for MeshTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshTopology")
            .field("cell_type", &self.cell_type)
            .field("data", &*self.data.read())
            .finish()
    }
}

impl Clone for MeshTopology {
    fn clone(&self) -> Self {
        Self {
            cell_type: self.cell_type,
            data: RwLock::new(self.data.read().clone()),
        }
    }
}

impl MeshTopology {
    /// Creates a topology from the cell-vertex incidence of `num_vertices` vertices.
    pub fn new(cell_type: CellType, num_vertices: usize, cells: ConnectivityTable) -> Result<Self, MeshError> {
        let n = cell_type.num_cell_vertices();
        for (c, row) in cells.rows().enumerate() {
            if row.len() != n {
                return Err(MeshError::MalformedInput(format!(
                    "cell {} has {} vertices, but a {} has {}",
                    c,
                    row.len(),
                    cell_type,
                    n
                )));
            }
            if let Some(&v) = row.iter().find(|&&v| v >= num_vertices) {
                return Err(MeshError::out_of_bounds("MeshTopology::new", v, num_vertices));
            }
        }

        let tdim = cell_type.dim();
        let num_cells = cells.len();
        let mut data = TopologyData {
            cell_type,
            num_entities: vec![None; tdim + 1],
            num_global_entities: vec![None; tdim + 1],
            global_indices: vec![None; tdim + 1],
            shared_entities: vec![BTreeSet::new(); tdim + 1],
            connectivity: vec![None; (tdim + 1) * (tdim + 1)],
        };
        data.num_entities[0] = Some(num_vertices);
        data.num_entities[tdim] = Some(num_cells);
        data.global_indices[0] = Some((0..num_vertices).collect());
        data.global_indices[tdim] = Some((0..num_cells).collect());
        data.set_table(tdim, 0, cells);

        Ok(Self {
            cell_type,
            data: RwLock::new(data),
        })
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    /// Topological dimension.
    pub fn dim(&self) -> usize {
        self.cell_type.dim()
    }

    /// Number of local entities of the given dimension, or zero if they have not been computed.
    pub fn size(&self, dim: usize) -> usize {
        self.data.read().size(dim).unwrap_or(0)
    }

    /// Number of entities across all processes. Equals [`size`](Self::size) unless a global
    /// numbering has been applied.
    pub fn size_global(&self, dim: usize) -> usize {
        let data = self.data.read();
        data.num_global_entities
            .get(dim)
            .copied()
            .flatten()
            .or_else(|| data.size(dim))
            .unwrap_or(0)
    }

    pub fn num_vertices(&self) -> usize {
        self.size(0)
    }

    pub fn num_cells(&self) -> usize {
        self.size(self.dim())
    }

    /// The cell-vertex connectivity (D, 0).
    pub fn cells(&self) -> Arc<ConnectivityTable> {
        let data = self.data.read();
        data.table(data.tdim(), 0)
            .cloned()
            .expect("Cell-vertex connectivity is always present")
    }

    /// Computes the entities of the given dimension if necessary and returns their number.
    pub fn init(&self, dim: usize) -> Result<usize, MeshError> {
        if let Some(n) = self.data.read().size(dim) {
            return Ok(n);
        }
        let mut data = self.data.write();
        compute::compute_entities(&mut data, dim)
    }

    /// Computes the connectivity (d0, d1) if necessary.
    pub fn init_connectivity(&self, d0: usize, d1: usize) -> Result<(), MeshError> {
        self.connectivity(d0, d1).map(|_| ())
    }

    /// Computes all entities and all connectivity.
    pub fn init_all(&self) -> Result<(), MeshError> {
        let tdim = self.dim();
        for d in 0..=tdim {
            self.init(d)?;
        }
        for d0 in 0..=tdim {
            for d1 in 0..=tdim {
                self.init_connectivity(d0, d1)?;
            }
        }
        Ok(())
    }

    /// The connectivity (d0, d1), computed and cached on first request.
    pub fn connectivity(&self, d0: usize, d1: usize) -> Result<Arc<ConnectivityTable>, MeshError> {
        {
            let data = self.data.read();
            data.check_dim("connectivity", d0)?;
            data.check_dim("connectivity", d1)?;
            if let Some(table) = data.table(d0, d1) {
                return Ok(table.clone());
            }
        }
        let mut data = self.data.write();
        compute::compute_connectivity(&mut data, d0, d1)?;
        data.table(d0, d1).cloned().ok_or(MeshError::MissingConnectivity {
            operation: "connectivity",
            d0,
            d1,
        })
    }

    /// The connectivity (d0, d1) if it has already been computed.
    pub fn try_connectivity(&self, d0: usize, d1: usize) -> Option<Arc<ConnectivityTable>> {
        let data = self.data.read();
        if d0 > data.tdim() || d1 > data.tdim() {
            return None;
        }
        data.table(d0, d1).cloned()
    }

    /// Discards all computed entities and connectivity, keeping only the cell-vertex incidence
    /// and the vertex and cell numbering.
    pub fn clean(&mut self) {
        let data = self.data.get_mut();
        let tdim = data.tdim();
        trace!("Cleaning topology of {} mesh", data.cell_type);
        let cells = data.table(tdim, 0).cloned();
        for table in data.connectivity.iter_mut() {
            *table = None;
        }
        let slot = data.slot(tdim, 0);
        data.connectivity[slot] = cells;
        for d in 1..tdim {
            data.num_entities[d] = None;
            data.num_global_entities[d] = None;
            data.global_indices[d] = None;
            data.shared_entities[d].clear();
        }
    }

    /// Global indices of the entities of the given dimension, if known.
    pub fn global_indices(&self, dim: usize) -> Option<Vec<usize>> {
        self.data.read().global_indices.get(dim).cloned().flatten()
    }

    pub fn global_index(&self, dim: usize, index: usize) -> Option<usize> {
        self.data
            .read()
            .global_indices
            .get(dim)?
            .as_ref()?
            .get(index)
            .copied()
    }

    pub fn set_global_indices(&mut self, dim: usize, indices: Vec<usize>) -> Result<(), MeshError> {
        let data = self.data.get_mut();
        data.check_dim("set_global_indices", dim)?;
        let size = data.size(dim).ok_or(MeshError::MissingConnectivity {
            operation: "set_global_indices",
            d0: dim,
            d1: 0,
        })?;
        if indices.len() != size {
            return Err(MeshError::MalformedInput(format!(
                "{} global indices given for {} entities of dimension {}",
                indices.len(),
                size,
                dim
            )));
        }
        data.global_indices[dim] = Some(indices);
        Ok(())
    }

    pub fn set_num_global_entities(&mut self, dim: usize, n: usize) -> Result<(), MeshError> {
        let data = self.data.get_mut();
        data.check_dim("set_num_global_entities", dim)?;
        data.num_global_entities[dim] = Some(n);
        Ok(())
    }

    /// Marks local entities as shared with other processes.
    pub fn mark_shared(&mut self, dim: usize, entities: impl IntoIterator<Item = usize>) -> Result<(), MeshError> {
        let data = self.data.get_mut();
        data.check_dim("mark_shared", dim)?;
        data.shared_entities[dim].extend(entities);
        Ok(())
    }

    pub fn is_shared(&self, dim: usize, index: usize) -> bool {
        self.data
            .read()
            .shared_entities
            .get(dim)
            .map(|shared| shared.contains(&index))
            .unwrap_or(false)
    }

    /// Number of cells incident to a facet across all processes. A facet shared with another
    /// process has one incident cell there.
    pub fn num_global_cells_of_facet(&self, facet: usize) -> Result<usize, MeshError> {
        let tdim = self.dim();
        if tdim == 0 {
            return Err(MeshError::IllegalDimension {
                operation: "num_global_cells_of_facet",
                cell_type: self.cell_type,
                dim: 0,
                tdim,
            });
        }
        let facet_cells = self.connectivity(tdim - 1, tdim)?;
        let local = facet_cells
            .get(facet)
            .ok_or_else(|| MeshError::out_of_bounds("num_global_cells_of_facet", facet, facet_cells.len()))?
            .len();
        Ok(local + usize::from(self.is_shared(tdim - 1, facet)))
    }

    pub fn shared_entities(&self, dim: usize) -> Vec<usize> {
        self.data
            .read()
            .shared_entities
            .get(dim)
            .map(|shared| shared.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, TopologyData> {
        self.data.read()
    }

    pub(crate) fn data_mut(&mut self) -> &mut TopologyData {
        self.data.get_mut()
    }
}
