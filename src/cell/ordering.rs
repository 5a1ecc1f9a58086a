//! Canonical local numbering of cells and their sub-entities.
//!
//! Neighbouring cells only agree on the orientation of a shared entity if both number its
//! vertices the same way. The convention is:
//!
//! - simplices list their vertices in ascending global index;
//! - quadrilaterals and hexahedra start at the vertex with the smallest global index, and its
//!   neighbours along the reference axes follow in ascending global index (the numbering stays
//!   a valid tensor-product numbering);
//! - sub-entity `i` of a cell sits at position `i` of the cell's connectivity row, so that its
//!   vertices are those of the reference pattern `i` (for simplices, facet `i` excludes local
//!   vertex `i`).
use crate::cell::CellType;
use crate::topology::{MeshTopology, TopologyData};
use crate::MeshError;

/// Reorders `vertices` of an entity of the given type into canonical order, comparing vertices
/// by `key`.
pub(crate) fn canonical_vertex_order(entity_type: CellType, vertices: &mut [usize], key: impl Fn(usize) -> usize) {
    match entity_type {
        CellType::Quadrilateral => tensor_order(vertices, 2, key),
        CellType::Hexahedron => tensor_order(vertices, 3, key),
        _ => vertices.sort_unstable_by_key(|&v| key(v)),
    }
}

/// Orders the `2^dim` vertices of a tensor-product cell, where local vertex `i` sits at the
/// reference corner given by the bits of `i`. The cell is reflected so that the smallest vertex
/// comes first, then its axes are permuted so that its neighbours ascend.
fn tensor_order(vertices: &mut [usize], dim: usize, key: impl Fn(usize) -> usize) {
    let n = 1 << dim;
    let first = (0..n).min_by_key(|&i| key(vertices[i])).unwrap_or(0);
    let reflected: Vec<usize> = (0..n).map(|i| vertices[i ^ first]).collect();
    let mut axes: Vec<usize> = (0..dim).collect();
    axes.sort_by_key(|&axis| key(reflected[1 << axis]));
    for (i, vertex) in vertices.iter_mut().take(n).enumerate() {
        let source = axes
            .iter()
            .enumerate()
            .filter(|&(bit, _)| (i >> bit) & 1 == 1)
            .fold(0, |source, (_, &axis)| source | (1 << axis));
        *vertex = reflected[source];
    }
}

fn global_key(local_to_global: &[usize]) -> impl '_ + Fn(usize) -> usize {
    move |v| local_to_global.get(v).copied().unwrap_or(v)
}

fn same_vertex_set(a: &[usize], b: &[usize]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

/// Reorders `entities` so that position `i` holds the entity whose vertices are those of
/// `patterns[i]` applied to `owner_vertices`.
fn match_patterns<'a>(
    patterns: &[&[usize]],
    owner_vertices: &[usize],
    entities: &[usize],
    entity_vertices: impl Fn(usize) -> &'a [usize],
) -> Result<Vec<usize>, MeshError> {
    let mut pattern_vertices = Vec::new();
    patterns
        .iter()
        .map(|pattern| {
            pattern_vertices.clear();
            pattern_vertices.extend(pattern.iter().map(|&i| owner_vertices[i]));
            entities
                .iter()
                .copied()
                .find(|&e| same_vertex_set(entity_vertices(e), &pattern_vertices))
                .ok_or_else(|| {
                    MeshError::MalformedInput(format!(
                        "no incident entity with vertices {:?} in {:?}",
                        pattern_vertices, entities
                    ))
                })
        })
        .collect()
}

/// Computes the canonical form of every row touched by ordering `cell` and hands each one to
/// `visit(d0, d1, row, canonical)`.
fn canonical_rows(
    data: &TopologyData,
    cell: usize,
    local_to_global: &[usize],
    mut visit: impl FnMut(usize, usize, usize, Vec<usize>) -> Result<(), MeshError>,
) -> Result<(), MeshError> {
    let cell_type = data.cell_type;
    let tdim = cell_type.dim();
    let key = global_key(local_to_global);

    let cells = data.table(tdim, 0).ok_or(MeshError::MissingConnectivity {
        operation: "order",
        d0: tdim,
        d1: 0,
    })?;
    if cell >= cells.len() {
        return Err(MeshError::out_of_bounds("order", cell, cells.len()));
    }
    let mut cell_vertices = cells.row(cell).to_vec();
    canonical_vertex_order(cell_type, &mut cell_vertices, &key);

    for d in 1..tdim {
        let (Some(cell_entities), Some(entity_vertices)) = (data.table(tdim, d), data.table(d, 0)) else {
            continue;
        };
        let entity_type = cell_type.entity_type(d)?;

        // Canonical vertex rows of the cell's sub-entities, used for all matching below
        let mut canonical_vertices = Vec::new();
        for &e in cell_entities.row(cell) {
            let mut vertices = entity_vertices.row(e).to_vec();
            canonical_vertex_order(entity_type, &mut vertices, &key);
            canonical_vertices.push((e, vertices));
        }
        let canonical_row = |e: usize| -> &[usize] {
            canonical_vertices
                .iter()
                .find(|(entity, _)| *entity == e)
                .map(|(_, vertices)| vertices.as_slice())
                .unwrap_or_else(|| entity_vertices.row(e))
        };

        let patterns = cell_type.reference_entities(d)?;
        let row = match_patterns(patterns, &cell_vertices, cell_entities.row(cell), canonical_row)?;
        visit(tdim, d, cell, row)?;

        for d1 in 1..d {
            let (Some(sub_entities), Some(sub_vertices)) = (data.table(d, d1), data.table(d1, 0)) else {
                continue;
            };
            let patterns = entity_type.reference_entities(d1)?;
            for &e in cell_entities.row(cell) {
                let row = match_patterns(patterns, canonical_row(e), sub_entities.row(e), |s| sub_vertices.row(s))?;
                visit(d, d1, e, row)?;
            }
        }

        for (e, vertices) in canonical_vertices {
            visit(d, 0, e, vertices)?;
        }
    }

    visit(tdim, 0, cell, cell_vertices)
}

impl CellType {
    /// Brings the local numbering of `cell` into canonical order with respect to the given
    /// global vertex numbering.
    ///
    /// Only connectivity that has already been computed is reordered. Ordering an ordered cell
    /// leaves the topology unchanged.
    pub fn order(&self, cell: usize, topology: &mut MeshTopology, local_to_global: &[usize]) -> Result<(), MeshError> {
        self.check_mesh_type("order", topology)?;
        let mut updates = Vec::new();
        canonical_rows(&topology.read(), cell, local_to_global, |d0, d1, row, canonical| {
            updates.push((d0, d1, row, canonical));
            Ok(())
        })?;

        let data = topology.data_mut();
        // Sub-entity vertex rows are applied before any row that was matched against them
        for (d0, d1, row, canonical) in updates {
            if let Some(table) = data.table_mut(d0, d1) {
                table.row_mut(row).copy_from_slice(&canonical);
            }
        }
        Ok(())
    }

    /// Whether the local numbering of `cell` is canonical.
    pub fn ordered(&self, cell: usize, topology: &MeshTopology, local_to_global: &[usize]) -> Result<bool, MeshError> {
        self.check_mesh_type("ordered", topology)?;
        let data = topology.read();
        let mut ordered = true;
        canonical_rows(&data, cell, local_to_global, |d0, d1, row, canonical| {
            if let Some(table) = data.table(d0, d1) {
                ordered &= table.row(row) == canonical.as_slice();
            }
            Ok(())
        })?;
        Ok(ordered)
    }

    /// Position in the cell's edge list of the edge with the vertices of reference edge `i`.
    ///
    /// For triangles this is the edge opposite local vertex `i`.
    pub fn find_edge(&self, i: usize, cell: usize, topology: &MeshTopology) -> Result<usize, MeshError> {
        self.check_mesh_type("find_edge", topology)?;
        let patterns = self.reference_entities(1)?;
        let pattern = patterns
            .get(i)
            .ok_or_else(|| MeshError::out_of_bounds("find_edge", i, patterns.len()))?;
        let tdim = self.dim();
        let cells = topology.cells();
        if cell >= cells.len() {
            return Err(MeshError::out_of_bounds("find_edge", cell, cells.len()));
        }
        let cell_vertices = cells.row(cell);
        let cell_edges = topology.connectivity(tdim, 1)?;
        let edge_vertices = topology.connectivity(1, 0)?;
        let wanted = [cell_vertices[pattern[0]], cell_vertices[pattern[1]]];
        cell_edges
            .row(cell)
            .iter()
            .position(|&e| same_vertex_set(edge_vertices.row(e), &wanted))
            .ok_or_else(|| {
                MeshError::MalformedInput(format!("cell {} has no edge with vertices {:?}", cell, wanted))
            })
    }

    fn check_mesh_type(&self, operation: &'static str, topology: &MeshTopology) -> Result<(), MeshError> {
        if topology.cell_type() == *self {
            Ok(())
        } else {
            Err(MeshError::UnsupportedCellType {
                operation,
                cell_type: topology.cell_type(),
            })
        }
    }
}
