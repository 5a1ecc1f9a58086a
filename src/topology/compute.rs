//! Construction of derived entities and connectivity from the cell-vertex incidence.
//!
//! Entities are numbered in the order in which they are first encountered while scanning
//! cells in ascending order, so the result only depends on the cell-vertex table and never on
//! hash iteration order.
use crate::cell::canonical_vertex_order;
use crate::topology::{ConnectivityTable, TopologyData};
use crate::MeshError;
use log::trace;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Computes the entities of dimension `dim` and stores (dim, 0) and (D, dim).
pub(super) fn compute_entities(data: &mut TopologyData, dim: usize) -> Result<usize, MeshError> {
    data.check_dim("init", dim)?;
    if let Some(n) = data.size(dim) {
        return Ok(n);
    }

    let tdim = data.tdim();
    let cell_type = data.cell_type;
    let entity_type = cell_type.entity_type(dim)?;
    let cells = cell_vertices(data)?;
    // Canonical vertex order follows the global numbering, as in `CellType::order`
    let local_to_global = data.global_indices[0].clone();
    let global_key = |v: usize| {
        local_to_global
            .as_ref()
            .and_then(|indices| indices.get(v).copied())
            .unwrap_or(v)
    };

    let mut keys: FxHashMap<Vec<usize>, usize> = FxHashMap::default();
    let mut entity_vertices = ConnectivityTable::new();
    let mut cell_entities = ConnectivityTable::new();
    let mut row = Vec::new();
    for cell in cells.rows() {
        row.clear();
        for mut vertices in cell_type.create_entities(dim, cell)? {
            canonical_vertex_order(entity_type, &mut vertices, global_key);
            let mut key = vertices.clone();
            key.sort_unstable();
            let next_index = keys.len();
            let index = *keys.entry(key).or_insert_with(|| {
                entity_vertices.push_row(&vertices);
                next_index
            });
            row.push(index);
        }
        cell_entities.push_row(&row);
    }

    let num_entities = entity_vertices.len();
    trace!(
        "Computed {} entities of dimension {} for {} {}",
        num_entities,
        dim,
        cells.len(),
        cell_type.description(true)
    );
    data.set_table(dim, 0, entity_vertices);
    data.set_table(tdim, dim, cell_entities);
    data.num_entities[dim] = Some(num_entities);
    if data.global_indices[dim].is_none() {
        data.global_indices[dim] = Some((0..num_entities).collect());
    }
    Ok(num_entities)
}

fn cell_vertices(data: &TopologyData) -> Result<Arc<ConnectivityTable>, MeshError> {
    let tdim = data.tdim();
    data.table(tdim, 0)
        .cloned()
        .ok_or(MeshError::MissingConnectivity {
            operation: "compute_entities",
            d0: tdim,
            d1: 0,
        })
}

/// Returns the table (d0, d1), computing it and anything it depends on first.
fn require(data: &mut TopologyData, d0: usize, d1: usize) -> Result<Arc<ConnectivityTable>, MeshError> {
    compute_connectivity(data, d0, d1)?;
    data.table(d0, d1)
        .cloned()
        .ok_or(MeshError::MissingConnectivity {
            operation: "compute_connectivity",
            d0,
            d1,
        })
}

/// Computes the connectivity (d0, d1) unless it is already present.
pub(super) fn compute_connectivity(data: &mut TopologyData, d0: usize, d1: usize) -> Result<(), MeshError> {
    data.check_dim("compute_connectivity", d0)?;
    data.check_dim("compute_connectivity", d1)?;
    if data.table(d0, d1).is_some() {
        return Ok(());
    }

    let tdim = data.tdim();
    trace!("Computing connectivity ({}, {}) for {} mesh", d0, d1, data.cell_type);

    // Entity construction produces (d, 0) and (D, d) together
    if d1 == 0 && d0 > 0 {
        compute_entities(data, d0)?;
        return Ok(());
    }
    if d0 == tdim && d1 < tdim {
        compute_entities(data, d1)?;
        return Ok(());
    }

    let table = if d0 == d1 {
        compute_neighbours(data, d0)?
    } else if d0 < d1 {
        let num_rows = compute_entities(data, d0)?;
        require(data, d1, d0)?.transpose(num_rows)
    } else {
        compute_from_intersection(data, d0, d1)?
    };
    data.set_table(d0, d1, table);
    Ok(())
}

/// Entities of dimension `dim` sharing a vertex with each entity. Every vertex is its own
/// only vertex, so (0, 0) is the identity.
fn compute_neighbours(data: &mut TopologyData, dim: usize) -> Result<ConnectivityTable, MeshError> {
    let num_entities = compute_entities(data, dim)?;
    if dim == 0 {
        return ConnectivityTable::from_uniform_rows(1, (0..num_entities).collect());
    }

    let to_link = require(data, dim, 0)?;
    let from_link = require(data, 0, dim)?;

    let mut table = ConnectivityTable::new();
    let mut neighbours = Vec::new();
    for (entity, links) in to_link.rows().enumerate() {
        neighbours.clear();
        for &link in links {
            neighbours.extend(from_link.row(link).iter().copied().filter(|&e| e != entity));
        }
        neighbours.sort_unstable();
        neighbours.dedup();
        table.push_row(&neighbours);
    }
    Ok(table)
}

/// Computes (d0, d1) for `D > d0 > d1 > 0`, ordering each row by the reference pattern of the
/// d0 entity type.
fn compute_from_intersection(data: &mut TopologyData, d0: usize, d1: usize) -> Result<ConnectivityTable, MeshError> {
    let entity_type = data.cell_type.entity_type(d0)?;
    let patterns = entity_type.reference_entities(d1)?;
    let d0_vertices = require(data, d0, 0)?;
    let d1_vertices = require(data, d1, 0)?;
    let vertex_to_d1 = require(data, 0, d1)?;

    let mut table = ConnectivityTable::new();
    let mut candidates = Vec::new();
    let mut row = Vec::with_capacity(patterns.len());
    let mut pattern_vertices = Vec::new();
    let mut candidate_vertices = Vec::new();
    for (entity, vertices) in d0_vertices.rows().enumerate() {
        candidates.clear();
        for &v in vertices {
            candidates.extend_from_slice(vertex_to_d1.row(v));
        }
        candidates.sort_unstable();
        candidates.dedup();

        row.clear();
        for pattern in patterns {
            pattern_vertices.clear();
            pattern_vertices.extend(pattern.iter().map(|&i| vertices[i]));
            pattern_vertices.sort_unstable();
            let found = candidates.iter().copied().find(|&candidate| {
                candidate_vertices.clear();
                candidate_vertices.extend_from_slice(d1_vertices.row(candidate));
                candidate_vertices.sort_unstable();
                candidate_vertices == pattern_vertices
            });
            match found {
                Some(index) => row.push(index),
                None => {
                    return Err(MeshError::MalformedInput(format!(
                        "{} {} has no incident entity of dimension {} with vertices {:?}",
                        entity_type, entity, d1, pattern_vertices
                    )))
                }
            }
        }
        table.push_row(&row);
    }
    Ok(table)
}
