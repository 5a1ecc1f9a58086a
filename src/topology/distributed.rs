//! Global numbering of entities for meshes partitioned across processes.
//!
//! Each process identifies its local entities by a canonical key: the sorted global indices of
//! the entity's vertices. Processes holding the same key hold the same physical entity. The
//! reconciliation below only depends on these keys, so every process computes the same global
//! numbering regardless of how the keys are exchanged.
use crate::topology::MeshTopology;
use crate::MeshError;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

/// The contiguous range of `n` items assigned to `process` out of `num_processes`.
///
/// The first `n % num_processes` processes receive one item more than the rest.
///
/// # Panics
///
/// Panics if `process >= num_processes`, which includes `num_processes == 0`.
pub fn local_range(process: usize, num_processes: usize, n: usize) -> Range<usize> {
    assert!(process < num_processes, "Process index must be smaller than the number of processes");
    let base = n / num_processes;
    let remainder = n % num_processes;
    let begin = process * base + process.min(remainder);
    let end = begin + base + usize::from(process < remainder);
    begin..end
}

/// Global numbering of the entities of one dimension, seen from every process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalNumbering {
    pub num_global_entities: usize,
    /// Global index of every local entity, per process.
    pub global_indices: Vec<Vec<usize>>,
    /// Owning process of every local entity, per process.
    pub owners: Vec<Vec<usize>>,
    /// Local entities that also exist on another process, per process.
    pub shared: Vec<BTreeSet<usize>>,
}

/// Assigns global indices to entities given their canonical keys on every process.
///
/// An entity is owned by the lowest process that holds it. Owned entities receive contiguous
/// global indices, process by process, in local order.
pub fn reconcile_global_numbering(keys: &[Vec<Vec<usize>>]) -> GlobalNumbering {
    // key -> (owner, number of processes holding the key)
    let mut holders: BTreeMap<&[usize], (usize, usize)> = BTreeMap::new();
    for (process, process_keys) in keys.iter().enumerate() {
        for key in process_keys {
            holders
                .entry(key.as_slice())
                .and_modify(|(_, count)| *count += 1)
                .or_insert((process, 1));
        }
    }

    let mut owned_index = BTreeMap::new();
    let mut next_index = 0;
    for (process, process_keys) in keys.iter().enumerate() {
        for key in process_keys {
            let (owner, _) = holders[key.as_slice()];
            if owner == process && !owned_index.contains_key(key.as_slice()) {
                owned_index.insert(key.as_slice(), next_index);
                next_index += 1;
            }
        }
    }

    let mut numbering = GlobalNumbering {
        num_global_entities: next_index,
        global_indices: Vec::with_capacity(keys.len()),
        owners: Vec::with_capacity(keys.len()),
        shared: Vec::with_capacity(keys.len()),
    };
    for process_keys in keys {
        let mut global_indices = Vec::with_capacity(process_keys.len());
        let mut owners = Vec::with_capacity(process_keys.len());
        let mut shared = BTreeSet::new();
        for (local, key) in process_keys.iter().enumerate() {
            let (owner, count) = holders[key.as_slice()];
            global_indices.push(owned_index[key.as_slice()]);
            owners.push(owner);
            if count > 1 {
                shared.insert(local);
            }
        }
        numbering.global_indices.push(global_indices);
        numbering.owners.push(owners);
        numbering.shared.push(shared);
    }
    debug!(
        "Reconciled {} global entities across {} processes",
        numbering.num_global_entities,
        keys.len()
    );
    numbering
}

impl MeshTopology {
    /// Canonical keys of the entities of the given dimension: the sorted global indices of
    /// their vertices.
    pub fn entity_keys(&self, dim: usize) -> Result<Vec<Vec<usize>>, MeshError> {
        self.init(dim)?;
        let entity_vertices = self.connectivity(dim, 0)?;
        let vertex_indices = self
            .global_indices(0)
            .unwrap_or_else(|| (0..self.num_vertices()).collect());
        Ok(entity_vertices
            .rows()
            .map(|vertices| vertices.iter().map(|&v| vertex_indices[v]).sorted_unstable().collect())
            .collect())
    }

    /// Stores the global numbering computed for `process`, marking its shared entities.
    pub fn apply_global_numbering(
        &mut self,
        dim: usize,
        numbering: &GlobalNumbering,
        process: usize,
    ) -> Result<(), MeshError> {
        let num_processes = numbering.global_indices.len();
        if process >= num_processes {
            return Err(MeshError::out_of_bounds("apply_global_numbering", process, num_processes));
        }
        self.init(dim)?;
        self.set_global_indices(dim, numbering.global_indices[process].clone())?;
        self.set_num_global_entities(dim, numbering.num_global_entities)?;
        self.mark_shared(dim, numbering.shared[process].iter().copied())
    }
}
