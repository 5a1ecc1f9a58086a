//! Integer labels attached to mesh entities, used to mark subdomains and boundary parts.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sparse assignment of labels to entities, per entity dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshDomains {
    markers: BTreeMap<usize, BTreeMap<usize, usize>>,
}

impl MeshDomains {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels the given entity, replacing any previous label.
    pub fn set_marker(&mut self, dim: usize, entity: usize, label: usize) -> Option<usize> {
        self.markers.entry(dim).or_default().insert(entity, label)
    }

    pub fn get_marker(&self, dim: usize, entity: usize) -> Option<usize> {
        self.markers.get(&dim)?.get(&entity).copied()
    }

    /// All labelled entities of the given dimension, with their labels.
    pub fn markers(&self, dim: usize) -> Option<&BTreeMap<usize, usize>> {
        self.markers.get(&dim)
    }

    /// Whether any entity of the given dimension carries a label.
    pub fn has_markers(&self, dim: usize) -> bool {
        self.markers.get(&dim).map_or(false, |m| !m.is_empty())
    }

    /// Entities of the given dimension with the given label, in ascending order.
    pub fn entities_with_label(&self, dim: usize, label: usize) -> Vec<usize> {
        self.markers
            .get(&dim)
            .map(|markers| {
                markers
                    .iter()
                    .filter(|&(_, &l)| l == label)
                    .map(|(&entity, _)| entity)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Dimensions with at least one labelled entity.
    pub fn marked_dims(&self) -> impl '_ + Iterator<Item = usize> {
        self.markers
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|(&dim, _)| dim)
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.markers.values().all(BTreeMap::is_empty)
    }
}
