use crate::{min_enclosing_circle, CsgError, CsgGeometry};
use serde::{Deserialize, Serialize};

/// Resolution parameters for CSG mesh generation.
///
/// When `mesh_resolution` is non-zero it takes precedence over `cell_size`: the cell size is
/// then chosen so that the diameter of the smallest circle enclosing the geometry is covered by
/// `mesh_resolution` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshParameters {
    pub mesh_resolution: usize,
    pub triangle_shape_bound: f64,
    pub cell_size: f64,
}

impl Default for MeshParameters {
    fn default() -> Self {
        Self {
            mesh_resolution: 64,
            triangle_shape_bound: 0.125,
            cell_size: 0.25,
        }
    }
}

impl MeshParameters {
    pub fn with_resolution(mesh_resolution: usize) -> Self {
        Self {
            mesh_resolution,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), CsgError> {
        if !(self.triangle_shape_bound > 0.0) {
            return Err(CsgError::InvalidParameters(format!(
                "triangle_shape_bound must be positive, got {}",
                self.triangle_shape_bound
            )));
        }
        if self.mesh_resolution == 0 && !(self.cell_size > 0.0) {
            return Err(CsgError::InvalidParameters(format!(
                "cell_size must be positive when mesh_resolution is 0, got {}",
                self.cell_size
            )));
        }
        Ok(())
    }

    /// The cell size handed to the triangulation backend for the given geometry.
    pub fn effective_cell_size(&self, geometry: &CsgGeometry) -> Result<f64, CsgError> {
        self.validate()?;
        if self.mesh_resolution == 0 {
            return Ok(self.cell_size);
        }
        let (_, radius) = min_enclosing_circle(&geometry.vertices())
            .ok_or_else(|| CsgError::InvalidParameters("geometry has no vertices".to_string()))?;
        Ok(2.0 * radius / self.mesh_resolution as f64)
    }
}
