//! Error types for mesh construction, topology computation and geometric queries.
use crate::cell::CellType;
use fenris_csg::CsgError;
use thiserror::Error;

/// Errors raised by mesh-level operations.
///
/// Assembly reports errors through [`eyre::Report`]; every `MeshError` converts into one
/// with `?`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// A dimension outside the range supported by the cell type or mesh was requested.
    #[error("{operation}: illegal dimension {dim} for {cell_type} (topological dimension {tdim})")]
    IllegalDimension {
        operation: &'static str,
        cell_type: CellType,
        dim: usize,
        tdim: usize,
    },
    /// An entity of the wrong dimension was passed to a cell type operation.
    #[error("{operation}: expected an entity of dimension {expected}, got dimension {actual}")]
    EntityDimensionMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{operation}: not implemented for {cell_type} cells embedded in R^{gdim}")]
    UnsupportedGeometricDimension {
        operation: &'static str,
        cell_type: CellType,
        gdim: usize,
    },
    #[error("{operation}: not supported for {cell_type} cells")]
    UnsupportedCellType {
        operation: &'static str,
        cell_type: CellType,
    },
    #[error("{operation}: connectivity ({d0}, {d1}) is not available")]
    MissingConnectivity {
        operation: &'static str,
        d0: usize,
        d1: usize,
    },
    #[error("{operation}: degenerate {cell_type} with zero volume")]
    DegenerateEntity {
        operation: &'static str,
        cell_type: CellType,
    },
    #[error("{operation}: index {index} is out of bounds (length {len})")]
    IndexOutOfBounds {
        operation: &'static str,
        index: usize,
        len: usize,
    },
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("mesh editor: {0}")]
    Editor(String),
    #[error("{operation}: {reason}")]
    Unsupported { operation: &'static str, reason: String },
    #[error(transparent)]
    Csg(#[from] CsgError),
}

impl MeshError {
    pub(crate) fn out_of_bounds(operation: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds { operation, index, len }
    }
}
