//! Local element tensors and the forms that compute them.
use crate::cell::CellOrientation;
use crate::mesh::MeshEntity;
use crate::Real;
use eyre::eyre;

/// The kinds of entities a form can be integrated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntegralType {
    Cell,
    /// Facets with exactly one incident cell.
    ExteriorFacet,
    /// Facets with exactly two incident cells.
    InteriorFacet,
}

/// The part of the mesh an integral is restricted to.
///
/// A label restriction only takes effect if the mesh carries markers for the entity dimension
/// of the integral (cells for cell integrals, facets for facet integrals). Entities without a
/// marker never match a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subdomain {
    #[default]
    Everywhere,
    Label(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct CellContext<'a, T: Real> {
    pub cell: MeshEntity<'a, T>,
    pub orientation: Option<CellOrientation>,
}

#[derive(Debug, Clone, Copy)]
pub struct ExteriorFacetContext<'a, T: Real> {
    pub cell: MeshEntity<'a, T>,
    pub facet: MeshEntity<'a, T>,
    /// Position of the facet among the facets of the cell.
    pub local_facet: usize,
    pub orientation: Option<CellOrientation>,
}

/// A facet together with its two cells, the `+` side first.
///
/// The `+` side is the cell with the lower index.
#[derive(Debug, Clone, Copy)]
pub struct InteriorFacetContext<'a, T: Real> {
    pub facet: MeshEntity<'a, T>,
    pub cells: [MeshEntity<'a, T>; 2],
    pub local_facets: [usize; 2],
    pub orientations: [Option<CellOrientation>; 2],
}

/// A variational form of rank 0 (functional), 1 (linear form) or 2 (bilinear form).
///
/// The form supplies a degree-of-freedom map for every axis of the tensor and computes local
/// tensors on the entities it integrates over. Local tensors are written to a zeroed, flat
/// buffer in row-major order: entry `(i, j)` of a rank-2 tensor is at `i * n_1 + j`, where
/// `n_1` is the number of local dofs of axis 1.
///
/// On interior facets the local dofs of an axis are those of the `+` cell followed by those of
/// the `-` cell.
pub trait Form<T: Real> {
    fn rank(&self) -> usize;

    /// Number of global dofs along the given axis.
    fn global_dimension(&self, axis: usize) -> usize;

    /// Writes the global dofs along the given axis associated with the cell.
    fn populate_cell_dofs(&self, axis: usize, cell: &MeshEntity<T>, dofs: &mut Vec<usize>) -> eyre::Result<()>;

    /// The subdomain the integral of the given type is restricted to, or `None` if the form has
    /// no such integral.
    fn integral(&self, integral_type: IntegralType) -> Option<Subdomain> {
        let _ = integral_type;
        None
    }

    fn tabulate_cell(&self, context: &CellContext<T>, output: &mut [T]) -> eyre::Result<()> {
        let _ = (context, output);
        Err(eyre!("form does not have a cell integral"))
    }

    fn tabulate_exterior_facet(&self, context: &ExteriorFacetContext<T>, output: &mut [T]) -> eyre::Result<()> {
        let _ = (context, output);
        Err(eyre!("form does not have an exterior facet integral"))
    }

    fn tabulate_interior_facet(&self, context: &InteriorFacetContext<T>, output: &mut [T]) -> eyre::Result<()> {
        let _ = (context, output);
        Err(eyre!("form does not have an interior facet integral"))
    }
}

impl<T: Real, F: Form<T> + ?Sized> Form<T> for &F {
    fn rank(&self) -> usize {
        F::rank(self)
    }

    fn global_dimension(&self, axis: usize) -> usize {
        F::global_dimension(self, axis)
    }

    fn populate_cell_dofs(&self, axis: usize, cell: &MeshEntity<T>, dofs: &mut Vec<usize>) -> eyre::Result<()> {
        F::populate_cell_dofs(self, axis, cell, dofs)
    }

    fn integral(&self, integral_type: IntegralType) -> Option<Subdomain> {
        F::integral(self, integral_type)
    }

    fn tabulate_cell(&self, context: &CellContext<T>, output: &mut [T]) -> eyre::Result<()> {
        F::tabulate_cell(self, context, output)
    }

    fn tabulate_exterior_facet(&self, context: &ExteriorFacetContext<T>, output: &mut [T]) -> eyre::Result<()> {
        F::tabulate_exterior_facet(self, context, output)
    }

    fn tabulate_interior_facet(&self, context: &InteriorFacetContext<T>, output: &mut [T]) -> eyre::Result<()> {
        F::tabulate_interior_facet(self, context, output)
    }
}
