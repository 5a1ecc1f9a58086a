//! Simple forms for continuous, piecewise linear (P1) functions on simplex meshes.
//!
//! The dofs of a P1 function are its values at the vertices, numbered by the global vertex
//! indices of the mesh.
use crate::assembly::local::{CellContext, ExteriorFacetContext, Form, IntegralType, InteriorFacetContext, Subdomain};
use crate::cell::unsupported_cell;
use crate::mesh::{Mesh, MeshEntity};
use crate::{MeshError, Real};
use eyre::eyre;
use nalgebra::{DMatrix, Point3, Scalar, Vector3};
use numeric_literals::replace_float_literals;
use std::fmt;
use std::fmt::{Debug, Formatter};

/// Gradients of the barycentric coordinates of a simplex, one per vertex.
///
/// Computed in the tangent space of the simplex, so simplices of any co-dimension are
/// supported.
pub fn barycentric_gradients<T: Real>(points: &[Point3<T>]) -> eyre::Result<Vec<Vector3<T>>> {
    if points.is_empty() {
        return Err(eyre!("a simplex needs at least one vertex"));
    }
    let tdim = points.len() - 1;
    let jacobian = DMatrix::from_fn(3, tdim, |i, j| points[j + 1][i] - points[0][i]);
    let metric = jacobian.transpose() * &jacobian;
    let metric_inverse = metric
        .try_inverse()
        .ok_or_else(|| eyre!("cannot compute gradients on a degenerate simplex"))?;
    let g = jacobian * metric_inverse;

    let mut gradients = Vec::with_capacity(tdim + 1);
    gradients.push(Vector3::zeros());
    for k in 0..tdim {
        let gradient = Vector3::new(g[(0, k)], g[(1, k)], g[(2, k)]);
        gradients[0] -= gradient;
        gradients.push(gradient);
    }
    Ok(gradients)
}

fn require_simplices<T: Real>(operation: &'static str, mesh: &Mesh<T>) -> Result<(), MeshError> {
    if mesh.cell_type().is_simplex() {
        Ok(())
    } else {
        Err(unsupported_cell(operation, mesh.cell_type()))
    }
}

fn populate_vertex_dofs<T: Real>(cell: &MeshEntity<T>, dofs: &mut Vec<usize>) -> eyre::Result<()> {
    let topology = cell.mesh().topology();
    for v in cell.vertex_indices()? {
        dofs.push(topology.global_index(0, v).unwrap_or(v));
    }
    Ok(())
}

fn as_real<T: Real>(n: usize) -> T {
    T::from_usize(n).expect("Count must fit in T")
}

/// The measure of the (marked part of the) mesh, integrated cell by cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellVolume {
    subdomain: Subdomain,
}

impl CellVolume {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restricted_to(self, label: usize) -> Self {
        Self {
            subdomain: Subdomain::Label(label),
        }
    }
}

impl<T: Real> Form<T> for CellVolume {
    fn rank(&self) -> usize {
        0
    }

    fn global_dimension(&self, _axis: usize) -> usize {
        1
    }

    fn populate_cell_dofs(&self, _axis: usize, _cell: &MeshEntity<T>, _dofs: &mut Vec<usize>) -> eyre::Result<()> {
        Ok(())
    }

    fn integral(&self, integral_type: IntegralType) -> Option<Subdomain> {
        (integral_type == IntegralType::Cell).then_some(self.subdomain)
    }

    fn tabulate_cell(&self, context: &CellContext<T>, output: &mut [T]) -> eyre::Result<()> {
        output[0] = context.cell.volume()?;
        Ok(())
    }
}

/// The measure of the (marked part of the) domain boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExteriorFacetMeasure {
    subdomain: Subdomain,
}

impl ExteriorFacetMeasure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restricted_to(self, label: usize) -> Self {
        Self {
            subdomain: Subdomain::Label(label),
        }
    }
}

impl<T: Real> Form<T> for ExteriorFacetMeasure {
    fn rank(&self) -> usize {
        0
    }

    fn global_dimension(&self, _axis: usize) -> usize {
        1
    }

    fn populate_cell_dofs(&self, _axis: usize, _cell: &MeshEntity<T>, _dofs: &mut Vec<usize>) -> eyre::Result<()> {
        Ok(())
    }

    fn integral(&self, integral_type: IntegralType) -> Option<Subdomain> {
        (integral_type == IntegralType::ExteriorFacet).then_some(self.subdomain)
    }

    fn tabulate_exterior_facet(&self, context: &ExteriorFacetContext<T>, output: &mut [T]) -> eyre::Result<()> {
        output[0] = context.cell.facet_area(context.local_facet)?;
        Ok(())
    }
}

/// The stiffness matrix `a(u, v) = ∫ κ ∇u · ∇v dx`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct P1Laplace<T> {
    num_dofs: usize,
    coefficient: T,
    subdomain: Subdomain,
}

impl<T: Real> P1Laplace<T> {
    pub fn new(mesh: &Mesh<T>) -> Result<Self, MeshError> {
        require_simplices("P1Laplace", mesh)?;
        Ok(Self {
            num_dofs: mesh.topology().size_global(0),
            coefficient: T::one(),
            subdomain: Subdomain::Everywhere,
        })
    }

    pub fn with_coefficient(self, coefficient: T) -> Self {
        Self { coefficient, ..self }
    }

    pub fn restricted_to(self, label: usize) -> Self {
        Self {
            subdomain: Subdomain::Label(label),
            ..self
        }
    }
}

impl<T: Real> Form<T> for P1Laplace<T> {
    fn rank(&self) -> usize {
        2
    }

    fn global_dimension(&self, _axis: usize) -> usize {
        self.num_dofs
    }

    fn populate_cell_dofs(&self, _axis: usize, cell: &MeshEntity<T>, dofs: &mut Vec<usize>) -> eyre::Result<()> {
        populate_vertex_dofs(cell, dofs)
    }

    fn integral(&self, integral_type: IntegralType) -> Option<Subdomain> {
        (integral_type == IntegralType::Cell).then_some(self.subdomain)
    }

    fn tabulate_cell(&self, context: &CellContext<T>, output: &mut [T]) -> eyre::Result<()> {
        let gradients = barycentric_gradients(&context.cell.points()?)?;
        let scale = self.coefficient * context.cell.volume()?;
        let n = gradients.len();
        for i in 0..n {
            for j in 0..n {
                output[i * n + j] = scale * gradients[i].dot(&gradients[j]);
            }
        }
        Ok(())
    }
}

/// The load vector `L(v) = ∫ f v dx`, with `f` evaluated at cell midpoints.
pub struct P1Source<T: Scalar> {
    num_dofs: usize,
    source: Box<dyn Fn(&Point3<T>) -> T + Send + Sync>,
    subdomain: Subdomain,
}

impl<T: Real> Debug for P1Source<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("P1Source")
            .field("num_dofs", &self.num_dofs)
            .field("subdomain", &self.subdomain)
            .finish_non_exhaustive()
    }
}

impl<T: Real> P1Source<T> {
    pub fn new(mesh: &Mesh<T>, source: impl Fn(&Point3<T>) -> T + Send + Sync + 'static) -> Result<Self, MeshError> {
        require_simplices("P1Source", mesh)?;
        Ok(Self {
            num_dofs: mesh.topology().size_global(0),
            source: Box::new(source),
            subdomain: Subdomain::Everywhere,
        })
    }

    pub fn constant(mesh: &Mesh<T>, value: T) -> Result<Self, MeshError> {
        Self::new(mesh, move |_| value)
    }

    pub fn restricted_to(self, label: usize) -> Self {
        Self {
            subdomain: Subdomain::Label(label),
            ..self
        }
    }
}

impl<T: Real> Form<T> for P1Source<T> {
    fn rank(&self) -> usize {
        1
    }

    fn global_dimension(&self, _axis: usize) -> usize {
        self.num_dofs
    }

    fn populate_cell_dofs(&self, _axis: usize, cell: &MeshEntity<T>, dofs: &mut Vec<usize>) -> eyre::Result<()> {
        populate_vertex_dofs(cell, dofs)
    }

    fn integral(&self, integral_type: IntegralType) -> Option<Subdomain> {
        (integral_type == IntegralType::Cell).then_some(self.subdomain)
    }

    fn tabulate_cell(&self, context: &CellContext<T>, output: &mut [T]) -> eyre::Result<()> {
        let f = (self.source)(&context.cell.midpoint()?);
        let value = f * context.cell.volume()? / as_real::<T>(output.len());
        output.fill(value);
        Ok(())
    }
}

/// Penalizes jumps of the normal derivative across interior facets:
/// `j(u, v) = γ h² ∫_F [∂u/∂n] [∂v/∂n] ds`, with `h` the mean diameter of the two cells.
///
/// Vanishes for functions that are linear on the whole mesh. Requires cells of full dimension
/// (`gdim == D`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct P1JumpPenalty<T> {
    num_dofs: usize,
    penalty: T,
    subdomain: Subdomain,
}

impl<T: Real> P1JumpPenalty<T> {
    pub fn new(mesh: &Mesh<T>, penalty: T) -> Result<Self, MeshError> {
        require_simplices("P1JumpPenalty", mesh)?;
        Ok(Self {
            num_dofs: mesh.topology().size_global(0),
            penalty,
            subdomain: Subdomain::Everywhere,
        })
    }

    pub fn restricted_to(self, label: usize) -> Self {
        Self {
            subdomain: Subdomain::Label(label),
            ..self
        }
    }
}

impl<T: Real> Form<T> for P1JumpPenalty<T> {
    fn rank(&self) -> usize {
        2
    }

    fn global_dimension(&self, _axis: usize) -> usize {
        self.num_dofs
    }

    fn populate_cell_dofs(&self, _axis: usize, cell: &MeshEntity<T>, dofs: &mut Vec<usize>) -> eyre::Result<()> {
        populate_vertex_dofs(cell, dofs)
    }

    fn integral(&self, integral_type: IntegralType) -> Option<Subdomain> {
        (integral_type == IntegralType::InteriorFacet).then_some(self.subdomain)
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn tabulate_interior_facet(&self, context: &InteriorFacetContext<T>, output: &mut [T]) -> eyre::Result<()> {
        // Normal derivative of every basis function of the macro element, on its own side
        let mut normal_derivatives = Vec::new();
        let mut h = 0.0;
        for (cell, &local_facet) in context.cells.iter().zip(&context.local_facets) {
            let n = cell.normal(local_facet)?;
            normal_derivatives.extend(
                barycentric_gradients(&cell.points()?)?
                    .iter()
                    .map(|gradient| gradient.dot(&n)),
            );
            h += 0.5 * cell.diameter()?;
        }
        let area = context.cells[0].facet_area(context.local_facets[0])?;
        let scale = self.penalty * h * h * area;
        let n = normal_derivatives.len();
        for i in 0..n {
            for j in 0..n {
                output[i * n + j] = scale * normal_derivatives[i] * normal_derivatives[j];
            }
        }
        Ok(())
    }
}
