use crate::assembly::local::{
    CellContext, ExteriorFacetContext, Form, IntegralType, InteriorFacetContext, Subdomain,
};
use crate::assembly::tensor::{DirectAdd, GlobalTensor, ScatterAdd};
use crate::cell::CellOrientation;
use crate::domains::MeshDomains;
use crate::mesh::{Mesh, MeshEntity};
use crate::topology::ConnectivityTable;
use crate::{MeshError, Real};
use eyre::{bail, eyre, WrapErr};
use log::debug;
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use std::collections::BTreeSet;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// The local tensor computed on one cell, as recorded by [`Assembler::assemble_cells_recorded`].
#[derive(Debug, Clone, PartialEq)]
pub struct CellTensor<T> {
    pub cell: usize,
    pub values: Vec<T>,
}

/// Number of entities visited and skipped by one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyCount {
    pub assembled: usize,
    pub skipped: usize,
}

fn in_subdomain(domains: &MeshDomains, dim: usize, entity: usize, subdomain: Subdomain) -> bool {
    match subdomain {
        Subdomain::Everywhere => true,
        Subdomain::Label(label) => !domains.has_markers(dim) || domains.get_marker(dim, entity) == Some(label),
    }
}

fn local_facet(cell_facets: &ConnectivityTable, cell: usize, facet: usize) -> Result<usize, MeshError> {
    cell_facets
        .row(cell)
        .iter()
        .position(|&f| f == facet)
        .ok_or_else(|| MeshError::MalformedInput(format!("facet {} is not a facet of cell {}", facet, cell)))
}

/// Dofs of every axis of a form, reused across entities.
struct DofBuffers {
    dofs: Vec<Vec<usize>>,
    cell_dofs: Vec<usize>,
}

impl DofBuffers {
    fn new<T: Real>(form: &dyn Form<T>) -> eyre::Result<Self> {
        let rank = form.rank();
        if rank > 2 {
            bail!("forms of rank {} are not supported", rank);
        }
        Ok(Self {
            dofs: vec![Vec::new(); rank],
            cell_dofs: Vec::new(),
        })
    }

    /// Concatenated dofs of the given cells along every axis.
    fn populate<T: Real>(&mut self, form: &dyn Form<T>, cells: &[MeshEntity<T>]) -> eyre::Result<()> {
        for (axis, dofs) in self.dofs.iter_mut().enumerate() {
            dofs.clear();
            for cell in cells {
                self.cell_dofs.clear();
                form.populate_cell_dofs(axis, cell, &mut self.cell_dofs)?;
                dofs.extend_from_slice(&self.cell_dofs);
            }
        }
        Ok(())
    }

    fn local_size(&self) -> usize {
        self.dofs.iter().map(Vec::len).product()
    }

    fn with_slices<R>(&self, f: impl FnOnce(&[&[usize]]) -> R) -> R {
        let empty: &[usize] = &[];
        let slices = [
            self.dofs.first().map_or(empty, Vec::as_slice),
            self.dofs.get(1).map_or(empty, Vec::as_slice),
        ];
        f(&slices[..self.dofs.len()])
    }
}

/// Assembles global tensors from forms by visiting cells, exterior facets and interior facets.
///
/// Local blocks are passed to a [`ScatterAdd`] strategy, which defaults to adding them
/// unchanged.
pub struct Assembler<T: Real> {
    scatter: Box<dyn ScatterAdd<T> + Send + Sync>,
}

impl<T: Real> Default for Assembler<T> {
    fn default() -> Self {
        Self {
            scatter: Box::new(DirectAdd),
        }
    }
}

impl<T: Real> Debug for Assembler<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assembler").finish_non_exhaustive()
    }
}

impl<T: Real> Assembler<T> {
    pub fn with_scatter(self, scatter: impl ScatterAdd<T> + Send + Sync + 'static) -> Self {
        Self {
            scatter: Box::new(scatter),
        }
    }

    /// Adds all integrals of the form into the tensor.
    ///
    /// The tensor is not zeroed first.
    pub fn assemble(&self, tensor: &mut dyn GlobalTensor<T>, form: &dyn Form<T>, mesh: &Mesh<T>) -> eyre::Result<()> {
        check_tensor(tensor, form)?;
        if form.integral(IntegralType::Cell).is_some() {
            self.assemble_cells(tensor, form, mesh)?;
        }
        if form.integral(IntegralType::ExteriorFacet).is_some() {
            self.assemble_exterior_facets(tensor, form, mesh)?;
        }
        if form.integral(IntegralType::InteriorFacet).is_some() {
            self.assemble_interior_facets(tensor, form, mesh)?;
        }
        Ok(())
    }

    pub fn assemble_cells(
        &self,
        tensor: &mut dyn GlobalTensor<T>,
        form: &dyn Form<T>,
        mesh: &Mesh<T>,
    ) -> eyre::Result<AssemblyCount> {
        self.cells_impl(tensor, form, mesh, None)
    }

    /// Like [`assemble_cells`](Self::assemble_cells), additionally recording every local tensor.
    pub fn assemble_cells_recorded(
        &self,
        tensor: &mut dyn GlobalTensor<T>,
        form: &dyn Form<T>,
        mesh: &Mesh<T>,
        results: &mut Vec<CellTensor<T>>,
    ) -> eyre::Result<AssemblyCount> {
        self.cells_impl(tensor, form, mesh, Some(results))
    }

    fn cells_impl(
        &self,
        tensor: &mut dyn GlobalTensor<T>,
        form: &dyn Form<T>,
        mesh: &Mesh<T>,
        mut results: Option<&mut Vec<CellTensor<T>>>,
    ) -> eyre::Result<AssemblyCount> {
        check_tensor(tensor, form)?;
        let mut local = Vec::new();
        let count = visit_cells(form, mesh, |context, buffers| {
            local.clear();
            local.resize(buffers.local_size(), T::zero());
            form.tabulate_cell(context, &mut local)
                .wrap_err_with(|| format!("failed to tabulate cell {}", context.cell.index()))?;
            if let Some(results) = results.as_deref_mut() {
                results.push(CellTensor {
                    cell: context.cell.index(),
                    values: local.clone(),
                });
            }
            buffers.with_slices(|dofs| self.scatter.scatter_add(tensor, &local, dofs))
        })?;
        debug!("Assembled {} cells ({} skipped)", count.assembled, count.skipped);
        Ok(count)
    }

    pub fn assemble_exterior_facets(
        &self,
        tensor: &mut dyn GlobalTensor<T>,
        form: &dyn Form<T>,
        mesh: &Mesh<T>,
    ) -> eyre::Result<AssemblyCount> {
        check_tensor(tensor, form)?;
        let mut local = Vec::new();
        let count = visit_exterior_facets(form, mesh, |context, buffers| {
            local.clear();
            local.resize(buffers.local_size(), T::zero());
            form.tabulate_exterior_facet(context, &mut local)
                .wrap_err_with(|| format!("failed to tabulate exterior facet {}", context.facet.index()))?;
            buffers.with_slices(|dofs| self.scatter.scatter_add(tensor, &local, dofs))
        })?;
        debug!("Assembled {} exterior facets ({} skipped)", count.assembled, count.skipped);
        Ok(count)
    }

    pub fn assemble_interior_facets(
        &self,
        tensor: &mut dyn GlobalTensor<T>,
        form: &dyn Form<T>,
        mesh: &Mesh<T>,
    ) -> eyre::Result<AssemblyCount> {
        check_tensor(tensor, form)?;
        let mut local = Vec::new();
        let count = visit_interior_facets(form, mesh, |context, buffers| {
            local.clear();
            local.resize(buffers.local_size(), T::zero());
            form.tabulate_interior_facet(context, &mut local)
                .wrap_err_with(|| format!("failed to tabulate interior facet {}", context.facet.index()))?;
            buffers.with_slices(|dofs| self.scatter.scatter_add(tensor, &local, dofs))
        })?;
        debug!("Assembled {} interior facets ({} skipped)", count.assembled, count.skipped);
        Ok(count)
    }

    /// The sparsity pattern of a bilinear form: every entry any of its integrals adds to.
    pub fn assemble_pattern(&self, form: &dyn Form<T>, mesh: &Mesh<T>) -> eyre::Result<SparsityPattern> {
        if form.rank() != 2 {
            bail!("sparsity patterns require a bilinear form, got rank {}", form.rank());
        }
        // Every entry is stored exactly once, regardless of how many entities contribute to it
        let mut entries = BTreeSet::new();
        let mut insert = |buffers: &DofBuffers| -> eyre::Result<()> {
            for &i in &buffers.dofs[0] {
                for &j in &buffers.dofs[1] {
                    entries.insert((i, j));
                }
            }
            Ok(())
        };
        if form.integral(IntegralType::Cell).is_some() {
            visit_cells(form, mesh, |_, buffers| insert(buffers))?;
        }
        if form.integral(IntegralType::ExteriorFacet).is_some() {
            visit_exterior_facets(form, mesh, |_, buffers| insert(buffers))?;
        }
        if form.integral(IntegralType::InteriorFacet).is_some() {
            visit_interior_facets(form, mesh, |_, buffers| insert(buffers))?;
        }

        let (num_rows, num_cols) = (form.global_dimension(0), form.global_dimension(1));
        let mut offsets = Vec::with_capacity(num_rows + 1);
        let mut column_indices = Vec::with_capacity(entries.len());
        offsets.push(0);
        for (i, j) in entries {
            if i >= num_rows || j >= num_cols {
                bail!("dof ({}, {}) exceeds the global dimensions {}x{}", i, j, num_rows, num_cols);
            }
            while offsets.len() <= i {
                offsets.push(column_indices.len());
            }
            column_indices.push(j);
        }
        while offsets.len() <= num_rows {
            offsets.push(column_indices.len());
        }
        Ok(SparsityPattern::try_from_offsets_and_indices(
            num_rows,
            num_cols,
            offsets,
            column_indices,
        )?)
    }

    /// Assembles a bilinear form into a new CSR matrix with the form's sparsity pattern.
    pub fn assemble_csr(&self, form: &dyn Form<T>, mesh: &Mesh<T>) -> eyre::Result<CsrMatrix<T>> {
        let pattern = self.assemble_pattern(form, mesh)?;
        let nnz = pattern.nnz();
        let mut matrix = CsrMatrix::try_from_pattern_and_values(pattern, vec![T::zero(); nnz])
            .map_err(|err| eyre!("failed to create CSR matrix from sparsity pattern: {}", err))?;
        self.assemble(&mut matrix, form, mesh)?;
        Ok(matrix)
    }
}

fn check_tensor<T: Real>(tensor: &dyn GlobalTensor<T>, form: &dyn Form<T>) -> eyre::Result<()> {
    if tensor.rank() != form.rank() {
        bail!("cannot assemble a form of rank {} into a tensor of rank {}", form.rank(), tensor.rank());
    }
    for axis in 0..form.rank() {
        if tensor.dimension(axis) < form.global_dimension(axis) {
            bail!(
                "tensor dimension {} along axis {} is smaller than the form dimension {}",
                tensor.dimension(axis),
                axis,
                form.global_dimension(axis)
            );
        }
    }
    Ok(())
}

fn facet_tables<T: Real>(mesh: &Mesh<T>) -> eyre::Result<(Arc<ConnectivityTable>, Arc<ConnectivityTable>)> {
    let tdim = mesh.dim();
    if tdim == 0 {
        bail!("facet integrals are not defined for meshes of points");
    }
    let facet_cells = mesh.topology().connectivity(tdim - 1, tdim)?;
    let cell_facets = mesh.topology().connectivity(tdim, tdim - 1)?;
    Ok((facet_cells, cell_facets))
}

fn orientation<T: Real>(mesh: &Mesh<T>, cell: usize) -> Option<CellOrientation> {
    mesh.cell_orientations().and_then(|o| o.get(cell).copied())
}

fn visit_cells<'a, T: Real>(
    form: &dyn Form<T>,
    mesh: &'a Mesh<T>,
    mut visit: impl FnMut(&CellContext<'a, T>, &DofBuffers) -> eyre::Result<()>,
) -> eyre::Result<AssemblyCount> {
    let subdomain = form
        .integral(IntegralType::Cell)
        .ok_or_else(|| eyre!("form does not have a cell integral"))?;
    let tdim = mesh.dim();
    let mut buffers = DofBuffers::new(form)?;
    let mut count = AssemblyCount::default();
    for cell in mesh.cells() {
        if !in_subdomain(mesh.domains(), tdim, cell.index(), subdomain) {
            count.skipped += 1;
            continue;
        }
        buffers.populate(form, &[cell])?;
        let context = CellContext {
            cell,
            orientation: orientation(mesh, cell.index()),
        };
        visit(&context, &buffers)?;
        count.assembled += 1;
    }
    Ok(count)
}

fn visit_exterior_facets<'a, T: Real>(
    form: &dyn Form<T>,
    mesh: &'a Mesh<T>,
    mut visit: impl FnMut(&ExteriorFacetContext<'a, T>, &DofBuffers) -> eyre::Result<()>,
) -> eyre::Result<AssemblyCount> {
    let subdomain = form
        .integral(IntegralType::ExteriorFacet)
        .ok_or_else(|| eyre!("form does not have an exterior facet integral"))?;
    let tdim = mesh.dim();
    let (facet_cells, cell_facets) = facet_tables(mesh)?;
    let mut buffers = DofBuffers::new(form)?;
    let mut count = AssemblyCount::default();
    for (facet, cells) in facet_cells.rows().enumerate() {
        // Facets shared with another process lie on the partition seam, not the domain boundary
        if cells.len() != 1 || mesh.topology().is_shared(tdim - 1, facet) {
            continue;
        }
        if !in_subdomain(mesh.domains(), tdim - 1, facet, subdomain) {
            count.skipped += 1;
            continue;
        }
        let cell = mesh.cell(cells[0])?;
        buffers.populate(form, &[cell])?;
        let context = ExteriorFacetContext {
            cell,
            facet: mesh.entity(tdim - 1, facet)?,
            local_facet: local_facet(&cell_facets, cells[0], facet)?,
            orientation: orientation(mesh, cells[0]),
        };
        visit(&context, &buffers)?;
        count.assembled += 1;
    }
    Ok(count)
}

fn visit_interior_facets<'a, T: Real>(
    form: &dyn Form<T>,
    mesh: &'a Mesh<T>,
    mut visit: impl FnMut(&InteriorFacetContext<'a, T>, &DofBuffers) -> eyre::Result<()>,
) -> eyre::Result<AssemblyCount> {
    let subdomain = form
        .integral(IntegralType::InteriorFacet)
        .ok_or_else(|| eyre!("form does not have an interior facet integral"))?;
    let tdim = mesh.dim();
    let (facet_cells, cell_facets) = facet_tables(mesh)?;
    let mut buffers = DofBuffers::new(form)?;
    let mut count = AssemblyCount::default();
    for (facet, cells) in facet_cells.rows().enumerate() {
        if cells.len() != 2 {
            continue;
        }
        if !in_subdomain(mesh.domains(), tdim - 1, facet, subdomain) {
            count.skipped += 1;
            continue;
        }
        let (plus, minus) = (cells[0].min(cells[1]), cells[0].max(cells[1]));
        let cell_pair = [mesh.cell(plus)?, mesh.cell(minus)?];
        buffers.populate(form, &cell_pair)?;
        let context = InteriorFacetContext {
            facet: mesh.entity(tdim - 1, facet)?,
            cells: cell_pair,
            local_facets: [
                local_facet(&cell_facets, plus, facet)?,
                local_facet(&cell_facets, minus, facet)?,
            ],
            orientations: [orientation(mesh, plus), orientation(mesh, minus)],
        };
        visit(&context, &buffers)?;
        count.assembled += 1;
    }
    Ok(count)
}
