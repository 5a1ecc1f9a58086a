use eyre::eyre;
use fenris_topology::assembly::{
    barycentric_gradients, Assembler, CellContext, CellTensor, CellVolume, ExteriorFacetMeasure, Form, GlobalTensor,
    IntegralType, P1JumpPenalty, P1Laplace, P1Source, ScalarTensor, Subdomain, SymmetricSplit,
};
use fenris_topology::cell::{CellOrientation, CellType};
use fenris_topology::mesh::procedural::{create_unit_box_uniform_tet_mesh_3d, create_unit_square_uniform_tri_mesh_2d};
use fenris_topology::mesh::{Mesh, MeshEntity};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, DVector, Vector3};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

fn two_triangles() -> Mesh<f64> {
    Mesh::from_vertices_and_cells(
        CellType::Triangle,
        2,
        vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        vec![0, 1, 2, 1, 3, 2],
    )
    .unwrap()
}

/// Values of `f` at the vertices of the mesh.
fn interpolate(mesh: &Mesh<f64>, f: impl Fn(f64, f64) -> f64) -> DVector<f64> {
    DVector::from_fn(mesh.num_vertices(), |v, _| {
        let p = mesh.geometry().point(v);
        f(p.x, p.y)
    })
}

/// Marks every cell whose midpoint lies left of `x = 0.5` with `label`.
fn mark_left_half(mesh: &mut Mesh<f64>, label: usize) -> Vec<usize> {
    let left: Vec<_> = mesh
        .cells()
        .filter(|cell| cell.midpoint().unwrap().x < 0.5)
        .map(|cell| cell.index())
        .collect();
    for &cell in &left {
        mesh.domains_mut().set_marker(2, cell, label);
    }
    left
}

/// A non-symmetric bilinear form `∫ φ_i (b · ∇φ_j) dx`, with `φ_i` approximated by its mean.
struct Convection {
    num_dofs: usize,
    velocity: Vector3<f64>,
}

impl Form<f64> for Convection {
    fn rank(&self) -> usize {
        2
    }

    fn global_dimension(&self, _axis: usize) -> usize {
        self.num_dofs
    }

    fn populate_cell_dofs(&self, _axis: usize, cell: &MeshEntity<f64>, dofs: &mut Vec<usize>) -> eyre::Result<()> {
        dofs.extend(cell.vertex_indices()?);
        Ok(())
    }

    fn integral(&self, integral_type: IntegralType) -> Option<Subdomain> {
        (integral_type == IntegralType::Cell).then_some(Subdomain::Everywhere)
    }

    fn tabulate_cell(&self, context: &CellContext<f64>, output: &mut [f64]) -> eyre::Result<()> {
        let gradients = barycentric_gradients(&context.cell.points()?)?;
        let n = gradients.len();
        let weight = context.cell.volume()? / n as f64;
        for i in 0..n {
            for j in 0..n {
                output[i * n + j] = weight * self.velocity.dot(&gradients[j]);
            }
        }
        Ok(())
    }
}

/// Counts the cells seen as flipped by the assembler.
struct FlippedCells;

impl Form<f64> for FlippedCells {
    fn rank(&self) -> usize {
        0
    }

    fn global_dimension(&self, _axis: usize) -> usize {
        1
    }

    fn populate_cell_dofs(&self, _axis: usize, _cell: &MeshEntity<f64>, _dofs: &mut Vec<usize>) -> eyre::Result<()> {
        Ok(())
    }

    fn integral(&self, integral_type: IntegralType) -> Option<Subdomain> {
        (integral_type == IntegralType::Cell).then_some(Subdomain::Everywhere)
    }

    fn tabulate_cell(&self, context: &CellContext<f64>, output: &mut [f64]) -> eyre::Result<()> {
        output[0] = match context.orientation {
            Some(CellOrientation::Flipped) => 1.0,
            Some(CellOrientation::Aligned) => 0.0,
            None => return Err(eyre!("cell orientations were not initialized")),
        };
        Ok(())
    }
}

#[test]
fn cell_volume_of_unit_box() {
    let mesh = create_unit_box_uniform_tet_mesh_3d::<f64>(2).unwrap();
    let mut volume = ScalarTensor::<f64>::default();
    Assembler::<f64>::default()
        .assemble(&mut volume, &CellVolume::new(), &mesh)
        .unwrap();
    assert_scalar_eq!(volume.0, 1.0, comp = abs, tol = 1e-12);
}

#[test]
fn exterior_facet_measure_of_unit_square() {
    let mut mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(4).unwrap();
    let assembler = Assembler::<f64>::default();
    let mut perimeter = ScalarTensor::<f64>::default();
    assembler
        .assemble(&mut perimeter, &ExteriorFacetMeasure::new(), &mesh)
        .unwrap();
    assert_scalar_eq!(perimeter.0, 4.0, comp = abs, tol = 1e-12);

    // Mark the left side only
    let left_facets: Vec<_> = mesh
        .entities(1)
        .unwrap()
        .filter(|facet| {
            facet
                .points()
                .unwrap()
                .iter()
                .all(|p| p.x == 0.0)
        })
        .map(|facet| facet.index())
        .collect();
    assert_eq!(left_facets.len(), 4);
    for facet in left_facets {
        mesh.domains_mut().set_marker(1, facet, 4);
    }
    let mut left = ScalarTensor::<f64>::default();
    let count = assembler
        .assemble_exterior_facets(&mut left, &ExteriorFacetMeasure::new().restricted_to(4), &mesh)
        .unwrap();
    assert_scalar_eq!(left.0, 1.0, comp = abs, tol = 1e-12);
    assert_eq!(count.assembled, 4);
    assert_eq!(count.skipped, 12);
}

#[test]
fn laplace_matrix_properties() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(4).unwrap();
    let form = P1Laplace::new(&mesh).unwrap();
    let mut a = DMatrix::<f64>::zeros(25, 25);
    Assembler::<f64>::default().assemble(&mut a, &form, &mesh).unwrap();

    assert_matrix_eq!(a, a.transpose(), comp = abs, tol = 1e-12);
    let ones = DVector::repeat(25, 1.0);
    assert_matrix_eq!(&a * &ones, DVector::<f64>::zeros(25), comp = abs, tol = 1e-12);

    // ∫ |∇u|² dx = 1 for u = x
    let u = interpolate(&mesh, |x, _| x);
    assert_scalar_eq!(u.dot(&(&a * &u)), 1.0, comp = abs, tol = 1e-12);

    let mut scaled = DMatrix::<f64>::zeros(25, 25);
    Assembler::<f64>::default()
        .assemble(&mut scaled, &form.with_coefficient(3.0), &mesh)
        .unwrap();
    assert_matrix_eq!(scaled, 3.0 * &a, comp = abs, tol = 1e-12);
}

#[test]
fn csr_and_coo_assembly_agree_with_dense_assembly() {
    let mesh = create_unit_box_uniform_tet_mesh_3d::<f64>(2).unwrap();
    let form = P1Laplace::new(&mesh).unwrap();
    let assembler = Assembler::<f64>::default();
    let n = mesh.num_vertices();

    let mut dense = DMatrix::<f64>::zeros(n, n);
    assembler.assemble(&mut dense, &form, &mesh).unwrap();

    let csr = assembler.assemble_csr(&form, &mesh).unwrap();
    assert_matrix_eq!(DMatrix::from(&csr), dense, comp = abs, tol = 1e-12);

    let mut coo = CooMatrix::<f64>::new(n, n);
    assembler.assemble(&mut coo, &form, &mesh).unwrap();
    assert_matrix_eq!(DMatrix::from(&CsrMatrix::from(&coo)), dense, comp = abs, tol = 1e-12);

    // Vertices only couple through edges
    let pattern = assembler.assemble_pattern(&form, &mesh).unwrap();
    assert_eq!(pattern.nnz(), n + 2 * mesh.num_entities(1).unwrap());
}

#[test]
fn csr_assembly_fails_outside_the_pattern() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(2).unwrap();
    let form = P1Laplace::new(&mesh).unwrap();
    let mut diagonal = CsrMatrix::<f64>::identity(9);
    assert!(Assembler::<f64>::default()
        .assemble(&mut diagonal, &form, &mesh)
        .is_err());
}

#[test]
fn source_vector_integrates_the_source() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(4).unwrap();
    let assembler = Assembler::<f64>::default();

    let mut b = DVector::<f64>::zeros(25);
    assembler
        .assemble(&mut b, &P1Source::constant(&mesh, 2.0).unwrap(), &mesh)
        .unwrap();
    assert_scalar_eq!(b.sum(), 2.0, comp = abs, tol = 1e-12);

    // The midpoint rule integrates linear sources exactly
    let mut b = DVector::<f64>::zeros(25);
    assembler
        .assemble(&mut b, &P1Source::new(&mesh, |p| p.x + p.y).unwrap(), &mesh)
        .unwrap();
    assert_scalar_eq!(b.sum(), 1.0, comp = abs, tol = 1e-12);
}

#[test]
fn restricted_assembly_matches_sub_mesh_assembly() {
    let mut mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(4).unwrap();
    let left = mark_left_half(&mut mesh, 1);
    assert_eq!(left.len(), 16);
    let sub_mesh = mesh.keep_cells(&left).unwrap();
    let assembler = Assembler::<f64>::default();

    let mut restricted = DMatrix::<f64>::zeros(25, 25);
    let form = P1Laplace::new(&mesh).unwrap().restricted_to(1);
    let count = assembler
        .assemble_cells(&mut restricted, &form, &mesh)
        .unwrap();
    assert_eq!(count.assembled, 16);
    assert_eq!(count.skipped, 16);

    let mut from_sub_mesh = DMatrix::<f64>::zeros(25, 25);
    let sub_form = P1Laplace::new(&sub_mesh).unwrap();
    assert_eq!(sub_form.global_dimension(0), 25);
    assembler
        .assemble(&mut from_sub_mesh, &sub_form, &sub_mesh)
        .unwrap();
    assert_eq!(restricted, from_sub_mesh);

    let mut b_restricted = DVector::<f64>::zeros(25);
    let mut b_sub = DVector::<f64>::zeros(25);
    assembler
        .assemble(&mut b_restricted, &P1Source::new(&mesh, |p| p.y).unwrap().restricted_to(1), &mesh)
        .unwrap();
    assembler
        .assemble(&mut b_sub, &P1Source::new(&sub_mesh, |p| p.y).unwrap(), &sub_mesh)
        .unwrap();
    assert_eq!(b_restricted, b_sub);

    let mut area = ScalarTensor::<f64>::default();
    assembler
        .assemble(&mut area, &CellVolume::new().restricted_to(1), &mesh)
        .unwrap();
    assert_scalar_eq!(area.0, 0.5, comp = abs, tol = 1e-12);
}

#[test]
fn labels_without_markers_select_everything() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(2).unwrap();
    let mut area = ScalarTensor::<f64>::default();
    let count = Assembler::<f64>::default()
        .assemble_cells(&mut area, &CellVolume::new().restricted_to(5), &mesh)
        .unwrap();
    assert_eq!(count.assembled, 8);
    assert_scalar_eq!(area.0, 1.0, comp = abs, tol = 1e-12);
}

#[test]
fn interior_facet_scatter_touches_both_cells() {
    let mesh = two_triangles();
    let scattered = Arc::new(Mutex::new(Vec::new()));
    let recorder = {
        let scattered = Arc::clone(&scattered);
        move |tensor: &mut dyn GlobalTensor<f64>, values: &[f64], dofs: &[&[usize]]| {
            scattered
                .lock()
                .unwrap()
                .push(dofs.iter().map(|d| d.to_vec()).collect::<Vec<_>>());
            tensor.add(values, dofs)
        }
    };
    let assembler = Assembler::<f64>::default().with_scatter(recorder);
    let form = P1JumpPenalty::new(&mesh, 1.0).unwrap();
    let mut a = DMatrix::<f64>::zeros(4, 4);
    let count = assembler
        .assemble_interior_facets(&mut a, &form, &mesh)
        .unwrap();
    assert_eq!(count.assembled, 1);

    let scattered = scattered.lock().unwrap();
    assert_eq!(scattered.len(), 1);
    for axis_dofs in &scattered[0] {
        assert_eq!(axis_dofs.len(), 6);
        assert_eq!(&axis_dofs[..3], &[0, 1, 2]);
        assert_eq!(&axis_dofs[3..], &[1, 3, 2]);
        let union: BTreeSet<_> = axis_dofs.iter().copied().collect();
        assert_eq!(union, (0..4).collect::<BTreeSet<_>>());
    }

    let pattern = Assembler::<f64>::default().assemble_pattern(&form, &mesh).unwrap();
    assert_eq!(pattern.nnz(), 16);
}

#[test]
fn jump_penalty_vanishes_for_linear_functions() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(3).unwrap();
    let form = P1JumpPenalty::new(&mesh, 10.0).unwrap();
    let a = Assembler::<f64>::default().assemble_csr(&form, &mesh).unwrap();
    let a = DMatrix::from(&a);
    assert_matrix_eq!(a, a.transpose(), comp = abs, tol = 1e-12);

    let linear = interpolate(&mesh, |x, y| 2.0 * x - 3.0 * y + 1.0);
    assert_matrix_eq!(&a * &linear, DVector::<f64>::zeros(16), comp = abs, tol = 1e-10);

    let kink = interpolate(&mesh, |x, _| (x - 0.5).abs());
    assert!(kink.dot(&(&a * &kink)) > 1e-3);
}

#[test]
fn symmetric_split_reconstructs_the_full_matrix() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(3).unwrap();
    let form = Convection {
        num_dofs: 16,
        velocity: Vector3::new(1.0, 2.0, 0.0),
    };

    let mut full = DMatrix::<f64>::zeros(16, 16);
    Assembler::<f64>::default().assemble(&mut full, &form, &mesh).unwrap();
    assert!((&full - full.transpose()).norm() > 1e-3);

    let mut symmetric = DMatrix::<f64>::zeros(16, 16);
    Assembler::<f64>::default()
        .with_scatter(SymmetricSplit::symmetric())
        .assemble(&mut symmetric, &form, &mesh)
        .unwrap();
    let mut antisymmetric = DMatrix::<f64>::zeros(16, 16);
    Assembler::<f64>::default()
        .with_scatter(SymmetricSplit::antisymmetric())
        .assemble(&mut antisymmetric, &form, &mesh)
        .unwrap();

    assert_matrix_eq!(symmetric, symmetric.transpose(), comp = abs, tol = 1e-12);
    assert_matrix_eq!(antisymmetric, -antisymmetric.transpose(), comp = abs, tol = 1e-12);
    assert_matrix_eq!(&symmetric + &antisymmetric, full, comp = abs, tol = 1e-12);
}

#[test]
fn recorded_cell_tensors() {
    let mesh = two_triangles();
    let form = P1Laplace::new(&mesh).unwrap();
    let mut a = DMatrix::<f64>::zeros(4, 4);
    let mut results: Vec<CellTensor<f64>> = Vec::new();
    let count = Assembler::<f64>::default()
        .assemble_cells_recorded(&mut a, &form, &mesh, &mut results)
        .unwrap();
    assert_eq!(count.assembled, 2);
    assert_eq!(results.iter().map(|r| r.cell).collect::<Vec<_>>(), vec![0, 1]);
    for result in &results {
        assert_eq!(result.values.len(), 9);
        assert_scalar_eq!(result.values.iter().sum::<f64>(), 0.0, comp = abs, tol = 1e-12);
    }
    // The reference triangle stiffness matrix
    assert_matrix_eq!(
        DMatrix::from_row_slice(3, 3, &results[0].values),
        DMatrix::from_row_slice(3, 3, &[1.0, -0.5, -0.5, -0.5, 0.5, 0.0, -0.5, 0.0, 0.5]),
        comp = abs,
        tol = 1e-12
    );
}

#[test]
fn cell_orientations_reach_the_form() {
    // Two triangles of the unit square embedded in R^3, the second numbered clockwise
    let mut mesh = Mesh::from_vertices_and_cells(
        CellType::Triangle,
        3,
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0],
        vec![0, 1, 2, 1, 2, 3],
    )
    .unwrap();
    let assembler = Assembler::<f64>::default();
    let mut flipped = ScalarTensor::<f64>::default();
    assert!(assembler
        .assemble(&mut flipped, &FlippedCells, &mesh)
        .is_err());

    mesh.init_cell_orientations(&Vector3::new(0.0, 0.0, 1.0))
        .unwrap();
    assembler
        .assemble(&mut flipped, &FlippedCells, &mesh)
        .unwrap();
    assert_eq!(flipped.0, 1.0);
}

#[test]
fn ordering_updates_cell_orientations() {
    let mut mesh = Mesh::from_vertices_and_cells(
        CellType::Triangle,
        3,
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        vec![0, 2, 1],
    )
    .unwrap();
    mesh.init_cell_orientations(&Vector3::new(0.0, 0.0, 1.0))
        .unwrap();
    assert_eq!(mesh.cell_orientations(), Some(&[CellOrientation::Flipped][..]));

    mesh.order().unwrap();
    let recomputed = mesh
        .cell(0)
        .unwrap()
        .orientation(&Vector3::new(0.0, 0.0, 1.0))
        .unwrap();
    assert_eq!(recomputed, CellOrientation::Aligned);
    assert_eq!(mesh.cell_orientations(), Some(&[recomputed][..]));
}

#[test]
fn mismatched_tensors_are_rejected() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(2).unwrap();
    let assembler = Assembler::<f64>::default();
    let laplace = P1Laplace::new(&mesh).unwrap();

    let mut vector = DVector::<f64>::zeros(9);
    assert!(assembler.assemble(&mut vector, &laplace, &mesh).is_err());
    let mut too_small = DMatrix::<f64>::zeros(4, 4);
    assert!(assembler.assemble(&mut too_small, &laplace, &mesh).is_err());
    let mut scalar = ScalarTensor::<f64>::default();
    assert!(assembler.assemble(&mut scalar, &laplace, &mesh).is_err());
    assert!(assembler
        .assemble_pattern(&CellVolume::new(), &mesh)
        .is_err());
    assert!(assembler
        .assemble_interior_facets(&mut too_small, &laplace, &mesh)
        .is_err());
}

#[test]
fn p1_forms_require_simplices() {
    let mesh = fenris_topology::mesh::procedural::create_unit_square_uniform_quad_mesh_2d::<f64>(2).unwrap();
    assert!(P1Laplace::new(&mesh).is_err());
    assert!(P1Source::constant(&mesh, 1.0).is_err());

    let mut area = ScalarTensor::<f64>::default();
    Assembler::<f64>::default()
        .assemble(&mut area, &CellVolume::new(), &mesh)
        .unwrap();
    assert_scalar_eq!(area.0, 1.0, comp = abs, tol = 1e-12);
}
