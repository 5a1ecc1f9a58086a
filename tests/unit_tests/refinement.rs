use fenris_topology::cell::CellType;
use fenris_topology::mesh::procedural::{
    create_unit_box_uniform_hex_mesh_3d, create_unit_box_uniform_tet_mesh_3d, create_unit_interval_mesh,
    create_unit_square_uniform_quad_mesh_2d, create_unit_square_uniform_tri_mesh_2d,
};
use fenris_topology::mesh::{BoundaryKind, Mesh};
use fenris_topology::MeshError;
use matrixcompare::assert_scalar_eq;

fn total_volume(mesh: &Mesh<f64>) -> f64 {
    mesh.cells().map(|cell| cell.volume().unwrap()).sum()
}

/// Checks child counts, volume conservation and the absence of hanging vertices.
fn assert_uniform_refinement(mesh: &Mesh<f64>) -> Mesh<f64> {
    let refined = mesh.refine_uniformly().unwrap();
    assert_eq!(refined.cell_type(), mesh.cell_type());
    assert_eq!(refined.num_cells(), (1 << mesh.dim()) * mesh.num_cells());
    assert_scalar_eq!(total_volume(&refined), total_volume(mesh), comp = abs, tol = 1e-12);
    for cell in refined.cells() {
        assert!(cell.volume().unwrap() > 0.0, "cell {} is degenerate", cell.index());
    }
    // A conforming refinement doubles the boundary resolution
    if mesh.dim() > 1 {
        let coarse = mesh.compute_boundary(BoundaryKind::Exterior).unwrap();
        let fine = refined.compute_boundary(BoundaryKind::Exterior).unwrap();
        let facet_children = 1 << (mesh.dim() - 1);
        assert_eq!(fine.mesh().num_cells(), facet_children * coarse.mesh().num_cells());
    }
    refined
}

#[test]
fn interval_refinement() {
    let mesh = create_unit_interval_mesh::<f64>(3).unwrap();
    let refined = assert_uniform_refinement(&mesh);
    assert_eq!(refined.num_vertices(), 7);
    assert_scalar_eq!(refined.hmax().unwrap(), 1.0 / 6.0, comp = abs, tol = 1e-12);
}

#[test]
fn triangle_refinement() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(2).unwrap();
    let refined = assert_uniform_refinement(&mesh);
    let num_edges = mesh.num_entities(1).unwrap();
    assert_eq!(refined.num_vertices(), mesh.num_vertices() + num_edges);
    assert_eq!(refined.num_vertices(), 25);
    assert_scalar_eq!(refined.hmax().unwrap(), 0.5 * mesh.hmax().unwrap(), comp = abs, tol = 1e-12);
    assert_scalar_eq!(refined.radius_ratio_min().unwrap(), mesh.radius_ratio_min().unwrap(), comp = abs, tol = 1e-12);
}

#[test]
fn quadrilateral_refinement_matches_finer_grid() {
    let mesh = create_unit_square_uniform_quad_mesh_2d::<f64>(2).unwrap();
    let refined = assert_uniform_refinement(&mesh);
    let finer = create_unit_square_uniform_quad_mesh_2d::<f64>(4).unwrap();
    assert_eq!(refined.num_vertices(), finer.num_vertices());
    assert_eq!(refined.num_entities(1).unwrap(), finer.num_entities(1).unwrap());
    assert_scalar_eq!(refined.hmax().unwrap(), finer.hmax().unwrap(), comp = abs, tol = 1e-12);
}

#[test]
fn tetrahedron_refinement() {
    let mesh = create_unit_box_uniform_tet_mesh_3d::<f64>(1).unwrap();
    let refined = assert_uniform_refinement(&mesh);
    assert_eq!(refined.cell_type(), CellType::Tetrahedron);
    assert_eq!(refined.num_vertices(), 8 + 19);
}

#[test]
fn hexahedron_refinement_matches_finer_grid() {
    let mesh = create_unit_box_uniform_hex_mesh_3d::<f64>(1).unwrap();
    let refined = assert_uniform_refinement(&mesh);
    assert_eq!(refined.num_vertices(), 27);
    let counts: Vec<_> = (0..=3).map(|d| refined.num_entities(d).unwrap()).collect();
    assert_eq!(counts, vec![27, 54, 36, 8]);
}

#[test]
fn cell_markers_are_inherited() {
    let mut mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(1).unwrap();
    mesh.domains_mut().set_marker(2, 1, 4);
    let refined = mesh.refine_uniformly().unwrap();
    let mut marked = refined.domains().entities_with_label(2, 4);
    marked.sort_unstable();
    assert_eq!(marked, vec![4, 5, 6, 7]);
    assert_eq!(refined.domains().get_marker(2, 0), None);
}

#[test]
fn meshes_of_points_cannot_be_refined() {
    let points = create_unit_interval_mesh::<f64>(1)
        .unwrap()
        .compute_boundary(BoundaryKind::Exterior)
        .unwrap()
        .into_parts()
        .0;
    assert!(matches!(
        points.refine_uniformly(),
        Err(MeshError::UnsupportedCellType {
            operation: "refine_uniformly",
            ..
        })
    ));
}
