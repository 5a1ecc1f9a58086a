use fenris_topology::cell::CellType;
use fenris_topology::mesh::procedural::{
    create_unit_box_uniform_hex_mesh_3d, create_unit_box_uniform_tet_mesh_3d, create_unit_square_uniform_tri_mesh_2d,
};
use fenris_topology::mesh::Mesh;
use fenris_topology::proptest::{rectangular_mesh_strategy, scrambled_mesh_strategy, unit_box_tet_mesh_strategy};
use matrixcompare::assert_scalar_eq;
use proptest::prelude::*;

fn total_volume(mesh: &Mesh<f64>) -> f64 {
    mesh.cells().map(|cell| cell.volume().unwrap()).sum()
}

fn assert_order_is_idempotent(mut mesh: Mesh<f64>) {
    let volume = total_volume(&mesh);
    mesh.init_all().unwrap();
    mesh.order().unwrap();
    assert!(mesh.ordered().unwrap());

    let mut reordered = mesh.clone();
    reordered.order().unwrap();
    assert!(reordered.ordered().unwrap());
    let dim = mesh.dim();
    for d0 in 0..=dim {
        for d1 in 0..=dim {
            assert_eq!(
                mesh.topology().connectivity(d0, d1).unwrap(),
                reordered.topology().connectivity(d0, d1).unwrap(),
                "connectivity ({}, {})",
                d0,
                d1
            );
        }
    }
    assert_scalar_eq!(total_volume(&mesh), volume, comp = abs, tol = 1e-12);
}

/// In an ordered simplex mesh, facet `i` of every cell is the facet opposite local vertex `i`.
fn assert_facets_opposite_vertices(mesh: &Mesh<f64>) {
    let tdim = mesh.dim();
    let topology = mesh.topology();
    let cells = topology.cells();
    let cell_facets = topology.connectivity(tdim, tdim - 1).unwrap();
    let facet_vertices = topology.connectivity(tdim - 1, 0).unwrap();
    for (cell, vertices) in cells.rows().enumerate() {
        assert!(vertices.windows(2).all(|w| w[0] < w[1]));
        for (i, &facet) in cell_facets.row(cell).iter().enumerate() {
            let expected: Vec<_> = vertices
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &v)| v)
                .collect();
            assert_eq!(facet_vertices.row(facet), expected.as_slice());
        }
    }
}

#[test]
fn ordering_sorts_simplices_by_global_index() {
    let mut mesh =
        Mesh::from_vertices_and_cells(CellType::Triangle, 2, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0], vec![
            2, 0, 1, 3, 2, 1,
        ])
        .unwrap();
    assert!(!mesh.ordered().unwrap());
    mesh.order().unwrap();
    assert!(mesh.ordered().unwrap());
    assert_eq!(mesh.topology().cells().row(0), &[0, 1, 2]);
    assert_eq!(mesh.topology().cells().row(1), &[1, 2, 3]);
}

#[test]
fn ordering_follows_global_vertex_indices() {
    let mut mesh =
        Mesh::from_vertices_and_cells(CellType::Triangle, 2, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0], vec![0, 1, 2])
            .unwrap();
    mesh.topology_mut()
        .set_global_indices(0, vec![30, 20, 10])
        .unwrap();
    mesh.order().unwrap();
    assert_eq!(mesh.topology().cells().row(0), &[2, 1, 0]);
    assert!(mesh.ordered().unwrap());

    // Entities computed after ordering follow the same numbering
    mesh.init_all().unwrap();
    assert!(mesh.ordered().unwrap());
    let edges = mesh.topology().connectivity(1, 0).unwrap();
    for vertices in edges.rows() {
        let global: Vec<_> = vertices
            .iter()
            .map(|&v| mesh.topology().global_index(0, v).unwrap())
            .collect();
        assert!(global[0] < global[1], "edge {:?} has global vertices {:?}", vertices, global);
    }
}

#[test]
fn submeshes_stay_ordered_after_computing_entities() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(2).unwrap();
    let mut submesh = mesh.keep_cells(&[7, 3, 5]).unwrap();
    submesh.order().unwrap();
    submesh.init_all().unwrap();
    assert!(submesh.ordered().unwrap());

    let tets = create_unit_box_uniform_tet_mesh_3d::<f64>(2).unwrap();
    let mut subtets = tets.keep_cells(&[40, 2, 17, 33, 9]).unwrap();
    subtets.order().unwrap();
    subtets.init_all().unwrap();
    assert!(subtets.ordered().unwrap());
}

#[test]
fn hexahedra_are_ordered_by_global_vertex_indices() {
    let mut mesh = create_unit_box_uniform_hex_mesh_3d::<f64>(2).unwrap();
    mesh.clean();
    let n = mesh.num_vertices();
    mesh.topology_mut()
        .set_global_indices(0, (0..n).rev().collect())
        .unwrap();
    assert!(!mesh.ordered().unwrap());
    mesh.order().unwrap();
    mesh.init_all().unwrap();
    assert!(mesh.ordered().unwrap());
    assert_order_is_idempotent(mesh.clone());

    let global = |v: usize| mesh.topology().global_index(0, v).unwrap();
    for vertices in mesh.topology().cells().rows() {
        let first = global(vertices[0]);
        assert!(vertices.iter().all(|&v| global(v) >= first));
        assert!(global(vertices[1]) < global(vertices[2]));
        assert!(global(vertices[2]) < global(vertices[4]));
    }
    for cell in mesh.cells() {
        assert_scalar_eq!(cell.volume().unwrap(), 0.125, comp = abs, tol = 1e-12);
    }
}

#[test]
fn find_edge_locates_the_opposite_edge() {
    let mut mesh =
        Mesh::from_vertices_and_cells(CellType::Triangle, 2, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0], vec![2, 0, 1])
            .unwrap();
    mesh.order().unwrap();
    for i in 0..3 {
        assert_eq!(CellType::Triangle.find_edge(i, 0, mesh.topology()).unwrap(), i);
    }
    assert!(CellType::Triangle.find_edge(3, 0, mesh.topology()).is_err());
    assert!(CellType::Tetrahedron.find_edge(0, 0, mesh.topology()).is_err());
}

proptest! {
    #[test]
    fn triangle_ordering_is_idempotent(
        mesh in scrambled_mesh_strategy(rectangular_mesh_strategy(CellType::Triangle, 16))
    ) {
        assert_order_is_idempotent(mesh.clone());
        let mut ordered = mesh;
        ordered.order().unwrap();
        assert_facets_opposite_vertices(&ordered);
    }

    #[test]
    fn quadrilateral_ordering_is_idempotent(
        mesh in scrambled_mesh_strategy(rectangular_mesh_strategy(CellType::Quadrilateral, 16))
    ) {
        assert_order_is_idempotent(mesh.clone());
        let mut ordered = mesh;
        ordered.order().unwrap();
        for vertices in ordered.topology().cells().rows() {
            prop_assert_eq!(vertices.iter().min(), Some(&vertices[0]));
            prop_assert!(vertices[1] < vertices[2]);
        }
        for cell in ordered.cells() {
            prop_assert!(cell.volume().unwrap() > 0.0);
        }
    }

    #[test]
    fn tetrahedron_ordering_is_idempotent(
        mesh in scrambled_mesh_strategy(unit_box_tet_mesh_strategy(2))
    ) {
        assert_order_is_idempotent(mesh.clone());
        let mut ordered = mesh;
        ordered.order().unwrap();
        assert_facets_opposite_vertices(&ordered);
    }
}
