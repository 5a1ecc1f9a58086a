use fenris_topology::cell::CellType;
use fenris_topology::mesh::procedural::{
    create_unit_box_uniform_hex_mesh_3d, create_unit_box_uniform_tet_mesh_3d, create_unit_square_uniform_tri_mesh_2d,
};
use fenris_topology::mesh::Mesh;
use fenris_topology::proptest::{rectangular_mesh_strategy, scrambled_mesh_strategy, unit_box_tet_mesh_strategy};
use fenris_topology::topology::{ConnectivityTable, MeshTopology};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn derive_edges_then_faces(mesh: &Mesh<f64>) -> (ConnectivityTable, ConnectivityTable) {
    let topology = mesh.topology();
    let edges = topology.connectivity(1, 0).unwrap();
    let faces = topology.connectivity(2, 1).unwrap();
    (edges.as_ref().clone(), faces.as_ref().clone())
}

fn assert_vertex_edges_consistent(topology: &MeshTopology) {
    let edge_vertices = topology.connectivity(1, 0).unwrap();
    let vertex_edges = topology.connectivity(0, 1).unwrap();
    assert_eq!(vertex_edges.len(), topology.num_vertices());
    for v in 0..topology.num_vertices() {
        let expected: BTreeSet<_> = edge_vertices
            .rows()
            .enumerate()
            .filter(|(_, vertices)| vertices.contains(&v))
            .map(|(e, _)| e)
            .collect();
        let actual: BTreeSet<_> = vertex_edges.row(v).iter().copied().collect();
        assert_eq!(actual, expected, "edges of vertex {}", v);
    }
}

#[test]
fn unit_square_entity_counts() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(3).unwrap();
    let num_vertices = mesh.num_entities(0).unwrap();
    let num_edges = mesh.num_entities(1).unwrap();
    let num_cells = mesh.num_entities(2).unwrap();
    assert_eq!(num_vertices, 16);
    assert_eq!(num_cells, 18);
    // 3 * 4 horizontal, 3 * 4 vertical and one diagonal per square
    assert_eq!(num_edges, 33);
    assert_eq!(num_vertices + num_cells - num_edges, 1);
}

#[test]
fn kuhn_cube_entity_counts() {
    let mesh = create_unit_box_uniform_tet_mesh_3d::<f64>(1).unwrap();
    let counts: Vec<_> = (0..=3).map(|d| mesh.num_entities(d).unwrap()).collect();
    assert_eq!(counts, vec![8, 19, 18, 6]);

    let hex = create_unit_box_uniform_hex_mesh_3d::<f64>(2).unwrap();
    let counts: Vec<_> = (0..=3).map(|d| hex.num_entities(d).unwrap()).collect();
    assert_eq!(counts, vec![27, 54, 36, 8]);
}

#[test]
fn every_cell_facet_matches_reference_pattern() {
    let mesh = create_unit_box_uniform_tet_mesh_3d::<f64>(2).unwrap();
    let topology = mesh.topology();
    let cells = topology.cells();
    let cell_faces = topology.connectivity(3, 2).unwrap();
    let face_vertices = topology.connectivity(2, 0).unwrap();
    let patterns = CellType::Tetrahedron.reference_entities(2).unwrap();
    for (cell, vertices) in cells.rows().enumerate() {
        for (i, &face) in cell_faces.row(cell).iter().enumerate() {
            let mut expected: Vec<_> = patterns[i].iter().map(|&j| vertices[j]).collect();
            let mut actual = face_vertices.row(face).to_vec();
            expected.sort_unstable();
            actual.sort_unstable();
            assert_eq!(actual, expected);
        }
    }
}

#[test]
fn face_edges_are_derived_by_intersection() {
    let mesh = create_unit_box_uniform_tet_mesh_3d::<f64>(1).unwrap();
    let topology = mesh.topology();
    let face_edges = topology.connectivity(2, 1).unwrap();
    let face_vertices = topology.connectivity(2, 0).unwrap();
    let edge_vertices = topology.connectivity(1, 0).unwrap();
    for (face, edges) in face_edges.rows().enumerate() {
        assert_eq!(edges.len(), 3);
        // Edge i of a triangle is opposite its vertex i
        for (i, &edge) in edges.iter().enumerate() {
            assert!(!edge_vertices.row(edge).contains(&face_vertices.row(face)[i]));
        }
    }
}

#[test]
fn cell_neighbours_share_a_vertex() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(2).unwrap();
    let topology = mesh.topology();
    let neighbours = topology.connectivity(2, 2).unwrap();
    let cells = topology.cells();
    for (cell, row) in neighbours.rows().enumerate() {
        assert!(!row.contains(&cell));
        for other in 0..mesh.num_cells() {
            let touches = other != cell && cells.row(cell).iter().any(|v| cells.row(other).contains(v));
            assert_eq!(row.contains(&other), touches);
        }
    }
    // Both triangles of the squares on the diagonal and one of each other square
    let centre = (0..mesh.num_vertices())
        .find(|&v| mesh.geometry().x(v) == [0.5, 0.5])
        .unwrap();
    let vertex_cells = topology.connectivity(0, 2).unwrap();
    assert_eq!(vertex_cells.row(centre).len(), 6);

    let vertex_vertices = topology.connectivity(0, 0).unwrap();
    for v in 0..mesh.num_vertices() {
        assert_eq!(vertex_vertices.row(v), &[v]);
    }
}

#[test]
fn clean_discards_derived_connectivity() {
    let mut mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(2).unwrap();
    mesh.init_all().unwrap();
    assert!(mesh.topology().try_connectivity(1, 2).is_some());
    mesh.clean();
    assert!(mesh.topology().try_connectivity(1, 2).is_none());
    assert!(mesh.topology().try_connectivity(2, 0).is_some());
    assert_eq!(mesh.topology().size(1), 0);
    assert_eq!(mesh.num_entities(1).unwrap(), 16);
}

#[test]
fn illegal_dimensions_are_rejected() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(1).unwrap();
    assert!(mesh.num_entities(3).is_err());
    assert!(mesh.topology().connectivity(0, 3).is_err());
    assert!(mesh.entity(1, 100).is_err());
}

proptest! {
    #[test]
    fn connectivity_derivation_is_deterministic(
        mesh in scrambled_mesh_strategy(rectangular_mesh_strategy(CellType::Triangle, 16))
    ) {
        let first = derive_edges_then_faces(&mesh);
        let mut recomputed = mesh.clone();
        recomputed.clean();
        let second = derive_edges_then_faces(&recomputed);
        prop_assert_eq!(first, second);

        let fresh = Mesh::from_vertices_and_cells(
            mesh.cell_type(),
            mesh.gdim(),
            mesh.geometry().coordinates().to_vec(),
            mesh.topology().cells().indices().to_vec(),
        ).unwrap();
        prop_assert_eq!(derive_edges_then_faces(&mesh), derive_edges_then_faces(&fresh));
    }

    #[test]
    fn vertex_edges_are_the_transpose_of_edge_vertices(
        mesh in rectangular_mesh_strategy(CellType::Quadrilateral, 16)
    ) {
        assert_vertex_edges_consistent(mesh.topology());
    }

    #[test]
    fn tet_vertex_edges_are_the_transpose_of_edge_vertices(mesh in unit_box_tet_mesh_strategy(2)) {
        assert_vertex_edges_consistent(mesh.topology());
    }
}
