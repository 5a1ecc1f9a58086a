use fenris_topology::cell::CellType;
use fenris_topology::mesh::procedural::{create_unit_box_uniform_tet_mesh_3d, create_unit_square_uniform_tri_mesh_2d};
use fenris_topology::mesh::{Mesh, MeshSearch};
use matrixcompare::assert_scalar_eq;
use nalgebra::Point3;
use proptest::prelude::*;

#[test]
fn colliding_cells_of_interior_points() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(4).unwrap();
    let search = MeshSearch::new(&mesh).unwrap();

    let point = Point3::new(0.3, 0.1, 0.0);
    let cells = search.colliding_cells(&point).unwrap();
    assert_eq!(cells.len(), 1);
    assert!(mesh.cell(cells[0]).unwrap().contains(&point).unwrap());

    // A vertex shared by six cells
    let centre = Point3::new(0.5, 0.5, 0.0);
    let cells = search.colliding_cells(&centre).unwrap();
    assert_eq!(cells.len(), 6);
    assert!(cells.windows(2).all(|w| w[0] < w[1]));

    assert!(search
        .colliding_cells(&Point3::new(1.5, 0.5, 0.0))
        .unwrap()
        .is_empty());
}

#[test]
fn closest_cell_of_outside_points() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(4).unwrap();
    let search = MeshSearch::new(&mesh).unwrap();

    let point = Point3::new(1.5, 0.6, 0.0);
    let (cell, distance) = search.closest_cell_and_distance(&point).unwrap().unwrap();
    assert_scalar_eq!(distance, 0.5, comp = abs, tol = 1e-12);
    assert_scalar_eq!(mesh.cell(cell).unwrap().squared_distance(&point).unwrap(), 0.25, comp = abs, tol = 1e-12);
    assert_eq!(search.closest_cell(&point).unwrap(), Some(cell));

    let corner = Point3::new(-3.0, -4.0, 0.0);
    assert_scalar_eq!(search.distance(&corner).unwrap().unwrap(), 5.0, comp = abs, tol = 1e-12);

    let inside = Point3::new(0.3, 0.1, 0.0);
    assert_scalar_eq!(search.distance(&inside).unwrap().unwrap(), 0.0, comp = abs, tol = 1e-12);
    assert_eq!(search.closest_cell(&inside).unwrap(), Some(search.colliding_cells(&inside).unwrap()[0]));
}

#[test]
fn ties_are_resolved_by_lowest_cell_index() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(2).unwrap();
    let search = MeshSearch::new(&mesh).unwrap();
    // Every cell touching the centre vertex has distance zero
    let centre = Point3::new(0.5, 0.5, 0.0);
    let touching = search.colliding_cells(&centre).unwrap();
    assert_eq!(search.closest_cell(&centre).unwrap(), touching.first().copied());
}

#[test]
fn search_in_tetrahedral_mesh() {
    let mesh = create_unit_box_uniform_tet_mesh_3d::<f64>(2).unwrap();
    let search = MeshSearch::new(&mesh).unwrap();
    assert_eq!(search.mesh().num_cells(), 48);
    let point = Point3::new(0.2, 0.3, 0.45);
    let cells = search.colliding_cells(&point).unwrap();
    assert_eq!(cells.len(), 1);
    assert_scalar_eq!(search.distance(&Point3::new(0.5, 0.5, 2.0)).unwrap().unwrap(), 1.0, comp = abs, tol = 1e-12);
}

#[test]
fn empty_meshes_have_no_closest_cell() {
    let mesh = Mesh::<f64>::from_vertices_and_cells(CellType::Triangle, 2, Vec::new(), Vec::new()).unwrap();
    let search = MeshSearch::new(&mesh).unwrap();
    assert_eq!(search.closest_cell(&Point3::origin()).unwrap(), None);
    assert_eq!(search.distance(&Point3::origin()).unwrap(), None);
    assert!(search.colliding_cells(&Point3::origin()).unwrap().is_empty());
}

proptest! {
    #[test]
    fn points_inside_the_unit_square_are_found(x in 0.0..=1.0f64, y in 0.0..=1.0f64) {
        let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(3).unwrap();
        let search = MeshSearch::new(&mesh).unwrap();
        let point = Point3::new(x, y, 0.0);
        let cells = search.colliding_cells(&point).unwrap();
        prop_assert!(!cells.is_empty());
        let (closest, distance) = search.closest_cell_and_distance(&point).unwrap().unwrap();
        prop_assert!(cells.contains(&closest));
        prop_assert!(distance <= 1e-12);
    }
}
