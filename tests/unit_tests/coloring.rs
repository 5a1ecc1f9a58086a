use fenris_topology::cell::CellType;
use fenris_topology::mesh::procedural::{create_unit_box_uniform_tet_mesh_3d, create_unit_square_uniform_tri_mesh_2d};
use fenris_topology::mesh::Mesh;
use fenris_topology::proptest::{rectangular_mesh_strategy, scrambled_mesh_strategy};
use proptest::prelude::*;

/// Checks that no two cells of the same color share an entity of dimension `dim`.
fn assert_valid_coloring(mesh: &Mesh<f64>, colors: &[usize], dim: usize) {
    let cell_entities = mesh.topology().connectivity(mesh.dim(), dim).unwrap();
    let entity_cells = mesh.topology().connectivity(dim, mesh.dim()).unwrap();
    assert_eq!(colors.len(), mesh.num_cells());
    for (cell, entities) in cell_entities.rows().enumerate() {
        for &entity in entities {
            for &other in entity_cells.row(entity) {
                if other != cell {
                    assert_ne!(colors[cell], colors[other], "cells {} and {} share entity {}", cell, other, entity);
                }
            }
        }
    }
}

#[test]
fn vertex_coloring_separates_touching_cells() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(4).unwrap();
    let colors = mesh.color(&[0]).unwrap();
    assert_valid_coloring(&mesh, &colors, 0);
    // Six cells meet at interior vertices
    let num_colors = colors.iter().max().unwrap() + 1;
    assert!(num_colors >= 6);
}

#[test]
fn facet_coloring_of_tetrahedra() {
    let mesh = create_unit_box_uniform_tet_mesh_3d::<f64>(2).unwrap();
    let colors = mesh.color(&[2]).unwrap();
    assert_valid_coloring(&mesh, &colors, 2);
    let combined = mesh.color(&[1, 2]).unwrap();
    assert_valid_coloring(&mesh, &combined, 1);
    assert_valid_coloring(&mesh, &combined, 2);
}

#[test]
fn cells_by_color_partitions_all_cells() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(3).unwrap();
    let colors = mesh.color(&[1]).unwrap();
    let groups = mesh.cells_by_color(&[1]).unwrap();
    let mut all_cells: Vec<_> = groups.concat();
    all_cells.sort_unstable();
    assert_eq!(all_cells, (0..mesh.num_cells()).collect::<Vec<_>>());
    for (color, group) in groups.iter().enumerate() {
        assert!(!group.is_empty());
        assert!(group.iter().all(|&cell| colors[cell] == color));
    }
    // The first cell always receives the first color
    assert_eq!(colors[0], 0);
}

#[test]
fn meshes_without_cells_have_no_colors() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(0).unwrap();
    assert!(mesh.color(&[0]).unwrap().is_empty());
    assert!(mesh.cells_by_color(&[0]).unwrap().is_empty());
}

proptest! {
    #[test]
    fn coloring_is_valid_and_deterministic(
        mesh in scrambled_mesh_strategy(rectangular_mesh_strategy(CellType::Quadrilateral, 16))
    ) {
        let colors = mesh.color(&[0]).unwrap();
        assert_valid_coloring(&mesh, &colors, 0);
        let mut recomputed = mesh.clone();
        recomputed.clean();
        prop_assert_eq!(recomputed.color(&[0]).unwrap(), colors);
    }
}
