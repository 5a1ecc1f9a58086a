//! Strategies for property-based testing with `proptest`.
use crate::cell::CellType;
use crate::mesh::procedural::{
    create_rectangular_uniform_quad_mesh_2d, create_rectangular_uniform_tri_mesh_2d, create_unit_box_uniform_tet_mesh_3d,
};
use crate::mesh::Mesh;
use ::proptest::prelude::*;
use nalgebra::{Point2, Point3};
use std::cmp::max;

pub fn point2() -> impl Strategy<Value = Point2<f64>> {
    // Keep coordinates in a modest range, so that geometric predicates stay well conditioned
    let range = -10.0..10.0;
    [range.clone(), range.clone()].prop_map(|[x, y]| Point2::new(x, y))
}

pub fn point3() -> impl Strategy<Value = Point3<f64>> {
    let range = -10.0..10.0;
    [range.clone(), range.clone(), range.clone()].prop_map(|[x, y, z]| Point3::new(x, y, z))
}

/// Triangles whose area is bounded away from zero, as padded 3D points in the xy-plane.
pub fn nondegenerate_triangle() -> impl Strategy<Value = [Point3<f64>; 3]> {
    [point2(), point2(), point2()]
        .prop_filter("triangle must not be degenerate", |[a, b, c]| {
            let area = 0.5 * (b - a).perp(&(c - a)).abs();
            area > 1e-2
        })
        .prop_map(|points| points.map(|p| Point3::new(p.x, p.y, 0.0)))
}

// Returns a strategy in which each value is a triplet (cells_per_unit, units_x, units_y)
// such that cells_per_unit^2 * units_x * units_y <= max_cells, with every entry at least one
fn rectangular_cell_distribution_strategy(max_cells: usize) -> impl Strategy<Value = (usize, usize, usize)> {
    let max_cells = max(1, max_cells);
    let max_cells_per_unit = max(1, f64::floor(f64::sqrt(max_cells as f64)) as usize);
    (1..=max_cells_per_unit)
        .prop_flat_map(move |cells_per_unit| {
            let cells_per_unit_sq = cells_per_unit * cells_per_unit;
            (Just(cells_per_unit), 1..=max(1, max_cells / cells_per_unit_sq))
        })
        .prop_flat_map(move |(cells_per_unit, units_x)| {
            let units_y_strategy = 1..=max(1, max_cells / (cells_per_unit * cells_per_unit * units_x));
            (Just(cells_per_unit), Just(units_x), units_y_strategy)
        })
}

/// Uniform rectangular meshes of triangles or quadrilaterals with at most `max_cells` squares.
pub fn rectangular_mesh_strategy(cell_type: CellType, max_cells: usize) -> impl Strategy<Value = Mesh<f64>> {
    rectangular_cell_distribution_strategy(max_cells).prop_map(move |(cells_per_unit, units_x, units_y)| {
        let mesh = match cell_type {
            CellType::Quadrilateral => create_rectangular_uniform_quad_mesh_2d(1.0, units_x, units_y, cells_per_unit),
            _ => create_rectangular_uniform_tri_mesh_2d(1.0, units_x, units_y, cells_per_unit),
        };
        mesh.expect("Uniform meshes are always valid")
    })
}

pub fn unit_box_tet_mesh_strategy(max_cells_per_dim: usize) -> impl Strategy<Value = Mesh<f64>> {
    (1..=max(1, max_cells_per_dim))
        .prop_map(|n| create_unit_box_uniform_tet_mesh_3d(n).expect("Uniform meshes are always valid"))
}

/// Relabels the vertices of meshes drawn from `meshes` with a random permutation, producing
/// unordered meshes of the same geometry. The local vertex order of simplex cells is also
/// rotated.
pub fn scrambled_mesh_strategy(meshes: impl Strategy<Value = Mesh<f64>>) -> impl Strategy<Value = Mesh<f64>> {
    meshes
        .prop_flat_map(|mesh| {
            let permutation = Just((0..mesh.num_vertices()).collect::<Vec<_>>()).prop_shuffle();
            let rotations = prop::collection::vec(0..8usize, mesh.num_cells());
            (Just(mesh), permutation, rotations)
        })
        .prop_map(|(mesh, permutation, rotations)| {
            let gdim = mesh.gdim();
            let mut coordinates = vec![0.0; gdim * mesh.num_vertices()];
            for (old, &new) in permutation.iter().enumerate() {
                coordinates[gdim * new..gdim * (new + 1)].copy_from_slice(mesh.geometry().x(old));
            }
            let is_simplex = mesh.cell_type().is_simplex();
            let mut cells = Vec::new();
            for (vertices, rotation) in mesh.topology().cells().rows().zip(rotations) {
                let n = vertices.len();
                let rotation = if is_simplex { rotation } else { 0 };
                cells.extend((0..n).map(|i| permutation[vertices[(i + rotation) % n]]));
            }
            Mesh::from_vertices_and_cells(mesh.cell_type(), gdim, coordinates, cells)
                .expect("Relabelling preserves validity")
        })
}
