//! Basic procedural mesh generation routines.
//!
//! All meshes are ordered. Vertices of the structured grids are numbered with the x index
//! running fastest.
use crate::cell::CellType;
use crate::mesh::Mesh;
use crate::{MeshError, Real};

/// Local vertices of the six tetrahedra of a Kuhn subdivision of a hexahedron. Neighbouring
/// hexahedra split their shared faces along the same diagonal.
const KUHN_TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 1, 5, 7],
    [0, 2, 3, 7],
    [0, 2, 6, 7],
    [0, 4, 5, 7],
    [0, 4, 6, 7],
];

fn coordinate<T: Real>(index: usize, cell_size: T) -> T {
    T::from_usize(index).expect("Must be able to fit usize in T") * cell_size
}

fn cell_size<T: Real>(unit_length: T, cells_per_unit: usize) -> T {
    unit_length / T::from_usize(cells_per_unit).expect("Must be able to fit usize in T")
}

fn ordered<T: Real>(mut mesh: Mesh<T>) -> Result<Mesh<T>, MeshError> {
    mesh.order()?;
    Ok(mesh)
}

/// The interval `[0, 1]` divided into `num_cells` cells.
pub fn create_unit_interval_mesh<T: Real>(num_cells: usize) -> Result<Mesh<T>, MeshError> {
    let h = cell_size(T::one(), num_cells.max(1));
    let num_vertices = if num_cells == 0 { 0 } else { num_cells + 1 };
    let coordinates = (0..num_vertices).map(|i| coordinate(i, h)).collect();
    let cells = (0..num_cells).flat_map(|i| [i, i + 1]).collect();
    ordered(Mesh::from_vertices_and_cells(CellType::Interval, 1, coordinates, cells)?)
}

/// Vertices and tensor-ordered cells of the grid `[0, u * ux] x [0, u * uy]`.
fn rectangular_grid<T: Real>(
    unit_length: T,
    units_x: usize,
    units_y: usize,
    cells_per_unit: usize,
) -> (Vec<T>, Vec<[usize; 4]>) {
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 {
        return (Vec::new(), Vec::new());
    }
    let h = cell_size(unit_length, cells_per_unit);
    let num_cells_x = units_x * cells_per_unit;
    let num_cells_y = units_y * cells_per_unit;
    let num_vertices_x = num_cells_x + 1;
    let to_global_vertex_index = |i: usize, j: usize| num_vertices_x * j + i;

    let mut coordinates = Vec::new();
    for j in 0..=num_cells_y {
        for i in 0..=num_cells_x {
            coordinates.push(coordinate(i, h));
            coordinates.push(coordinate(j, h));
        }
    }
    let mut cells = Vec::new();
    for j in 0..num_cells_y {
        for i in 0..num_cells_x {
            cells.push([
                to_global_vertex_index(i, j),
                to_global_vertex_index(i + 1, j),
                to_global_vertex_index(i, j + 1),
                to_global_vertex_index(i + 1, j + 1),
            ]);
        }
    }
    (coordinates, cells)
}

/// Generates an axis-aligned rectangular uniform quadrilateral mesh of
/// `[0, u * ux] x [0, u * uy]`, where `u` is the unit length, with the given number of cells
/// per unit length.
pub fn create_rectangular_uniform_quad_mesh_2d<T: Real>(
    unit_length: T,
    units_x: usize,
    units_y: usize,
    cells_per_unit: usize,
) -> Result<Mesh<T>, MeshError> {
    let (coordinates, cells) = rectangular_grid(unit_length, units_x, units_y, cells_per_unit);
    let cells = cells.into_iter().flatten().collect();
    ordered(Mesh::from_vertices_and_cells(CellType::Quadrilateral, 2, coordinates, cells)?)
}

pub fn create_unit_square_uniform_quad_mesh_2d<T: Real>(cells_per_dim: usize) -> Result<Mesh<T>, MeshError> {
    create_rectangular_uniform_quad_mesh_2d(T::one(), 1, 1, cells_per_dim)
}

/// Like [`create_rectangular_uniform_quad_mesh_2d`], with every quadrilateral split into two
/// triangles along the diagonal through its first vertex.
pub fn create_rectangular_uniform_tri_mesh_2d<T: Real>(
    unit_length: T,
    units_x: usize,
    units_y: usize,
    cells_per_unit: usize,
) -> Result<Mesh<T>, MeshError> {
    let (coordinates, quads) = rectangular_grid(unit_length, units_x, units_y, cells_per_unit);
    let cells = quads
        .into_iter()
        .flat_map(|[v0, v1, v2, v3]| [v0, v1, v3, v0, v3, v2])
        .collect();
    ordered(Mesh::from_vertices_and_cells(CellType::Triangle, 2, coordinates, cells)?)
}

pub fn create_unit_square_uniform_tri_mesh_2d<T: Real>(cells_per_dim: usize) -> Result<Mesh<T>, MeshError> {
    create_rectangular_uniform_tri_mesh_2d(T::one(), 1, 1, cells_per_dim)
}

/// Vertices and tensor-ordered cells of the box `[0, u * ux] x [0, u * uy] x [0, u * uz]`.
fn box_grid<T: Real>(
    unit_length: T,
    units: [usize; 3],
    cells_per_unit: usize,
) -> (Vec<T>, Vec<[usize; 8]>) {
    if cells_per_unit == 0 || units.contains(&0) {
        return (Vec::new(), Vec::new());
    }
    let h = cell_size(unit_length, cells_per_unit);
    let [nx, ny, nz] = units.map(|u| u * cells_per_unit);
    let to_global_vertex_index = |i: usize, j: usize, k: usize| ((ny + 1) * k + j) * (nx + 1) + i;

    let mut coordinates = Vec::new();
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                coordinates.extend_from_slice(&[coordinate(i, h), coordinate(j, h), coordinate(k, h)]);
            }
        }
    }
    let mut cells = Vec::new();
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let mut cell = [0; 8];
                for (local, vertex) in cell.iter_mut().enumerate() {
                    *vertex = to_global_vertex_index(i + (local & 1), j + ((local >> 1) & 1), k + ((local >> 2) & 1));
                }
                cells.push(cell);
            }
        }
    }
    (coordinates, cells)
}

/// Generates an axis-aligned uniform hexahedral mesh of the box
/// `[0, u * ux] x [0, u * uy] x [0, u * uz]`.
pub fn create_rectangular_uniform_hex_mesh<T: Real>(
    unit_length: T,
    units_x: usize,
    units_y: usize,
    units_z: usize,
    cells_per_unit: usize,
) -> Result<Mesh<T>, MeshError> {
    let (coordinates, cells) = box_grid(unit_length, [units_x, units_y, units_z], cells_per_unit);
    let cells = cells.into_iter().flatten().collect();
    ordered(Mesh::from_vertices_and_cells(CellType::Hexahedron, 3, coordinates, cells)?)
}

pub fn create_unit_box_uniform_hex_mesh_3d<T: Real>(cells_per_dim: usize) -> Result<Mesh<T>, MeshError> {
    create_rectangular_uniform_hex_mesh(T::one(), 1, 1, 1, cells_per_dim)
}

/// The unit box with every hexahedral cell split into six tetrahedra.
pub fn create_unit_box_uniform_tet_mesh_3d<T: Real>(cells_per_dim: usize) -> Result<Mesh<T>, MeshError> {
    let (coordinates, hexahedra) = box_grid(T::one(), [1, 1, 1], cells_per_dim);
    let cells = hexahedra
        .iter()
        .flat_map(|hex| KUHN_TETRAHEDRA.iter().flat_map(move |tet| tet.map(|i| hex[i])))
        .collect();
    ordered(Mesh::from_vertices_and_cells(CellType::Tetrahedron, 3, coordinates, cells)?)
}
