//! Uniform refinement.
//!
//! New vertices are placed at the midpoints of all edges. Quadrilaterals and hexahedra also get
//! a vertex at the centre of every face and cell, so that every cell is split into `2^D`
//! children of the same type. New vertices are numbered after the existing ones: first one per
//! edge, then one per face, then one per cell, each in entity order.
use crate::cell::{midpoint, CellType};
use crate::editor::MeshEditor;
use crate::mesh::Mesh;
use crate::topology::ConnectivityTable;
use crate::{MeshError, Real};
use log::trace;
use std::sync::Arc;

/// Triangle children in terms of the three vertices followed by the three edge midpoints.
const TRIANGLE_CHILDREN: [[usize; 3]; 4] = [[0, 5, 4], [1, 3, 5], [2, 4, 3], [3, 4, 5]];

/// Tetrahedron children in terms of the four vertices followed by the six edge midpoints. The
/// inner octahedron is split along the diagonal between the midpoints of edges 1 and 4.
const TETRAHEDRON_CHILDREN: [[usize; 4]; 8] = [
    [0, 9, 8, 7],
    [9, 1, 6, 5],
    [8, 6, 2, 4],
    [7, 5, 4, 3],
    [9, 8, 7, 5],
    [9, 8, 6, 5],
    [8, 7, 5, 4],
    [8, 6, 5, 4],
];

/// Local vertices of the sub-entity at a point of the `3^D` lattice of a tensor-product cell.
///
/// Even lattice coordinates fix a side of the cell, odd ones span the entity.
fn lattice_entity(lattice: &[usize], local_vertices: &mut Vec<usize>) -> usize {
    let tdim = lattice.len();
    local_vertices.clear();
    local_vertices.extend((0..1 << tdim).filter(|&v| {
        lattice
            .iter()
            .enumerate()
            .all(|(axis, &a)| a % 2 == 1 || (v >> axis) & 1 == a / 2)
    }));
    lattice.iter().filter(|&&a| a % 2 == 1).count()
}

impl<T: Real> Mesh<T> {
    /// Refines every cell uniformly. Cell markers are inherited by the children.
    pub fn refine_uniformly(&self) -> Result<Self, MeshError> {
        let cell_type = self.cell_type();
        let tdim = self.dim();
        if tdim == 0 {
            return Err(MeshError::UnsupportedCellType {
                operation: "refine_uniformly",
                cell_type,
            });
        }
        let topology = self.topology();
        let cells = topology.cells();

        // New vertices are created for edges and, for tensor-product cells, all higher entities
        let max_dim = if cell_type.is_simplex() { 1 } else { tdim };
        let mut offsets = vec![0; tdim + 2];
        offsets[1] = self.num_vertices();
        for d in 1..=max_dim {
            offsets[d + 1] = offsets[d] + topology.init(d)?;
        }
        let num_vertices = offsets[max_dim + 1];

        let mut editor = MeshEditor::open(cell_type, self.gdim())?;
        editor.init_vertices(num_vertices)?;
        for v in 0..self.num_vertices() {
            editor.add_vertex(v, self.geometry().x(v))?;
        }
        let mut points = Vec::new();
        for d in 1..=max_dim {
            let entity_vertices = topology.connectivity(d, 0)?;
            for (e, vertices) in entity_vertices.rows().enumerate() {
                self.geometry().gather_points(vertices, &mut points)?;
                let x = midpoint(&points);
                editor.add_vertex(offsets[d] + e, &x.coords.as_slice()[..self.gdim()])?;
            }
        }

        let num_children = 1 << tdim;
        editor.init_cells(num_children * self.num_cells())?;
        // Cells themselves are not looked up through a table
        let cell_entities: Vec<_> = (1..=max_dim.min(tdim - 1))
            .map(|d| topology.connectivity(tdim, d))
            .collect::<Result<_, _>>()?;
        let mut new_vertices = Vec::new();
        let mut children = Vec::new();
        for (cell, vertices) in cells.rows().enumerate() {
            children.clear();
            if cell_type.is_simplex() {
                // Vertices followed by edge midpoints, in reference order
                new_vertices.clear();
                new_vertices.extend_from_slice(vertices);
                match cell_entities.first() {
                    Some(edges) => new_vertices.extend(edges.row(cell).iter().map(|&e| offsets[1] + e)),
                    None => new_vertices.push(offsets[1] + cell),
                }
                match cell_type {
                    CellType::Interval => {
                        children.push(vec![new_vertices[0], new_vertices[2]]);
                        children.push(vec![new_vertices[2], new_vertices[1]]);
                    }
                    CellType::Triangle => {
                        children.extend(TRIANGLE_CHILDREN.iter().map(|c| c.map(|i| new_vertices[i]).to_vec()))
                    }
                    _ => children.extend(
                        TETRAHEDRON_CHILDREN
                            .iter()
                            .map(|c| c.map(|i| new_vertices[i]).to_vec()),
                    ),
                }
            } else {
                self.tensor_children(cell_type, cell, vertices, &cell_entities, &offsets, &mut children)?;
            }
            for (i, child) in children.iter().enumerate() {
                editor.add_cell(num_children * cell + i, child)?;
            }
        }

        let mut refined = editor.close(false)?;
        if let Some(markers) = self.domains().markers(tdim) {
            for (&cell, &label) in markers {
                for i in 0..num_children {
                    refined
                        .domains_mut()
                        .set_marker(tdim, num_children * cell + i, label);
                }
            }
        }
        trace!(
            "Refined {} {} into {}",
            self.num_cells(),
            cell_type.description(true),
            refined.num_cells()
        );
        Ok(refined)
    }

    /// Children of a quadrilateral or hexahedron on the `3^D` lattice of its vertices, edge,
    /// face and cell midpoints.
    fn tensor_children(
        &self,
        cell_type: CellType,
        cell: usize,
        vertices: &[usize],
        cell_entities: &[Arc<ConnectivityTable>],
        offsets: &[usize],
        children: &mut Vec<Vec<usize>>,
    ) -> Result<(), MeshError> {
        let tdim = cell_type.dim();
        let mut local_vertices = Vec::new();
        let mut sorted_pattern = Vec::new();
        let mut node = |lattice: &[usize]| -> Result<usize, MeshError> {
            let dim = lattice_entity(lattice, &mut local_vertices);
            if dim == 0 {
                return Ok(vertices[local_vertices[0]]);
            }
            if dim == tdim {
                return Ok(offsets[tdim] + cell);
            }
            let position = cell_type
                .reference_entities(dim)?
                .iter()
                .position(|pattern| {
                    sorted_pattern.clear();
                    sorted_pattern.extend_from_slice(pattern);
                    sorted_pattern.sort_unstable();
                    sorted_pattern == local_vertices
                })
                .ok_or_else(|| {
                    MeshError::MalformedInput(format!("no {}-dimensional entity with vertices {:?}", dim, local_vertices))
                })?;
            Ok(offsets[dim] + cell_entities[dim - 1].row(cell)[position])
        };

        let mut lattice = vec![0; tdim];
        for child in 0..1usize << tdim {
            let mut child_vertices = Vec::with_capacity(1 << tdim);
            for corner in 0..1usize << tdim {
                for (axis, a) in lattice.iter_mut().enumerate() {
                    *a = ((child >> axis) & 1) + ((corner >> axis) & 1);
                }
                child_vertices.push(node(&lattice)?);
            }
            children.push(child_vertices);
        }
        Ok(())
    }
}
