use crate::mesh::Mesh;
use crate::{MeshError, Real};
use log::trace;
use nalgebra::Point3;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, RTreeObject, AABB};

type CellBox = GeomWithData<Rectangle<[f64; 3]>, usize>;

fn to_f64<T: Real>(point: &Point3<T>) -> Result<[f64; 3], MeshError> {
    let mut p = [0.0; 3];
    for (p_i, x_i) in p.iter_mut().zip(point.iter()) {
        *p_i = x_i
            .to_subset()
            .ok_or_else(|| MeshError::MalformedInput("coordinate cannot be represented as f64".to_string()))?;
    }
    Ok(p)
}

/// Largest squared distance from `point` to any point of the box.
fn max_distance2(aabb: &AABB<[f64; 3]>, point: &[f64; 3]) -> f64 {
    let (lower, upper) = (aabb.lower(), aabb.upper());
    (0..3)
        .map(|i| {
            let d = f64::max((point[i] - lower[i]).abs(), (upper[i] - point[i]).abs());
            d * d
        })
        .sum()
}

/// Point queries on a mesh, accelerated by an R-tree of cell bounding boxes.
pub struct MeshSearch<'a, T: Real> {
    mesh: &'a Mesh<T>,
    tree: RTree<CellBox>,
}

impl<'a, T: Real> MeshSearch<'a, T> {
    pub fn new(mesh: &'a Mesh<T>) -> Result<Self, MeshError> {
        let mut boxes = Vec::with_capacity(mesh.num_cells());
        for cell in mesh.cells() {
            let points = cell.points()?;
            let mut lower = [f64::INFINITY; 3];
            let mut upper = [f64::NEG_INFINITY; 3];
            for point in &points {
                let p = to_f64(point)?;
                for i in 0..3 {
                    lower[i] = lower[i].min(p[i]);
                    upper[i] = upper[i].max(p[i]);
                }
            }
            // Enlarge boxes slightly so that containment tolerances are respected
            let margin = 0.005 * (0..3).map(|i| upper[i] - lower[i]).fold(0.0, f64::max);
            for i in 0..3 {
                lower[i] -= margin;
                upper[i] += margin;
            }
            boxes.push(GeomWithData::new(Rectangle::from_corners(lower, upper), cell.index()));
        }
        trace!("Built search tree for {} cells", boxes.len());
        Ok(Self {
            mesh,
            tree: RTree::bulk_load(boxes),
        })
    }

    pub fn mesh(&self) -> &'a Mesh<T> {
        self.mesh
    }

    /// Cells containing the point, in ascending order.
    pub fn colliding_cells(&self, point: &Point3<T>) -> Result<Vec<usize>, MeshError> {
        let p = to_f64(point)?;
        let mut cells = Vec::new();
        for candidate in self.tree.locate_all_at_point(&p) {
            if self.mesh.cell(candidate.data)?.contains(point)? {
                cells.push(candidate.data);
            }
        }
        cells.sort_unstable();
        Ok(cells)
    }

    /// The cell closest to the point together with the distance. Ties are resolved in favour of
    /// the lowest cell index. Returns `None` for meshes without cells.
    pub fn closest_cell_and_distance(&self, point: &Point3<T>) -> Result<Option<(usize, T)>, MeshError> {
        let p = to_f64(point)?;
        let mut candidates = self.tree.nearest_neighbor_iter(&p).peekable();
        // Boxes farther away than the farthest point of the nearest box cannot hold the closest cell
        let d2_max = match candidates.peek() {
            Some(first) => max_distance2(&first.envelope(), &p),
            None => return Ok(None),
        };

        let mut closest: Option<(usize, T)> = None;
        for candidate in candidates.take_while(|candidate| candidate.envelope().distance_2(&p) <= d2_max) {
            let cell = candidate.data;
            let d2 = self.mesh.cell(cell)?.squared_distance(point)?;
            closest = match closest {
                Some((best, best_d2)) if best_d2 < d2 || (best_d2 == d2 && best < cell) => Some((best, best_d2)),
                _ => Some((cell, d2)),
            };
        }
        Ok(closest.map(|(cell, d2)| (cell, d2.sqrt())))
    }

    pub fn closest_cell(&self, point: &Point3<T>) -> Result<Option<usize>, MeshError> {
        Ok(self.closest_cell_and_distance(point)?.map(|(cell, _)| cell))
    }

    /// Distance from the point to the mesh.
    pub fn distance(&self, point: &Point3<T>) -> Result<Option<T>, MeshError> {
        Ok(self.closest_cell_and_distance(point)?.map(|(_, d)| d))
    }
}
