use crate::{CsgError, CsgGeometry};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// A constrained triangulation of the plane region covering a CSG geometry.
///
/// The triangulation typically covers more than the resolved domain (e.g. holes and the
/// convex hull of all primitives). Edges lying on primitive boundaries are listed in
/// `constrained_edges`; they separate the nesting levels used to classify triangles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstrainedTriangulation {
    pub vertices: Vec<Point2<f64>>,
    pub triangles: Vec<[usize; 3]>,
    pub constrained_edges: Vec<[usize; 2]>,
}

/// The exact-geometry kernel used to triangulate a CSG geometry.
///
/// Implementations resolve the Boolean operations of the tree, insert the boundaries as
/// constraints and refine the triangulation so that triangles respect the shape bound
/// (ratio between circumradius and shortest edge) and the cell size (longest edge).
pub trait TriangulationBackend {
    fn triangulate(
        &self,
        geometry: &CsgGeometry,
        triangle_shape_bound: f64,
        cell_size: f64,
    ) -> Result<ConstrainedTriangulation, CsgError>;
}

impl<F> TriangulationBackend for F
where
    F: Fn(&CsgGeometry, f64, f64) -> Result<ConstrainedTriangulation, CsgError>,
{
    fn triangulate(
        &self,
        geometry: &CsgGeometry,
        triangle_shape_bound: f64,
        cell_size: f64,
    ) -> Result<ConstrainedTriangulation, CsgError> {
        self(geometry, triangle_shape_bound, cell_size)
    }
}

fn sorted_edge(a: usize, b: usize) -> [usize; 2] {
    if a < b {
        [a, b]
    } else {
        [b, a]
    }
}

impl ConstrainedTriangulation {
    pub fn validate(&self) -> Result<(), CsgError> {
        let n = self.vertices.len();
        for (i, triangle) in self.triangles.iter().enumerate() {
            if triangle.iter().any(|&v| v >= n) {
                return Err(CsgError::MalformedTriangulation(format!(
                    "triangle {} references a vertex out of bounds ({} vertices)",
                    i, n
                )));
            }
            if triangle[0] == triangle[1] || triangle[1] == triangle[2] || triangle[0] == triangle[2] {
                return Err(CsgError::MalformedTriangulation(format!(
                    "triangle {} has repeated vertices",
                    i
                )));
            }
        }
        for edge in &self.constrained_edges {
            if edge[0] >= n || edge[1] >= n {
                return Err(CsgError::MalformedTriangulation(
                    "constrained edge references a vertex out of bounds".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Computes the nesting level of every triangle.
    ///
    /// The unbounded face surrounding the triangulation has level 0. A flood fill crosses
    /// unconstrained edges without changing level, while crossing a constrained edge increments
    /// it. Triangles that cannot be reached get `None`.
    pub fn nesting_levels(&self) -> Result<Vec<Option<usize>>, CsgError> {
        self.validate()?;
        let num_faces = self.triangles.len();
        let infinite_face = num_faces;

        let mut edge_faces: BTreeMap<[usize; 2], Vec<usize>> = BTreeMap::new();
        for (f, t) in self.triangles.iter().enumerate() {
            for i in 0..3 {
                let edge = sorted_edge(t[(i + 1) % 3], t[(i + 2) % 3]);
                edge_faces.entry(edge).or_default().push(f);
            }
        }
        if let Some((edge, faces)) = edge_faces.iter().find(|(_, faces)| faces.len() > 2) {
            return Err(CsgError::MalformedTriangulation(format!(
                "edge {:?} is shared by {} triangles",
                edge,
                faces.len()
            )));
        }

        let constrained: BTreeSet<[usize; 2]> = self
            .constrained_edges
            .iter()
            .map(|e| sorted_edge(e[0], e[1]))
            .collect();

        let hull_edges: Vec<([usize; 2], usize)> = edge_faces
            .iter()
            .filter(|(_, faces)| faces.len() == 1)
            .map(|(edge, faces)| (*edge, faces[0]))
            .collect();

        // (edge, neighbor across edge) pairs; the infinite face borders every hull edge
        let neighbors = |face: usize| -> Vec<([usize; 2], usize)> {
            if face == infinite_face {
                hull_edges.clone()
            } else {
                let t = &self.triangles[face];
                (0..3)
                    .map(|i| {
                        let edge = sorted_edge(t[(i + 1) % 3], t[(i + 2) % 3]);
                        let other = edge_faces[&edge]
                            .iter()
                            .copied()
                            .find(|&g| g != face)
                            .unwrap_or(infinite_face);
                        (edge, other)
                    })
                    .collect()
            }
        };

        let mut levels = vec![None; num_faces + 1];
        let mut border = VecDeque::new();

        let flood = |start: usize,
                     level: usize,
                     levels: &mut Vec<Option<usize>>,
                     border: &mut VecDeque<(usize, [usize; 2], usize)>| {
            if levels[start].is_some() {
                return;
            }
            let mut queue = VecDeque::from([start]);
            while let Some(face) = queue.pop_front() {
                if levels[face].is_some() {
                    continue;
                }
                levels[face] = Some(level);
                for (edge, neighbor) in neighbors(face) {
                    if levels[neighbor].is_none() {
                        if constrained.contains(&edge) {
                            border.push_back((face, edge, neighbor));
                        } else {
                            queue.push_back(neighbor);
                        }
                    }
                }
            }
        };

        flood(infinite_face, 0, &mut levels, &mut border);
        while let Some((face, _, neighbor)) = border.pop_front() {
            if levels[neighbor].is_none() {
                let level = levels[face].map(|l| l + 1).unwrap_or(1);
                flood(neighbor, level, &mut levels, &mut border);
            }
        }

        levels.truncate(num_faces);
        Ok(levels)
    }

    /// Whether each triangle lies inside the resolved domain, i.e. has odd nesting level.
    pub fn in_domain(&self) -> Result<Vec<bool>, CsgError> {
        Ok(self
            .nesting_levels()?
            .into_iter()
            .map(|level| level.map(|l| l % 2 == 1).unwrap_or(false))
            .collect())
    }
}
