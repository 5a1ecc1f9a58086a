//! Vertex coordinate storage.
use crate::{MeshError, Real};
use nalgebra::{Point3, Scalar};
use serde::{Deserialize, Serialize};

/// Coordinates of all mesh vertices, stored as one flat array with `dim` entries per vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshGeometry<T> {
    dim: usize,
    coordinates: Vec<T>,
}

impl<T: Scalar> MeshGeometry<T> {
    /// Creates an empty geometry for the given embedding dimension (1, 2 or 3).
    pub fn new(dim: usize) -> Result<Self, MeshError> {
        Self::from_coordinates(dim, Vec::new())
    }

    pub fn from_coordinates(dim: usize, coordinates: Vec<T>) -> Result<Self, MeshError> {
        if !(1..=3).contains(&dim) {
            return Err(MeshError::MalformedInput(format!(
                "geometric dimension must be 1, 2 or 3, got {}",
                dim
            )));
        }
        if coordinates.len() % dim != 0 {
            return Err(MeshError::MalformedInput(format!(
                "{} coordinates do not form whole points of dimension {}",
                coordinates.len(),
                dim
            )));
        }
        Ok(Self { dim, coordinates })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn num_vertices(&self) -> usize {
        self.coordinates.len() / self.dim
    }

    pub fn coordinates(&self) -> &[T] {
        &self.coordinates
    }

    /// Coordinates of the given vertex.
    ///
    /// # Panics
    ///
    /// Panics if the vertex index is out of bounds.
    pub fn x(&self, vertex: usize) -> &[T] {
        &self.coordinates[self.dim * vertex..self.dim * (vertex + 1)]
    }

    pub fn x_mut(&mut self, vertex: usize) -> &mut [T] {
        &mut self.coordinates[self.dim * vertex..self.dim * (vertex + 1)]
    }

    pub(crate) fn push(&mut self, x: &[T]) {
        debug_assert_eq!(x.len(), self.dim);
        self.coordinates.extend_from_slice(x);
    }
}

impl<T: Real> MeshGeometry<T> {
    /// The given vertex as a point in R^3, padded with zeros.
    pub fn point(&self, vertex: usize) -> Point3<T> {
        let mut p = Point3::origin();
        for (p_i, x_i) in p.coords.iter_mut().zip(self.x(vertex)) {
            *p_i = *x_i;
        }
        p
    }

    pub fn try_point(&self, vertex: usize) -> Result<Point3<T>, MeshError> {
        if vertex < self.num_vertices() {
            Ok(self.point(vertex))
        } else {
            Err(MeshError::out_of_bounds("MeshGeometry::point", vertex, self.num_vertices()))
        }
    }

    /// Collects the points of the given vertices into `points`, replacing its contents.
    pub fn gather_points(&self, vertices: &[usize], points: &mut Vec<Point3<T>>) -> Result<(), MeshError> {
        points.clear();
        for &v in vertices {
            points.push(self.try_point(v)?);
        }
        Ok(())
    }

    /// Overwrites the given vertex with the first `dim` components of `p`.
    pub fn set_point(&mut self, vertex: usize, p: &Point3<T>) {
        let dim = self.dim;
        self.x_mut(vertex).copy_from_slice(&p.coords.as_slice()[..dim]);
    }
}
