use crate::cell::{midpoint, CellOrientation, CellType};
use crate::mesh::Mesh;
use crate::{MeshError, Real};
use nalgebra::{Point3, Scalar, Vector3};

/// A view of the entity `index` of dimension `dim` in a mesh.
#[derive(Debug)]
pub struct MeshEntity<'a, T: Scalar> {
    mesh: &'a Mesh<T>,
    dim: usize,
    index: usize,
}

impl<'a, T: Scalar> Clone for MeshEntity<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: Scalar> Copy for MeshEntity<'a, T> {}

impl<'a, T: Real> MeshEntity<'a, T> {
    pub(crate) fn new(mesh: &'a Mesh<T>, dim: usize, index: usize) -> Self {
        Self { mesh, dim, index }
    }

    pub fn mesh(&self) -> &'a Mesh<T> {
        self.mesh
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The shape of the entity.
    pub fn entity_type(&self) -> CellType {
        self.mesh
            .cell_type()
            .entity_type(self.dim)
            .expect("Entity dimension never exceeds the mesh dimension")
    }

    /// Global index of the entity, if a global numbering is known for its dimension.
    pub fn global_index(&self) -> Option<usize> {
        self.mesh.topology().global_index(self.dim, self.index)
    }

    /// Vertices of the entity, in local order.
    pub fn vertex_indices(&self) -> Result<Vec<usize>, MeshError> {
        if self.dim == 0 {
            return Ok(vec![self.index]);
        }
        let table = self.mesh.topology().connectivity(self.dim, 0)?;
        Ok(table.row(self.index).to_vec())
    }

    /// Incident entities of dimension `dim`, as given by the connectivity (self.dim, dim).
    pub fn entities(&self, dim: usize) -> Result<Vec<usize>, MeshError> {
        let table = self.mesh.topology().connectivity(self.dim, dim)?;
        Ok(table.row(self.index).to_vec())
    }

    pub fn num_entities(&self, dim: usize) -> Result<usize, MeshError> {
        let table = self.mesh.topology().connectivity(self.dim, dim)?;
        Ok(table.row(self.index).len())
    }

    /// Coordinates of the vertices, in local order.
    pub fn points(&self) -> Result<Vec<Point3<T>>, MeshError> {
        let mut points = Vec::new();
        self.mesh
            .geometry()
            .gather_points(&self.vertex_indices()?, &mut points)?;
        Ok(points)
    }

    /// Average of the vertex coordinates.
    pub fn midpoint(&self) -> Result<Point3<T>, MeshError> {
        Ok(midpoint(&self.points()?))
    }

    pub fn volume(&self) -> Result<T, MeshError> {
        self.entity_type().volume(self)
    }

    pub fn diameter(&self) -> Result<T, MeshError> {
        self.entity_type().diameter(self)
    }

    pub fn circumradius(&self) -> Result<T, MeshError> {
        self.entity_type().circumradius(self)
    }

    pub fn inradius(&self) -> Result<T, MeshError> {
        self.entity_type().inradius(self)
    }

    pub fn radius_ratio(&self) -> Result<T, MeshError> {
        self.entity_type().radius_ratio(self)
    }

    pub fn contains(&self, point: &Point3<T>) -> Result<bool, MeshError> {
        self.entity_type().contains(self, point)
    }

    pub fn squared_distance(&self, point: &Point3<T>) -> Result<T, MeshError> {
        self.entity_type().squared_distance(self, point)
    }

    pub fn distance(&self, point: &Point3<T>) -> Result<T, MeshError> {
        Ok(self.squared_distance(point)?.sqrt())
    }

    pub fn normal(&self, facet: usize) -> Result<Vector3<T>, MeshError> {
        self.entity_type().normal(self, facet)
    }

    pub fn cell_normal(&self) -> Result<Vector3<T>, MeshError> {
        self.entity_type().cell_normal(self)
    }

    pub fn facet_area(&self, facet: usize) -> Result<T, MeshError> {
        self.entity_type().facet_area(self, facet)
    }

    pub fn orientation(&self, up: &Vector3<T>) -> Result<CellOrientation, MeshError> {
        self.entity_type().orientation(self, up)
    }
}
