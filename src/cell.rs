//! Cell shapes: reference entity patterns and geometric formulas.
//!
//! A mesh holds cells of a single [`CellType`]. The cell type knows how the sub-entities of a
//! cell are defined in terms of its local vertices, and how to evaluate geometric quantities
//! (volume, diameter, normals, containment, distance) from vertex coordinates.
//!
//! Vertex numbering follows the usual simplex convention for intervals, triangles and
//! tetrahedra, and the tensor-product convention for quadrilaterals and hexahedra: local vertex
//! `i` sits at the reference coordinates given by the bits of `i` (x = bit 0, y = bit 1,
//! z = bit 2).
use crate::mesh::MeshEntity;
use crate::{MeshError, Real};
use nalgebra::{Point3, Scalar, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

mod hexahedron;
mod interval;
mod ordering;
mod quadrilateral;
mod tetrahedron;
mod triangle;

pub(crate) use ordering::canonical_vertex_order;

/// Tolerance used when testing whether a point lies inside a cell.
pub(crate) const CONTAINMENT_EPS: f64 = 3.0e-16;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Point,
    Interval,
    Triangle,
    Quadrilateral,
    Tetrahedron,
    Hexahedron,
}

/// Orientation of a cell relative to a global "up" direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellOrientation {
    /// The cell normal points along the up direction (or is orthogonal to it).
    Aligned,
    /// The cell normal points against the up direction.
    Flipped,
}

pub(crate) fn unsupported_gdim(operation: &'static str, cell_type: CellType, gdim: usize) -> MeshError {
    MeshError::UnsupportedGeometricDimension {
        operation,
        cell_type,
        gdim,
    }
}

pub(crate) fn unsupported_cell(operation: &'static str, cell_type: CellType) -> MeshError {
    MeshError::UnsupportedCellType { operation, cell_type }
}

static POINT_ENTITIES: [&[&[usize]]; 1] = [&[&[0]]];

impl CellType {
    /// Topological dimension of the cell.
    pub fn dim(&self) -> usize {
        match self {
            Self::Point => 0,
            Self::Interval => 1,
            Self::Triangle | Self::Quadrilateral => 2,
            Self::Tetrahedron | Self::Hexahedron => 3,
        }
    }

    pub fn is_simplex(&self) -> bool {
        !matches!(self, Self::Quadrilateral | Self::Hexahedron)
    }

    fn check_dim(&self, operation: &'static str, dim: usize) -> Result<(), MeshError> {
        if dim <= self.dim() {
            Ok(())
        } else {
            Err(MeshError::IllegalDimension {
                operation,
                cell_type: *self,
                dim,
                tdim: self.dim(),
            })
        }
    }

    /// Local vertex patterns of all sub-entities of the given dimension.
    ///
    /// Sub-entity `i` of dimension `dim` consists of the local vertices
    /// `reference_entities(dim)?[i]`, in that order.
    pub fn reference_entities(&self, dim: usize) -> Result<&'static [&'static [usize]], MeshError> {
        self.check_dim("reference_entities", dim)?;
        Ok(match self {
            Self::Point => POINT_ENTITIES[dim],
            Self::Interval => interval::ENTITIES[dim],
            Self::Triangle => triangle::ENTITIES[dim],
            Self::Quadrilateral => quadrilateral::ENTITIES[dim],
            Self::Tetrahedron => tetrahedron::ENTITIES[dim],
            Self::Hexahedron => hexahedron::ENTITIES[dim],
        })
    }

    /// Number of sub-entities of the given dimension in a single cell.
    pub fn num_entities(&self, dim: usize) -> Result<usize, MeshError> {
        Ok(self.reference_entities(dim)?.len())
    }

    /// Number of vertices of each sub-entity of the given dimension.
    pub fn num_vertices(&self, dim: usize) -> Result<usize, MeshError> {
        Ok(self.entity_type(dim)?.num_cell_vertices())
    }

    pub fn num_cell_vertices(&self) -> usize {
        match self {
            Self::Point => 1,
            Self::Interval => 2,
            Self::Triangle => 3,
            Self::Quadrilateral | Self::Tetrahedron => 4,
            Self::Hexahedron => 8,
        }
    }

    /// The shape of the sub-entities of the given dimension.
    pub fn entity_type(&self, dim: usize) -> Result<CellType, MeshError> {
        self.check_dim("entity_type", dim)?;
        Ok(match (dim, self.is_simplex()) {
            (0, _) => Self::Point,
            (1, _) => Self::Interval,
            (2, true) => Self::Triangle,
            (2, false) => Self::Quadrilateral,
            (_, true) => Self::Tetrahedron,
            (_, false) => Self::Hexahedron,
        })
    }

    pub fn facet_type(&self) -> Result<CellType, MeshError> {
        match self.dim() {
            0 => Err(unsupported_cell("facet_type", *self)),
            d => self.entity_type(d - 1),
        }
    }

    pub fn description(&self, plural: bool) -> &'static str {
        match (self, plural) {
            (Self::Point, false) => "point",
            (Self::Point, true) => "points",
            (Self::Interval, false) => "interval",
            (Self::Interval, true) => "intervals",
            (Self::Triangle, false) => "triangle",
            (Self::Triangle, true) => "triangles",
            (Self::Quadrilateral, false) => "quadrilateral",
            (Self::Quadrilateral, true) => "quadrilaterals",
            (Self::Tetrahedron, false) => "tetrahedron",
            (Self::Tetrahedron, true) => "tetrahedra",
            (Self::Hexahedron, false) => "hexahedron",
            (Self::Hexahedron, true) => "hexahedra",
        }
    }

    /// Creates the sub-entities of dimension `dim` of a cell with the given vertices.
    ///
    /// `dim` must be strictly lower than the cell dimension.
    pub fn create_entities(&self, dim: usize, vertices: &[usize]) -> Result<Vec<Vec<usize>>, MeshError> {
        if dim >= self.dim() {
            return Err(MeshError::IllegalDimension {
                operation: "create_entities",
                cell_type: *self,
                dim,
                tdim: self.dim(),
            });
        }
        if vertices.len() != self.num_cell_vertices() {
            return Err(MeshError::MalformedInput(format!(
                "{} requires {} vertices, got {}",
                self.description(false),
                self.num_cell_vertices(),
                vertices.len()
            )));
        }
        Ok(self
            .reference_entities(dim)?
            .iter()
            .map(|pattern| pattern.iter().map(|&i| vertices[i]).collect())
            .collect())
    }

    fn with_geometry<T, R>(
        &self,
        operation: &'static str,
        entity: &MeshEntity<T>,
        f: impl FnOnce(&CellGeometry<T>) -> Result<R, MeshError>,
    ) -> Result<R, MeshError>
    where
        T: Real,
    {
        if entity.dim() != self.dim() {
            return Err(MeshError::EntityDimensionMismatch {
                operation,
                expected: self.dim(),
                actual: entity.dim(),
            });
        }
        let points = entity.points()?;
        let geometry = CellGeometry::new(*self, entity.mesh().gdim(), &points)?;
        f(&geometry)
    }

    pub fn volume<T: Real>(&self, entity: &MeshEntity<T>) -> Result<T, MeshError> {
        self.with_geometry("volume", entity, |g| g.volume())
    }

    pub fn diameter<T: Real>(&self, entity: &MeshEntity<T>) -> Result<T, MeshError> {
        self.with_geometry("diameter", entity, |g| g.diameter())
    }

    pub fn circumradius<T: Real>(&self, entity: &MeshEntity<T>) -> Result<T, MeshError> {
        self.with_geometry("circumradius", entity, |g| g.circumradius())
    }

    pub fn inradius<T: Real>(&self, entity: &MeshEntity<T>) -> Result<T, MeshError> {
        self.with_geometry("inradius", entity, |g| g.inradius())
    }

    pub fn radius_ratio<T: Real>(&self, entity: &MeshEntity<T>) -> Result<T, MeshError> {
        self.with_geometry("radius_ratio", entity, |g| g.radius_ratio())
    }

    pub fn squared_distance<T: Real>(&self, cell: &MeshEntity<T>, point: &Point3<T>) -> Result<T, MeshError> {
        self.with_geometry("squared_distance", cell, |g| g.squared_distance(point))
    }

    pub fn contains<T: Real>(&self, cell: &MeshEntity<T>, point: &Point3<T>) -> Result<bool, MeshError> {
        self.with_geometry("contains", cell, |g| g.contains(point))
    }

    /// Outward unit normal of the given local facet.
    pub fn normal<T: Real>(&self, cell: &MeshEntity<T>, facet: usize) -> Result<Vector3<T>, MeshError> {
        self.with_geometry("normal", cell, |g| g.normal(facet))
    }

    pub fn cell_normal<T: Real>(&self, cell: &MeshEntity<T>) -> Result<Vector3<T>, MeshError> {
        self.with_geometry("cell_normal", cell, |g| g.cell_normal())
    }

    pub fn facet_area<T: Real>(&self, cell: &MeshEntity<T>, facet: usize) -> Result<T, MeshError> {
        self.with_geometry("facet_area", cell, |g| g.facet_area(facet))
    }

    pub fn orientation<T: Real>(&self, cell: &MeshEntity<T>, up: &Vector3<T>) -> Result<CellOrientation, MeshError> {
        self.with_geometry("orientation", cell, |g| g.orientation(up))
    }
}

impl Display for CellType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description(false))
    }
}

impl FromStr for CellType {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "point" | "vertex" => Ok(Self::Point),
            "interval" => Ok(Self::Interval),
            "triangle" => Ok(Self::Triangle),
            "quadrilateral" => Ok(Self::Quadrilateral),
            "tetrahedron" => Ok(Self::Tetrahedron),
            "hexahedron" => Ok(Self::Hexahedron),
            _ => Err(MeshError::MalformedInput(format!("unknown cell type \"{}\"", s))),
        }
    }
}

/// The vertex coordinates of a single cell, viewed as a cell of a given type.
///
/// Geometric quantities only depend on the vertex coordinates; local facet `i` is the
/// sub-entity `i` of dimension `D - 1` in [`CellType::reference_entities`].
#[derive(Debug, Copy, Clone)]
pub struct CellGeometry<'a, T: Scalar> {
    cell_type: CellType,
    gdim: usize,
    vertices: &'a [Point3<T>],
}

impl<'a, T: Real> CellGeometry<'a, T> {
    pub fn new(cell_type: CellType, gdim: usize, vertices: &'a [Point3<T>]) -> Result<Self, MeshError> {
        if vertices.len() != cell_type.num_cell_vertices() {
            return Err(MeshError::MalformedInput(format!(
                "{} requires {} vertices, got {}",
                cell_type.description(false),
                cell_type.num_cell_vertices(),
                vertices.len()
            )));
        }
        Ok(Self {
            cell_type,
            gdim,
            vertices,
        })
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn gdim(&self) -> usize {
        self.gdim
    }

    pub fn vertices(&self) -> &'a [Point3<T>] {
        self.vertices
    }

    pub fn midpoint(&self) -> Point3<T> {
        midpoint(self.vertices)
    }

    pub fn volume(&self) -> Result<T, MeshError> {
        let (p, gdim) = (self.vertices, self.gdim);
        match self.cell_type {
            CellType::Point => Err(unsupported_cell("volume", CellType::Point)),
            CellType::Interval => Ok(interval::volume(p)),
            CellType::Triangle => triangle::volume(p, gdim),
            CellType::Quadrilateral => quadrilateral::volume(p, gdim),
            CellType::Tetrahedron => tetrahedron::volume(p, gdim),
            CellType::Hexahedron => hexahedron::volume(p, gdim),
        }
    }

    /// Diameter of the cell.
    ///
    /// For simplices this is twice the circumradius, for tensor-product cells the largest
    /// distance between two vertices. Fails for degenerate simplices of zero volume.
    pub fn diameter(&self) -> Result<T, MeshError> {
        let (p, gdim) = (self.vertices, self.gdim);
        match self.cell_type {
            CellType::Point => Err(unsupported_cell("diameter", CellType::Point)),
            CellType::Interval => Ok(interval::volume(p)),
            CellType::Triangle => triangle::diameter(p, gdim),
            CellType::Tetrahedron => tetrahedron::diameter(p, gdim),
            CellType::Quadrilateral | CellType::Hexahedron => Ok(max_vertex_distance(p)),
        }
    }

    fn require_simplex(&self, operation: &'static str) -> Result<(), MeshError> {
        if self.cell_type.is_simplex() && self.cell_type != CellType::Point {
            Ok(())
        } else {
            Err(unsupported_cell(operation, self.cell_type))
        }
    }

    pub fn circumradius(&self) -> Result<T, MeshError> {
        self.require_simplex("circumradius")?;
        Ok(self.diameter()? / T::from_f64(2.0).expect("Literal must fit in T"))
    }

    /// Radius of the inscribed sphere of a simplex, `D * volume / (sum of facet areas)`.
    pub fn inradius(&self) -> Result<T, MeshError> {
        self.require_simplex("inradius")?;
        let volume = self.volume()?;
        let mut facet_area_sum = T::zero();
        for facet in 0..self.cell_type.num_entities(self.cell_type.dim() - 1)? {
            facet_area_sum += self.facet_area(facet)?;
        }
        if facet_area_sum == T::zero() {
            return Ok(T::zero());
        }
        Ok(dim_as_real::<T>(self.cell_type.dim()) * volume / facet_area_sum)
    }

    /// Normalized ratio `D * inradius / circumradius`, equal to 1 for regular simplices and 0
    /// for degenerate cells.
    pub fn radius_ratio(&self) -> Result<T, MeshError> {
        self.require_simplex("radius_ratio")?;
        if self.volume()? == T::zero() {
            return Ok(T::zero());
        }
        let d = dim_as_real::<T>(self.cell_type.dim());
        Ok(d * self.inradius()? / self.circumradius()?)
    }

    /// Squared distance from the point to the closest point of the cell.
    pub fn squared_distance(&self, point: &Point3<T>) -> Result<T, MeshError> {
        let (p, gdim) = (self.vertices, self.gdim);
        match self.cell_type {
            CellType::Point => Ok((point - p[0]).norm_squared()),
            CellType::Interval => Ok(interval::squared_distance(p, point)),
            CellType::Triangle => match gdim {
                2 | 3 => Ok(triangle::squared_distance(point, &p[0], &p[1], &p[2])),
                _ => Err(unsupported_gdim("squared_distance", CellType::Triangle, gdim)),
            },
            CellType::Quadrilateral => quadrilateral::squared_distance(p, gdim, point),
            CellType::Tetrahedron => tetrahedron::squared_distance(p, gdim, point),
            CellType::Hexahedron => hexahedron::squared_distance(p, gdim, point),
        }
    }

    /// Whether the point lies inside the cell, admitting points on the boundary up to a small
    /// tolerance.
    pub fn contains(&self, point: &Point3<T>) -> Result<bool, MeshError> {
        let (p, gdim) = (self.vertices, self.gdim);
        match self.cell_type {
            CellType::Point => Ok(p[0] == *point),
            CellType::Interval => Ok(interval::contains(p, point)),
            CellType::Triangle => match gdim {
                2 | 3 => Ok(triangle::contains(&p[0], &p[1], &p[2], point)),
                _ => Err(unsupported_gdim("contains", CellType::Triangle, gdim)),
            },
            CellType::Quadrilateral => quadrilateral::contains(p, gdim, point),
            CellType::Tetrahedron => tetrahedron::contains(p, gdim, point),
            CellType::Hexahedron => hexahedron::contains(p, gdim, point),
        }
    }

    fn check_facet(&self, operation: &'static str, facet: usize) -> Result<(), MeshError> {
        let num_facets = match self.cell_type.dim() {
            0 => 0,
            d => self.cell_type.num_entities(d - 1)?,
        };
        if facet < num_facets {
            Ok(())
        } else {
            Err(MeshError::out_of_bounds(operation, facet, num_facets))
        }
    }

    /// Outward unit normal of the given local facet. Requires `gdim == D`.
    pub fn normal(&self, facet: usize) -> Result<Vector3<T>, MeshError> {
        self.check_facet("normal", facet)?;
        if self.gdim != self.cell_type.dim() {
            return Err(unsupported_gdim("normal", self.cell_type, self.gdim));
        }
        let p = self.vertices;
        match self.cell_type {
            CellType::Point => Err(unsupported_cell("normal", CellType::Point)),
            CellType::Interval => Ok(interval::normal(p, facet)),
            CellType::Triangle => Ok(triangle::normal(p, facet)),
            CellType::Quadrilateral => Ok(quadrilateral::normal(p, facet)),
            CellType::Tetrahedron => Ok(tetrahedron::normal(p, facet)),
            CellType::Hexahedron => Ok(hexahedron::normal(p, facet)),
        }
    }

    /// Unit normal of a cell embedded in a space of one dimension higher.
    pub fn cell_normal(&self) -> Result<Vector3<T>, MeshError> {
        let (p, gdim) = (self.vertices, self.gdim);
        match self.cell_type {
            CellType::Interval => interval::cell_normal(p, gdim),
            CellType::Triangle => triangle::cell_normal(p, gdim),
            CellType::Quadrilateral => quadrilateral::cell_normal(p, gdim),
            other => Err(unsupported_cell("cell_normal", other)),
        }
    }

    /// Area (length, volume) of the given local facet.
    pub fn facet_area(&self, facet: usize) -> Result<T, MeshError> {
        self.check_facet("facet_area", facet)?;
        let p = self.vertices;
        match self.cell_type {
            CellType::Point => Err(unsupported_cell("facet_area", CellType::Point)),
            CellType::Interval => Ok(T::one()),
            CellType::Triangle => Ok(triangle::facet_area(p, facet)),
            CellType::Quadrilateral => Ok(quadrilateral::facet_area(p, facet)),
            CellType::Tetrahedron => Ok(tetrahedron::facet_area(p, facet)),
            CellType::Hexahedron => Ok(hexahedron::facet_area(p, facet)),
        }
    }

    pub fn orientation(&self, up: &Vector3<T>) -> Result<CellOrientation, MeshError> {
        if self.cell_normal()?.dot(up) < T::zero() {
            Ok(CellOrientation::Flipped)
        } else {
            Ok(CellOrientation::Aligned)
        }
    }
}

fn dim_as_real<T: Real>(dim: usize) -> T {
    T::from_usize(dim).expect("Dimension must fit in T")
}

pub(crate) fn midpoint<T: Real>(points: &[Point3<T>]) -> Point3<T> {
    let mut sum = Vector3::zeros();
    for p in points {
        sum += p.coords;
    }
    if points.is_empty() {
        Point3::origin()
    } else {
        Point3::from(sum / dim_as_real::<T>(points.len()))
    }
}

fn max_vertex_distance<T: Real>(points: &[Point3<T>]) -> T {
    let mut max = T::zero();
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            max = max.max((b - a).norm());
        }
    }
    max
}
