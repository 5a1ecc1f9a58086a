use crate::primitives::polygon_contains;
use crate::{Circle, Ellipse, Polygon, Rectangle};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A planar CSG tree: primitives at the leaves, Boolean operators at the inner nodes.
///
/// Trees are usually built with the operators `+` (union), `*` (intersection) and
/// `-` (difference):
///
/// ```
/// # use fenris_csg::{Circle, CsgGeometry, Rectangle};
/// # use nalgebra::Point2;
/// let square = Rectangle::new(Point2::new(0.0, 0.0), Point2::new(2.0, 2.0)).unwrap();
/// let hole = Circle::new(Point2::new(1.0, 1.0), 0.5).unwrap();
/// let domain = CsgGeometry::from(square) - hole;
/// assert!(domain.contains(&Point2::new(0.1, 0.1)));
/// assert!(!domain.contains(&Point2::new(1.0, 1.0)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsgGeometry {
    Circle(Circle),
    Ellipse(Ellipse),
    Rectangle(Rectangle),
    Polygon(Polygon),
    Union(Box<CsgGeometry>, Box<CsgGeometry>),
    Intersection(Box<CsgGeometry>, Box<CsgGeometry>),
    Difference(Box<CsgGeometry>, Box<CsgGeometry>),
}

impl CsgGeometry {
    /// Geometric dimension of the described domain. Only planar geometries are supported.
    pub fn dim(&self) -> usize {
        2
    }

    pub fn union(self, other: impl Into<CsgGeometry>) -> Self {
        Self::Union(Box::new(self), Box::new(other.into()))
    }

    pub fn intersection(self, other: impl Into<CsgGeometry>) -> Self {
        Self::Intersection(Box::new(self), Box::new(other.into()))
    }

    pub fn difference(self, other: impl Into<CsgGeometry>) -> Self {
        Self::Difference(Box::new(self), Box::new(other.into()))
    }

    /// The counter-clockwise boundary polygons of all primitives in the tree, left to right.
    ///
    /// These are the constraint curves handed to a triangulation backend.
    pub fn primitive_boundaries(&self) -> Vec<Vec<Point2<f64>>> {
        let mut boundaries = Vec::new();
        self.collect_boundaries(&mut boundaries);
        boundaries
    }

    fn collect_boundaries(&self, boundaries: &mut Vec<Vec<Point2<f64>>>) {
        match self {
            Self::Circle(circle) => boundaries.push(circle.boundary()),
            Self::Ellipse(ellipse) => boundaries.push(ellipse.boundary()),
            Self::Rectangle(rectangle) => boundaries.push(rectangle.boundary()),
            Self::Polygon(polygon) => boundaries.push(polygon.boundary()),
            Self::Union(a, b) | Self::Intersection(a, b) | Self::Difference(a, b) => {
                a.collect_boundaries(boundaries);
                b.collect_boundaries(boundaries);
            }
        }
    }

    /// All boundary vertices of all primitives.
    pub fn vertices(&self) -> Vec<Point2<f64>> {
        self.primitive_boundaries().into_iter().flatten().collect()
    }

    /// Whether the point lies inside the domain described by the polygonal approximation
    /// of the tree.
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        match self {
            Self::Circle(circle) => polygon_contains(&circle.boundary(), p),
            Self::Ellipse(ellipse) => polygon_contains(&ellipse.boundary(), p),
            Self::Rectangle(rectangle) => polygon_contains(&rectangle.boundary(), p),
            Self::Polygon(polygon) => polygon_contains(polygon.vertices(), p),
            Self::Union(a, b) => a.contains(p) || b.contains(p),
            Self::Intersection(a, b) => a.contains(p) && b.contains(p),
            Self::Difference(a, b) => a.contains(p) && !b.contains(p),
        }
    }

    /// Axis-aligned bounding box `(min, max)` of all primitive boundaries.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let vertices = self.vertices();
        let first = vertices.first()?;
        let (mut min, mut max) = (*first, *first);
        for v in &vertices {
            min = Point2::new(min.x.min(v.x), min.y.min(v.y));
            max = Point2::new(max.x.max(v.x), max.y.max(v.y));
        }
        Some((min, max))
    }
}

macro_rules! impl_from_primitive {
    ($($primitive:ident),*) => {
        $(
            impl From<$primitive> for CsgGeometry {
                fn from(primitive: $primitive) -> Self {
                    Self::$primitive(primitive)
                }
            }
        )*
    };
}

impl_from_primitive!(Circle, Ellipse, Rectangle, Polygon);

impl<G: Into<CsgGeometry>> Add<G> for CsgGeometry {
    type Output = CsgGeometry;

    fn add(self, rhs: G) -> Self::Output {
        self.union(rhs)
    }
}

impl<G: Into<CsgGeometry>> Mul<G> for CsgGeometry {
    type Output = CsgGeometry;

    fn mul(self, rhs: G) -> Self::Output {
        self.intersection(rhs)
    }
}

impl<G: Into<CsgGeometry>> Sub<G> for CsgGeometry {
    type Output = CsgGeometry;

    fn sub(self, rhs: G) -> Self::Output {
        self.difference(rhs)
    }
}
