use crate::CsgError;
use itertools::Itertools;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const DEFAULT_FRAGMENTS: usize = 32;

/// A circle, approximated by a regular polygon with `fragments` segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    center: Point2<f64>,
    radius: f64,
    fragments: usize,
}

impl Circle {
    pub fn new(center: Point2<f64>, radius: f64) -> Result<Self, CsgError> {
        Self::with_fragments(center, radius, DEFAULT_FRAGMENTS)
    }

    pub fn with_fragments(center: Point2<f64>, radius: f64, fragments: usize) -> Result<Self, CsgError> {
        if !(radius > 0.0) {
            return Err(invalid("circle", format!("radius must be positive, got {}", radius)));
        }
        if fragments < 3 {
            return Err(invalid("circle", format!("need at least 3 fragments, got {}", fragments)));
        }
        Ok(Self {
            center,
            radius,
            fragments,
        })
    }

    pub fn center(&self) -> &Point2<f64> {
        &self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// Counter-clockwise boundary polygon, starting at angle zero.
    pub fn boundary(&self) -> Vec<Point2<f64>> {
        elliptic_boundary(&self.center, self.radius, self.radius, self.fragments)
    }
}

/// An axis-aligned ellipse with semi-axes `a` (along x) and `b` (along y).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    center: Point2<f64>,
    a: f64,
    b: f64,
    fragments: usize,
}

impl Ellipse {
    pub fn new(center: Point2<f64>, a: f64, b: f64) -> Result<Self, CsgError> {
        Self::with_fragments(center, a, b, DEFAULT_FRAGMENTS)
    }

    pub fn with_fragments(center: Point2<f64>, a: f64, b: f64, fragments: usize) -> Result<Self, CsgError> {
        if !(a > 0.0 && b > 0.0) {
            return Err(invalid("ellipse", format!("semi-axes must be positive, got ({}, {})", a, b)));
        }
        if fragments < 3 {
            return Err(invalid("ellipse", format!("need at least 3 fragments, got {}", fragments)));
        }
        Ok(Self { center, a, b, fragments })
    }

    pub fn center(&self) -> &Point2<f64> {
        &self.center
    }

    pub fn semi_axes(&self) -> (f64, f64) {
        (self.a, self.b)
    }

    pub fn fragments(&self) -> usize {
        self.fragments
    }

    pub fn boundary(&self) -> Vec<Point2<f64>> {
        elliptic_boundary(&self.center, self.a, self.b, self.fragments)
    }
}

/// An axis-aligned rectangle spanned by two opposite corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    min: Point2<f64>,
    max: Point2<f64>,
}

impl Rectangle {
    /// Creates a rectangle from two opposite corners, given in any order.
    pub fn new(a: Point2<f64>, b: Point2<f64>) -> Result<Self, CsgError> {
        let min = Point2::new(a.x.min(b.x), a.y.min(b.y));
        let max = Point2::new(a.x.max(b.x), a.y.max(b.y));
        if !(max.x > min.x && max.y > min.y) {
            return Err(invalid("rectangle", format!("corners {} and {} span no area", a, b)));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> &Point2<f64> {
        &self.min
    }

    pub fn max(&self) -> &Point2<f64> {
        &self.max
    }

    pub fn boundary(&self) -> Vec<Point2<f64>> {
        vec![
            self.min,
            Point2::new(self.max.x, self.min.y),
            self.max,
            Point2::new(self.min.x, self.max.y),
        ]
    }
}

/// A simple polygon. The stored boundary is always counter-clockwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Point2<f64>>,
}

impl Polygon {
    pub fn new(mut vertices: Vec<Point2<f64>>) -> Result<Self, CsgError> {
        if vertices.len() < 3 {
            return Err(invalid("polygon", format!("need at least 3 vertices, got {}", vertices.len())));
        }
        let area = signed_area(&vertices);
        if area == 0.0 {
            return Err(invalid("polygon", "vertices enclose no area".to_string()));
        }
        if area < 0.0 {
            vertices.reverse();
        }
        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Point2<f64>] {
        &self.vertices
    }

    pub fn boundary(&self) -> Vec<Point2<f64>> {
        self.vertices.clone()
    }
}

fn invalid(primitive: &'static str, reason: String) -> CsgError {
    CsgError::InvalidPrimitive { primitive, reason }
}

fn elliptic_boundary(center: &Point2<f64>, a: f64, b: f64, fragments: usize) -> Vec<Point2<f64>> {
    (0..fragments)
        .map(|i| {
            let phi = 2.0 * PI * (i as f64) / (fragments as f64);
            center + Vector2::new(a * phi.cos(), b * phi.sin())
        })
        .collect()
}

/// Signed area of a closed polygon, positive for counter-clockwise orientation.
pub(crate) fn signed_area(vertices: &[Point2<f64>]) -> f64 {
    let area: f64 = vertices
        .iter()
        .circular_tuple_windows()
        .map(|(a, b)| (a.x - b.x) * (a.y + b.y))
        .sum();
    0.5 * area
}

/// Crossing-number point-in-polygon test.
pub(crate) fn polygon_contains(vertices: &[Point2<f64>], p: &Point2<f64>) -> bool {
    let mut inside = false;
    for (a, b) in vertices.iter().circular_tuple_windows() {
        if (a.y > p.y) != (b.y > p.y) {
            let x_crossing = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_crossing {
                inside = !inside;
            }
        }
    }
    inside
}
