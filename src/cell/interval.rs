use crate::cell::{unsupported_gdim, CellType, CONTAINMENT_EPS};
use crate::{MeshError, Real};
use nalgebra::{distance_squared, Point3, Vector3};

static VERTICES: [&[usize]; 2] = [&[0], &[1]];
static CELL: [&[usize]; 1] = [&[0, 1]];
pub(crate) static ENTITIES: [&[&[usize]]; 2] = [&VERTICES, &CELL];

pub(crate) fn volume<T: Real>(p: &[Point3<T>]) -> T {
    (p[1] - p[0]).norm()
}

/// Parameter of the orthogonal projection of `point` onto the line through the interval,
/// or `None` for zero-length intervals.
fn projection_parameter<T: Real>(p: &[Point3<T>], point: &Point3<T>) -> Option<T> {
    let d = p[1] - p[0];
    let length2 = d.norm_squared();
    if length2 == T::zero() {
        None
    } else {
        Some((point - p[0]).dot(&d) / length2)
    }
}

pub(crate) fn squared_distance<T: Real>(p: &[Point3<T>], point: &Point3<T>) -> T {
    match projection_parameter(p, point) {
        None => distance_squared(point, &p[0]),
        Some(t) => {
            let t = t.max(T::zero()).min(T::one());
            distance_squared(point, &(p[0] + (p[1] - p[0]) * t))
        }
    }
}

pub(crate) fn contains<T: Real>(p: &[Point3<T>], point: &Point3<T>) -> bool {
    let eps = T::from_f64(CONTAINMENT_EPS).expect("Literal must fit in T");
    match projection_parameter(p, point) {
        None => *point == p[0],
        Some(t) => {
            let projected = p[0] + (p[1] - p[0]) * t;
            t > -eps && t < T::one() + eps && distance_squared(point, &projected) <= eps * volume(p).powi(2)
        }
    }
}

/// Facet `i` is vertex `i`; its normal points away from the other vertex.
pub(crate) fn normal<T: Real>(p: &[Point3<T>], facet: usize) -> Vector3<T> {
    (p[facet] - p[1 - facet]).normalize()
}

/// Normal of an interval in the plane, obtained by rotating the tangent counter-clockwise.
pub(crate) fn cell_normal<T: Real>(p: &[Point3<T>], gdim: usize) -> Result<Vector3<T>, MeshError> {
    if gdim != 2 {
        return Err(unsupported_gdim("cell_normal", CellType::Interval, gdim));
    }
    let t = p[1] - p[0];
    Ok(Vector3::new(-t.y, t.x, T::zero()).normalize())
}
