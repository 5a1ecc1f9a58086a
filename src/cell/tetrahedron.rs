use crate::cell::{triangle, unsupported_gdim, CellType, CONTAINMENT_EPS};
use crate::{MeshError, Real};
use nalgebra::{Matrix3, Point3, Vector3};
use numeric_literals::replace_float_literals;

static VERTICES: [&[usize]; 4] = [&[0], &[1], &[2], &[3]];
/// Edges `i` and `5 - i` are opposite.
pub(crate) static EDGES: [&[usize]; 6] = [&[2, 3], &[1, 3], &[1, 2], &[0, 3], &[0, 2], &[0, 1]];
/// Face `i` is opposite to vertex `i`.
pub(crate) static FACES: [&[usize]; 4] = [&[1, 2, 3], &[0, 2, 3], &[0, 1, 3], &[0, 1, 2]];
static CELL: [&[usize]; 1] = [&[0, 1, 2, 3]];
pub(crate) static ENTITIES: [&[&[usize]]; 4] = [&VERTICES, &EDGES, &FACES, &CELL];

fn require_3d(operation: &'static str, gdim: usize) -> Result<(), MeshError> {
    if gdim == 3 {
        Ok(())
    } else {
        Err(unsupported_gdim(operation, CellType::Tetrahedron, gdim))
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub(crate) fn volume<T: Real>(p: &[Point3<T>], gdim: usize) -> Result<T, MeshError> {
    require_3d("volume", gdim)?;
    let a = p[1] - p[0];
    let b = p[2] - p[0];
    let c = p[3] - p[0];
    Ok(a.cross(&b).dot(&c).abs() / 6.0)
}

/// Twice the circumradius.
///
/// Uses that `24 V R` equals the area of a triangle whose sides are the products of the lengths
/// of opposite edges.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub(crate) fn diameter<T: Real>(p: &[Point3<T>], gdim: usize) -> Result<T, MeshError> {
    let volume = volume(p, gdim)?;
    if volume == T::zero() {
        return Err(MeshError::DegenerateEntity {
            operation: "diameter",
            cell_type: CellType::Tetrahedron,
        });
    }
    let length = |i: usize, j: usize| (p[j] - p[i]).norm();
    let la = length(1, 2) * length(0, 3);
    let lb = length(0, 2) * length(1, 3);
    let lc = length(0, 1) * length(2, 3);
    let s = 0.5 * (la + lb + lc);
    let area = (s * (s - la) * (s - lb) * (s - lc)).max(0.0).sqrt();
    Ok(area / (3.0 * volume))
}

/// Barycentric coordinates `(λ1, λ2, λ3)` of `point` with respect to vertices 1, 2 and 3.
fn barycentric<T: Real>(p: &[Point3<T>], point: &Point3<T>) -> Option<Vector3<T>> {
    let j = Matrix3::from_columns(&[p[1] - p[0], p[2] - p[0], p[3] - p[0]]);
    j.try_inverse().map(|j_inv| j_inv * (point - p[0]))
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub(crate) fn contains<T: Real>(p: &[Point3<T>], gdim: usize, point: &Point3<T>) -> Result<bool, MeshError> {
    require_3d("contains", gdim)?;
    let eps = T::from_f64(CONTAINMENT_EPS).expect("Literal must fit in T");
    Ok(match barycentric(p, point) {
        Some(lambda) => lambda.iter().all(|&l| l > -eps) && lambda.sum() < 1.0 + eps,
        None => false,
    })
}

/// Squared distance to the closest face the point lies outside of, or zero inside.
pub(crate) fn squared_distance<T: Real>(p: &[Point3<T>], gdim: usize, point: &Point3<T>) -> Result<T, MeshError> {
    require_3d("squared_distance", gdim)?;
    let mut min_distance: Option<T> = None;
    for (opposite, face) in FACES.iter().enumerate() {
        let [a, b, c] = [&p[face[0]], &p[face[1]], &p[face[2]]];
        let n = (b - a).cross(&(c - a));
        let point_side = n.dot(&(point - a));
        let vertex_side = n.dot(&(p[opposite] - a));
        if vertex_side == T::zero() || point_side * vertex_side < T::zero() {
            let d = triangle::squared_distance(point, a, b, c);
            min_distance = Some(min_distance.map_or(d, |m: T| m.min(d)));
        }
    }
    Ok(min_distance.unwrap_or_else(T::zero))
}

/// Unit normal of face `facet`, pointing away from the opposite vertex.
pub(crate) fn normal<T: Real>(p: &[Point3<T>], facet: usize) -> Vector3<T> {
    let face = FACES[facet];
    let p1 = &p[face[0]];
    let n = (p[face[1]] - p1).cross(&(p[face[2]] - p1));
    let n = if n.dot(&(p[facet] - p1)) > T::zero() { -n } else { n };
    n.normalize()
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub(crate) fn facet_area<T: Real>(p: &[Point3<T>], facet: usize) -> T {
    let face = FACES[facet];
    let p1 = &p[face[0]];
    0.5 * (p[face[1]] - p1).cross(&(p[face[2]] - p1)).norm()
}
