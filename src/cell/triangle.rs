use crate::cell::{unsupported_gdim, CellType, CONTAINMENT_EPS};
use crate::{MeshError, Real};
use nalgebra::{distance_squared, Point3, Vector3};
use numeric_literals::replace_float_literals;

static VERTICES: [&[usize]; 3] = [&[0], &[1], &[2]];
/// Edge `i` is opposite to vertex `i`.
pub(crate) static EDGES: [&[usize]; 3] = [&[1, 2], &[0, 2], &[0, 1]];
static CELL: [&[usize]; 1] = [&[0, 1, 2]];
pub(crate) static ENTITIES: [&[&[usize]]; 3] = [&VERTICES, &EDGES, &CELL];

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub(crate) fn volume<T: Real>(p: &[Point3<T>], gdim: usize) -> Result<T, MeshError> {
    let a = p[1] - p[0];
    let b = p[2] - p[0];
    match gdim {
        2 => Ok(0.5 * (a.x * b.y - a.y * b.x).abs()),
        3 => Ok(0.5 * a.cross(&b).norm()),
        _ => Err(unsupported_gdim("volume", CellType::Triangle, gdim)),
    }
}

/// Twice the circumradius, `abc / (2 * area)`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub(crate) fn diameter<T: Real>(p: &[Point3<T>], gdim: usize) -> Result<T, MeshError> {
    if gdim != 2 && gdim != 3 {
        return Err(unsupported_gdim("diameter", CellType::Triangle, gdim));
    }
    let a = (p[2] - p[1]).norm();
    let b = (p[2] - p[0]).norm();
    let c = (p[1] - p[0]).norm();
    let area = volume(p, gdim)?;
    if area == T::zero() {
        return Err(MeshError::DegenerateEntity {
            operation: "diameter",
            cell_type: CellType::Triangle,
        });
    }
    Ok(0.5 * a * b * c / area)
}

/// Squared distance from `point` to the triangle `(a, b, c)`.
///
/// Determines which Voronoi region of the triangle contains the point (three vertex regions,
/// three edge regions or the interior), as in Ericson, *Real-Time Collision Detection*,
/// Section 5.1.5. Points in the interior region of a triangle in the plane have distance zero.
pub(crate) fn squared_distance<T: Real>(point: &Point3<T>, a: &Point3<T>, b: &Point3<T>, c: &Point3<T>) -> T {
    let zero = T::zero();
    let ab = b - a;
    let ac = c - a;

    // Vertex region outside a
    let ap = point - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= zero && d2 <= zero {
        return distance_squared(point, a);
    }

    // Vertex region outside b
    let bp = point - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= zero && d4 <= d3 {
        return distance_squared(point, b);
    }

    // Edge region of ab
    let vc = d1 * d4 - d3 * d2;
    if vc <= zero && d1 >= zero && d3 <= zero {
        let v = d1 / (d1 - d3);
        return distance_squared(point, &(a + ab * v));
    }

    // Vertex region outside c
    let cp = point - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= zero && d5 <= d6 {
        return distance_squared(point, c);
    }

    // Edge region of ac
    let vb = d5 * d2 - d1 * d6;
    if vb <= zero && d2 >= zero && d6 <= zero {
        let w = d2 / (d2 - d6);
        return distance_squared(point, &(a + ac * w));
    }

    // Edge region of bc
    let va = d3 * d6 - d5 * d4;
    if va <= zero && (d4 - d3) >= zero && (d5 - d6) >= zero {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return distance_squared(point, &(b + (c - b) * w));
    }

    // Interior region: distance to the projection onto the plane of the triangle
    let denom = T::one() / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    distance_squared(point, &(a + ab * v + ac * w))
}

/// Expresses `point - a` in the basis `(b - a, c - a)` through the normal equations and checks
/// that the coefficients form a convex combination.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub(crate) fn contains<T: Real>(a: &Point3<T>, b: &Point3<T>, c: &Point3<T>, point: &Point3<T>) -> bool {
    let eps = T::from_f64(CONTAINMENT_EPS).expect("Literal must fit in T");
    let v1 = b - a;
    let v2 = c - a;
    let v = point - a;

    let a11 = v1.dot(&v1);
    let a12 = v1.dot(&v2);
    let a22 = v2.dot(&v2);
    let b1 = v.dot(&v1);
    let b2 = v.dot(&v2);

    let det = a11 * a22 - a12 * a12;
    if det == 0.0 {
        return false;
    }
    let x1 = (a22 * b1 - a12 * b2) / det;
    let x2 = (a11 * b2 - a12 * b1) / det;
    x1 > -eps && x2 > -eps && x1 + x2 < 1.0 + eps
}

/// Unit normal of edge `facet`, pointing away from the opposite vertex.
pub(crate) fn normal<T: Real>(p: &[Point3<T>], facet: usize) -> Vector3<T> {
    let p0 = &p[facet];
    let p1 = &p[EDGES[facet][0]];
    let p2 = &p[EDGES[facet][1]];

    // Remove the component of p2 - p0 along the edge
    let t = (p2 - p1).normalize();
    let n = p2 - p0;
    (n - t * n.dot(&t)).normalize()
}

pub(crate) fn cell_normal<T: Real>(p: &[Point3<T>], gdim: usize) -> Result<Vector3<T>, MeshError> {
    if gdim != 2 && gdim != 3 {
        return Err(unsupported_gdim("cell_normal", CellType::Triangle, gdim));
    }
    Ok((p[1] - p[0]).cross(&(p[2] - p[0])).normalize())
}

pub(crate) fn facet_area<T: Real>(p: &[Point3<T>], facet: usize) -> T {
    let [i, j] = [EDGES[facet][0], EDGES[facet][1]];
    (p[j] - p[i]).norm()
}
