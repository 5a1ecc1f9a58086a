use crate::cell::{midpoint, triangle, unsupported_gdim, CellType};
use crate::{MeshError, Real};
use nalgebra::{Point3, Vector3};
use numeric_literals::replace_float_literals;

static VERTICES: [&[usize]; 4] = [&[0], &[1], &[2], &[3]];
/// Two edges along the first reference axis, then two along the second.
pub(crate) static EDGES: [&[usize]; 4] = [&[0, 1], &[2, 3], &[0, 2], &[1, 3]];
static CELL: [&[usize]; 1] = [&[0, 1, 2, 3]];
pub(crate) static ENTITIES: [&[&[usize]]; 3] = [&VERTICES, &EDGES, &CELL];

/// The quadrilateral split along its diagonal from vertex 0 to vertex 3.
const TRIANGLES: [[usize; 3]; 2] = [[0, 1, 3], [0, 3, 2]];

fn require_2d_or_3d(operation: &'static str, gdim: usize) -> Result<(), MeshError> {
    if gdim == 2 || gdim == 3 {
        Ok(())
    } else {
        Err(unsupported_gdim(operation, CellType::Quadrilateral, gdim))
    }
}

/// Area of a planar quadrilateral, half the norm of the cross product of its diagonals.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub(crate) fn volume<T: Real>(p: &[Point3<T>], gdim: usize) -> Result<T, MeshError> {
    require_2d_or_3d("volume", gdim)?;
    Ok(0.5 * (p[3] - p[0]).cross(&(p[2] - p[1])).norm())
}

/// Containment for planar, convex quadrilaterals.
pub(crate) fn contains<T: Real>(p: &[Point3<T>], gdim: usize, point: &Point3<T>) -> Result<bool, MeshError> {
    require_2d_or_3d("contains", gdim)?;
    Ok(TRIANGLES
        .iter()
        .any(|&[a, b, c]| triangle::contains(&p[a], &p[b], &p[c], point)))
}

/// Squared distance for planar, convex quadrilaterals.
pub(crate) fn squared_distance<T: Real>(p: &[Point3<T>], gdim: usize, point: &Point3<T>) -> Result<T, MeshError> {
    require_2d_or_3d("squared_distance", gdim)?;
    let [t0, t1] = TRIANGLES.map(|[a, b, c]| triangle::squared_distance(point, &p[a], &p[b], &p[c]));
    Ok(t0.min(t1))
}

/// Unit normal of edge `facet` in the plane, pointing away from the cell midpoint.
pub(crate) fn normal<T: Real>(p: &[Point3<T>], facet: usize) -> Vector3<T> {
    let [a, b] = [EDGES[facet][0], EDGES[facet][1]];
    let t = p[b] - p[a];
    let n = Vector3::new(t.y, -t.x, T::zero());
    let outward = p[a] - midpoint(p);
    let n = if n.dot(&outward) < T::zero() { -n } else { n };
    n.normalize()
}

pub(crate) fn cell_normal<T: Real>(p: &[Point3<T>], gdim: usize) -> Result<Vector3<T>, MeshError> {
    require_2d_or_3d("cell_normal", gdim)?;
    Ok((p[1] - p[0]).cross(&(p[2] - p[0])).normalize())
}

pub(crate) fn facet_area<T: Real>(p: &[Point3<T>], facet: usize) -> T {
    let [a, b] = [EDGES[facet][0], EDGES[facet][1]];
    (p[b] - p[a]).norm()
}
