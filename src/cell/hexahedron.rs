use crate::cell::{midpoint, tetrahedron, unsupported_gdim, CellType};
use crate::{MeshError, Real};
use nalgebra::{Matrix3, Point3, Vector3};
use numeric_literals::replace_float_literals;

static VERTICES: [&[usize]; 8] = [&[0], &[1], &[2], &[3], &[4], &[5], &[6], &[7]];
pub(crate) static EDGES: [&[usize]; 12] = [
    &[0, 1],
    &[2, 3],
    &[4, 5],
    &[6, 7],
    &[0, 2],
    &[1, 3],
    &[4, 6],
    &[5, 7],
    &[0, 4],
    &[1, 5],
    &[2, 6],
    &[3, 7],
];
/// Faces in pairs normal to the z, y and x reference axes, each in tensor-product order.
pub(crate) static FACES: [&[usize]; 6] = [
    &[0, 1, 2, 3],
    &[4, 5, 6, 7],
    &[0, 1, 4, 5],
    &[2, 3, 6, 7],
    &[0, 2, 4, 6],
    &[1, 3, 5, 7],
];
static CELL: [&[usize]; 1] = [&[0, 1, 2, 3, 4, 5, 6, 7]];
pub(crate) static ENTITIES: [&[&[usize]]; 4] = [&VERTICES, &EDGES, &FACES, &CELL];

/// Split into six tetrahedra sharing the diagonal from vertex 0 to vertex 7.
const TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 1, 5, 7],
    [0, 2, 3, 7],
    [0, 2, 6, 7],
    [0, 4, 5, 7],
    [0, 4, 6, 7],
];

fn require_3d(operation: &'static str, gdim: usize) -> Result<(), MeshError> {
    if gdim == 3 {
        Ok(())
    } else {
        Err(unsupported_gdim(operation, CellType::Hexahedron, gdim))
    }
}

/// Volume of the trilinear hexahedron, integrating the Jacobian determinant with the 2x2x2
/// Gauss rule.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub(crate) fn volume<T: Real>(p: &[Point3<T>], gdim: usize) -> Result<T, MeshError> {
    require_3d("volume", gdim)?;
    let offset = 0.5 / T::sqrt(3.0);
    let gauss = [0.5 - offset, 0.5 + offset];
    let mut volume = T::zero();
    for &xi in &gauss {
        for &eta in &gauss {
            for &zeta in &gauss {
                let xi = [xi, eta, zeta];
                let mut jacobian = Matrix3::zeros();
                for (i, x_i) in p.iter().enumerate() {
                    let mut gradient = Vector3::zeros();
                    for k in 0..3 {
                        let mut derivative = 1.0;
                        for j in 0..3 {
                            let bit = (i >> j) & 1 == 1;
                            derivative *= match (j == k, bit) {
                                (true, true) => 1.0,
                                (true, false) => -1.0,
                                (false, true) => xi[j],
                                (false, false) => 1.0 - xi[j],
                            };
                        }
                        gradient[k] = derivative;
                    }
                    jacobian += x_i.coords * gradient.transpose();
                }
                volume += 0.125 * jacobian.determinant().abs();
            }
        }
    }
    Ok(volume)
}

/// Containment for hexahedra that are parallelepipeds.
pub(crate) fn contains<T: Real>(p: &[Point3<T>], gdim: usize, point: &Point3<T>) -> Result<bool, MeshError> {
    require_3d("contains", gdim)?;
    for tet in &TETRAHEDRA {
        let vertices = tet.map(|i| p[i]);
        if tetrahedron::contains(&vertices, gdim, point)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Squared distance for hexahedra that are parallelepipeds.
pub(crate) fn squared_distance<T: Real>(p: &[Point3<T>], gdim: usize, point: &Point3<T>) -> Result<T, MeshError> {
    require_3d("squared_distance", gdim)?;
    let mut min_distance: Option<T> = None;
    for tet in &TETRAHEDRA {
        let vertices = tet.map(|i| p[i]);
        let d = tetrahedron::squared_distance(&vertices, gdim, point)?;
        min_distance = Some(min_distance.map_or(d, |m: T| m.min(d)));
    }
    Ok(min_distance.unwrap_or_else(T::zero))
}

fn face_cross<T: Real>(p: &[Point3<T>], facet: usize) -> Vector3<T> {
    let face = FACES[facet];
    (p[face[3]] - p[face[0]]).cross(&(p[face[2]] - p[face[1]]))
}

/// Unit normal of face `facet`, pointing away from the cell midpoint.
pub(crate) fn normal<T: Real>(p: &[Point3<T>], facet: usize) -> Vector3<T> {
    let n = face_cross(p, facet);
    let outward = p[FACES[facet][0]] - midpoint(p);
    let n = if n.dot(&outward) < T::zero() { -n } else { n };
    n.normalize()
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub(crate) fn facet_area<T: Real>(p: &[Point3<T>], facet: usize) -> T {
    0.5 * face_cross(p, facet).norm()
}
