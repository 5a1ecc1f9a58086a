use nalgebra::Point2;

const RELATIVE_TOLERANCE: f64 = 1e-12;

/// Computes the smallest circle enclosing all given points, returned as `(center, radius)`.
///
/// Uses the incremental construction of Welzl's algorithm, processing the points in the
/// given order. Returns `None` if no points are given.
pub fn min_enclosing_circle(points: &[Point2<f64>]) -> Option<(Point2<f64>, f64)> {
    let first = points.first()?;
    let scale = points
        .iter()
        .map(|p| p.coords.amax())
        .fold(1.0, f64::max);
    let tol = RELATIVE_TOLERANCE * scale;
    let inside = |c: &(Point2<f64>, f64), p: &Point2<f64>| (p - c.0).norm() <= c.1 + tol;

    let mut circle = (*first, 0.0);
    for i in 1..points.len() {
        if inside(&circle, &points[i]) {
            continue;
        }
        circle = (points[i], 0.0);
        for j in 0..i {
            if inside(&circle, &points[j]) {
                continue;
            }
            circle = diametral_circle(&points[i], &points[j]);
            for k in 0..j {
                if !inside(&circle, &points[k]) {
                    circle = circumcircle(&points[i], &points[j], &points[k]);
                }
            }
        }
    }
    Some(circle)
}

fn diametral_circle(a: &Point2<f64>, b: &Point2<f64>) -> (Point2<f64>, f64) {
    let center = nalgebra::center(a, b);
    (center, (a - center).norm())
}

fn circumcircle(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> (Point2<f64>, f64) {
    let ab = b - a;
    let ac = c - a;
    let d = 2.0 * (ab.x * ac.y - ab.y * ac.x);
    if d == 0.0 {
        // Collinear: the circle through the two farthest points encloses the third
        let candidates = [(a, b), (a, c), (b, c)];
        let (p, q) = candidates
            .iter()
            .copied()
            .max_by(|(p1, q1), (p2, q2)| (*p1 - *q1).norm().total_cmp(&(*p2 - *q2).norm()))
            .unwrap_or((a, b));
        return diametral_circle(p, q);
    }
    let ab2 = ab.norm_squared();
    let ac2 = ac.norm_squared();
    let ux = (ac.y * ab2 - ab.y * ac2) / d;
    let uy = (ab.x * ac2 - ac.x * ab2) / d;
    let center = Point2::new(a.x + ux, a.y + uy);
    (center, (a - center).norm())
}
