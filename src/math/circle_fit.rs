use nalgebra::{Matrix3, Vector3};

use super::Point2;

/// Algebraic least-squares circle fit.
///
/// Solves the normal equations of `2hx + 2ky + c = x² + y²` for `(h, k, c)`.
/// The center is `(h, k)` and the radius is the mean distance from the
/// center to the input points, which is more robust than `sqrt(c + h² + k²)`
/// for nearly-colinear input.
///
/// Returns `None` for fewer than three points or a singular system
/// (all points colinear or coincident).
#[must_use]
pub fn fit_circle(points: &[Point2]) -> Option<(Point2, f64)> {
    if points.len() < 3 {
        return None;
    }

    // Center the data for conditioning, then shift the result back.
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let mean = points.iter().fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords) / n;

    let mut ata = Matrix3::zeros();
    let mut atb = Vector3::zeros();
    for p in points {
        let x = p.x - mean.x;
        let y = p.y - mean.y;
        let row = Vector3::new(2.0 * x, 2.0 * y, 1.0);
        ata += row * row.transpose();
        atb += row * (x * x + y * y);
    }

    let scale = ata.abs().max();
    let lu = ata.lu();
    if lu.determinant().abs() < 1e-12 * scale * scale * scale {
        return None;
    }
    let sol = lu.solve(&atb)?;

    let center = Point2::new(sol.x + mean.x, sol.y + mean.y);
    let radius = points.iter().map(|p| (p - center).norm()).sum::<f64>() / n;
    Some((center, radius))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::TAU;

    use approx::assert_abs_diff_eq;

    use super::*;

    fn regular_polygon(cx: f64, cy: f64, r: f64, n: usize) -> Vec<Point2> {
        (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let a = TAU * i as f64 / n as f64;
                Point2::new(cx + r * a.cos(), cy + r * a.sin())
            })
            .collect()
    }

    #[test]
    fn hexagon_fit() {
        let (c, r) = fit_circle(&regular_polygon(0.0, 0.0, 10.0, 6)).unwrap();
        assert_abs_diff_eq!(c.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.y, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn offset_circle_fit() {
        let (c, r) = fit_circle(&regular_polygon(120.0, -40.0, 3.5, 48)).unwrap();
        assert_abs_diff_eq!(c.x, 120.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.y, -40.0, epsilon = 1e-6);
        assert_abs_diff_eq!(r, 3.5, epsilon = 1e-6);
    }

    #[test]
    fn three_points_exact() {
        let pts = [Point2::new(1.0, 0.0), Point2::new(0.0, 1.0), Point2::new(-1.0, 0.0)];
        let (c, r) = fit_circle(&pts).unwrap();
        assert!(c.coords.norm() < 1e-9, "c={c}");
        assert!((r - 1.0).abs() < 1e-9, "r={r}");
    }

    #[test]
    fn colinear_is_singular() {
        let pts = [Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)];
        assert!(fit_circle(&pts).is_none());
    }

    #[test]
    fn too_few_points() {
        assert!(fit_circle(&[Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]).is_none());
    }
}
