use super::Point2;

/// Returns `true` if `a` and `b` differ by less than `tol` on every axis.
///
/// This is a box test, not a Euclidean one.
#[must_use]
pub fn within_per_axis(a: &Point2, b: &Point2, tol: f64) -> bool {
    (a.x - b.x).abs() < tol && (a.y - b.y).abs() < tol
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn per_axis_box() {
        assert!(within_per_axis(&p(0.0, 0.0), &p(9e-4, -9e-4), 1e-3));
        assert!(!within_per_axis(&p(0.0, 0.0), &p(1.1e-3, 0.0), 1e-3));
    }

    #[test]
    fn diagonal_inside_box_but_outside_circle() {
        // Euclidean distance is about 1.27e-3.
        assert!(within_per_axis(&p(0.0, 0.0), &p(9e-4, 9e-4), 1e-3));
    }

    #[test]
    fn boundary_is_exclusive() {
        assert!(!within_per_axis(&p(0.0, 0.0), &p(0.0, 1e-3), 1e-3));
    }
}
