/// 2D arc math utilities.
///
/// Arcs are stored center-radius-angle form with a signed `sweep`:
/// positive sweeps run counter-clockwise.
use std::f64::consts::TAU;

use super::{Point2, TOLERANCE};

/// Evaluates a point on an arc at parameter `t` in `[0, 1]`.
#[must_use]
pub fn arc_point_at(center: &Point2, radius: f64, start_angle: f64, sweep: f64, t: f64) -> Point2 {
    let angle = start_angle + sweep * t;
    Point2::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
}

/// Normalizes an angle to `[0, 2π)`.
#[must_use]
pub fn normalize_angle(a: f64) -> f64 {
    let r = a % TAU;
    if r < 0.0 {
        r + TAU
    } else {
        r
    }
}

/// Counter-clockwise sweep from `start_angle` to `end_angle`, in `(0, 2π]`.
#[must_use]
pub fn ccw_sweep(start_angle: f64, end_angle: f64) -> f64 {
    let s = normalize_angle(end_angle - start_angle);
    if s < TOLERANCE {
        TAU
    } else {
        s
    }
}

/// Circle through three points.
///
/// Returns `(center, radius)`, or `None` if the points are colinear.
#[must_use]
pub fn circumcircle(a: &Point2, b: &Point2, c: &Point2) -> Option<(Point2, f64)> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    let scale = (b - a).norm().max((c - a).norm()).max(1.0);
    if d.abs() < TOLERANCE * scale * scale {
        return None;
    }
    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    let center = Point2::new(ux, uy);
    Some((center, (a - center).norm()))
}

/// Arc from `p0` to `p1` passing through `mid`.
///
/// Returns `(center, radius, start_angle, sweep)` with a positive
/// (counter-clockwise) sweep. When the counter-clockwise path from `p0` to
/// `p1` does not contain `mid`, the endpoints are swapped so the arc still
/// passes through it.
#[must_use]
pub fn arc_through_three_points(
    p0: &Point2,
    mid: &Point2,
    p1: &Point2,
) -> Option<(Point2, f64, f64, f64)> {
    let (center, radius) = circumcircle(p0, mid, p1)?;
    let angle_of = |p: &Point2| (p.y - center.y).atan2(p.x - center.x);
    let a0 = angle_of(p0);
    let am = angle_of(mid);
    let a1 = angle_of(p1);

    let sweep = ccw_sweep(a0, a1);
    let to_mid = normalize_angle(am - a0);
    if to_mid <= sweep {
        Some((center, radius, a0, sweep))
    } else {
        Some((center, radius, a1, ccw_sweep(a1, a0)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    #[test]
    fn point_at_quarter() {
        let p = arc_point_at(&Point2::new(1.0, 1.0), 2.0, 0.0, PI / 2.0, 1.0);
        assert!((p.x - 1.0).abs() < 1e-12 && (p.y - 3.0).abs() < 1e-12, "p={p}");
    }

    #[test]
    fn circumcircle_unit() {
        let (c, r) = circumcircle(
            &Point2::new(1.0, 0.0),
            &Point2::new(0.0, 1.0),
            &Point2::new(-1.0, 0.0),
        )
        .unwrap();
        assert!(c.coords.norm() < 1e-12, "c={c}");
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn circumcircle_colinear() {
        assert!(circumcircle(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(2.0, 0.0)
        )
        .is_none());
    }

    #[test]
    fn three_point_arc_clockwise_input() {
        // Walking (0,1) → (1,0) → (0,-1) is clockwise; the arc is re-oriented
        // counter-clockwise from (0,-1) to (0,1) through (1,0).
        let (_, r, start, sweep) = arc_through_three_points(
            &Point2::new(0.0, 1.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(0.0, -1.0),
        )
        .unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        assert!((start + PI / 2.0).abs() < 1e-12, "start={start}");
        assert!((sweep - PI).abs() < 1e-12, "sweep={sweep}");
    }
}
