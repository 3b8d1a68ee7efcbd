pub mod arc_2d;
pub mod bspline;
pub mod circle_fit;
pub mod distance_2d;
pub mod intersect_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns the unsigned angle between two direction vectors, in degrees.
///
/// Uses `atan2(|cross|, dot)` so the result is well-conditioned near 0 and 180.
/// Returns `None` when either vector is shorter than [`TOLERANCE`].
#[must_use]
pub fn angle_between_deg(u: &Vector2, v: &Vector2) -> Option<f64> {
    if u.norm() < TOLERANCE || v.norm() < TOLERANCE {
        return None;
    }
    let cross = u.x * v.y - u.y * v.x;
    let dot = u.dot(v);
    Some(cross.abs().atan2(dot).to_degrees())
}

/// Returns the direction angle of `v` in degrees, in `(-180, 180]`.
#[must_use]
pub fn direction_deg(v: &Vector2) -> f64 {
    v.y.atan2(v.x).to_degrees()
}

/// Smallest absolute difference between two direction angles in degrees,
/// accounting for wraparound at 360.
#[must_use]
pub fn direction_delta_deg(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}
