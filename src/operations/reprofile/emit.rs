use tracing::debug;

use crate::error::Result;
use crate::math::bspline::{compress_knots, Interpolated};
use crate::math::Point2;
use crate::sketch::{Constraint, GeoId, GeometrySink};

/// Adds a Block-constrained construction line from the origin to `center`.
///
/// The blocked line pins an otherwise free center in place.
fn center_anchor<H: GeometrySink + ?Sized>(host: &mut H, center: Point2) -> Result<GeoId> {
    let anchor = host.add_line_segment(Point2::origin(), center)?;
    host.set_construction(anchor, true)?;
    host.add_constraint(Constraint::block(anchor))?;
    Ok(anchor)
}

/// Adds a circle with an anchored center and a radius constraint.
///
/// # Errors
///
/// Propagates any host rejection.
pub fn circle<H: GeometrySink + ?Sized>(host: &mut H, center: Point2, radius: f64) -> Result<GeoId> {
    center_anchor(host, center)?;
    let circle = host.add_circle(center, radius)?;
    host.add_constraint(Constraint::radius(circle, radius))?;
    debug!(geo = circle, x = center.x, y = center.y, radius, "circle added");
    Ok(circle)
}

/// Adds the arc through `start`, `mid` and `end` with an anchored center
/// and a radius constraint.
///
/// # Errors
///
/// Propagates any host rejection.
pub fn arc<H: GeometrySink + ?Sized>(
    host: &mut H,
    points: [Point2; 3],
    center: Point2,
    radius: f64,
) -> Result<GeoId> {
    let [start, mid, end] = points;
    let arc = host.add_arc(start, mid, end)?;
    center_anchor(host, center)?;
    host.add_constraint(Constraint::radius(arc, radius))?;
    debug!(geo = arc, radius, "arc added");
    Ok(arc)
}

/// # Errors
///
/// Propagates any host rejection.
pub fn line<H: GeometrySink + ?Sized>(host: &mut H, start: Point2, end: Point2) -> Result<GeoId> {
    let line = host.add_line_segment(start, end)?;
    debug!(geo = line, "line added");
    Ok(line)
}

/// Adds a non-periodic spline from an interpolation result.
///
/// # Errors
///
/// Propagates any host rejection.
pub fn spline<H: GeometrySink + ?Sized>(host: &mut H, curve: Interpolated) -> Result<GeoId> {
    let (knots, mults) = compress_knots(&curve.knots);
    let poles = curve.poles.len();
    let spline = host.add_bspline(curve.poles, knots, mults, curve.degree, false)?;
    debug!(geo = spline, poles, degree = curve.degree, "spline added");
    Ok(spline)
}
