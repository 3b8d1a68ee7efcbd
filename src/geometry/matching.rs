//! Geometric matching predicates.
//!
//! Every predicate returns `Result<bool, GeometryError>`. Enumeration loops
//! that call them decide locally whether an error means "no match".

use std::f64::consts::TAU;

use super::curve::{Curve, EvalResult};
use crate::math::arc_2d::normalize_angle;
use crate::math::{Point2, Vector2};

/// Default matching tolerance.
pub const MATCH_TOLERANCE: f64 = 1e-6;

/// Which predicate a lookup applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// [`curves_exact_match`]
    Exact,
    /// [`curves_similar_match`]
    Similar,
}

impl MatchMode {
    /// Applies the selected predicate.
    ///
    /// # Errors
    ///
    /// Returns an error if either curve cannot be evaluated.
    pub fn test(self, a: &Curve, b: &Curve, tol: f64) -> EvalResult<bool> {
        match self {
            Self::Exact => curves_exact_match(a, b, tol),
            Self::Similar => curves_similar_match(a, b, tol),
        }
    }
}

/// Returns `true` if the points are closer than `tol`.
#[must_use]
pub fn points_match(a: &Point2, b: &Point2, tol: f64) -> bool {
    (a - b).norm() < tol
}

/// Center, radius, start angle and sweep for arcs and full circles.
fn circular_span(curve: &Curve) -> Option<(Point2, f64, f64, f64)> {
    match curve {
        Curve::Arc(a) => Some((*a.center(), a.radius(), a.start_angle(), a.sweep())),
        Curve::Circle(c) => Some((*c.center(), c.radius(), 0.0, TAU)),
        _ => None,
    }
}

fn endpoints_match(
    a: Option<(Point2, Point2)>,
    b: Option<(Point2, Point2)>,
    tol: f64,
) -> bool {
    let (Some((s1, e1)), Some((s2, e2))) = (a, b) else {
        return false;
    };
    let forward = points_match(&s1, &s2, tol) && points_match(&e1, &e2, tol);
    let reverse = points_match(&s1, &e2, tol) && points_match(&e1, &s2, tol);
    forward || reverse
}

/// Exact match: same shape in the same place.
///
/// Circles and arcs compare center, radius and angular span, then require
/// the endpoints to match forward or reversed. Full circles have no
/// endpoints, so two full circles never match exactly. Other curves compare
/// kind, length and endpoints.
///
/// # Errors
///
/// Returns an error if either curve cannot be evaluated.
pub fn curves_exact_match(a: &Curve, b: &Curve, tol: f64) -> EvalResult<bool> {
    if let (Some((c1, r1, _, sw1)), Some((c2, r2, _, sw2))) = (circular_span(a), circular_span(b))
    {
        if !points_match(&c1, &c2, tol) || (r1 - r2).abs() > tol || (sw1 - sw2).abs() > tol {
            return Ok(false);
        }
        return Ok(endpoints_match(a.endpoints()?, b.endpoints()?, tol));
    }

    if a.kind() != b.kind() {
        return Ok(false);
    }
    if (a.length()? - b.length()?).abs() > tol {
        return Ok(false);
    }
    Ok(endpoints_match(a.endpoints()?, b.endpoints()?, tol))
}

/// Similar match: lines on the same carrier with overlapping extent, or
/// circles and arcs on the same circle with overlapping angular extent.
///
/// # Errors
///
/// Returns an error if either curve cannot be evaluated.
pub fn curves_similar_match(a: &Curve, b: &Curve, tol: f64) -> EvalResult<bool> {
    match (a, b) {
        (Curve::Line(l1), Curve::Line(l2)) => {
            let d1 = l1.direction();
            let d2 = l2.direction();
            let (n1, n2) = (d1.norm(), d2.norm());
            if n1 < tol || n2 < tol {
                return Ok(false);
            }
            let u1 = d1 / n1;
            let u2 = d2 / n2;
            if u1.dot(&u2).abs() < 1.0 - tol {
                return Ok(false);
            }
            let origin = l1.start();
            let offset: Vector2 = l2.start() - origin;
            if (offset.x * u1.y - offset.y * u1.x).abs() > tol {
                return Ok(false);
            }
            let interval = |p: &Point2, q: &Point2| {
                let s = u1.dot(&(p - origin));
                let e = u1.dot(&(q - origin));
                (s.min(e), s.max(e))
            };
            let (s1, e1) = interval(l1.start(), l1.end());
            let (s2, e2) = interval(l2.start(), l2.end());
            Ok(e1.min(e2) - s1.max(s2) > tol)
        }
        _ => {
            let (Some((c1, r1, st1, sw1)), Some((c2, r2, st2, sw2))) =
                (circular_span(a), circular_span(b))
            else {
                return Ok(false);
            };
            if !points_match(&c1, &c2, tol) || (r1 - r2).abs() > tol {
                return Ok(false);
            }
            let full1 = (sw1 - TAU).abs() < tol;
            let full2 = (sw2 - TAU).abs() < tol;
            if full1 && full2 {
                return Ok(true);
            }
            Ok(angular_overlap(st1, sw1, st2, sw2) > tol)
        }
    }
}

/// Length of the overlap between two counter-clockwise angular ranges.
fn angular_overlap(start1: f64, sweep1: f64, start2: f64, sweep2: f64) -> f64 {
    let rel = normalize_angle(start2 - start1);
    // Second range expressed relative to the first's start, plus its copy one
    // turn back to catch ranges wrapping past the first's start.
    let direct = sweep1.min(rel + sweep2) - rel;
    let wrapped = sweep1.min(rel + sweep2 - TAU);
    direct.max(wrapped).max(0.0)
}
