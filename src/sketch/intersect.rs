use std::f64::consts::TAU;

use super::host::CurveIntersector;
use crate::error::Result;
use crate::geometry::Curve;
use crate::math::intersect_2d::{
    arc_arc_intersect_2d, collinear_overlap_2d, line_arc_intersect_2d,
    segment_segment_intersect_2d,
};
use crate::math::Point2;

/// Segments used to approximate ellipses and splines.
const SAMPLE_SEGMENTS: usize = 128;

/// Points closer than this are reported once.
const DEDUP_TOLERANCE: f64 = 1e-7;

/// Collinearity tolerance for segment overlap.
const COLLINEAR_TOLERANCE: f64 = 1e-9;

/// Bounded intersection built on the closed-form 2D kernels.
///
/// Lines, arcs and circles are intersected exactly. Ellipses and B-splines
/// are sampled into polylines first.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelIntersector;

enum Piece {
    Segment(Point2, Point2),
    Arc {
        center: Point2,
        radius: f64,
        start: f64,
        sweep: f64,
    },
    Polyline(Vec<Point2>),
}

fn to_piece(curve: &Curve) -> Result<Piece> {
    Ok(match curve {
        Curve::Line(l) => Piece::Segment(*l.start(), *l.end()),
        Curve::Arc(a) => Piece::Arc {
            center: *a.center(),
            radius: a.radius(),
            start: a.start_angle(),
            sweep: a.sweep(),
        },
        Curve::Circle(c) => Piece::Arc {
            center: *c.center(),
            radius: c.radius(),
            start: 0.0,
            sweep: TAU,
        },
        Curve::Ellipse(_) | Curve::BSpline(_) => Piece::Polyline(curve.sample(SAMPLE_SEGMENTS)?),
    })
}

fn push_unique(out: &mut Vec<Point2>, p: Point2) {
    if out.iter().all(|q| (q - p).norm() > DEDUP_TOLERANCE) {
        out.push(p);
    }
}

fn segment_vs(a0: &Point2, a1: &Point2, other: &Piece, out: &mut Vec<Point2>) {
    match other {
        Piece::Segment(b0, b1) => {
            if let Some((p, _, _)) = segment_segment_intersect_2d(a0, a1, b0, b1) {
                push_unique(out, p);
            } else if let Some((s, e)) = collinear_overlap_2d(a0, a1, b0, b1, COLLINEAR_TOLERANCE)
            {
                push_unique(out, s);
                push_unique(out, e);
            }
        }
        Piece::Arc {
            center,
            radius,
            start,
            sweep,
        } => {
            for (p, _, _) in line_arc_intersect_2d(a0, a1, center, *radius, *start, *sweep) {
                push_unique(out, p);
            }
        }
        Piece::Polyline(points) => {
            for w in points.windows(2) {
                segment_vs(&w[0], &w[1], &Piece::Segment(*a0, *a1), out);
            }
        }
    }
}

fn intersect_pieces(a: &Piece, b: &Piece, out: &mut Vec<Point2>) {
    match (a, b) {
        (Piece::Segment(a0, a1), _) => segment_vs(a0, a1, b, out),
        (_, Piece::Segment(b0, b1)) => segment_vs(b0, b1, a, out),
        (Piece::Polyline(points), _) => {
            for w in points.windows(2) {
                segment_vs(&w[0], &w[1], b, out);
            }
        }
        (_, Piece::Polyline(points)) => {
            for w in points.windows(2) {
                segment_vs(&w[0], &w[1], a, out);
            }
        }
        (
            Piece::Arc {
                center: c1,
                radius: r1,
                start: s1,
                sweep: w1,
            },
            Piece::Arc {
                center: c2,
                radius: r2,
                start: s2,
                sweep: w2,
            },
        ) => {
            for (p, _, _) in arc_arc_intersect_2d(c1, *r1, *s1, *w1, c2, *r2, *s2, *w2) {
                push_unique(out, p);
            }
        }
    }
}

impl CurveIntersector for KernelIntersector {
    fn intersect(&self, a: &Curve, b: &Curve) -> Result<Vec<Point2>> {
        let pa = to_piece(a)?;
        let pb = to_piece(b)?;
        let mut out = Vec::new();
        intersect_pieces(&pa, &pb, &mut out);
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::geometry::{Arc, BSpline, Circle, Line};

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Curve {
        Curve::Line(Line::new(Point2::new(x0, y0), Point2::new(x1, y1)))
    }

    #[test]
    fn crossing_lines() {
        let pts = KernelIntersector
            .intersect(&line(0.0, 0.0, 2.0, 2.0), &line(0.0, 2.0, 2.0, 0.0))
            .unwrap();
        assert_eq!(pts.len(), 1);
        assert!((pts[0] - Point2::new(1.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn disjoint_lines_bounded() {
        // The infinite carriers cross at (3, 3); the segments do not.
        let pts = KernelIntersector
            .intersect(&line(0.0, 0.0, 1.0, 1.0), &line(0.0, 6.0, 1.0, 5.0))
            .unwrap();
        assert!(pts.is_empty());
    }

    #[test]
    fn collinear_overlap_reports_two_points() {
        let pts = KernelIntersector
            .intersect(&line(0.0, 0.0, 4.0, 0.0), &line(2.0, 0.0, 6.0, 0.0))
            .unwrap();
        assert_eq!(pts.len(), 2);
    }

    #[test]
    fn shared_endpoint_reports_one_point() {
        let pts = KernelIntersector
            .intersect(&line(0.0, 0.0, 1.0, 0.0), &line(1.0, 0.0, 1.0, 1.0))
            .unwrap();
        assert_eq!(pts.len(), 1);
    }

    #[test]
    fn line_through_circle() {
        let c = Curve::Circle(Circle::new(Point2::origin(), 1.0).unwrap());
        let pts = KernelIntersector.intersect(&line(-2.0, 0.0, 2.0, 0.0), &c).unwrap();
        assert_eq!(pts.len(), 2);
    }

    #[test]
    fn arc_misses_outside_range() {
        let a = Curve::Arc(Arc::new(Point2::origin(), 1.0, 0.0, PI).unwrap());
        let pts = KernelIntersector.intersect(&a, &line(-2.0, -0.5, 2.0, -0.5)).unwrap();
        assert!(pts.is_empty());
    }

    #[test]
    fn spline_crossing_line() {
        let s = BSpline::interpolating(
            &[
                Point2::new(0.0, -1.0),
                Point2::new(1.0, 0.0),
                Point2::new(2.0, 1.0),
                Point2::new(3.0, 2.0),
            ],
            3,
        )
        .unwrap();
        let pts = KernelIntersector
            .intersect(&Curve::BSpline(s), &line(0.0, 0.5, 3.0, 0.5))
            .unwrap();
        assert_eq!(pts.len(), 1);
        assert!((pts[0].x - 1.5).abs() < 1e-3, "p={}", pts[0]);
    }
}
