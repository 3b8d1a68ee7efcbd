mod arc;
mod bspline;
mod circle;
mod ellipse;
mod line;

use std::fmt;

pub use arc::Arc;
pub use bspline::BSpline;
pub use circle::Circle;
pub use ellipse::Ellipse;
pub use line::Line;

use crate::error::GeometryError;
use crate::math::Point2;

/// Result of evaluating a curve.
pub type EvalResult<T> = std::result::Result<T, GeometryError>;

/// Samples used to approximate the length of a B-spline.
const SPLINE_LENGTH_SAMPLES: usize = 64;

/// Point position on a geometry, numbered the way sketch hosts number them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointPos {
    Edge = 0,
    Start = 1,
    End = 2,
    Center = 3,
}

impl PointPos {
    /// Maps a host position code to a `PointPos`.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Edge),
            1 => Some(Self::Start),
            2 => Some(Self::End),
            3 => Some(Self::Center),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Discriminant of a [`Curve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveKind {
    Line,
    Arc,
    Circle,
    BSpline,
    Ellipse,
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Line => "Line",
            Self::Arc => "Arc",
            Self::Circle => "Circle",
            Self::BSpline => "BSpline",
            Self::Ellipse => "Ellipse",
        };
        f.write_str(name)
    }
}

/// A planar sketch curve.
#[derive(Debug, Clone, PartialEq)]
pub enum Curve {
    Line(Line),
    Arc(Arc),
    Circle(Circle),
    BSpline(BSpline),
    Ellipse(Ellipse),
}

impl Curve {
    #[must_use]
    pub fn kind(&self) -> CurveKind {
        match self {
            Self::Line(_) => CurveKind::Line,
            Self::Arc(_) => CurveKind::Arc,
            Self::Circle(_) => CurveKind::Circle,
            Self::BSpline(_) => CurveKind::BSpline,
            Self::Ellipse(_) => CurveKind::Ellipse,
        }
    }

    /// Start and end points, or `None` for closed curves (full circles,
    /// ellipses and periodic splines).
    ///
    /// # Errors
    ///
    /// Returns an error if a B-spline cannot be evaluated.
    pub fn endpoints(&self) -> EvalResult<Option<(Point2, Point2)>> {
        Ok(match self {
            Self::Line(l) => Some((*l.start(), *l.end())),
            Self::Arc(a) => Some((a.start_point(), a.end_point())),
            Self::Circle(_) | Self::Ellipse(_) => None,
            Self::BSpline(s) => s.endpoints()?,
        })
    }

    /// Center point, for arcs, circles and ellipses.
    #[must_use]
    pub fn center(&self) -> Option<Point2> {
        match self {
            Self::Arc(a) => Some(*a.center()),
            Self::Circle(c) => Some(*c.center()),
            Self::Ellipse(e) => Some(*e.center()),
            Self::Line(_) | Self::BSpline(_) => None,
        }
    }

    /// Coordinates of a point position, `None` if the curve has no such
    /// point. `PointPos::Edge` never resolves to a point.
    ///
    /// # Errors
    ///
    /// Returns an error if a B-spline cannot be evaluated.
    pub fn point(&self, pos: PointPos) -> EvalResult<Option<Point2>> {
        match pos {
            PointPos::Edge => Ok(None),
            PointPos::Center => Ok(self.center()),
            PointPos::Start => Ok(self.endpoints()?.map(|(s, _)| s)),
            PointPos::End => Ok(self.endpoints()?.map(|(_, e)| e)),
        }
    }

    /// Curve length. B-spline length is a polyline approximation.
    ///
    /// # Errors
    ///
    /// Returns an error if a B-spline cannot be evaluated.
    pub fn length(&self) -> EvalResult<f64> {
        Ok(match self {
            Self::Line(l) => l.length(),
            Self::Arc(a) => a.length(),
            Self::Circle(c) => c.circumference(),
            Self::Ellipse(e) => e.perimeter(),
            Self::BSpline(_) => self
                .sample(SPLINE_LENGTH_SAMPLES)?
                .windows(2)
                .map(|w| (w[1] - w[0]).norm())
                .sum(),
        })
    }

    /// Evaluates the curve at normalized parameter `t` in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if a B-spline cannot be evaluated.
    pub fn point_at(&self, t: f64) -> EvalResult<Point2> {
        Ok(match self {
            Self::Line(l) => l.point_at(t),
            Self::Arc(a) => a.point_at(t),
            Self::Circle(c) => c.point_at(t),
            Self::Ellipse(e) => e.point_at(t),
            Self::BSpline(s) => s.point_at(t)?,
        })
    }

    /// Samples `segments + 1` evenly spaced parameter values into a polyline.
    ///
    /// # Errors
    ///
    /// Returns an error if a B-spline cannot be evaluated.
    pub fn sample(&self, segments: usize) -> EvalResult<Vec<Point2>> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f64 / segments as f64;
                self.point_at(t)
            })
            .collect()
    }

    /// Returns `true` if the curve has no free endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if a B-spline cannot be evaluated.
    pub fn is_closed(&self) -> EvalResult<bool> {
        Ok(self.endpoints()?.is_none())
    }
}

/// Display name of a geometry, `"{index + 1}-{kind}"`.
#[must_use]
pub fn geometry_name(index: usize, kind: CurveKind) -> String {
    format!("{}-{}", index + 1, kind)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn circle_has_no_endpoints() {
        let c = Curve::Circle(Circle::new(Point2::origin(), 1.0).unwrap());
        assert!(c.endpoints().unwrap().is_none());
        assert!(c.point(PointPos::Start).unwrap().is_none());
        assert_eq!(c.point(PointPos::Center).unwrap(), Some(Point2::origin()));
        assert!(c.is_closed().unwrap());
    }

    #[test]
    fn line_points() {
        let c = Curve::Line(Line::new(Point2::new(0.0, 0.0), Point2::new(2.0, 0.0)));
        assert_eq!(c.point(PointPos::End).unwrap(), Some(Point2::new(2.0, 0.0)));
        assert!(c.point(PointPos::Center).unwrap().is_none());
        assert!(c.point(PointPos::Edge).unwrap().is_none());
        assert_eq!(c.sample(4).unwrap().len(), 5);
    }

    #[test]
    fn names() {
        assert_eq!(geometry_name(0, CurveKind::Line), "1-Line");
        assert_eq!(geometry_name(11, CurveKind::BSpline), "12-BSpline");
    }

    #[test]
    fn point_pos_codes() {
        for code in 0..4 {
            assert_eq!(PointPos::from_code(code).unwrap().code(), code);
        }
        assert!(PointPos::from_code(4).is_none());
    }

    #[test]
    fn spline_length_close_to_chord_sum() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(3.0, 0.0),
        ];
        let c = Curve::BSpline(BSpline::interpolating(&pts, 3).unwrap());
        assert!((c.length().unwrap() - 3.0).abs() < 1e-9);
    }
}
