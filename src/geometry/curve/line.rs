use crate::math::{Point2, Vector2};

/// A bounded line segment from `start` to `end`.
///
/// Zero-length segments are representable so callers can report them as
/// defects instead of failing to read them.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    start: Point2,
    end: Point2,
}

impl Line {
    /// Creates a new segment.
    #[must_use]
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// Returns the start point.
    #[must_use]
    pub fn start(&self) -> &Point2 {
        &self.start
    }

    /// Returns the end point.
    #[must_use]
    pub fn end(&self) -> &Point2 {
        &self.end
    }

    /// Returns the (non-normalized) vector from start to end.
    #[must_use]
    pub fn direction(&self) -> Vector2 {
        self.end - self.start
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    /// Evaluates the segment at `t` in `[0, 1]`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        self.start + self.direction() * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_and_midpoint() {
        let l = Line::new(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0));
        assert!((l.length() - 5.0).abs() < 1e-12);
        let m = l.point_at(0.5);
        assert!((m.x - 1.5).abs() < 1e-12 && (m.y - 2.0).abs() < 1e-12, "m={m}");
    }

    #[test]
    fn zero_length_is_representable() {
        let p = Point2::new(1.0, 1.0);
        assert!(Line::new(p, p).length() < 1e-15);
    }
}
