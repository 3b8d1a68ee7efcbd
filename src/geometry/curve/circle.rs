use std::f64::consts::TAU;

use crate::error::{GeometryError, Result};
use crate::math::{Point2, TOLERANCE};

/// A full circle.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    center: Point2,
    radius: f64,
}

impl Circle {
    /// Creates a new circle.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive.
    pub fn new(center: Point2, radius: f64) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(GeometryError::Degenerate("circle radius must be positive".into()).into());
        }
        Ok(Self { center, radius })
    }

    #[must_use]
    pub fn center(&self) -> &Point2 {
        &self.center
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Evaluates the circle at `t` in `[0, 1]`, starting at angle zero.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        let a = TAU * t;
        Point2::new(
            self.center.x + self.radius * a.cos(),
            self.center.y + self.radius * a.sin(),
        )
    }

    #[must_use]
    pub fn circumference(&self) -> f64 {
        TAU * self.radius
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn circumference() {
        let c = Circle::new(Point2::new(1.0, 2.0), 3.0).unwrap();
        assert!((c.circumference() - 6.0 * std::f64::consts::PI).abs() < 1e-12);
        let p = c.point_at(0.25);
        assert!((p.x - 1.0).abs() < 1e-12 && (p.y - 5.0).abs() < 1e-12, "p={p}");
    }

    #[test]
    fn zero_radius_rejected() {
        assert!(Circle::new(Point2::origin(), 0.0).is_err());
    }
}
