use std::f64::consts::TAU;

use crate::error::{GeometryError, Result};
use crate::math::arc_2d::{arc_point_at, arc_through_three_points};
use crate::math::{Point2, TOLERANCE};

/// A counter-clockwise circular arc.
///
/// Defined by a center, radius, start angle and a positive `sweep` (both in
/// radians). The arc runs from `start_angle` to `start_angle + sweep`.
#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    center: Point2,
    radius: f64,
    start_angle: f64,
    sweep: f64,
}

impl Arc {
    /// Creates a new arc.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive or the sweep is not in
    /// `(0, 2π]`.
    pub fn new(center: Point2, radius: f64, start_angle: f64, sweep: f64) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(GeometryError::Degenerate("arc radius must be positive".into()).into());
        }
        if sweep < TOLERANCE || sweep > TAU + TOLERANCE {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "sweep",
                value: sweep,
                min: 0.0,
                max: TAU,
            }
            .into());
        }
        Ok(Self {
            center,
            radius,
            start_angle,
            sweep,
        })
    }

    /// Arc from `p0` to `p1` through `mid`, oriented counter-clockwise.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the three points are colinear.
    pub fn through_three_points(p0: &Point2, mid: &Point2, p1: &Point2) -> Result<Self> {
        let (center, radius, start, sweep) = arc_through_three_points(p0, mid, p1)
            .ok_or_else(|| GeometryError::Degenerate("arc points are colinear".into()))?;
        Self::new(center, radius, start, sweep)
    }

    #[must_use]
    pub fn center(&self) -> &Point2 {
        &self.center
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[must_use]
    pub fn start_angle(&self) -> f64 {
        self.start_angle
    }

    #[must_use]
    pub fn sweep(&self) -> f64 {
        self.sweep
    }

    /// Evaluates the arc at `t` in `[0, 1]`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        arc_point_at(&self.center, self.radius, self.start_angle, self.sweep, t)
    }

    #[must_use]
    pub fn start_point(&self) -> Point2 {
        self.point_at(0.0)
    }

    #[must_use]
    pub fn end_point(&self) -> Point2 {
        self.point_at(1.0)
    }

    /// Arc length, `radius * sweep`.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.radius * self.sweep
    }
}
