use std::f64::consts::{PI, TAU};

use crate::error::{GeometryError, Result};
use crate::math::{Point2, Vector2, TOLERANCE};

/// A full ellipse in the sketch plane.
///
/// `P(t) = center + a * cos(θ) * major + b * sin(θ) * minor`, with
/// `θ = 2πt` and `minor` the major axis rotated by +90°.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipse {
    center: Point2,
    semi_major: f64,
    semi_minor: f64,
    major_dir: Vector2,
}

impl Ellipse {
    /// Creates a new ellipse.
    ///
    /// # Errors
    ///
    /// Returns an error if either axis length is non-positive, the minor axis
    /// exceeds the major axis, or the major direction is zero-length.
    pub fn new(center: Point2, semi_major: f64, semi_minor: f64, major_dir: Vector2) -> Result<Self> {
        if semi_major < TOLERANCE {
            return Err(
                GeometryError::Degenerate("semi-major axis must be positive".into()).into(),
            );
        }
        if semi_minor < TOLERANCE {
            return Err(
                GeometryError::Degenerate("semi-minor axis must be positive".into()).into(),
            );
        }
        if semi_minor > semi_major + TOLERANCE {
            return Err(GeometryError::Degenerate(
                "semi-minor axis must not exceed semi-major axis".into(),
            )
            .into());
        }
        let len = major_dir.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            center,
            semi_major,
            semi_minor,
            major_dir: major_dir / len,
        })
    }

    #[must_use]
    pub fn center(&self) -> &Point2 {
        &self.center
    }

    #[must_use]
    pub fn semi_major(&self) -> f64 {
        self.semi_major
    }

    #[must_use]
    pub fn semi_minor(&self) -> f64 {
        self.semi_minor
    }

    #[must_use]
    pub fn major_dir(&self) -> &Vector2 {
        &self.major_dir
    }

    /// Evaluates the ellipse at `t` in `[0, 1]`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        let a = TAU * t;
        let minor = Vector2::new(-self.major_dir.y, self.major_dir.x);
        self.center
            + self.major_dir * (self.semi_major * a.cos())
            + minor * (self.semi_minor * a.sin())
    }

    /// Perimeter by Ramanujan's second approximation.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        let (a, b) = (self.semi_major, self.semi_minor);
        let h = ((a - b) / (a + b)).powi(2);
        PI * (a + b) * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()))
    }
}
