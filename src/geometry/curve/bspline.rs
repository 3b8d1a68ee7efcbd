use crate::error::{GeometryError, Result};
use crate::math::bspline::{compress_knots, domain, evaluate, expand_knots, interpolate};
use crate::math::Point2;

use super::EvalResult;

/// A non-rational B-spline in host form: poles, unique knots with
/// multiplicities, degree and a periodic flag.
///
/// For a non-periodic spline the multiplicities sum to
/// `poles + degree + 1`. For a periodic spline the multiplicities, last
/// knot excluded, sum to the pole count and the curve closes on itself.
#[derive(Debug, Clone, PartialEq)]
pub struct BSpline {
    poles: Vec<Point2>,
    knots: Vec<f64>,
    mults: Vec<u32>,
    degree: usize,
    periodic: bool,
    // Expanded knots and poles ready for evaluation.
    eval_knots: Vec<f64>,
    eval_poles: Vec<Point2>,
}

impl BSpline {
    /// Creates a new B-spline.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the knot layout does not match
    /// the pole count and degree, or the knots are not increasing.
    pub fn new(
        poles: Vec<Point2>,
        knots: Vec<f64>,
        mults: Vec<u32>,
        degree: usize,
        periodic: bool,
    ) -> Result<Self> {
        if degree == 0 || poles.len() < 2 {
            return Err(GeometryError::Degenerate(
                "b-spline needs degree >= 1 and at least 2 poles".into(),
            )
            .into());
        }
        if knots.len() != mults.len() || knots.len() < 2 {
            return Err(
                GeometryError::Degenerate("knot and multiplicity counts differ".into()).into(),
            );
        }
        if knots.windows(2).any(|w| w[1] <= w[0]) {
            return Err(GeometryError::Degenerate("knots must be increasing".into()).into());
        }

        let (eval_knots, eval_poles) = if periodic {
            unwrap_periodic(&poles, &knots, &mults, degree)?
        } else {
            (expand_knots(&knots, &mults), poles.clone())
        };
        // Validates the expanded layout.
        domain(&eval_poles, &eval_knots, degree)?;

        Ok(Self {
            poles,
            knots,
            mults,
            degree,
            periodic,
            eval_knots,
            eval_poles,
        })
    }

    /// Interpolating, clamped spline through `points`.
    ///
    /// # Errors
    ///
    /// Propagates interpolation failures (too few or repeated points).
    pub fn interpolating(points: &[Point2], degree: usize) -> Result<Self> {
        let fit = interpolate(points, degree)?;
        let (knots, mults) = compress_knots(&fit.knots);
        Self::new(fit.poles, knots, mults, fit.degree, false)
    }

    #[must_use]
    pub fn poles(&self) -> &[Point2] {
        &self.poles
    }

    #[must_use]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    #[must_use]
    pub fn mults(&self) -> &[u32] {
        &self.mults
    }

    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    #[must_use]
    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    /// Evaluates the spline at normalized parameter `t` in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error only for an inconsistent internal layout.
    pub fn point_at(&self, t: f64) -> EvalResult<Point2> {
        let (lo, hi) = domain(&self.eval_poles, &self.eval_knots, self.degree)?;
        let u = lo + (hi - lo) * t.clamp(0.0, 1.0);
        evaluate(&self.eval_poles, &self.eval_knots, self.degree, u)
    }

    /// First and last evaluated points, `None` for periodic splines.
    ///
    /// # Errors
    ///
    /// Returns an error only for an inconsistent internal layout.
    pub fn endpoints(&self) -> EvalResult<Option<(Point2, Point2)>> {
        if self.periodic {
            return Ok(None);
        }
        Ok(Some((self.point_at(0.0)?, self.point_at(1.0)?)))
    }
}

/// Builds the evaluation layout for a periodic spline: the pole list is
/// extended by `degree` wrapped poles and the knot vector by one period on
/// each side.
fn unwrap_periodic(
    poles: &[Point2],
    knots: &[f64],
    mults: &[u32],
    degree: usize,
) -> Result<(Vec<f64>, Vec<Point2>)> {
    let n = knots.len();
    let flat = expand_knots(&knots[..n - 1], &mults[..n - 1]);
    let count = poles.len();
    if flat.len() != count || count <= degree {
        return Err(GeometryError::Degenerate(format!(
            "periodic spline has {} poles but {} knots per period",
            count,
            flat.len()
        ))
        .into());
    }
    let period = knots[n - 1] - knots[0];

    let mut ext = Vec::with_capacity(count + 2 * degree + 1);
    ext.extend(flat[count - degree..].iter().map(|k| k - period));
    ext.extend_from_slice(&flat);
    ext.extend(flat[..=degree].iter().map(|k| k + period));

    let mut ext_poles = poles.to_vec();
    ext_poles.extend_from_slice(&poles[..degree]);
    Ok((ext, ext_poles))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn interpolating_endpoints() {
        let pts: Vec<Point2> = (0..6)
            .map(|i| {
                let x = f64::from(i);
                Point2::new(x, x * x * 0.1)
            })
            .collect();
        let s = BSpline::interpolating(&pts, 3).unwrap();
        assert_eq!(s.degree(), 3);
        assert_eq!(s.knots().len(), s.mults().len());
        let (a, b) = s.endpoints().unwrap().unwrap();
        assert!((a - pts[0]).norm() < 1e-9, "a={a}");
        assert!((b - pts[5]).norm() < 1e-9, "b={b}");
    }

    #[test]
    fn layout_mismatch_rejected() {
        let poles = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 0.0)];
        assert!(BSpline::new(poles, vec![0.0, 1.0], vec![3, 3], 3, false).is_err());
    }

    #[test]
    fn periodic_closes() {
        let poles = vec![
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(-1.0, 0.0),
            Point2::new(0.0, -1.0),
        ];
        let s = BSpline::new(poles, vec![0.0, 1.0, 2.0, 3.0, 4.0], vec![1; 5], 2, true).unwrap();
        assert!(s.is_periodic());
        assert!(s.endpoints().unwrap().is_none());
        let a = s.point_at(0.0).unwrap();
        let b = s.point_at(1.0).unwrap();
        assert!((a - b).norm() < 1e-12, "a={a} b={b}");
    }
}
