//! Non-rational B-spline kernels: basis evaluation and global interpolation.
//!
//! Knot vectors here are the expanded form (each knot repeated by its
//! multiplicity). [`compress_knots`] and [`expand_knots`] convert to and from
//! the unique-knot plus multiplicity form used by sketch hosts.

use nalgebra::DMatrix;

use super::{Point2, TOLERANCE};
use crate::error::GeometryError;

/// Finds the knot span index containing `u`.
///
/// `last` is the index of the last control point.
#[must_use]
pub fn find_span(last: usize, degree: usize, u: f64, knots: &[f64]) -> usize {
    if u >= knots[last + 1] {
        return last;
    }
    if u <= knots[degree] {
        return degree;
    }
    let mut low = degree;
    let mut high = last + 1;
    let mut mid = (low + high) / 2;
    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Evaluates the `degree + 1` non-zero basis functions at `u` in `span`.
#[must_use]
pub fn basis_functions(span: usize, u: f64, degree: usize, knots: &[f64]) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    n[0] = 1.0;
    for j in 1..=degree {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let temp = if denom.abs() < f64::EPSILON { 0.0 } else { n[r] / denom };
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }
    n
}

/// Evaluates a B-spline curve at parameter `u`.
///
/// # Errors
///
/// Returns `GeometryError::Degenerate` if the knot vector length does not
/// equal `poles.len() + degree + 1`.
pub fn evaluate(
    poles: &[Point2],
    knots: &[f64],
    degree: usize,
    u: f64,
) -> Result<Point2, GeometryError> {
    check_layout(poles, knots, degree)?;
    let last = poles.len() - 1;
    let span = find_span(last, degree, u, knots);
    let basis = basis_functions(span, u, degree, knots);
    let mut acc = nalgebra::Vector2::zeros();
    for (i, b) in basis.iter().enumerate() {
        acc += poles[span - degree + i].coords * *b;
    }
    Ok(Point2::from(acc))
}

/// Returns the valid parameter range `[knots[p], knots[len - p - 1]]`.
///
/// # Errors
///
/// Returns `GeometryError::Degenerate` for an inconsistent layout.
pub fn domain(poles: &[Point2], knots: &[f64], degree: usize) -> Result<(f64, f64), GeometryError> {
    check_layout(poles, knots, degree)?;
    Ok((knots[degree], knots[knots.len() - degree - 1]))
}

fn check_layout(poles: &[Point2], knots: &[f64], degree: usize) -> Result<(), GeometryError> {
    if poles.is_empty() || degree == 0 && poles.len() < 2 {
        return Err(GeometryError::Degenerate("b-spline has no poles".into()));
    }
    if knots.len() != poles.len() + degree + 1 {
        return Err(GeometryError::Degenerate(format!(
            "knot vector length {} does not match {} poles of degree {}",
            knots.len(),
            poles.len(),
            degree
        )));
    }
    Ok(())
}

/// Result of a global interpolation: poles plus the expanded knot vector.
#[derive(Debug, Clone)]
pub struct Interpolated {
    pub poles: Vec<Point2>,
    pub knots: Vec<f64>,
    pub degree: usize,
}

/// Global curve interpolation through `points`.
///
/// Uses chord-length parameters and knot averaging, then solves the
/// collocation system. The curve is clamped and non-periodic, so its first
/// and last poles coincide with the first and last points. The degree is
/// reduced to `points.len() - 1` when there are too few points.
///
/// # Errors
///
/// Returns `GeometryError::Degenerate` for fewer than two points or
/// repeated consecutive points, and `GeometryError::Singular` if the
/// collocation matrix cannot be solved.
pub fn interpolate(points: &[Point2], degree: usize) -> Result<Interpolated, GeometryError> {
    if points.len() < 2 {
        return Err(GeometryError::Degenerate(
            "interpolation needs at least 2 points".into(),
        ));
    }
    let last = points.len() - 1;
    let p = degree.clamp(1, last);

    // Chord-length parameters.
    let chords: Vec<f64> = points.windows(2).map(|w| (w[1] - w[0]).norm()).collect();
    let total: f64 = chords.iter().sum();
    if total < TOLERANCE || chords.iter().any(|c| *c < TOLERANCE) {
        return Err(GeometryError::Degenerate(
            "repeated interpolation points".into(),
        ));
    }
    let mut params = Vec::with_capacity(points.len());
    let mut acc = 0.0;
    params.push(0.0);
    for c in &chords {
        acc += c;
        params.push(acc / total);
    }
    params[last] = 1.0;

    // Averaged, clamped knot vector.
    let mut knots = vec![0.0; p + 1];
    for j in 1..=(last - p) {
        #[allow(clippy::cast_precision_loss)]
        let avg = params[j..j + p].iter().sum::<f64>() / p as f64;
        knots.push(avg);
    }
    knots.extend(std::iter::repeat(1.0).take(p + 1));

    let size = points.len();
    let mut n = DMatrix::<f64>::zeros(size, size);
    for (k, u) in params.iter().enumerate() {
        let span = find_span(last, p, *u, &knots);
        let basis = basis_functions(span, *u, p, &knots);
        for (i, b) in basis.iter().enumerate() {
            n[(k, span - p + i)] = *b;
        }
    }
    let mut rhs = DMatrix::<f64>::zeros(size, 2);
    for (k, q) in points.iter().enumerate() {
        rhs[(k, 0)] = q.x;
        rhs[(k, 1)] = q.y;
    }

    let sol = n
        .lu()
        .solve(&rhs)
        .ok_or(GeometryError::Singular("b-spline collocation matrix"))?;
    let poles = (0..size)
        .map(|i| Point2::new(sol[(i, 0)], sol[(i, 1)]))
        .collect();

    Ok(Interpolated {
        poles,
        knots,
        degree: p,
    })
}

/// Collapses an expanded knot vector to unique knots and multiplicities.
#[must_use]
pub fn compress_knots(expanded: &[f64]) -> (Vec<f64>, Vec<u32>) {
    let mut knots: Vec<f64> = Vec::new();
    let mut mults: Vec<u32> = Vec::new();
    for &k in expanded {
        match knots.last() {
            Some(&prev) if (k - prev).abs() < 1e-12 => {
                if let Some(m) = mults.last_mut() {
                    *m += 1;
                }
            }
            _ => {
                knots.push(k);
                mults.push(1);
            }
        }
    }
    (knots, mults)
}

/// Expands unique knots and multiplicities into a full knot vector.
#[must_use]
pub fn expand_knots(knots: &[f64], mults: &[u32]) -> Vec<f64> {
    knots
        .iter()
        .zip(mults)
        .flat_map(|(k, m)| std::iter::repeat(*k).take(*m as usize))
        .collect()
}
