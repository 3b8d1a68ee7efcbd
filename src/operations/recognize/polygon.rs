use tracing::{debug, warn};

use super::ProfileGraph;
use crate::math::circle_fit::fit_circle;
use crate::math::Point2;
use crate::topology::Loop;

/// Spread of edge lengths around a closed polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub range: f64,
}

impl LengthStats {
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn of(lengths: &[f64]) -> Option<Self> {
        let first = *lengths.first()?;
        let (min, max) = lengths
            .iter()
            .fold((first, first), |(lo, hi), &l| (lo.min(l), hi.max(l)));
        #[allow(clippy::cast_precision_loss)]
        let avg = lengths.iter().sum::<f64>() / lengths.len() as f64;
        Some(Self {
            min,
            max,
            avg,
            range: max - min,
        })
    }
}

/// A closed polygon with its length statistics and, when equilateral, the
/// fitted circumcircle.
#[derive(Debug, Clone)]
pub struct PolygonClass {
    pub polygon: Loop,
    pub stats: LengthStats,
    pub equilateral: bool,
    /// `(center, radius)` of the least-squares circle through the vertices.
    pub circle: Option<(Point2, f64)>,
}

/// Classifies each polygon as equilateral or not and fits a circle through
/// the equilateral ones.
///
/// A polygon is equilateral when `max - min` of its edge lengths is at most
/// `tolerance`. An equilateral polygon whose vertices do not determine a
/// circle keeps `circle = None`.
#[must_use]
pub fn classify_polygons(pg: &ProfileGraph, polygons: &[Loop], tolerance: f64) -> Vec<PolygonClass> {
    polygons
        .iter()
        .filter_map(|polygon| {
            let lengths: Vec<f64> = polygon.edges.iter().map(|&e| pg.length(e)).collect();
            let stats = LengthStats::of(&lengths)?;
            let equilateral = stats.range <= tolerance;
            let circle = if equilateral {
                let points: Vec<Point2> = polygon
                    .vertices
                    .iter()
                    .map(|&v| pg.graph.position(v))
                    .collect();
                let fit = fit_circle(&points);
                if fit.is_none() {
                    warn!(edges = polygon.len(), "equilateral polygon has no circle fit");
                }
                fit
            } else {
                None
            };
            debug!(
                edges = polygon.len(),
                min = stats.min,
                max = stats.max,
                equilateral,
                "polygon classified"
            );
            Some(PolygonClass {
                polygon: polygon.clone(),
                stats,
                equilateral,
                circle,
            })
        })
        .collect()
}
