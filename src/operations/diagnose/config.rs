//! Configuration for wire topology diagnosis and repair.

use crate::geometry::matching::MATCH_TOLERANCE;

/// Tolerances and caps used by the analyzer and the repair actions.
#[derive(Debug, Clone)]
pub struct DiagnoseConfig {
    /// Decimal digits kept when endpoints are used as coordinate keys.
    pub coordinate_precision: u32,
    /// Per-axis distance within which an intersection counts as being at an
    /// endpoint.
    pub endpoint_tolerance: f64,
    /// Distance within which an endpoint snaps to a constrained point when
    /// the loop graph is built.
    pub snap_tolerance: f64,
    /// Distinct loops after which enumeration stops.
    pub max_loops: usize,
    /// Longest loop enumerated, in edges. `None` means the number of normal
    /// geometries.
    pub max_path_length: Option<usize>,
    /// Vertex cap of the bounded loop count used for edge-removal tests.
    pub removal_path_cap: usize,
    /// Lines shorter than this are zero-length.
    pub zero_length_tolerance: f64,
    /// Vertices closer than this are near-coincident.
    pub near_coincident: f64,
    /// Vertices closer than this are loosely coincident.
    pub loose_coincident: f64,
    /// Endpoint tolerance for duplicate geometry.
    pub duplicate_tolerance: f64,
    /// Tolerance of the geometry matching predicates.
    pub match_tolerance: f64,
}

impl Default for DiagnoseConfig {
    fn default() -> Self {
        Self {
            coordinate_precision: 8,
            endpoint_tolerance: 1e-3,
            snap_tolerance: 1e-3,
            max_loops: 1000,
            max_path_length: None,
            removal_path_cap: 8,
            zero_length_tolerance: 1e-6,
            near_coincident: 5e-6,
            loose_coincident: 100e-6,
            duplicate_tolerance: 100e-6,
            match_tolerance: MATCH_TOLERANCE,
        }
    }
}

impl DiagnoseConfig {
    /// Smaller loop budget for large or dense sketches.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            max_loops: 200,
            ..Self::default()
        }
    }

    /// Larger loop budget and a deeper edge-removal search.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_loops: 10_000,
            removal_path_cap: 12,
            ..Self::default()
        }
    }

    /// Distance at which two endpoints share a coordinate key.
    #[must_use]
    pub fn vertex_tolerance(&self) -> f64 {
        10f64.powi(-i32::try_from(self.coordinate_precision).unwrap_or(i32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_differ_only_in_budget() {
        let quick = DiagnoseConfig::quick();
        let strict = DiagnoseConfig::strict();
        assert_eq!(quick.max_loops, 200);
        assert!(strict.max_loops > DiagnoseConfig::default().max_loops);
        assert!((quick.snap_tolerance - strict.snap_tolerance).abs() < f64::EPSILON);
    }

    #[test]
    fn vertex_tolerance_follows_precision() {
        let cfg = DiagnoseConfig::default();
        assert!((cfg.vertex_tolerance() - 1e-8).abs() < 1e-20);
    }
}
