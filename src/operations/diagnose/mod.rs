//! Wire topology diagnosis.
//!
//! [`WireTopologyAnalyzer`] runs a fixed sequence of phases over one sketch
//! snapshot:
//! - **1 Resolution**: constraint maps and connectivity graphs. Failure here
//!   aborts the run.
//! - **2 Isolation**: geometry connected to nothing.
//! - **2.5 Geometric validity**: real crossings between normal geometry.
//! - **3 Bridge**: edges outside every loop that join loop systems.
//! - **4 Subdivision**: junction edges that split a loop, graded by
//!   confidence.
//! - **5 T-junction**: endpoints with no vertex connection.
//!
//! Phases after the first record their own failure and let the rest run.

pub mod bridge;
pub mod config;
pub mod isolation;
pub mod resolve;
pub mod subdivision;
pub mod tjunction;
pub mod types;
pub mod validity;

pub use config::DiagnoseConfig;
pub use resolve::{resolve, ConstraintMaps, Resolution, Wire};
pub use types::{
    AnalysisReport, Confidence, IssueKind, LoopStats, Phase, PhaseResult, Severity,
    TopologyIssue,
};

use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::sketch::{CurveIntersector, GeometrySource, KernelIntersector, SketchSnapshot};
use crate::topology::{components, enumerate_loops};

/// Phased wire topology analyzer.
pub struct WireTopologyAnalyzer<I = KernelIntersector> {
    config: DiagnoseConfig,
    intersector: I,
}

impl WireTopologyAnalyzer<KernelIntersector> {
    /// Analyzer using the built-in bounded curve intersector.
    #[must_use]
    pub fn new(config: DiagnoseConfig) -> Self {
        Self::with_intersector(config, KernelIntersector)
    }
}

impl<I: CurveIntersector> WireTopologyAnalyzer<I> {
    #[must_use]
    pub fn with_intersector(config: DiagnoseConfig, intersector: I) -> Self {
        Self {
            config,
            intersector,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DiagnoseConfig {
        &self.config
    }

    /// Runs every phase against a fresh snapshot of `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sketch cannot be read or constraint
    /// resolution fails. Failures of later phases are recorded in their
    /// [`PhaseResult`] instead.
    #[instrument(skip(self, source))]
    pub fn analyze<S: GeometrySource + ?Sized>(&self, source: &S) -> Result<AnalysisReport> {
        let snapshot = SketchSnapshot::capture(source)?;
        let mut report = AnalysisReport {
            construction_geometry: snapshot.entries().filter(|e| e.construction).count(),
            normal_geometry: snapshot.normal().count(),
            ..AnalysisReport::default()
        };
        info!(
            normal = report.normal_geometry,
            construction = report.construction_geometry,
            "starting wire topology analysis"
        );

        // Phase 1: the only hard gate.
        let res = match resolve(&snapshot, &self.config) {
            Ok(res) => res,
            Err(err) => {
                warn!(error = %err, "constraint resolution failed, aborting analysis");
                return Err(err);
            }
        };
        report.phases.push(PhaseResult::completed(
            Phase::Resolution,
            isolation::unresolved_splines(&res),
        ));

        report.phases.push(run_phase(Phase::Isolation, || {
            Ok(isolation::find_orphans(&res))
        }));

        report.phases.push(run_phase(Phase::GeometricValidity, || {
            let pairs = validity::find_crossings(
                &snapshot,
                &res,
                &self.intersector,
                self.config.endpoint_tolerance,
            );
            Ok(validity::crossing_issues(&res, &pairs))
        }));

        let max_path = self.config.max_path_length.unwrap_or(res.normal.len());
        let loops = enumerate_loops(&res.loop_graph, self.config.max_loops, max_path);
        report.loop_stats = LoopStats {
            loops: loops.loops.len(),
            truncated: loops.truncated,
            components: components(&res.graph).len(),
        };
        info!(
            loops = report.loop_stats.loops,
            truncated = report.loop_stats.truncated,
            components = report.loop_stats.components,
            "loops enumerated"
        );

        report.phases.push(run_phase(Phase::Bridge, || {
            Ok(bridge::find_bridges(&res, &loops.loops))
        }));

        report.phases.push(run_phase(Phase::Subdivision, || {
            subdivision::find_subdivisions(&snapshot, &res, &loops.loops, &self.config)
        }));

        report.phases.push(run_phase(Phase::TJunction, || {
            Ok(tjunction::find_dangling(&snapshot, &res))
        }));

        info!(
            issues = report.issue_count(),
            failed_phases = report.phases.iter().filter(|p| !p.success).count(),
            "analysis complete"
        );
        Ok(report)
    }
}

fn run_phase<F>(phase: Phase, run: F) -> PhaseResult
where
    F: FnOnce() -> Result<Vec<TopologyIssue>>,
{
    match run() {
        Ok(issues) => {
            info!(phase = phase.label(), issues = issues.len(), "phase complete");
            PhaseResult::completed(phase, issues)
        }
        Err(err) => {
            warn!(phase = phase.label(), error = %err, "phase failed");
            PhaseResult::failed(phase, err)
        }
    }
}

/// Analyzes `source` with the built-in intersector.
///
/// # Errors
///
/// See [`WireTopologyAnalyzer::analyze`].
pub fn run_analysis<S: GeometrySource + ?Sized>(
    source: &S,
    config: &DiagnoseConfig,
) -> Result<AnalysisReport> {
    WireTopologyAnalyzer::new(config.clone()).analyze(source)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::OperationError;
    use crate::geometry::Curve;
    use crate::math::Point2;
    use crate::sketch::Sketch;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    /// Intersector that refuses every pair.
    struct Refusing;

    impl CurveIntersector for Refusing {
        fn intersect(&self, _a: &Curve, _b: &Curve) -> Result<Vec<Point2>> {
            Err(OperationError::Failed("no kernel".into()).into())
        }
    }

    #[test]
    fn closed_square_is_clean() {
        let mut s = Sketch::new();
        let c = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        for i in 0..4 {
            s.push_line(c[i], c[(i + 1) % 4], false);
        }
        let report = run_analysis(&s, &DiagnoseConfig::default()).unwrap();
        assert!(report.is_clean(), "{report}");
        assert_eq!(report.phases.len(), 6);
        assert_eq!(report.loop_stats.loops, 1);
        assert_eq!(report.loop_stats.components, 1);
        assert!(!report.loop_stats.truncated);
    }

    #[test]
    fn phases_run_in_order() {
        let s = Sketch::new();
        let report = run_analysis(&s, &DiagnoseConfig::default()).unwrap();
        let order: Vec<_> = report.phases.iter().map(|p| p.phase.label()).collect();
        assert_eq!(order, vec!["1", "2", "2.5", "3", "4", "5"]);
    }

    #[test]
    fn intersector_errors_skip_pairs_only() {
        let mut s = Sketch::new();
        s.push_line(p(0.0, 0.0), p(2.0, 2.0), false);
        s.push_line(p(0.0, 2.0), p(2.0, 0.0), false);
        let report = WireTopologyAnalyzer::with_intersector(DiagnoseConfig::default(), Refusing)
            .analyze(&s)
            .unwrap();
        let validity = report.phase(Phase::GeometricValidity).unwrap();
        assert!(validity.success);
        assert!(validity.issues.is_empty());
        // Both lines are still free at both ends.
        assert_eq!(report.issues_of(IssueKind::TJunction).len(), 2);
    }

    #[test]
    fn quick_preset_truncates_dense_grid() {
        // A 4x4 grid of unit cells has far more than ten simple cycles.
        let mut s = Sketch::new();
        for i in 0..=4 {
            for j in 0..4 {
                let (a, b) = (f64::from(i), f64::from(j));
                s.push_line(p(a, b), p(a, b + 1.0), false);
                s.push_line(p(b, a), p(b + 1.0, a), false);
            }
        }
        let cfg = DiagnoseConfig {
            max_loops: 10,
            ..DiagnoseConfig::quick()
        };
        let report = run_analysis(&s, &cfg).unwrap();
        assert!(report.loop_stats.truncated);
        assert_eq!(report.loop_stats.loops, 10);
        assert!(report.to_string().contains("search truncated"));
    }
}
