use std::fmt;

use tracing::{info, instrument};

use crate::error::{OperationError, Result};
use crate::operations::diagnose::{AnalysisReport, Confidence, IssueKind};
use crate::sketch::{with_transaction, GeoId, SketchHost};

/// Which issues of a report section to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    /// Only issues graded [`Confidence::Strong`].
    Strong,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "All",
            Self::Strong => "Strong",
        })
    }
}

/// Turns the geometry behind one report section into construction geometry.
#[derive(Debug, Clone, Copy)]
pub struct MakeConstruction {
    section: IssueKind,
    selection: Selection,
}

impl MakeConstruction {
    #[must_use]
    pub fn new(section: IssueKind, selection: Selection) -> Self {
        Self { section, selection }
    }

    /// Looks the section up by its report key, e.g. `"subdivision"`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::UnknownSection`] for an unrecognized key.
    pub fn for_section(key: &str, selection: Selection) -> Result<Self> {
        let section = IssueKind::from_section(key)
            .ok_or_else(|| OperationError::UnknownSection(key.to_owned()))?;
        Ok(Self::new(section, selection))
    }

    #[must_use]
    pub fn transaction_name(&self) -> String {
        format!(
            "Convert {} {} to Construction",
            self.selection,
            self.section.section_title()
        )
    }

    /// Geometry selected from `report`, ascending and without repeats.
    #[must_use]
    pub fn targets(&self, report: &AnalysisReport) -> Vec<GeoId> {
        let mut ids: Vec<GeoId> = report
            .issues_of(self.section)
            .into_iter()
            .filter(|issue| {
                self.selection == Selection::All || issue.confidence == Some(Confidence::Strong)
            })
            .map(|issue| issue.geo)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Returns the geometry converted. Nothing is opened when the selection
    /// is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a target no longer exists; the transaction is
    /// then rolled back.
    #[instrument(skip(self, host, report), fields(section = %self.section))]
    pub fn execute<H: SketchHost + ?Sized>(
        &self,
        host: &mut H,
        report: &AnalysisReport,
    ) -> Result<Vec<GeoId>> {
        let targets = self.targets(report);
        if targets.is_empty() {
            return Ok(targets);
        }
        with_transaction(host, &self.transaction_name(), |h| {
            targets
                .iter()
                .try_for_each(|&id| h.set_construction(id, true))
        })?;
        info!(converted = targets.len(), "geometry converted to construction");
        Ok(targets)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SketchwireError;
    use crate::geometry::CurveKind;
    use crate::math::Point2;
    use crate::operations::diagnose::{Phase, PhaseResult, Severity, TopologyIssue};
    use crate::sketch::{GeometrySource, Sketch};

    fn report() -> AnalysisReport {
        let issue = |geo, confidence| {
            TopologyIssue::new(
                geo,
                CurveKind::Line,
                IssueKind::Subdivision,
                "split",
                Severity::Medium,
            )
            .with_confidence(confidence)
        };
        AnalysisReport {
            phases: vec![PhaseResult::completed(
                Phase::Subdivision,
                vec![
                    issue(2, Confidence::Strong),
                    issue(0, Confidence::Weak),
                    issue(2, Confidence::Strong),
                ],
            )],
            ..AnalysisReport::default()
        }
    }

    #[test]
    fn transaction_names() {
        let all = MakeConstruction::for_section("subdivision", Selection::All).unwrap();
        assert_eq!(all.transaction_name(), "Convert All SUBDIVISION ISSUES to Construction");
        let strong = MakeConstruction::new(IssueKind::Bridge, Selection::Strong);
        assert_eq!(
            strong.transaction_name(),
            "Convert Strong BRIDGE/CONNECTION ISSUES to Construction"
        );
    }

    #[test]
    fn unknown_section_is_rejected() {
        let err = MakeConstruction::for_section("overlaps", Selection::All).unwrap_err();
        assert!(matches!(
            err,
            SketchwireError::Operation(OperationError::UnknownSection(ref k)) if k == "overlaps"
        ));
    }

    #[test]
    fn strong_selection_filters() {
        let r = report();
        let all = MakeConstruction::new(IssueKind::Subdivision, Selection::All);
        assert_eq!(all.targets(&r), vec![0, 2]);
        let strong = MakeConstruction::new(IssueKind::Subdivision, Selection::Strong);
        assert_eq!(strong.targets(&r), vec![2]);
        let other = MakeConstruction::new(IssueKind::Isolation, Selection::All);
        assert!(other.targets(&r).is_empty());
    }

    #[test]
    fn execute_converts_in_one_transaction() {
        let mut s = Sketch::new();
        for i in 0..3 {
            let x = f64::from(i);
            s.push_line(Point2::new(x, 0.0), Point2::new(x + 1.0, 0.0), false);
        }
        let op = MakeConstruction::new(IssueKind::Subdivision, Selection::Strong);
        assert_eq!(op.execute(&mut s, &report()).unwrap(), vec![2]);
        assert!(s.is_construction(2).unwrap());
        assert!(!s.is_construction(0).unwrap());
        assert_eq!(s.recompute_count(), 1);
    }

    #[test]
    fn stale_target_rolls_back() {
        let mut s = Sketch::new();
        s.push_line(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), false);
        let op = MakeConstruction::new(IssueKind::Subdivision, Selection::All);
        assert!(op.execute(&mut s, &report()).is_err());
        assert!(!s.is_construction(0).unwrap());
        assert_eq!(s.transaction_name(), None);
    }
}
