//! Shared types for wire topology diagnosis.
//!
//! Defines issue kinds, severities, subdivision confidence, per-phase
//! results and the [`AnalysisReport`] returned by the analyzer.

use std::collections::BTreeMap;
use std::fmt;

use crate::geometry::{geometry_name, CurveKind};
use crate::sketch::GeoId;

/// Category of a topology finding. Each category is one report section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IssueKind {
    Isolation,
    GeometricValidity,
    Bridge,
    Subdivision,
    TJunction,
}

impl IssueKind {
    pub const ALL: [Self; 5] = [
        Self::Isolation,
        Self::GeometricValidity,
        Self::Bridge,
        Self::Subdivision,
        Self::TJunction,
    ];

    /// Stable key naming the report section.
    #[must_use]
    pub fn section_key(self) -> &'static str {
        match self {
            Self::Isolation => "isolation",
            Self::GeometricValidity => "geometric_validity",
            Self::Bridge => "bridge",
            Self::Subdivision => "subdivision",
            Self::TJunction => "tjunction",
        }
    }

    /// Heading of the report section.
    #[must_use]
    pub fn section_title(self) -> &'static str {
        match self {
            Self::Isolation => "ISOLATION ISSUES",
            Self::GeometricValidity => "GEOMETRIC VALIDITY ISSUES",
            Self::Bridge => "BRIDGE/CONNECTION ISSUES",
            Self::Subdivision => "SUBDIVISION ISSUES",
            Self::TJunction => "INCOMPLETE CONNECTIONS",
        }
    }

    /// Looks up a section by its key.
    #[must_use]
    pub fn from_section(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.section_key() == key)
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section_key())
    }
}

/// How much a finding matters. Higher is more critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Cosmetic or incomplete connection.
    Low = 1,
    /// Likely wrong but may be intentional.
    Medium = 2,
    /// Breaks planar wire validity.
    High = 3,
}

impl Severity {
    #[must_use]
    pub fn level(self) -> u8 {
        self as u8
    }
}

/// Confidence that a subdivision edge is internal rather than boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confidence {
    Weak,
    Strong,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weak => f.write_str("WEAK"),
            Self::Strong => f.write_str("STRONG"),
        }
    }
}

/// One finding against one geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyIssue {
    pub geo: GeoId,
    /// Kind of the offending curve, used for its display name.
    pub curve: CurveKind,
    pub kind: IssueKind,
    pub description: String,
    pub severity: Severity,
    /// Only set for subdivision findings.
    pub confidence: Option<Confidence>,
}

impl TopologyIssue {
    #[must_use]
    pub fn new(
        geo: GeoId,
        curve: CurveKind,
        kind: IssueKind,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            geo,
            curve,
            kind,
            description: description.into(),
            severity,
            confidence: None,
        }
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Display name of the geometry, such as `"3-Line"`.
    #[must_use]
    pub fn name(&self) -> String {
        geometry_name(self.geo, self.curve)
    }
}

impl fmt::Display for TopologyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.severity.level(),
            self.name(),
            self.description
        )
    }
}

/// Stage of the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Resolution,
    Isolation,
    GeometricValidity,
    Bridge,
    Subdivision,
    TJunction,
}

impl Phase {
    /// Phase number as shown to users.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Resolution => "1",
            Self::Isolation => "2",
            Self::GeometricValidity => "2.5",
            Self::Bridge => "3",
            Self::Subdivision => "4",
            Self::TJunction => "5",
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Resolution => "Constraint Resolution",
            Self::Isolation => "Isolation Detection",
            Self::GeometricValidity => "Geometric Validity Check",
            Self::Bridge => "Bridge Detection",
            Self::Subdivision => "Subdivision Detection",
            Self::TJunction => "T-junction Cleanup",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Phase {}: {}", self.label(), self.name())
    }
}

/// Outcome of one phase.
#[derive(Debug, Clone)]
pub struct PhaseResult {
    pub phase: Phase,
    pub issues: Vec<TopologyIssue>,
    pub success: bool,
    /// Error message when the phase failed.
    pub error: Option<String>,
}

impl PhaseResult {
    #[must_use]
    pub fn completed(phase: Phase, issues: Vec<TopologyIssue>) -> Self {
        Self {
            phase,
            issues,
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(phase: Phase, error: impl fmt::Display) -> Self {
        Self {
            phase,
            issues: Vec::new(),
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Loop and component counts gathered during analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub loops: usize,
    /// Set when enumeration hit a cap and loops may be missing.
    pub truncated: bool,
    /// Connected components with more than one vertex.
    pub components: usize,
}

/// Result of a full analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    /// Phase results in execution order.
    pub phases: Vec<PhaseResult>,
    pub loop_stats: LoopStats,
    pub normal_geometry: usize,
    pub construction_geometry: usize,
}

impl AnalysisReport {
    /// Every issue, in phase order.
    pub fn issues(&self) -> impl Iterator<Item = &TopologyIssue> {
        self.phases.iter().flat_map(|p| p.issues.iter())
    }

    /// Issues grouped by kind. Kinds without issues are absent.
    #[must_use]
    pub fn issues_by_kind(&self) -> BTreeMap<IssueKind, Vec<&TopologyIssue>> {
        let mut map: BTreeMap<IssueKind, Vec<&TopologyIssue>> = BTreeMap::new();
        for issue in self.issues() {
            map.entry(issue.kind).or_default().push(issue);
        }
        map
    }

    #[must_use]
    pub fn issues_of(&self, kind: IssueKind) -> Vec<&TopologyIssue> {
        self.issues().filter(|i| i.kind == kind).collect()
    }

    #[must_use]
    pub fn phase(&self, phase: Phase) -> Option<&PhaseResult> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// Returns `true` if every phase succeeded and nothing was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.phases.iter().all(|p| p.success && p.issues.is_empty())
    }

    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.phases.iter().map(|p| p.issues.len()).sum()
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Geometry: {} normal, {} construction",
            self.normal_geometry, self.construction_geometry
        )?;
        write!(
            f,
            "Loops: {} in {} components",
            self.loop_stats.loops, self.loop_stats.components
        )?;
        if self.loop_stats.truncated {
            write!(f, " (search truncated)")?;
        }
        writeln!(f)?;
        for phase in &self.phases {
            match &phase.error {
                Some(err) => writeln!(f, "{}: failed: {err}", phase.phase)?,
                None => writeln!(f, "{}: {} issues", phase.phase, phase.issues.len())?,
            }
        }
        for (kind, issues) in self.issues_by_kind() {
            writeln!(f, "{} ({})", kind.section_title(), issues.len())?;
            for issue in issues {
                writeln!(f, "  {issue}")?;
            }
        }
        Ok(())
    }
}
