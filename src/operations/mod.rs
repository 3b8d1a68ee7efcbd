pub mod diagnose;
pub mod highlight;
pub mod recognize;
pub mod repair;
pub mod reprofile;

pub use diagnose::{run_analysis, AnalysisReport, DiagnoseConfig, WireTopologyAnalyzer};
pub use highlight::{HighlightSession, MarkerId};
pub use reprofile::{ReProfile, ReProfileConfig, ReProfileSummary};
