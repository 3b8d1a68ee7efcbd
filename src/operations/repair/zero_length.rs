use tracing::{info, instrument};

use crate::error::Result;
use crate::geometry::Curve;
use crate::operations::diagnose::DiagnoseConfig;
use crate::sketch::{with_transaction, GeoId, SketchHost, SketchSnapshot};

pub const TRANSACTION_NAME: &str = "Delete Zero-Length Lines";

/// A line segment whose endpoints (nearly) coincide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZeroLengthLine {
    pub geo: GeoId,
    pub length: f64,
    pub construction: bool,
}

/// Lines shorter than `tolerance`, construction geometry included.
#[must_use]
pub fn find_zero_length(snapshot: &SketchSnapshot, tolerance: f64) -> Vec<ZeroLengthLine> {
    snapshot
        .entries()
        .filter_map(|entry| match &entry.curve {
            Curve::Line(line) => {
                let length = (line.end() - line.start()).norm();
                (length < tolerance).then_some(ZeroLengthLine {
                    geo: entry.id,
                    length,
                    construction: entry.construction,
                })
            }
            _ => None,
        })
        .collect()
}

/// Deletes every zero-length line in one transaction.
#[derive(Debug, Clone, Copy)]
pub struct DeleteZeroLength {
    tolerance: f64,
}

impl Default for DeleteZeroLength {
    fn default() -> Self {
        Self::from_config(&DiagnoseConfig::default())
    }
}

impl DeleteZeroLength {
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    #[must_use]
    pub fn from_config(config: &DiagnoseConfig) -> Self {
        Self::new(config.zero_length_tolerance)
    }

    /// Returns the lines that were deleted. No transaction is opened when
    /// there is nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns an error if the sketch cannot be read or a deletion fails; the
    /// transaction is then rolled back.
    #[instrument(skip(self, host))]
    pub fn execute<H: SketchHost + ?Sized>(&self, host: &mut H) -> Result<Vec<ZeroLengthLine>> {
        let snapshot = SketchSnapshot::capture(host)?;
        let found = find_zero_length(&snapshot, self.tolerance);
        if found.is_empty() {
            return Ok(found);
        }
        let mut ids: Vec<GeoId> = found.iter().map(|z| z.geo).collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        with_transaction(host, TRANSACTION_NAME, |h| {
            for &id in &ids {
                h.delete_geometry(&[id])?;
            }
            Ok(())
        })?;
        info!(deleted = found.len(), "zero-length lines deleted");
        Ok(found)
    }
}
