use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::geometry::{geometry_name, Curve, CurveKind};
use crate::math::Point2;
use crate::operations::diagnose::DiagnoseConfig;
use crate::sketch::{with_transaction, GeoId, SketchHost, SketchSnapshot};

pub const TRANSACTION_NAME: &str = "Delete All Recommended Duplicates";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateMember {
    pub geo: GeoId,
    /// Constraints referencing this geometry.
    pub constraints: usize,
}

/// Geometry lying on top of each other.
///
/// Members are ordered by ascending constraint count; the first one is the
/// recommended keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub kind: CurveKind,
    pub members: Vec<DuplicateMember>,
}

impl DuplicateGroup {
    #[must_use]
    pub fn keep(&self) -> GeoId {
        self.members[0].geo
    }

    /// Members recommended for deletion.
    pub fn redundant(&self) -> impl Iterator<Item = GeoId> + '_ {
        self.members[1..].iter().map(|m| m.geo)
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.members
            .iter()
            .map(|m| geometry_name(m.geo, self.kind))
            .collect()
    }
}

fn same_ends(a: (Point2, Point2), b: (Point2, Point2), tol: f64) -> bool {
    let close = |p: Point2, q: Point2| (p - q).norm() <= tol;
    (close(a.0, b.0) && close(a.1, b.1)) || (close(a.0, b.1) && close(a.1, b.0))
}

/// Groups geometry of the same kind whose endpoints match forward or
/// reversed within `tolerance`.
///
/// Curves without endpoints (full circles, ellipses, periodic splines) are
/// never duplicates. Each geometry joins at most one group, the one seeded
/// by the lowest index it matches.
#[must_use]
pub fn find_duplicates(snapshot: &SketchSnapshot, tolerance: f64) -> Vec<DuplicateGroup> {
    let ends: Vec<(GeoId, CurveKind, (Point2, Point2))> = snapshot
        .entries()
        .filter_map(|entry| match entry.curve.endpoints() {
            Ok(Some(pair)) => Some((entry.id, entry.curve.kind(), pair)),
            Ok(None) => None,
            Err(err) => {
                debug!(geo = entry.id, error = %err, "no endpoints, skipped");
                None
            }
        })
        .collect();
    let count = |geo: GeoId| {
        snapshot
            .constraints()
            .iter()
            .filter(|c| c.involves(geo))
            .count()
    };

    let mut claimed = vec![false; ends.len()];
    let mut groups = Vec::new();
    for i in 0..ends.len() {
        if claimed[i] {
            continue;
        }
        let (geo, kind, pair) = ends[i];
        let mut members = vec![DuplicateMember {
            geo,
            constraints: count(geo),
        }];
        for j in i + 1..ends.len() {
            let (other, other_kind, other_pair) = ends[j];
            if !claimed[j] && other_kind == kind && same_ends(pair, other_pair, tolerance) {
                claimed[j] = true;
                members.push(DuplicateMember {
                    geo: other,
                    constraints: count(other),
                });
            }
        }
        if members.len() > 1 {
            members.sort_by_key(|m| m.constraints);
            groups.push(DuplicateGroup { kind, members });
        }
    }
    groups
}

/// Deletes every non-keep member of every duplicate group.
#[derive(Debug, Clone, Copy)]
pub struct DeleteDuplicates {
    tolerance: f64,
}

impl Default for DeleteDuplicates {
    fn default() -> Self {
        Self::from_config(&DiagnoseConfig::default())
    }
}

impl DeleteDuplicates {
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    #[must_use]
    pub fn from_config(config: &DiagnoseConfig) -> Self {
        Self::new(config.duplicate_tolerance)
    }

    /// Returns the number of geometries deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the sketch cannot be read or a deletion fails; the
    /// transaction is then rolled back.
    #[instrument(skip(self, host))]
    pub fn execute<H: SketchHost + ?Sized>(&self, host: &mut H) -> Result<usize> {
        let snapshot = SketchSnapshot::capture(host)?;
        let groups = find_duplicates(&snapshot, self.tolerance);
        let mut doomed: Vec<GeoId> = groups.iter().flat_map(DuplicateGroup::redundant).collect();
        if doomed.is_empty() {
            return Ok(0);
        }
        doomed.sort_unstable_by(|a, b| b.cmp(a));
        with_transaction(host, TRANSACTION_NAME, |h| {
            for &id in &doomed {
                h.delete_geometry(&[id])?;
            }
            Ok(())
        })?;
        info!(groups = groups.len(), deleted = doomed.len(), "duplicates deleted");
        Ok(doomed.len())
    }
}
