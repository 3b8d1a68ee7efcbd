use tracing::{debug, warn};

use super::constraint::{Constraint, GeoId, GeoRef};
use super::host::GeometrySource;
use crate::error::Result;
use crate::geometry::matching::MatchMode;
use crate::geometry::Curve;
use crate::math::Point2;

/// One geometry as read at capture time.
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    pub id: GeoId,
    pub curve: Curve,
    pub construction: bool,
}

/// Immutable copy of a sketch's geometry and constraints.
///
/// Captured fresh at the start of every run and never reused after the host
/// is edited. Geometry that cannot be read is skipped and counted.
#[derive(Debug, Clone)]
pub struct SketchSnapshot {
    entries: Vec<Option<SnapshotEntry>>,
    constraints: Vec<Constraint>,
    skipped: usize,
}

impl SketchSnapshot {
    /// Reads every geometry and the constraint list from `source`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the constraint list cannot be read.
    /// Unreadable geometry is logged and skipped.
    pub fn capture<S: GeometrySource + ?Sized>(source: &S) -> Result<Self> {
        let count = source.geometry_count();
        let mut entries = Vec::with_capacity(count);
        let mut skipped = 0;
        for id in 0..count {
            let read = source
                .geometry(id)
                .and_then(|curve| Ok((curve, source.is_construction(id)?)));
            match read {
                Ok((curve, construction)) => entries.push(Some(SnapshotEntry {
                    id,
                    curve,
                    construction,
                })),
                Err(err) => {
                    warn!(geo = id, error = %err, "skipping unreadable geometry");
                    skipped += 1;
                    entries.push(None);
                }
            }
        }
        let constraints = source.constraints()?;
        debug!(
            geometry = count,
            constraints = constraints.len(),
            skipped,
            "sketch snapshot captured"
        );
        Ok(Self {
            entries,
            constraints,
            skipped,
        })
    }

    /// Total geometry slots, readable or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of geometries that could not be read.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    #[must_use]
    pub fn entry(&self, id: GeoId) -> Option<&SnapshotEntry> {
        self.entries.get(id).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn curve(&self, id: GeoId) -> Option<&Curve> {
        self.entry(id).map(|e| &e.curve)
    }

    #[must_use]
    pub fn is_construction(&self, id: GeoId) -> bool {
        self.entry(id).is_some_and(|e| e.construction)
    }

    /// Every readable geometry in index order.
    pub fn entries(&self) -> impl Iterator<Item = &SnapshotEntry> {
        self.entries.iter().flatten()
    }

    /// Readable non-construction geometry in index order.
    pub fn normal(&self) -> impl Iterator<Item = &SnapshotEntry> {
        self.entries().filter(|e| !e.construction)
    }

    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Coordinates of a referenced point, if it exists and can be evaluated.
    #[must_use]
    pub fn point(&self, r: GeoRef) -> Option<Point2> {
        let curve = self.curve(r.geo)?;
        match curve.point(r.pos) {
            Ok(p) => p,
            Err(err) => {
                debug!(geo = r.geo, error = %err, "point evaluation failed");
                None
            }
        }
    }

    /// Geometry matching `target` under `mode`.
    ///
    /// A curve the predicate cannot evaluate counts as no match.
    #[must_use]
    pub fn matching(&self, target: &Curve, mode: MatchMode, tol: f64) -> Vec<GeoId> {
        self.entries()
            .filter(|entry| match mode.test(target, &entry.curve, tol) {
                Ok(found) => found,
                Err(e) => {
                    debug!(geo = entry.id, error = %e, "match test failed");
                    false
                }
            })
            .map(|entry| entry.id)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::sketch::memory::Sketch;
    use crate::sketch::GeometrySink;

    struct Flaky(Sketch);

    impl GeometrySource for Flaky {
        fn geometry_count(&self) -> usize {
            self.0.geometry_count()
        }
        fn geometry(&self, id: GeoId) -> Result<Curve> {
            if id == 1 {
                return Err(HostError::Failed("unreadable".into()).into());
            }
            self.0.geometry(id)
        }
        fn is_construction(&self, id: GeoId) -> Result<bool> {
            self.0.is_construction(id)
        }
        fn constraints(&self) -> Result<Vec<Constraint>> {
            self.0.constraints()
        }
    }

    #[test]
    fn unreadable_geometry_is_skipped() {
        let mut s = Sketch::new();
        for i in 0..3 {
            let x = f64::from(i);
            s.add_line_segment(Point2::new(x, 0.0), Point2::new(x + 1.0, 0.0))
                .unwrap();
        }
        let snap = SketchSnapshot::capture(&Flaky(s)).unwrap();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.skipped(), 1);
        assert!(snap.curve(1).is_none());
        assert_eq!(snap.entries().count(), 2);
    }

    #[test]
    fn point_lookup() {
        let mut s = Sketch::new();
        s.push_line(Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), true);
        let snap = SketchSnapshot::capture(&s).unwrap();
        assert_eq!(snap.point(GeoRef::end(0)), Some(Point2::new(2.0, 0.0)));
        assert!(snap.point(GeoRef::center(0)).is_none());
        assert!(snap.is_construction(0));
        assert_eq!(snap.normal().count(), 0);
    }

    #[test]
    fn matching_lookup() {
        let mut s = Sketch::new();
        s.push_line(Point2::new(0.0, 0.0), Point2::new(4.0, 0.0), false);
        s.push_line(Point2::new(4.0, 0.0), Point2::new(0.0, 0.0), false);
        s.push_line(Point2::new(2.0, 0.0), Point2::new(6.0, 0.0), false);
        s.push_line(Point2::new(0.0, 1.0), Point2::new(4.0, 1.0), false);
        let snap = SketchSnapshot::capture(&s).unwrap();
        let target = snap.curve(0).unwrap().clone();
        assert_eq!(snap.matching(&target, MatchMode::Exact, 1e-6), vec![0, 1]);
        assert_eq!(snap.matching(&target, MatchMode::Similar, 1e-6), vec![0, 1, 2]);
    }
}
