use std::collections::BTreeMap;

use tracing::debug;

use super::constraint::{Constraint, ConstraintKind, GeoId, GeoRef};
use super::host::{GeometrySink, GeometrySource, HighlightSink, TransactionControl};
use crate::error::{HostError, Result};
use crate::geometry::{Arc, BSpline, Circle, Curve, Line, PointPos};
use crate::math::Point2;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    curve: Curve,
    construction: bool,
}

#[derive(Debug, Clone)]
struct Transaction {
    name: String,
    saved_geometry: Vec<Entry>,
    saved_constraints: Vec<Constraint>,
}

/// In-memory sketch implementing every host trait.
///
/// Transactions snapshot the geometry and constraint lists when opened and
/// restore them on abort.
#[derive(Debug, Clone, Default)]
pub struct Sketch {
    geometry: Vec<Entry>,
    constraints: Vec<Constraint>,
    transaction: Option<Transaction>,
    markers: BTreeMap<u64, GeoId>,
    next_marker: u64,
    recomputes: usize,
}

impl Sketch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a curve directly, outside any transaction.
    pub fn push(&mut self, curve: Curve, construction: bool) -> GeoId {
        self.geometry.push(Entry {
            curve,
            construction,
        });
        self.geometry.len() - 1
    }

    /// Appends a line segment directly.
    pub fn push_line(&mut self, start: Point2, end: Point2, construction: bool) -> GeoId {
        self.push(Curve::Line(Line::new(start, end)), construction)
    }

    /// Appends a closed polyline through `points` as construction lines and
    /// returns the new ids in order.
    pub fn push_polygon(&mut self, points: &[Point2]) -> Vec<GeoId> {
        let n = points.len();
        (0..n)
            .map(|i| self.push_line(points[i], points[(i + 1) % n], true))
            .collect()
    }

    #[must_use]
    pub fn curve(&self, id: GeoId) -> Option<&Curve> {
        self.geometry.get(id).map(|e| &e.curve)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }

    #[must_use]
    pub fn constraint_list(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Name of the open transaction, if any.
    #[must_use]
    pub fn transaction_name(&self) -> Option<&str> {
        self.transaction.as_ref().map(|t| t.name.as_str())
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn recompute_count(&self) -> usize {
        self.recomputes
    }

    fn entry_mut(&mut self, id: GeoId) -> Result<&mut Entry> {
        self.geometry
            .get_mut(id)
            .ok_or_else(|| HostError::NoSuchGeometry(id).into())
    }

    fn check_ref(&self, r: GeoRef) -> Result<()> {
        let entry = self
            .geometry
            .get(r.geo)
            .ok_or(HostError::NoSuchGeometry(r.geo))?;
        if r.pos == PointPos::Edge {
            return Ok(());
        }
        match entry.curve.point(r.pos)? {
            Some(_) => Ok(()),
            None => Err(HostError::NoSuchPoint {
                geo: r.geo,
                pos: r.pos.code(),
            }
            .into()),
        }
    }
}

impl GeometrySource for Sketch {
    fn geometry_count(&self) -> usize {
        self.geometry.len()
    }

    fn geometry(&self, id: GeoId) -> Result<Curve> {
        self.geometry
            .get(id)
            .map(|e| e.curve.clone())
            .ok_or_else(|| HostError::NoSuchGeometry(id).into())
    }

    fn is_construction(&self, id: GeoId) -> Result<bool> {
        self.geometry
            .get(id)
            .map(|e| e.construction)
            .ok_or_else(|| HostError::NoSuchGeometry(id).into())
    }

    fn constraints(&self) -> Result<Vec<Constraint>> {
        Ok(self.constraints.clone())
    }
}

impl GeometrySink for Sketch {
    fn add_line_segment(&mut self, start: Point2, end: Point2) -> Result<GeoId> {
        Ok(self.push_line(start, end, false))
    }

    fn add_circle(&mut self, center: Point2, radius: f64) -> Result<GeoId> {
        let circle = Circle::new(center, radius)?;
        Ok(self.push(Curve::Circle(circle), false))
    }

    fn add_arc(&mut self, start: Point2, mid: Point2, end: Point2) -> Result<GeoId> {
        let arc = Arc::through_three_points(&start, &mid, &end)?;
        Ok(self.push(Curve::Arc(arc), false))
    }

    fn add_bspline(
        &mut self,
        poles: Vec<Point2>,
        knots: Vec<f64>,
        mults: Vec<u32>,
        degree: usize,
        periodic: bool,
    ) -> Result<GeoId> {
        let spline = BSpline::new(poles, knots, mults, degree, periodic)?;
        Ok(self.push(Curve::BSpline(spline), false))
    }

    fn add_constraint(&mut self, constraint: Constraint) -> Result<usize> {
        self.check_ref(constraint.first)?;
        if let Some(second) = constraint.second {
            self.check_ref(second)?;
            if constraint.kind == ConstraintKind::Coincident && second == constraint.first {
                return Err(HostError::ConstraintRejected(
                    "coincident constraint on a single point".into(),
                )
                .into());
            }
        }
        self.constraints.push(constraint);
        Ok(self.constraints.len() - 1)
    }

    fn set_construction(&mut self, id: GeoId, construction: bool) -> Result<()> {
        self.entry_mut(id)?.construction = construction;
        Ok(())
    }

    fn toggle_construction(&mut self, id: GeoId) -> Result<()> {
        let entry = self.entry_mut(id)?;
        entry.construction = !entry.construction;
        Ok(())
    }

    fn delete_geometry(&mut self, ids: &[GeoId]) -> Result<()> {
        let mut doomed: Vec<GeoId> = ids.to_vec();
        doomed.sort_unstable();
        doomed.dedup();
        if let Some(&bad) = doomed.iter().find(|id| **id >= self.geometry.len()) {
            return Err(HostError::NoSuchGeometry(bad).into());
        }

        // Step 1: drop constraints touching deleted geometry.
        self.constraints
            .retain(|c| !c.refs().any(|r| doomed.binary_search(&r.geo).is_ok()));

        // Step 2: renumber surviving references.
        let shift = |geo: GeoId| geo - doomed.partition_point(|d| *d < geo);
        for c in &mut self.constraints {
            c.first.geo = shift(c.first.geo);
            if let Some(second) = c.second.as_mut() {
                second.geo = shift(second.geo);
            }
        }

        // Step 3: remove the geometry, highest index first.
        for &id in doomed.iter().rev() {
            self.geometry.remove(id);
        }
        debug!(deleted = doomed.len(), remaining = self.geometry.len(), "geometry deleted");
        Ok(())
    }
}

impl TransactionControl for Sketch {
    fn open_transaction(&mut self, name: &str) -> Result<()> {
        if let Some(open) = &self.transaction {
            return Err(HostError::TransactionOpen(open.name.clone()).into());
        }
        self.transaction = Some(Transaction {
            name: name.to_string(),
            saved_geometry: self.geometry.clone(),
            saved_constraints: self.constraints.clone(),
        });
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<()> {
        self.transaction
            .take()
            .map(|_| ())
            .ok_or_else(|| HostError::NoTransaction.into())
    }

    fn abort_transaction(&mut self) -> Result<()> {
        let saved = self.transaction.take().ok_or(HostError::NoTransaction)?;
        self.geometry = saved.saved_geometry;
        self.constraints = saved.saved_constraints;
        Ok(())
    }

    fn recompute(&mut self) -> Result<()> {
        self.recomputes += 1;
        Ok(())
    }
}

impl HighlightSink for Sketch {
    fn add_marker(&mut self, geo: GeoId) -> Result<u64> {
        if geo >= self.geometry.len() {
            return Err(HostError::NoSuchGeometry(geo).into());
        }
        let handle = self.next_marker;
        self.next_marker += 1;
        self.markers.insert(handle, geo);
        Ok(handle)
    }

    fn remove_marker(&mut self, handle: u64) -> Result<()> {
        self.markers
            .remove(&handle)
            .map(|_| ())
            .ok_or_else(|| HostError::Failed(format!("unknown marker {handle}")).into())
    }
}
