//! Traits describing the host sketch object model.
//!
//! Analysis reads through [`GeometrySource`]; reconstruction and repair write
//! through [`GeometrySink`] inside a transaction driven by
//! [`TransactionControl`].

use tracing::warn;

use super::constraint::{Constraint, GeoId};
use crate::error::Result;
use crate::geometry::Curve;
use crate::math::Point2;

/// Read access to sketch geometry and constraints.
pub trait GeometrySource {
    fn geometry_count(&self) -> usize;

    /// Returns an owned copy of one geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry does not exist or cannot be read.
    fn geometry(&self, id: GeoId) -> Result<Curve>;

    /// # Errors
    ///
    /// Returns an error if the geometry does not exist.
    fn is_construction(&self, id: GeoId) -> Result<bool>;

    /// # Errors
    ///
    /// Returns an error if the constraint list cannot be read.
    fn constraints(&self) -> Result<Vec<Constraint>>;
}

/// Write access to sketch geometry and constraints.
pub trait GeometrySink {
    /// # Errors
    ///
    /// Returns an error if the host rejects the geometry.
    fn add_line_segment(&mut self, start: Point2, end: Point2) -> Result<GeoId>;

    /// # Errors
    ///
    /// Returns an error if the radius is not positive.
    fn add_circle(&mut self, center: Point2, radius: f64) -> Result<GeoId>;

    /// Adds the arc from `start` to `end` passing through `mid`.
    ///
    /// # Errors
    ///
    /// Returns an error if the three points are colinear.
    fn add_arc(&mut self, start: Point2, mid: Point2, end: Point2) -> Result<GeoId>;

    /// # Errors
    ///
    /// Returns an error for an inconsistent knot layout.
    fn add_bspline(
        &mut self,
        poles: Vec<Point2>,
        knots: Vec<f64>,
        mults: Vec<u32>,
        degree: usize,
        periodic: bool,
    ) -> Result<GeoId>;

    /// Adds a constraint and returns its index.
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects the constraint.
    fn add_constraint(&mut self, constraint: Constraint) -> Result<usize>;

    /// # Errors
    ///
    /// Returns an error if the geometry does not exist.
    fn set_construction(&mut self, id: GeoId, construction: bool) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the geometry does not exist.
    fn toggle_construction(&mut self, id: GeoId) -> Result<()>;

    /// Deletes geometry and every constraint that references it. Remaining
    /// geometry is renumbered.
    ///
    /// # Errors
    ///
    /// Returns an error if any id does not exist.
    fn delete_geometry(&mut self, ids: &[GeoId]) -> Result<()>;
}

/// Undo-able edit sessions.
pub trait TransactionControl {
    /// # Errors
    ///
    /// Returns an error if a transaction is already open.
    fn open_transaction(&mut self, name: &str) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if no transaction is open.
    fn commit_transaction(&mut self) -> Result<()>;

    /// Rolls back every change since the transaction opened.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is open.
    fn abort_transaction(&mut self) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the host fails to recompute.
    fn recompute(&mut self) -> Result<()>;
}

/// Bounded curve-curve intersection: only points lying on both curves
/// within their own parameter ranges are reported.
pub trait CurveIntersector {
    /// # Errors
    ///
    /// Returns an error if either curve cannot be evaluated.
    fn intersect(&self, a: &Curve, b: &Curve) -> Result<Vec<Point2>>;
}

/// Temporary visual markers for interactive diagnosis.
pub trait HighlightSink {
    /// Adds a marker over a geometry and returns the host's handle for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker cannot be created.
    fn add_marker(&mut self, geo: GeoId) -> Result<u64>;

    /// # Errors
    ///
    /// Returns an error if the handle is unknown to the host.
    fn remove_marker(&mut self, handle: u64) -> Result<()>;
}

/// A host that supports reading, writing and transactions.
pub trait SketchHost: GeometrySource + GeometrySink + TransactionControl {}

impl<T: GeometrySource + GeometrySink + TransactionControl> SketchHost for T {}

/// Runs `edit` inside a named transaction.
///
/// Commits and recomputes on success. On error the transaction is aborted
/// and the original error is returned, so the host is left unchanged.
///
/// # Errors
///
/// Returns the error from `edit`, or from opening or committing.
pub fn with_transaction<H, T, F>(host: &mut H, name: &str, edit: F) -> Result<T>
where
    H: TransactionControl + ?Sized,
    F: FnOnce(&mut H) -> Result<T>,
{
    host.open_transaction(name)?;
    match edit(host) {
        Ok(value) => {
            host.commit_transaction()?;
            host.recompute()?;
            Ok(value)
        }
        Err(err) => {
            warn!(transaction = name, error = %err, "aborting transaction");
            if let Err(abort_err) = host.abort_transaction() {
                warn!(transaction = name, error = %abort_err, "abort failed");
            }
            Err(err)
        }
    }
}

impl<T: HighlightSink + ?Sized> HighlightSink for &mut T {
    fn add_marker(&mut self, geo: GeoId) -> Result<u64> {
        (**self).add_marker(geo)
    }

    fn remove_marker(&mut self, handle: u64) -> Result<()> {
        (**self).remove_marker(handle)
    }
}
