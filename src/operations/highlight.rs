//! Ephemeral markers over sketch geometry.

use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::sketch::{GeoId, HighlightSink};

slotmap::new_key_type! {
    /// Handle to a marker owned by a [`HighlightSession`].
    pub struct MarkerId;
}

#[derive(Debug, Clone, Copy)]
struct Marker {
    geo: GeoId,
    handle: u64,
}

/// Owns every marker it places on its sink.
///
/// Placing a new highlight removes the previous one first, and dropping the
/// session removes whatever is left, so markers never outlive the session.
pub struct HighlightSession<S: HighlightSink> {
    sink: S,
    markers: SlotMap<MarkerId, Marker>,
}

impl<S: HighlightSink> HighlightSession<S> {
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            markers: SlotMap::with_key(),
        }
    }

    /// Replaces the current highlight with markers over `geos`.
    ///
    /// # Errors
    ///
    /// Returns an error if an old marker cannot be removed or a new one
    /// cannot be placed. Markers placed before the failure stay tracked.
    pub fn highlight(&mut self, geos: &[GeoId]) -> Result<Vec<MarkerId>> {
        self.clear()?;
        let mut ids = Vec::with_capacity(geos.len());
        for &geo in geos {
            let handle = self.sink.add_marker(geo)?;
            ids.push(self.markers.insert(Marker { geo, handle }));
        }
        debug!(markers = ids.len(), "highlight placed");
        Ok(ids)
    }

    /// Removes every marker. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first removal error. Every marker is forgotten either way.
    pub fn clear(&mut self) -> Result<()> {
        let mut first_err = None;
        for (_, marker) in self.markers.drain() {
            if let Err(err) = self.sink.remove_marker(marker.handle) {
                warn!(geo = marker.geo, error = %err, "marker removal failed");
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Geometry under a marker, if it is still placed.
    #[must_use]
    pub fn geo(&self, id: MarkerId) -> Option<GeoId> {
        self.markers.get(id).map(|m| m.geo)
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: HighlightSink> Drop for HighlightSession<S> {
    fn drop(&mut self) {
        // Errors are already logged by `clear`.
        let _ = self.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::sketch::Sketch;

    fn sketch() -> Sketch {
        let mut s = Sketch::new();
        for i in 0..3 {
            let x = f64::from(i);
            s.push_line(Point2::new(x, 0.0), Point2::new(x + 1.0, 0.0), false);
        }
        s
    }

    #[test]
    fn new_highlight_replaces_old() {
        let mut s = sketch();
        let mut session = HighlightSession::new(&mut s);
        let first = session.highlight(&[0, 1]).unwrap();
        assert_eq!(session.sink().marker_count(), 2);
        let second = session.highlight(&[2]).unwrap();
        assert_eq!(session.len(), 1);
        assert_eq!(session.sink().marker_count(), 1);
        assert_eq!(session.geo(first[0]), None);
        assert_eq!(session.geo(second[0]), Some(2));
    }

    #[test]
    fn clear_is_idempotent() {
        let mut s = sketch();
        let mut session = HighlightSession::new(&mut s);
        session.highlight(&[0, 1, 2]).unwrap();
        session.clear().unwrap();
        session.clear().unwrap();
        assert!(session.is_empty());
        assert_eq!(session.sink().marker_count(), 0);
    }

    #[test]
    fn drop_removes_markers() {
        let mut s = sketch();
        {
            let mut session = HighlightSession::new(&mut s);
            session.highlight(&[1]).unwrap();
        }
        assert_eq!(s.marker_count(), 0);
    }

    #[test]
    fn failed_placement_keeps_earlier_markers_tracked() {
        let mut s = sketch();
        {
            let mut session = HighlightSession::new(&mut s);
            assert!(session.highlight(&[0, 7]).is_err());
            assert_eq!(session.len(), 1);
        }
        assert_eq!(s.marker_count(), 0);
    }
}
