use crate::geometry::PointPos;

/// Index of a geometry in its sketch.
pub type GeoId = usize;

/// Reference to a point (or the edge) of one geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeoRef {
    pub geo: GeoId,
    pub pos: PointPos,
}

impl GeoRef {
    #[must_use]
    pub fn new(geo: GeoId, pos: PointPos) -> Self {
        Self { geo, pos }
    }

    #[must_use]
    pub fn edge(geo: GeoId) -> Self {
        Self::new(geo, PointPos::Edge)
    }

    #[must_use]
    pub fn start(geo: GeoId) -> Self {
        Self::new(geo, PointPos::Start)
    }

    #[must_use]
    pub fn end(geo: GeoId) -> Self {
        Self::new(geo, PointPos::End)
    }

    #[must_use]
    pub fn center(geo: GeoId) -> Self {
        Self::new(geo, PointPos::Center)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Coincident,
    InternalAlignment,
    PointOnObject,
    Block,
    Radius,
    Distance,
    Horizontal,
    Vertical,
    Other,
}

/// A sketch constraint between one or two references.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub first: GeoRef,
    pub second: Option<GeoRef>,
    pub value: Option<f64>,
}

impl Constraint {
    #[must_use]
    pub fn coincident(a: GeoRef, b: GeoRef) -> Self {
        Self {
            kind: ConstraintKind::Coincident,
            first: a,
            second: Some(b),
            value: None,
        }
    }

    /// Internal alignment of `dependent` (e.g. a B-spline endpoint) to
    /// `driver` (e.g. a construction circle center).
    #[must_use]
    pub fn internal_alignment(driver: GeoRef, dependent: GeoRef) -> Self {
        Self {
            kind: ConstraintKind::InternalAlignment,
            first: driver,
            second: Some(dependent),
            value: None,
        }
    }

    #[must_use]
    pub fn point_on_object(point: GeoRef, curve: GeoId) -> Self {
        Self {
            kind: ConstraintKind::PointOnObject,
            first: point,
            second: Some(GeoRef::edge(curve)),
            value: None,
        }
    }

    #[must_use]
    pub fn block(geo: GeoId) -> Self {
        Self {
            kind: ConstraintKind::Block,
            first: GeoRef::edge(geo),
            second: None,
            value: None,
        }
    }

    #[must_use]
    pub fn radius(geo: GeoId, radius: f64) -> Self {
        Self {
            kind: ConstraintKind::Radius,
            first: GeoRef::edge(geo),
            second: None,
            value: Some(radius),
        }
    }

    /// All references held by this constraint.
    pub fn refs(&self) -> impl Iterator<Item = GeoRef> + '_ {
        std::iter::once(self.first).chain(self.second)
    }

    /// Returns `true` if either reference names `geo`.
    #[must_use]
    pub fn involves(&self, geo: GeoId) -> bool {
        self.refs().any(|r| r.geo == geo)
    }

    /// Coincident and internal-alignment constraints carry connectivity.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self.kind,
            ConstraintKind::Coincident | ConstraintKind::InternalAlignment
        )
    }

    /// Returns `true` if this is a Coincident constraint joining `a` and `b`
    /// in either order.
    #[must_use]
    pub fn joins(&self, a: GeoRef, b: GeoRef) -> bool {
        self.kind == ConstraintKind::Coincident
            && (self.first == a && self.second == Some(b)
                || self.first == b && self.second == Some(a))
    }
}
