pub mod constraint;
pub mod host;
pub mod intersect;
pub mod memory;
pub mod snapshot;

pub use constraint::{Constraint, ConstraintKind, GeoId, GeoRef};
pub use host::{
    with_transaction, CurveIntersector, GeometrySink, GeometrySource, HighlightSink, SketchHost,
    TransactionControl,
};
pub use intersect::KernelIntersector;
pub use memory::Sketch;
pub use snapshot::{SketchSnapshot, SnapshotEntry};
