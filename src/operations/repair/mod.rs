//! One-shot repairs for defects found in a sketch.
//!
//! Each repair captures its own snapshot, computes its edits up front and
//! applies them inside a single named transaction.

pub mod coincident;
pub mod construction;
pub mod duplicates;
pub mod zero_length;

pub use coincident::{
    anchor_score, best_anchor, collect_vertices, find_non_coincident, CoincideVertices,
    CoincidenceNetwork, Proximity, SketchVertex, VertexGroup,
};
pub use construction::{MakeConstruction, Selection};
pub use duplicates::{find_duplicates, DeleteDuplicates, DuplicateGroup, DuplicateMember};
pub use zero_length::{find_zero_length, DeleteZeroLength, ZeroLengthLine};
