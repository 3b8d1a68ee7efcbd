pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod sketch;
pub mod topology;

pub use error::{Result, SketchwireError};
