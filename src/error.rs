use thiserror::Error;

/// Top-level error type for sketch wire analysis.
#[derive(Debug, Error)]
pub enum SketchwireError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("singular system: {0}")]
    Singular(&'static str),
}

/// Errors related to graph and loop construction.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("edge {0} not found")]
    EdgeNotFound(usize),
}

/// Errors related to reconstruction, diagnosis and repair operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("operation failed: {0}")]
    Failed(String),

    #[error("constraint resolution failed: {0}")]
    ResolutionFailed(String),

    #[error("unknown report section: {0}")]
    UnknownSection(String),
}

/// Errors reported by the host sketch object model.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("geometry {0} does not exist")]
    NoSuchGeometry(usize),

    #[error("geometry {geo} has no point at position {pos}")]
    NoSuchPoint { geo: usize, pos: u8 },

    #[error("constraint rejected: {0}")]
    ConstraintRejected(String),

    #[error("no open transaction")]
    NoTransaction,

    #[error("transaction '{0}' already open")]
    TransactionOpen(String),

    #[error("host failure: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`SketchwireError`].
pub type Result<T> = std::result::Result<T, SketchwireError>;
