use thiserror::Error;

use crate::capability::Capability;

/// Errors returned by the Mapper pipeline and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// Input slice is empty.
    #[error("empty input")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Points in a dataset have inconsistent dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// Lens and dataset disagree on the number of rows.
    #[error("row count mismatch: lens has {lens} rows, data has {data}")]
    RowMismatch {
        /// Rows in the lens.
        lens: usize,
        /// Rows in the dataset.
        data: usize,
    },

    /// A required argument was neither passed nor available from a previous fit.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// The operation needs a capability this build was compiled without.
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(Capability),

    /// Graph serialization failed.
    #[cfg(feature = "serde")]
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
