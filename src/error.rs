//! Defines the crate errors.

use std::{io, path::PathBuf};

use thiserror::Error;

/// A specialized result type for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error type for acquisition, persistence and training.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading from or writing to an already opened stream failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A file on the storage could not be opened.
    #[error("{path} - failed to open file: {source}")]
    Open {
        /// The path that was opened.
        path: PathBuf,
        /// The underlying failure.
        source: io::Error,
    },

    /// A dataset or model file does not exist.
    #[error("{0} not found")]
    NotFound(PathBuf),

    /// The dataset holds more bands than the network is allowed to take as inputs.
    #[error("too many input neurons: {bands} bands, at most {max} allowed")]
    TooManyInputs {
        /// The band count read from the dataset header.
        bands: usize,
        /// The configured maximum.
        max: usize,
    },

    /// Every layer must have at least one neuron.
    #[error("invalid topology {inputs} {hidden} {outputs}")]
    InvalidTopology {
        /// Number of inputs.
        inputs: usize,
        /// Number of hidden neurons.
        hidden: usize,
        /// Number of outputs.
        outputs: usize,
    },

    /// A network was given data of a different width than its layers.
    #[error("network has {network} {what}, data has {data}")]
    ShapeMismatch {
        /// The layer that does not match, `"inputs"` or `"outputs"`.
        what: &'static str,
        /// Width of the network layer.
        network: usize,
        /// Width of the data rows.
        data: usize,
    },

    /// The band count does not fit the transform length.
    #[error("cannot split {samples} samples into {bands} bands")]
    InvalidBands {
        /// The transform length.
        samples: usize,
        /// The requested band count.
        bands: usize,
    },

    /// The transform length exponent is out of range.
    #[error("log2 of the transform length must be in 1..=16, got {0}")]
    InvalidLog2(u32),

    /// A stream ended before a complete record was read.
    #[error("unexpected end of stream while reading {what}")]
    UnexpectedEof {
        /// The item being read.
        what: &'static str,
    },

    /// A training driver operation was called out of order.
    #[error("operation requires phase {expected:?}, trainer is {found:?}")]
    InvalidPhase {
        /// The phase the operation needs.
        expected: crate::train::Phase,
        /// The phase the trainer is in.
        found: crate::train::Phase,
    },

    /// The split ratio leaves no rows to train on.
    #[error("training split of {rows} rows with ratio {ratio} is empty")]
    EmptySplit {
        /// Rows in the dataset.
        rows: usize,
        /// The configured ratio.
        ratio: f32,
    },

    /// A configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
