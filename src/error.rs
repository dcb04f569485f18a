use std::path::PathBuf;

use thiserror::Error;

/// Error types for the streaming k-median engine
#[derive(Error, Debug)]
pub enum StreamError {
    /// A configuration parameter is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The dedicated worker pool could not be built
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),

    /// An I/O error occurred while reading the input stream
    #[error("error reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The input ended in the middle of a point record
    #[error("input stream ended in the middle of a point record")]
    TruncatedInput,

    /// The accumulated intermediate centers exceed the configured capacity
    #[error("center store full: need {needed} slots but capacity is {capacity}")]
    CenterOverflow { needed: usize, capacity: usize },
}
