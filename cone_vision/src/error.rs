//! Error types for cone_vision.
//!
//! "Nothing found" is never an error in this crate: every stage signals it with
//! an empty collection or `None`. The variants below are reserved for inputs
//! that indicate a bug in a collaborator (a malformed frame, an invalid
//! configuration) or a broken worker pool.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    #[error("Frame has an empty dimension: {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },

    #[error("Frame buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Unsupported pixel layout: {0}")]
    UnsupportedLayout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

pub type Result<T> = std::result::Result<T, DetectionError>;
