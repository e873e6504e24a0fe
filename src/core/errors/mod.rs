//! Error handling for the hymnal conversion pipeline.

mod types;

pub use types::{HymnError, ProcessingStage};

/// A type alias for results produced by the pipeline.
pub type HymnResult<T> = Result<T, HymnError>;
