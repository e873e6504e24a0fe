//! The core module of the hymnal pipeline.
//!
//! This module contains the fundamental pieces shared by every component:
//! - Configuration value objects and their validation
//! - Error handling
//! - Traits describing the external collaborators

pub mod config;
pub mod errors;
pub mod traits;

pub use config::{
    ConfigError, ConfigValidator, ParallelPolicy, PipelineConfig, RepetitionConfig, ZoneConfig,
};
pub use errors::{HymnError, HymnResult, ProcessingStage};
pub use traits::{PageRasterizer, TextRecognizer, ZoneDetector};
