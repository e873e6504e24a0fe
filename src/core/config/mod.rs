//! Configuration for the hymnal pipeline.
//!
//! This module provides the configuration value objects, the validation
//! trait they share, and YAML loading for the top-level configuration.

pub mod errors;
pub mod parallel;
pub mod pipeline;
pub mod repetition;
pub mod zones;

pub use errors::{ConfigError, ConfigValidator};
pub use parallel::ParallelPolicy;
pub use pipeline::PipelineConfig;
pub use repetition::RepetitionConfig;
pub use zones::ZoneConfig;
