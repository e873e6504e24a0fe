//! Core error types for the hymnal pipeline.
//!
//! This module defines the `HymnError` enum used across rasterization, OCR,
//! parsing, and output, along with the `ProcessingStage` enum that tags where
//! a processing failure happened. The repetition detector itself never
//! returns these errors; its degenerate cases collapse to "no repetitions".

use thiserror::Error;

/// Enum representing the stages of the hymnal pipeline.
///
/// Used to identify which stage a processing error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Error occurred while turning PDF pages into images.
    Rasterization,
    /// Error occurred while splitting a page into zones.
    ZoneDetection,
    /// Error occurred while extracting text from a region.
    Recognition,
    /// Error occurred while analyzing the bar margin.
    RepetitionDetection,
    /// Error occurred while parsing recognized text.
    Parsing,
    /// Error occurred while writing or reading YAML.
    Serialization,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Rasterization => write!(f, "rasterization"),
            ProcessingStage::ZoneDetection => write!(f, "zone detection"),
            ProcessingStage::Recognition => write!(f, "text recognition"),
            ProcessingStage::RepetitionDetection => write!(f, "repetition detection"),
            ProcessingStage::Parsing => write!(f, "parsing"),
            ProcessingStage::Serialization => write!(f, "serialization"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Enum representing the errors that can occur in the hymnal pipeline.
#[derive(Error, Debug)]
pub enum HymnError {
    /// Error occurred while loading or encoding an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error occurred during processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error reported by the OCR engine.
    #[error("ocr engine '{engine}' failed: {message}")]
    Ocr {
        /// Name of the engine that failed.
        engine: String,
        /// A message describing the failure.
        message: String,
    },

    /// Error reported while opening or rendering a PDF.
    #[error("pdf: {message}")]
    Pdf {
        /// A message describing the failure.
        message: String,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// YAML (de)serialization error.
    #[error("yaml")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for HymnError {
    /// Converts an image::ImageError to HymnError::ImageLoad.
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

impl From<crate::core::config::ConfigError> for HymnError {
    /// Converts a ConfigError to HymnError::ConfigError.
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

impl HymnError {
    /// Creates a processing error for the given stage.
    ///
    /// # Arguments
    ///
    /// * `kind` - The stage where the failure happened
    /// * `context` - Description of what was being done
    /// * `source` - The underlying error
    pub fn processing(
        kind: ProcessingStage,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an OCR engine error.
    pub fn ocr(engine: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Ocr {
            engine: engine.into(),
            message: message.into(),
        }
    }

    /// Creates a PDF error.
    pub fn pdf(message: impl Into<String>) -> Self {
        Self::Pdf {
            message: message.into(),
        }
    }

    /// Returns the processing stage this error is attributed to.
    pub fn stage(&self) -> ProcessingStage {
        match self {
            Self::Processing { kind, .. } => *kind,
            Self::Ocr { .. } => ProcessingStage::Recognition,
            Self::Pdf { .. } => ProcessingStage::Rasterization,
            Self::Yaml(_) => ProcessingStage::Serialization,
            _ => ProcessingStage::Generic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_error_display() {
        let io = std::io::Error::other("disk gone");
        let err = HymnError::processing(ProcessingStage::Recognition, "body zone", io);
        assert_eq!(err.to_string(), "text recognition failed: body zone");
        assert_eq!(err.stage(), ProcessingStage::Recognition);
    }

    #[test]
    fn test_stage_of_collaborator_errors() {
        assert_eq!(
            HymnError::ocr("tesseract", "exit 1").stage(),
            ProcessingStage::Recognition
        );
        assert_eq!(HymnError::pdf("bad").stage(), ProcessingStage::Rasterization);
        assert_eq!(
            HymnError::invalid_input("x").stage(),
            ProcessingStage::Generic
        );
    }
}
