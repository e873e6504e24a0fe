//! # hymn-ocr
//!
//! Converts scanned hymnal PDFs into structured YAML hymn books.
//!
//! Besides the usual OCR plumbing (zones, text, metadata parsing), the
//! crate recovers *repetition bars*: vertical strokes printed in the left
//! margin beside lyric lines that are sung more than once. A bar beside
//! lines 1 to 4 becomes the range `1-4`; nested bars produce lists such as
//! `1-2, 3-4, 1-4`.
//!
//! ## Modules
//!
//! * [`core`] - Configuration, errors, and collaborator traits
//! * [`domain`] - Hymns, pages, zones, and repetition ranges
//! * [`processors`] - Margin profiles, segments, gap splitting, bar counting, zones
//! * [`repetition`] - The repetition-bar detector and line mapping
//! * [`pipeline`] - Page processing, merging, YAML output, and validation
//! * [`utils`] - Cropping, debug overlays, and logging setup
//!
//! ## Example
//!
//! ```no_run
//! use hymn_ocr::prelude::*;
//! use image::RgbImage;
//!
//! let detector = RepetitionDetector::new(RepetitionConfig::default());
//! let page = RgbImage::new(1000, 1400);
//! let body = Zone::rows(200, 1100);
//! let repetitions = detector.detect(&page, Some(&body), "Linha um\nLinha dois", &[]);
//! println!("{:?}", repetitions.map(|r| r.to_string()));
//! ```

pub mod core;
pub mod domain;
pub mod pipeline;
pub mod processors;
pub mod repetition;
pub mod utils;

/// Commonly used types.
pub mod prelude {
    pub use crate::core::{
        ConfigValidator, HymnError, HymnResult, PageRasterizer, PipelineConfig, RepetitionConfig,
        TextRecognizer, ZoneConfig, ZoneDetector,
    };
    pub use crate::domain::{
        Hymn, HymnBook, OcrLine, PageData, PageType, PageZones, RepetitionRange, Repetitions,
        Zone,
    };
    pub use crate::pipeline::{
        HymnPipeline, HymnPipelineBuilder, create_hymnbook, generate_yaml, save_yaml,
    };
    pub use crate::processors::{LineBoundary, RuleZoneDetector};
    pub use crate::repetition::RepetitionDetector;
}
