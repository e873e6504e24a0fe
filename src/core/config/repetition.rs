//! Tunable parameters of the repetition-bar detector.
//!
//! The defaults were tuned against hymnals rendered with bars in a fixed
//! left-margin band. Every threshold is relative or configurable so other
//! layouts can be tuned without touching the detector.

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigValidator};
use crate::processors::MAX_CLOSING_HEIGHT;

/// Configuration for [`RepetitionDetector`](crate::repetition::RepetitionDetector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepetitionConfig {
    /// Fraction of the page width, from the left edge, scanned for bars.
    pub margin_ratio: f64,
    /// Lower bound on the margin width in pixels.
    pub min_margin_width: u32,
    /// Body zones shorter than this (pixels) are not analyzed.
    pub min_body_height: u32,

    /// Profile rows above this fraction of the profile maximum are bar rows.
    pub detection_threshold: f64,
    /// Segments shorter than this fraction of the region height are noise.
    pub min_segment_ratio: f64,
    /// Horizontal gradient magnitude (0-255) that counts as an edge pixel.
    pub edge_threshold: u8,
    /// Height of the vertical closing kernel applied to the edge map.
    pub closing_height: u32,
    /// Number of strips the margin is divided into for column diagnostics.
    pub num_columns: usize,

    /// Relative level below which a segment's profile is a valley.
    pub gap_threshold: f64,
    /// Minimum valley height as a fraction of body height.
    pub min_gap_ratio: f64,
    /// Minimum valley height in pixels.
    pub min_gap_px: u32,
    /// Minimum internal piece height as a fraction of the split segment.
    pub min_internal_ratio: f64,
    /// Minimum internal piece height in pixels.
    pub min_internal_px: u32,
    /// A lone segment must span more than this fraction of the body to be split.
    pub split_span_ratio: f64,
    /// Number of lines a split segment is assumed to cover.
    pub assumed_segment_lines: f64,
    /// Internal pieces covering fewer estimated lines than this reject the split.
    pub min_line_coverage: f64,
    /// Two internal pieces whose height ratio is below this reject the split.
    pub min_height_ratio: f64,

    /// A lone segment must span at least this fraction of the body for per-line counting.
    pub per_line_span_ratio: f64,
    /// Minimum number of precise lines overlapping the segment for per-line counting.
    pub per_line_min_lines: usize,
    /// Half height, in pixels, of the slice taken at each line centre.
    pub slice_margin: u32,
    /// Gray level at or below which a pixel counts as ink when counting bars.
    pub dark_threshold: u8,
    /// Fraction of the slice maximum a column must exceed to belong to a bar.
    pub peak_ratio: f64,
    /// Minimum width in pixels of a bar stroke in a slice.
    pub min_peak_width: usize,

    /// Minimum number of precise line boundaries for precise mapping.
    pub min_precise_lines: usize,
    /// Lines assumed under the bars when estimating line height.
    pub default_estimated_lines: usize,
    /// Lines assumed per segment when the innermost column holds several.
    pub lines_per_internal_segment: usize,
    /// Fraction of the body assumed to be text when no bar span is available.
    pub text_height_ratio: f64,
    /// A bar ending within this fraction of a line boundary stops at the previous line.
    pub end_boundary_tolerance: f64,
}

impl Default for RepetitionConfig {
    fn default() -> Self {
        Self {
            margin_ratio: 0.15,
            min_margin_width: 10,
            min_body_height: 10,
            detection_threshold: 0.15,
            min_segment_ratio: 0.05,
            edge_threshold: 20,
            closing_height: 5,
            num_columns: 3,
            gap_threshold: 0.5,
            min_gap_ratio: 0.015,
            min_gap_px: 10,
            min_internal_ratio: 0.15,
            min_internal_px: 20,
            split_span_ratio: 0.15,
            assumed_segment_lines: 4.0,
            min_line_coverage: 1.5,
            min_height_ratio: 0.5,
            per_line_span_ratio: 0.15,
            per_line_min_lines: 3,
            slice_margin: 5,
            dark_threshold: 200,
            peak_ratio: 0.3,
            min_peak_width: 3,
            min_precise_lines: 2,
            default_estimated_lines: 4,
            lines_per_internal_segment: 2,
            text_height_ratio: 0.45,
            end_boundary_tolerance: 0.1,
        }
    }
}

impl RepetitionConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the relative detection threshold.
    pub fn with_detection_threshold(mut self, threshold: f64) -> Self {
        self.detection_threshold = threshold;
        self
    }

    /// Set the fraction of the page width scanned for bars.
    pub fn with_margin_ratio(mut self, ratio: f64) -> Self {
        self.margin_ratio = ratio;
        self
    }

    /// Set the number of column strips.
    pub fn with_num_columns(mut self, num_columns: usize) -> Self {
        self.num_columns = num_columns;
        self
    }

    /// Set the valley threshold used by the gap splitter.
    pub fn with_gap_threshold(mut self, threshold: f64) -> Self {
        self.gap_threshold = threshold;
        self
    }

    /// Minimum valley height in pixels for a body of `body_height` pixels.
    pub fn min_gap_height(&self, body_height: u32) -> usize {
        let relative = (body_height as f64 * self.min_gap_ratio) as u32;
        self.min_gap_px.max(relative) as usize
    }

    /// Margin width in pixels for a page `page_width` pixels wide.
    pub fn margin_width(&self, page_width: u32) -> u32 {
        let relative = (page_width as f64 * self.margin_ratio) as u32;
        self.min_margin_width.max(relative).min(page_width)
    }
}

impl ConfigValidator for RepetitionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_ratio("margin_ratio", self.margin_ratio)?;
        self.validate_ratio("detection_threshold", self.detection_threshold)?;
        self.validate_range("min_segment_ratio", self.min_segment_ratio, 0.0, 1.0)?;
        self.validate_ratio("gap_threshold", self.gap_threshold)?;
        self.validate_range("min_gap_ratio", self.min_gap_ratio, 0.0, 1.0)?;
        self.validate_range("min_internal_ratio", self.min_internal_ratio, 0.0, 1.0)?;
        self.validate_range("split_span_ratio", self.split_span_ratio, 0.0, 1.0)?;
        self.validate_range("per_line_span_ratio", self.per_line_span_ratio, 0.0, 1.0)?;
        self.validate_ratio("peak_ratio", self.peak_ratio)?;
        self.validate_range("min_height_ratio", self.min_height_ratio, 0.0, 1.0)?;
        self.validate_ratio("text_height_ratio", self.text_height_ratio)?;
        self.validate_range("end_boundary_tolerance", self.end_boundary_tolerance, 0.0, 0.5)?;
        self.validate_range(
            "assumed_segment_lines",
            self.assumed_segment_lines,
            1.0,
            f64::MAX,
        )?;
        self.validate_range("min_line_coverage", self.min_line_coverage, 0.0, f64::MAX)?;
        self.validate_positive("num_columns", self.num_columns)?;
        self.validate_positive("min_peak_width", self.min_peak_width)?;
        self.validate_positive("default_estimated_lines", self.default_estimated_lines)?;
        self.validate_positive("lines_per_internal_segment", self.lines_per_internal_segment)?;
        self.validate_range(
            "closing_height",
            self.closing_height as f64,
            1.0,
            MAX_CLOSING_HEIGHT as f64,
        )?;
        if self.min_precise_lines < 2 {
            return Err(ConfigError::invalid(
                "min_precise_lines",
                "precise mapping needs at least two lines",
            ));
        }
        Ok(())
    }
}
