//! Parameters of the rule-based page zone detector.

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigValidator};

/// Configuration for [`RuleZoneDetector`](crate::processors::RuleZoneDetector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// A horizontal rule above this fraction of the height marks the header.
    pub header_end_ratio: f64,
    /// The footer starts at this fraction of the height.
    pub footer_start_ratio: f64,
    /// Height of the metadata zone under the header rule, in pixels.
    pub metadata_height: u32,
    /// The metadata zone never extends past this fraction of the height.
    pub metadata_max_ratio: f64,
    /// Minimum dark run length, in pixels, for a row to be a horizontal rule.
    pub min_rule_length: u32,
    /// Rule rows closer than this many pixels are merged.
    pub rule_merge_distance: u32,
    /// Gray level below which a pixel is dark when searching for rules.
    pub dark_level: u8,
    /// Gray level at or above which a pixel is white for cover detection.
    pub white_level: u8,
    /// Pages with a white fraction below this are covers.
    pub cover_white_ratio: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            header_end_ratio: 0.15,
            footer_start_ratio: 0.80,
            metadata_height: 80,
            metadata_max_ratio: 0.25,
            min_rule_length: 200,
            rule_merge_distance: 20,
            dark_level: 128,
            white_level: 240,
            cover_white_ratio: 0.5,
        }
    }
}

impl ConfigValidator for ZoneConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_ratio("header_end_ratio", self.header_end_ratio)?;
        self.validate_ratio("footer_start_ratio", self.footer_start_ratio)?;
        self.validate_ratio("metadata_max_ratio", self.metadata_max_ratio)?;
        self.validate_range("cover_white_ratio", self.cover_white_ratio, 0.0, 1.0)?;
        if self.header_end_ratio >= self.footer_start_ratio {
            return Err(ConfigError::invalid(
                "header_end_ratio",
                "header must end before the footer starts",
            ));
        }
        self.validate_positive("min_rule_length", self.min_rule_length as usize)
    }
}
