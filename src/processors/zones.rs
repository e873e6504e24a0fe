//! Rule-based page zone detection.
//!
//! Hymn pages carry a horizontal rule under the title. Its position splits
//! the page into header, metadata, and body; the bottom fifth is the footer.
//! Pages without a rule are treated as body plus footer.

use image::{GrayImage, RgbImage};
use image::imageops;
use tracing::debug;

use crate::core::ZoneDetector;
use crate::core::config::ZoneConfig;
use crate::domain::{PageZones, Zone};

/// [`ZoneDetector`] driven by horizontal rules and fixed page proportions.
#[derive(Debug, Clone, Default)]
pub struct RuleZoneDetector {
    config: ZoneConfig,
}

impl RuleZoneDetector {
    /// Creates a detector with the given parameters.
    pub fn new(config: ZoneConfig) -> Self {
        Self { config }
    }

    /// Whether the page is mostly non-white, as covers with artwork are.
    pub fn is_cover(&self, gray: &GrayImage) -> bool {
        let total = gray.pixels().len();
        if total == 0 {
            return false;
        }
        let white = gray
            .pixels()
            .filter(|p| p[0] >= self.config.white_level)
            .count();
        (white as f64 / total as f64) < self.config.cover_white_ratio
    }

    /// Rows holding a horizontal rule, sorted, with near-duplicates merged.
    pub fn horizontal_rules(&self, gray: &GrayImage) -> Vec<u32> {
        let (width, height) = gray.dimensions();
        let mut rules: Vec<u32> = Vec::new();
        for y in 0..height {
            let mut longest = 0u32;
            let mut current = 0u32;
            for x in 0..width {
                if gray.get_pixel(x, y)[0] < self.config.dark_level {
                    current += 1;
                    longest = longest.max(current);
                } else {
                    current = 0;
                }
            }
            if longest < self.config.min_rule_length {
                continue;
            }
            match rules.last() {
                Some(&last) if y - last <= self.config.rule_merge_distance => {}
                _ => rules.push(y),
            }
        }
        rules
    }
}

impl ZoneDetector for RuleZoneDetector {
    fn detect_zones(&self, page: &RgbImage) -> PageZones {
        let gray = imageops::grayscale(page);
        let height = gray.height();

        if self.is_cover(&gray) {
            debug!("Page classified as cover");
            return PageZones::cover();
        }

        let rules = self.horizontal_rules(&gray);
        let header_max = (height as f64 * self.config.header_end_ratio) as u32;
        let footer_start = (height as f64 * self.config.footer_start_ratio) as u32;
        let footer = Some(Zone::rows(footer_start, height));

        match rules.iter().copied().find(|&y| y < header_max) {
            Some(rule) => {
                let metadata_cap = (height as f64 * self.config.metadata_max_ratio) as u32;
                let metadata_end = (rule + self.config.metadata_height).min(metadata_cap);
                debug!("Header rule at y={}, metadata ends at {}", rule, metadata_end);
                PageZones {
                    header: Some(Zone::rows(0, rule)),
                    metadata: Some(Zone::rows(rule, metadata_end)),
                    body: Some(Zone::rows(metadata_end, footer_start)),
                    footer,
                    is_cover: false,
                }
            }
            None => PageZones {
                header: None,
                metadata: None,
                body: Some(Zone::rows(0, footer_start)),
                footer,
                is_cover: false,
            },
        }
    }
}
