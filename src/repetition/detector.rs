//! The bar orchestrator: from a page image to repetition ranges.
//!
//! Decision order for one page:
//! 1. Crop the left margin of the page to the body rows and profile it.
//! 2. Cut the profile into segments.
//! 3. One tall segment with at least three recognized lines next to it is
//!    first checked line by line for asymmetric nesting.
//! 4. Otherwise one tall segment is tried for a gap split, kept only when
//!    the split looks plausible.
//! 5. Several segments are taken as independent bars.
//! 6. Segments are mapped to lines, internal bars first, and deduplicated.
//!
//! Every degenerate case ends in "no repetitions"; nothing here fails.

use image::{GrayImage, RgbImage, imageops};
use serde::Serialize;
use tracing::debug;

use super::line_mapper::LineMapper;
use super::text_lines::count_text_lines;
use crate::core::RepetitionConfig;
use crate::domain::{Repetitions, Zone};
use crate::processors::{
    BarCountParams, BarSegment, GapParams, LineBoundary, Profile, ProfileParams, SplitLimits,
    analyze_columns, column_segments, count_bars_per_line, deduce_repetitions, find_segments,
    split_is_plausible, split_on_gaps, vertical_profile,
};

/// Which strategy produced the final segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BarStrategy {
    /// Per-line bar counts revealed asymmetric nesting.
    PerLineCount,
    /// A single segment was split at intensity valleys.
    GapSplit,
    /// A single segment was kept as is.
    SingleSegment,
    /// Several segments were found and kept as independent bars.
    MultipleSegments,
}

impl std::fmt::Display for BarStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BarStrategy::PerLineCount => "per-line count",
            BarStrategy::GapSplit => "gap split",
            BarStrategy::SingleSegment => "single segment",
            BarStrategy::MultipleSegments => "multiple segments",
        };
        f.write_str(name)
    }
}

/// Intermediate results of one page's analysis, for logging and debugging.
#[derive(Debug, Clone, Serialize)]
pub struct BarAnalysis {
    /// Height of the analyzed body zone.
    pub body_height: usize,
    /// Segments cut from the whole-margin profile.
    pub initial_segments: Vec<BarSegment>,
    /// Segments after the chosen strategy, in output order.
    pub segments: Vec<BarSegment>,
    /// Strategy that produced `segments`.
    pub strategy: BarStrategy,
    /// Per-line bar counts, when the per-line strategy ran.
    pub bar_counts: Option<Vec<usize>>,
    /// Lines the ranges are clamped to.
    pub num_lines: usize,
    /// Final ranges, if any survived.
    pub repetitions: Option<Repetitions>,
}

/// Detects repetition bars in the left margin of hymn pages.
///
/// Stateless apart from its configuration; one instance can serve many
/// pages and threads.
#[derive(Debug, Clone, Default)]
pub struct RepetitionDetector {
    config: RepetitionConfig,
}

impl RepetitionDetector {
    /// Creates a detector with the given configuration.
    pub fn new(config: RepetitionConfig) -> Self {
        Self { config }
    }

    /// The detector's configuration.
    pub fn config(&self) -> &RepetitionConfig {
        &self.config
    }

    /// Detects repetition ranges on one page.
    ///
    /// # Arguments
    ///
    /// * `page` - The full page image
    /// * `body` - Body zone of the page
    /// * `body_text` - Recognized body text, used to count lines
    /// * `precise_lines` - Line boundaries in body coordinates, possibly empty
    ///
    /// # Returns
    ///
    /// The ranges, or `None` when no bar could be detected.
    pub fn detect(
        &self,
        page: &RgbImage,
        body: Option<&Zone>,
        body_text: &str,
        precise_lines: &[LineBoundary],
    ) -> Option<Repetitions> {
        self.analyze(page, body, body_text, precise_lines)?
            .repetitions
    }

    /// Runs the full analysis and returns its intermediate results.
    pub fn analyze(
        &self,
        page: &RgbImage,
        body: Option<&Zone>,
        body_text: &str,
        precise_lines: &[LineBoundary],
    ) -> Option<BarAnalysis> {
        let body = body?;
        if body_text.is_empty() {
            debug!("No body text, skipping bar detection");
            return None;
        }
        let region = self.margin_region(page, body)?;
        self.analyze_region(&region, body_text, precise_lines)
    }

    /// The left page margin restricted to the body rows, in grayscale.
    ///
    /// Returns `None` when the body is shorter than the configured minimum.
    pub fn margin_region(&self, page: &RgbImage, body: &Zone) -> Option<GrayImage> {
        let (width, height) = page.dimensions();
        let body = body.clamped(width, height);
        if body.height() < self.config.min_body_height {
            debug!("Body zone too short ({} px)", body.height());
            return None;
        }
        let margin_width = self.config.margin_width(width);
        let region = imageops::crop_imm(page, 0, body.y_start, margin_width, body.height());
        Some(imageops::grayscale(&region.to_image()))
    }

    /// Segments found per column strip of the margin, for diagnostics.
    pub fn inspect_columns(&self, page: &RgbImage, body: &Zone) -> Vec<BarSegment> {
        let Some(region) = self.margin_region(page, body) else {
            return Vec::new();
        };
        let columns = analyze_columns(&region, self.config.num_columns, &self.profile_params());
        column_segments(
            &columns,
            self.config.detection_threshold,
            self.config.min_segment_ratio,
        )
    }

    /// Analyzes an already cropped margin region.
    pub fn analyze_region(
        &self,
        region: &GrayImage,
        body_text: &str,
        precise_lines: &[LineBoundary],
    ) -> Option<BarAnalysis> {
        let profile = vertical_profile(region, &self.profile_params())?;
        self.analyze_profile(&profile, Some(region), body_text, precise_lines)
    }

    /// Analyzes a precomputed profile whose length is the body height.
    ///
    /// Without `region` the per-line strategy is unavailable.
    pub(crate) fn analyze_profile(
        &self,
        profile: &Profile,
        region: Option<&GrayImage>,
        body_text: &str,
        precise_lines: &[LineBoundary],
    ) -> Option<BarAnalysis> {
        let config = &self.config;
        let body_height = profile.len();
        if body_height == 0 {
            return None;
        }

        let initial = find_segments(
            profile,
            config.detection_threshold,
            body_height,
            config.min_segment_ratio,
        );
        debug!("Found {} initial bar segment(s)", initial.len());
        if initial.is_empty() {
            return None;
        }

        if let Some(region) = region
            && let Some(analysis) = self.try_per_line(region, &initial, body_height, precise_lines)
        {
            return Some(analysis);
        }

        let (strategy, mut segments) = match initial.as_slice() {
            [segment] => self.try_gap_split(profile, segment, body_height),
            _ => (BarStrategy::MultipleSegments, initial.clone()),
        };

        let num_lines = count_text_lines(body_text);
        if num_lines == 0 {
            debug!("No text lines in body, dropping {} segment(s)", segments.len());
            return None;
        }

        segments.sort_by_key(|s| (!s.is_internal, s.y_start));
        let mapper = LineMapper::select(precise_lines, &segments, num_lines, body_height, config);
        let repetitions = Repetitions::from_ranges(
            segments.iter().filter_map(|segment| mapper.map_segment(segment)),
        );
        debug!(
            "Strategy {} mapped {} segment(s) to '{}'",
            strategy,
            segments.len(),
            repetitions
        );

        Some(BarAnalysis {
            body_height,
            initial_segments: initial,
            segments,
            strategy,
            bar_counts: None,
            num_lines: mapper.num_lines(),
            repetitions: (!repetitions.is_empty()).then_some(repetitions),
        })
    }

    /// Counts bars per recognized line next to a lone tall segment.
    ///
    /// Only accepted when the counts vary (some lines with one bar, some
    /// with more) and the busiest lines form a proper contiguous block.
    fn try_per_line(
        &self,
        region: &GrayImage,
        initial: &[BarSegment],
        body_height: usize,
        precise_lines: &[LineBoundary],
    ) -> Option<BarAnalysis> {
        let config = &self.config;
        let [segment] = initial else {
            return None;
        };
        if precise_lines.len() < config.per_line_min_lines {
            return None;
        }
        let span = segment.height() as f64 / body_height as f64;
        if span < config.per_line_span_ratio {
            return None;
        }

        let near: Vec<(usize, LineBoundary)> = precise_lines
            .iter()
            .enumerate()
            .filter(|(_, line)| {
                let half = line.height() as f64 / 2.0;
                let center = line.center();
                segment.y_start as f64 - half <= center && center <= segment.y_end as f64 + half
            })
            .map(|(i, line)| (i, *line))
            .collect();
        if near.len() < config.per_line_min_lines {
            return None;
        }

        let lines: Vec<LineBoundary> = near.iter().map(|(_, line)| *line).collect();
        let counts = count_bars_per_line(region, &lines, &self.bar_count_params());
        let max = counts.iter().copied().max().unwrap_or(0);
        let min = counts.iter().copied().min().unwrap_or(0);
        debug!("Per-line bar counts: {:?}", counts);
        if max < 2 || min < 1 || min >= max {
            return None;
        }

        let pattern = deduce_repetitions(&counts)?;
        if pattern.internal.is_none() {
            return None;
        }
        let first_line = near.first().map(|(i, _)| *i).unwrap_or(0);
        let repetitions = pattern.offset_by(first_line).to_repetitions();
        debug!("Per-line counting found '{}'", repetitions);

        Some(BarAnalysis {
            body_height,
            initial_segments: initial.to_vec(),
            segments: initial.to_vec(),
            strategy: BarStrategy::PerLineCount,
            bar_counts: Some(counts),
            num_lines: precise_lines.len(),
            repetitions: Some(repetitions),
        })
    }

    /// Splits a lone tall segment when the split passes the sanity checks.
    fn try_gap_split(
        &self,
        profile: &Profile,
        segment: &BarSegment,
        body_height: usize,
    ) -> (BarStrategy, Vec<BarSegment>) {
        let config = &self.config;
        let span = segment.height() as f64 / body_height as f64;
        if span <= config.split_span_ratio {
            return (BarStrategy::SingleSegment, vec![*segment]);
        }

        let params = GapParams {
            gap_threshold: config.gap_threshold,
            min_gap_height: config.min_gap_height(body_height as u32),
            min_internal_ratio: config.min_internal_ratio,
            min_internal_px: config.min_internal_px as usize,
        };
        let limits = SplitLimits {
            assumed_segment_lines: config.assumed_segment_lines,
            min_line_coverage: config.min_line_coverage,
            min_height_ratio: config.min_height_ratio,
        };
        let split = split_on_gaps(profile, segment, &params);
        if split_is_plausible(&split, segment, &limits) {
            debug!("Gap split accepted: {} piece(s)", split.len());
            (BarStrategy::GapSplit, split)
        } else {
            if split.len() > 1 {
                debug!("Gap split rejected by sanity checks");
            }
            (BarStrategy::SingleSegment, vec![*segment])
        }
    }

    fn profile_params(&self) -> ProfileParams {
        ProfileParams {
            edge_threshold: self.config.edge_threshold,
            closing_height: self.config.closing_height,
        }
    }

    fn bar_count_params(&self) -> BarCountParams {
        BarCountParams {
            slice_margin: self.config.slice_margin,
            dark_threshold: self.config.dark_threshold,
            peak_ratio: self.config.peak_ratio,
            min_peak_width: self.config.min_peak_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    const FOUR_LINES: &str = "Eu pedi a Deus\nQue me desse amor\nE Ele me mandou\nA luz do seu fulgor";

    fn profile_with(len: usize, parts: &[(std::ops::Range<usize>, f64)]) -> Profile {
        let mut values = vec![0.0; len];
        for (range, value) in parts {
            values[range.clone()].iter_mut().for_each(|v| *v = *value);
        }
        Profile::from_values(values)
    }

    fn eight_lines() -> Vec<LineBoundary> {
        (0..8)
            .map(|i| LineBoundary::new(i * 100 + 20, i * 100 + 80))
            .collect()
    }

    /// A white margin with 6 px bars, each `(x, rows)`.
    fn margin_with_bars(
        width: u32,
        height: u32,
        bars: &[(u32, std::ops::Range<u32>)],
    ) -> GrayImage {
        let mut region = GrayImage::from_pixel(width, height, Luma([255]));
        for (x, rows) in bars {
            for y in rows.clone() {
                for xx in *x..*x + 6 {
                    region.put_pixel(xx, y, Luma([0]));
                }
            }
        }
        region
    }

    fn four_lines() -> Vec<LineBoundary> {
        (0..4)
            .map(|i| LineBoundary::new(i * 100 + 100, i * 100 + 140))
            .collect()
    }

    #[test]
    fn test_per_line_needs_enough_lines() {
        // Outer bar on all four lines, inner bar on the last two.
        let region = margin_with_bars(150, 500, &[(20, 95..445), (60, 295..445)]);
        let lines = four_lines();
        let analysis = RepetitionDetector::default()
            .analyze_region(&region, FOUR_LINES, &lines[..2])
            .unwrap();
        assert_ne!(analysis.strategy, BarStrategy::PerLineCount);
        assert!(analysis.bar_counts.is_none());
    }

    #[test]
    fn test_per_line_needs_tall_segment() {
        // 104 of 1000 rows is under the 15% span gate.
        let region = margin_with_bars(150, 1000, &[(20, 400..500), (60, 450..500)]);
        let lines = [
            LineBoundary::new(400, 420),
            LineBoundary::new(425, 445),
            LineBoundary::new(455, 475),
            LineBoundary::new(480, 500),
        ];
        let analysis = RepetitionDetector::default()
            .analyze_region(&region, FOUR_LINES, &lines)
            .unwrap();
        assert_eq!(analysis.initial_segments.len(), 1);
        assert_eq!(analysis.strategy, BarStrategy::SingleSegment);
        assert!(analysis.bar_counts.is_none());
    }

    #[test]
    fn test_uniform_counts_fall_through() {
        // Two bars over every line: two strokes everywhere, no nesting to deduce.
        let region = margin_with_bars(150, 500, &[(20, 95..445), (60, 95..445)]);
        let lines = four_lines();
        let analysis = RepetitionDetector::default()
            .analyze_region(&region, FOUR_LINES, &lines)
            .unwrap();
        assert_eq!(analysis.strategy, BarStrategy::SingleSegment);
        assert!(analysis.bar_counts.is_none());
        assert_eq!(analysis.repetitions.unwrap().to_string(), "1-4");
    }

    #[test]
    fn test_implausible_split_reverts() {
        // The valley leaves a 120-row piece, under 1.5 of 4 lines.
        let profile = profile_with(800, &[(40..760, 10.0), (600..640, 2.0)]);
        let analysis = RepetitionDetector::default()
            .analyze_profile(&profile, None, FOUR_LINES, &[])
            .unwrap();
        assert_eq!(analysis.strategy, BarStrategy::SingleSegment);
        assert_eq!(analysis.segments, analysis.initial_segments);
        assert_eq!(analysis.repetitions.unwrap().to_string(), "1-4");
    }

    #[test]
    fn test_gap_split_lists_internal_first() {
        let profile = profile_with(800, &[(40..760, 10.0), (380..420, 2.0)]);
        let analysis = RepetitionDetector::default()
            .analyze_profile(&profile, None, FOUR_LINES, &[])
            .unwrap();
        assert_eq!(analysis.strategy, BarStrategy::GapSplit);
        assert_eq!(
            analysis.repetitions.unwrap().to_string(),
            "1-2, 3-4, 1-4"
        );
    }

    #[test]
    fn test_small_segment_not_split() {
        // 80 rows of 800 is under the 15% gate.
        let profile = profile_with(800, &[(300..380, 10.0)]);
        let analysis = RepetitionDetector::default()
            .analyze_profile(&profile, None, FOUR_LINES, &[])
            .unwrap();
        assert_eq!(analysis.strategy, BarStrategy::SingleSegment);
        assert_eq!(analysis.segments.len(), 1);
    }

    #[test]
    fn test_two_segments_with_precise_lines() {
        let profile = profile_with(800, &[(15..285, 6.0), (515..785, 6.0)]);
        let lines = eight_lines();
        let text = (1..=8)
            .map(|i| format!("Verso numero {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let analysis = RepetitionDetector::default()
            .analyze_profile(&profile, None, &text, &lines)
            .unwrap();
        assert_eq!(analysis.strategy, BarStrategy::MultipleSegments);
        assert_eq!(analysis.num_lines, 8);
        assert_eq!(analysis.repetitions.unwrap().to_string(), "1-3, 6-8");
    }

    #[test]
    fn test_flat_profile_is_absent() {
        let profile = profile_with(500, &[]);
        assert!(
            RepetitionDetector::default()
                .analyze_profile(&profile, None, FOUR_LINES, &[])
                .is_none()
        );
    }

    #[test]
    fn test_no_text_lines_is_absent() {
        let profile = profile_with(800, &[(200..600, 5.0)]);
        assert!(
            RepetitionDetector::default()
                .analyze_profile(&profile, None, "XX\n|\n", &[])
                .is_none()
        );
    }

    #[test]
    fn test_degenerate_inputs() {
        let detector = RepetitionDetector::default();
        let page = RgbImage::from_pixel(200, 300, Rgb([255, 255, 255]));
        let body = Zone::rows(50, 250);
        assert!(detector.detect(&page, None, FOUR_LINES, &[]).is_none());
        assert!(detector.detect(&page, Some(&body), "", &[]).is_none());
        assert!(
            detector
                .detect(&page, Some(&Zone::rows(100, 105)), FOUR_LINES, &[])
                .is_none()
        );
        assert!(
            detector
                .detect(&page, Some(&Zone::rows(400, 900)), FOUR_LINES, &[])
                .is_none()
        );
    }

    #[test]
    fn test_margin_region_dimensions() {
        let detector = RepetitionDetector::default();
        let page = RgbImage::from_pixel(1000, 1200, Rgb([255, 255, 255]));
        let region = detector
            .margin_region(&page, &Zone::rows(100, 900))
            .unwrap();
        assert_eq!(region.dimensions(), (150, 800));
    }

    #[test]
    fn test_inspect_columns_separates_nesting() {
        let mut page = RgbImage::from_pixel(600, 1000, Rgb([255, 255, 255]));
        let mut bar = |x: u32, y: std::ops::Range<u32>| {
            for yy in y {
                for xx in x..x + 4 {
                    page.put_pixel(xx, yy, Rgb([0, 0, 0]));
                }
            }
        };
        bar(5, 200..700);
        bar(70, 200..430);
        bar(70, 470..700);
        let segments =
            RepetitionDetector::default().inspect_columns(&page, &Zone::rows(100, 900));
        assert_eq!(segments.iter().filter(|s| s.column == 0).count(), 1);
        assert_eq!(segments.iter().filter(|s| s.column == 2).count(), 2);
    }
}
