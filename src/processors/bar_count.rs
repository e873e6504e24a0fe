//! Counting bar strokes line by line.
//!
//! A thin horizontal slice through the middle of a text line crosses every
//! bar that covers the line. Counting the dark runs in the slice tells how
//! many bars are stacked there, which exposes asymmetric nesting such as
//! `3-4, 1-4` that leaves no valley in the vertical profile.

use image::GrayImage;
use image::imageops;

use super::profile::{Profile, horizontal_profile, runs};
use super::types::LineBoundary;
use crate::domain::{RepetitionRange, Repetitions};

/// Parameters of the per-line counter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarCountParams {
    /// Rows above and below the line centre included in the slice.
    pub slice_margin: u32,
    /// Gray level at or below which a pixel is ink.
    pub dark_threshold: u8,
    /// Fraction of the slice maximum a column must exceed.
    pub peak_ratio: f64,
    /// Minimum stroke width in pixels.
    pub min_peak_width: usize,
}

impl Default for BarCountParams {
    fn default() -> Self {
        Self {
            slice_margin: 5,
            dark_threshold: 200,
            peak_ratio: 0.3,
            min_peak_width: 3,
        }
    }
}

/// Number of runs above `peak_ratio` of the maximum that are at least `min_width` wide.
pub fn count_peaks(profile: &Profile, peak_ratio: f64, min_width: usize) -> usize {
    let Some(normalized) = profile.normalized() else {
        return 0;
    };
    let is_peak: Vec<bool> = normalized.iter().map(|&v| v > peak_ratio).collect();
    runs(&is_peak)
        .into_iter()
        .filter(|run| run.len() >= min_width)
        .count()
}

/// How many bar strokes cross each line, one count per boundary.
///
/// Lines whose slice falls outside the region count as zero.
pub fn count_bars_per_line(
    region: &GrayImage,
    lines: &[LineBoundary],
    params: &BarCountParams,
) -> Vec<usize> {
    let (width, height) = region.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let margin = params.slice_margin as i64;

    lines
        .iter()
        .map(|line| {
            let center = (line.y_min + line.y_max).div_euclid(2);
            let start = (center - margin).max(0);
            let end = (center + margin).min(height as i64);
            if end <= start {
                return 0;
            }
            let slice =
                imageops::crop_imm(region, 0, start as u32, width, (end - start) as u32).to_image();
            let profile = horizontal_profile(&slice, params.dark_threshold);
            count_peaks(&profile, params.peak_ratio, params.min_peak_width)
        })
        .collect()
}

/// Ranges deduced from per-line bar counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarCountPattern {
    /// Lines covered by the most bars, when they form a proper contiguous subset.
    pub internal: Option<RepetitionRange>,
    /// First to last line covered by any bar.
    pub external: RepetitionRange,
}

impl BarCountPattern {
    /// Internal range first, then the external one.
    pub fn to_repetitions(&self) -> Repetitions {
        Repetitions::from_ranges(self.internal.into_iter().chain([self.external]))
    }

    /// Shifts both ranges by `offset` lines.
    pub fn offset_by(self, offset: usize) -> Self {
        Self {
            internal: self.internal.map(|range| range.offset_by(offset)),
            external: self.external.offset_by(offset),
        }
    }
}

/// Deduces repetition ranges from per-line bar counts (1-indexed lines).
///
/// For `[1, 1, 2, 2]` this yields internal `3-4` and external `1-4`.
///
/// # Returns
///
/// `None` when no line has a bar.
pub fn deduce_repetitions(counts: &[usize]) -> Option<BarCountPattern> {
    let max_bars = counts.iter().copied().max()?;
    if max_bars == 0 {
        return None;
    }

    let external_lines: Vec<usize> = lines_where(counts, |c| c >= 1);
    let external = RepetitionRange::new(*external_lines.first()?, *external_lines.last()?)?;

    let internal = if max_bars > 1 {
        let internal_lines = lines_where(counts, |c| c == max_bars);
        match (internal_lines.first(), internal_lines.last()) {
            (Some(&first), Some(&last))
                if internal_lines != external_lines
                    && last - first + 1 == internal_lines.len() =>
            {
                RepetitionRange::new(first, last)
            }
            _ => None,
        }
    } else {
        None
    };

    Some(BarCountPattern { internal, external })
}

fn lines_where(counts: &[usize], pred: impl Fn(usize) -> bool) -> Vec<usize> {
    counts
        .iter()
        .enumerate()
        .filter(|&(_, &c)| pred(c))
        .map(|(i, _)| i + 1)
        .collect()
}
