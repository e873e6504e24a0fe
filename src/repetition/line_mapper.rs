//! Mapping pixel rows to 1-indexed text line numbers.
//!
//! Two strategies exist. Precise mapping walks the recognized line boxes;
//! estimated mapping divides the bar span into lines of equal height. The
//! mapper is picked once per page by [`LineMapper::select`].

use itertools::Itertools;

use crate::core::RepetitionConfig;
use crate::domain::RepetitionRange;
use crate::processors::{BarSegment, LineBoundary};

/// Converts segment rows into line numbers, always within `[1, num_lines]`.
#[derive(Debug, Clone, PartialEq)]
pub enum LineMapper<'a> {
    /// Uses recognized line boxes, sorted top to bottom.
    Precise {
        /// Line boxes in body coordinates.
        lines: &'a [LineBoundary],
    },
    /// Uses a uniform line height starting at the first bar.
    Estimated {
        /// Row where line 1 is assumed to start.
        first_y: i64,
        /// Height of one line in pixels.
        line_height: f64,
        /// Number of text lines on the page.
        num_lines: usize,
        /// A bar ending within this fraction of a line stops at the previous line.
        end_tolerance: f64,
    },
}

impl<'a> LineMapper<'a> {
    /// Picks precise mapping when enough line boxes exist, else estimates.
    ///
    /// # Arguments
    ///
    /// * `precise` - Recognized line boundaries, possibly empty
    /// * `segments` - Segments that will be mapped
    /// * `num_lines` - Text line count used by the estimate
    /// * `body_height` - Height of the body zone
    /// * `config` - Detector configuration
    pub fn select(
        precise: &'a [LineBoundary],
        segments: &[BarSegment],
        num_lines: usize,
        body_height: usize,
        config: &RepetitionConfig,
    ) -> Self {
        if precise.len() >= config.min_precise_lines {
            return LineMapper::Precise { lines: precise };
        }
        Self::estimated(segments, num_lines, body_height, config)
    }

    /// Estimated mapping derived from the layout of `segments`.
    ///
    /// When the innermost column holds several segments, each is assumed to
    /// cover `lines_per_internal_segment` lines; otherwise the bars are
    /// assumed to span `default_estimated_lines` lines.
    pub fn estimated(
        segments: &[BarSegment],
        num_lines: usize,
        body_height: usize,
        config: &RepetitionConfig,
    ) -> Self {
        let first_y = segments.iter().map(|s| s.y_start).min().unwrap_or(0);
        let last_y = segments.iter().map(|s| s.y_end).max().unwrap_or(0);
        let span = last_y.saturating_sub(first_y);

        let by_column = segments.iter().counts_by(|s| s.column);
        let innermost = by_column
            .iter()
            .max_by_key(|(column, _)| **column)
            .map(|(_, count)| *count)
            .unwrap_or(0);
        let estimated_lines = if innermost >= 2 {
            innermost * config.lines_per_internal_segment
        } else {
            config.default_estimated_lines
        };

        let line_height = if span > 0 && estimated_lines > 0 {
            span as f64 / estimated_lines as f64
        } else {
            body_height as f64 * config.text_height_ratio / num_lines.max(1) as f64
        };

        LineMapper::Estimated {
            first_y: first_y as i64,
            line_height,
            num_lines,
            end_tolerance: config.end_boundary_tolerance,
        }
    }

    /// Number of lines results are clamped to.
    pub fn num_lines(&self) -> usize {
        match self {
            LineMapper::Precise { lines } => lines.len(),
            LineMapper::Estimated { num_lines, .. } => *num_lines,
        }
    }

    /// Line on which a bar starting at row `y` begins.
    pub fn map_start(&self, y: i64) -> usize {
        let line = match self {
            LineMapper::Precise { lines } => lines
                .iter()
                .position(|line| y <= line.y_max)
                .map(|i| i + 1)
                .unwrap_or(lines.len()),
            LineMapper::Estimated {
                first_y,
                line_height,
                ..
            } => {
                if *line_height <= 0.0 {
                    return 1;
                }
                let index = (y - first_y) as f64 / line_height;
                (index.trunc() as i64 + 1).max(1) as usize
            }
        };
        self.clamp(line)
    }

    /// Last line covered by a bar ending at row `y`.
    ///
    /// A bar that stops before a line's midpoint does not cover that line.
    pub fn map_end(&self, y: i64) -> usize {
        let line = match self {
            LineMapper::Precise { lines } => {
                let mut found = lines.len();
                for (i, line) in lines.iter().enumerate() {
                    if (y as f64) <= line.center() {
                        found = i.max(1);
                        break;
                    }
                    if y <= line.y_max {
                        found = i + 1;
                        break;
                    }
                }
                found
            }
            LineMapper::Estimated {
                first_y,
                line_height,
                end_tolerance,
                ..
            } => {
                if *line_height <= 0.0 {
                    return 1;
                }
                let index = (y - first_y) as f64 / line_height;
                let whole = index.trunc();
                let line = if index - whole < *end_tolerance {
                    whole as i64
                } else {
                    whole as i64 + 1
                };
                line.max(1) as usize
            }
        };
        self.clamp(line)
    }

    /// Maps a segment to a range, or `None` when the ends cross.
    pub fn map_segment(&self, segment: &BarSegment) -> Option<RepetitionRange> {
        let start = self.map_start(segment.y_start as i64);
        let end = self.map_end(segment.y_end as i64);
        RepetitionRange::new(start, end).filter(|range| range.fits(self.num_lines()))
    }

    fn clamp(&self, line: usize) -> usize {
        line.clamp(1, self.num_lines().max(1))
    }
}
