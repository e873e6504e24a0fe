//! Value types produced while analyzing the bar margin.

use serde::{Deserialize, Serialize};

/// A contiguous row range of the margin region where a bar was detected.
///
/// Coordinates are relative to the margin region (and therefore to the body
/// zone), `y_start` inclusive and `y_end` exclusive, with `y_start < y_end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarSegment {
    /// First row of the bar.
    pub y_start: usize,
    /// One past the last row of the bar.
    pub y_end: usize,
    /// Mean normalized profile value over the rows.
    pub intensity: f64,
    /// Column strip that produced it; 0 is the leftmost (outermost) strip.
    pub column: usize,
    /// Whether the segment came out of a gap split.
    pub is_internal: bool,
}

impl BarSegment {
    /// A directly detected segment in column 0.
    pub fn new(y_start: usize, y_end: usize, intensity: f64) -> Self {
        Self {
            y_start,
            y_end,
            intensity,
            column: 0,
            is_internal: false,
        }
    }

    /// Number of rows covered.
    pub fn height(&self) -> usize {
        self.y_end - self.y_start
    }

    /// Same segment tagged with another column.
    pub fn in_column(mut self, column: usize) -> Self {
        self.column = column;
        self
    }
}

/// Vertical extent of one text line, in body-zone pixel coordinates.
///
/// The 1-indexed position of a boundary in its sorted list is the line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineBoundary {
    /// Top row.
    pub y_min: i64,
    /// Bottom row.
    pub y_max: i64,
}

impl LineBoundary {
    /// Creates a boundary from its top and bottom rows.
    pub fn new(y_min: i64, y_max: i64) -> Self {
        Self { y_min, y_max }
    }

    /// Vertical midpoint.
    pub fn center(&self) -> f64 {
        (self.y_min + self.y_max) as f64 / 2.0
    }

    /// Line height in pixels.
    pub fn height(&self) -> i64 {
        self.y_max - self.y_min
    }
}
