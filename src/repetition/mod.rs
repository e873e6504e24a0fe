//! Repetition-bar detection.
//!
//! [`RepetitionDetector`] turns the left margin of a page into repetition
//! ranges such as `1-4` or `1-2, 3-4, 1-4`. [`LineMapper`] converts bar rows
//! into line numbers, and [`text_lines`] separates lyric lines from OCR
//! debris for both line counting and precise line boxes.

pub mod detector;
pub mod line_mapper;
pub mod text_lines;

pub use detector::{BarAnalysis, BarStrategy, RepetitionDetector};
pub use line_mapper::LineMapper;
pub use text_lines::{count_text_lines, filter_text_lines, precise_line_boundaries};
