//! Image analysis building blocks.
//!
//! These are the leaf stages of repetition-bar detection (profiles,
//! segments, column strips, gap splitting, per-line counting) plus the
//! rule-based zone detector.

pub mod bar_count;
pub mod columns;
pub mod gaps;
pub mod profile;
pub mod segments;
pub mod types;
pub mod zones;

pub use bar_count::{
    BarCountParams, BarCountPattern, count_bars_per_line, count_peaks, deduce_repetitions,
};
pub use columns::{ColumnProfile, analyze_columns, column_segments};
pub use gaps::{GapParams, SplitLimits, split_is_plausible, split_on_gaps};
pub use profile::{
    MAX_CLOSING_HEIGHT, Profile, ProfileParams, close_vertical, horizontal_profile, runs,
    vertical_profile,
};
pub use segments::find_segments;
pub use types::{BarSegment, LineBoundary};
pub use zones::RuleZoneDetector;
