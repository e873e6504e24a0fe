//! Splitting one tall segment at intensity valleys.
//!
//! Where an inner bar overlaps the outer one, both strokes add edge energy,
//! so rows covered by the outer bar alone show up as valleys inside a single
//! tall segment. Cutting at those valleys recovers the inner bars.

use super::profile::{Profile, runs};
use super::segments::mean;
use super::types::BarSegment;

/// Parameters of [`split_on_gaps`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapParams {
    /// Valley level relative to the segment's own maximum.
    pub gap_threshold: f64,
    /// Minimum valley height, and minimum piece height before filtering.
    pub min_gap_height: usize,
    /// Minimum internal piece height as a fraction of the segment height.
    pub min_internal_ratio: f64,
    /// Minimum internal piece height in pixels.
    pub min_internal_px: usize,
}

/// Sanity limits applied to a split before it is trusted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitLimits {
    /// Number of lines the unsplit segment is assumed to cover.
    pub assumed_segment_lines: f64,
    /// Minimum estimated line coverage of every internal piece.
    pub min_line_coverage: f64,
    /// Minimum height ratio when exactly two internal pieces exist.
    pub min_height_ratio: f64,
}

/// Splits `segment` at valleys of `profile` (the full region profile).
///
/// On success the result holds at least two internal pieces (`is_internal`,
/// one column to the right of the segment) followed by the original segment
/// as the external bar. Otherwise the segment comes back alone and unchanged.
pub fn split_on_gaps(
    profile: &Profile,
    segment: &BarSegment,
    params: &GapParams,
) -> Vec<BarSegment> {
    let unsplit = vec![*segment];
    let seg_profile = profile.slice(segment.y_start..segment.y_end);
    let len = seg_profile.len();
    let min_gap = params.min_gap_height;

    if len < min_gap * 3 {
        return unsplit;
    }
    let Some(normalized) = seg_profile.normalized() else {
        return unsplit;
    };

    let is_valley: Vec<bool> = normalized.iter().map(|&v| v < params.gap_threshold).collect();
    let valleys: Vec<_> = runs(&is_valley)
        .into_iter()
        .filter(|valley| valley.len() >= min_gap)
        .collect();
    if valleys.is_empty() {
        return unsplit;
    }

    let mut pieces = Vec::new();
    let mut prev_end = 0;
    for valley in &valleys {
        if valley.start - prev_end >= min_gap {
            pieces.push(prev_end..valley.start);
        }
        prev_end = valley.end;
    }
    if len - prev_end >= min_gap {
        pieces.push(prev_end..len);
    }

    let min_internal = params
        .min_internal_px
        .max((len as f64 * params.min_internal_ratio) as usize);
    let mut result: Vec<BarSegment> = pieces
        .into_iter()
        .filter(|piece| piece.len() >= min_internal)
        .map(|piece| BarSegment {
            y_start: segment.y_start + piece.start,
            y_end: segment.y_start + piece.end,
            intensity: mean(&normalized[piece]),
            column: segment.column + 1,
            is_internal: true,
        })
        .collect();

    if result.len() < 2 {
        return unsplit;
    }
    result.push(BarSegment {
        is_internal: false,
        ..*segment
    });
    result
}

/// Whether a split produced by [`split_on_gaps`] looks like real nesting.
///
/// Needs at least two internal pieces, each covering enough estimated lines.
/// With exactly two pieces their heights must also be comparable.
pub fn split_is_plausible(
    split: &[BarSegment],
    original: &BarSegment,
    limits: &SplitLimits,
) -> bool {
    let internal: Vec<&BarSegment> = split.iter().filter(|s| s.is_internal).collect();
    if internal.len() < 2 {
        return false;
    }
    let original_height = original.height() as f64;
    if original_height <= 0.0 {
        return false;
    }

    let covers_enough = internal.iter().all(|piece| {
        let lines = piece.height() as f64 / original_height * limits.assumed_segment_lines;
        lines >= limits.min_line_coverage
    });
    if !covers_enough {
        return false;
    }

    if let [a, b] = internal.as_slice() {
        let (low, high) = if a.height() <= b.height() {
            (a.height(), b.height())
        } else {
            (b.height(), a.height())
        };
        let ratio = if high > 0 { low as f64 / high as f64 } else { 0.0 };
        if ratio < limits.min_height_ratio {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GapParams {
        GapParams {
            gap_threshold: 0.5,
            min_gap_height: 10,
            min_internal_ratio: 0.15,
            min_internal_px: 20,
        }
    }

    fn limits() -> SplitLimits {
        SplitLimits {
            assumed_segment_lines: 4.0,
            min_line_coverage: 1.5,
            min_height_ratio: 0.5,
        }
    }

    /// Profile of 800 rows, active 40..760 at `high`, with `valleys` at `low`.
    fn nested_profile(valleys: &[std::ops::Range<usize>]) -> Profile {
        let mut values = vec![0.0; 800];
        for v in &mut values[40..760] {
            *v = 10.0;
        }
        for valley in valleys {
            for v in &mut values[valley.clone()] {
                *v = 2.0;
            }
        }
        Profile::from_values(values)
    }

    #[test]
    fn test_split_at_midpoint_valley() {
        let profile = nested_profile(&[380..420]);
        let segment = BarSegment::new(40, 760, 0.9);
        let split = split_on_gaps(&profile, &segment, &params());

        assert_eq!(split.len(), 3);
        assert_eq!((split[0].y_start, split[0].y_end), (40, 380));
        assert_eq!((split[1].y_start, split[1].y_end), (420, 760));
        assert!(split[0].is_internal && split[1].is_internal);
        assert_eq!(split[0].column, 1);
        let external = split[2];
        assert!(!external.is_internal);
        assert_eq!((external.y_start, external.y_end, external.column), (40, 760, 0));
        assert!(split_is_plausible(&split, &segment, &limits()));
    }

    #[test]
    fn test_no_valley_returns_original() {
        let profile = nested_profile(&[]);
        let segment = BarSegment::new(40, 760, 1.0);
        assert_eq!(split_on_gaps(&profile, &segment, &params()), vec![segment]);
    }

    #[test]
    fn test_short_valley_ignored() {
        let profile = nested_profile(&[400..405]);
        let segment = BarSegment::new(40, 760, 1.0);
        assert_eq!(split_on_gaps(&profile, &segment, &params()).len(), 1);
    }

    #[test]
    fn test_short_segment_not_split() {
        let profile = nested_profile(&[]);
        let segment = BarSegment::new(40, 65, 1.0);
        assert_eq!(split_on_gaps(&profile, &segment, &params()).len(), 1);
    }

    #[test]
    fn test_tiny_piece_filtered() {
        // The lower piece is shorter than 15% of the segment.
        let profile = nested_profile(&[620..700]);
        let segment = BarSegment::new(40, 760, 1.0);
        assert_eq!(split_on_gaps(&profile, &segment, &params()).len(), 1);
    }

    #[test]
    fn test_unbalanced_split_rejected() {
        let profile = nested_profile(&[500..540]);
        let segment = BarSegment::new(40, 760, 1.0);
        let split = split_on_gaps(&profile, &segment, &params());
        assert_eq!(split.len(), 3);
        // The lower piece covers under 1.5 of the assumed 4 lines.
        assert!(!split_is_plausible(&split, &segment, &limits()));
    }

    #[test]
    fn test_height_ratio_check() {
        let original = BarSegment::new(0, 400, 1.0);
        let piece = |y_start, y_end| BarSegment {
            is_internal: true,
            ..BarSegment::new(y_start, y_end, 1.0)
        };
        let limits = SplitLimits {
            assumed_segment_lines: 8.0,
            ..limits()
        };
        let uneven = [piece(0, 100), piece(120, 400), original];
        assert!(!split_is_plausible(&uneven, &original, &limits));
        let even = [piece(0, 180), piece(220, 400), original];
        assert!(split_is_plausible(&even, &original, &limits));
    }

    #[test]
    fn test_unsplit_is_not_plausible() {
        let segment = BarSegment::new(0, 100, 1.0);
        assert!(!split_is_plausible(&[segment], &segment, &limits()));
    }
}
