//! Property-based tests for the repetition-bar building blocks.

use hymn_ocr::core::RepetitionConfig;
use hymn_ocr::processors::{
    BarSegment, LineBoundary, Profile, ProfileParams, find_segments, vertical_profile,
};
use hymn_ocr::repetition::LineMapper;
use image::{GrayImage, Luma};
use proptest::prelude::*;

fn profile_params() -> ProfileParams {
    let config = RepetitionConfig::default();
    ProfileParams {
        edge_threshold: config.edge_threshold,
        closing_height: config.closing_height,
    }
}

/// Sorted, non-overlapping line boxes from (gap, height) pairs.
fn lines_from(shape: &[(i64, i64)]) -> Vec<LineBoundary> {
    let mut y = 0;
    shape
        .iter()
        .map(|&(gap, height)| {
            let top = y + gap;
            y = top + height;
            LineBoundary::new(top, top + height)
        })
        .collect()
}

// ============================================================================
// Segment Finder
// ============================================================================

/// Property: segments are sorted, disjoint, and never empty
#[test]
fn proptest_segments_sorted_and_disjoint() {
    proptest!(|(
        values in prop::collection::vec(0.0f64..100.0, 1..400),
        threshold in 0.01f64..0.99,
        min_ratio in 0.0f64..0.2,
    )| {
        let height = values.len();
        let segments = find_segments(&Profile::from_values(values), threshold, height, min_ratio);
        for segment in &segments {
            prop_assert!(segment.y_start < segment.y_end, "zero-height segment {:?}", segment);
            prop_assert!(segment.y_end <= height);
        }
        for pair in segments.windows(2) {
            prop_assert!(pair[0].y_start < pair[1].y_start, "segments out of order");
            prop_assert!(pair[0].y_end <= pair[1].y_start, "segments overlap");
        }
    });
}

/// Property: a flat profile never produces segments
#[test]
fn proptest_flat_zero_profile_is_empty() {
    proptest!(|(len in 0usize..300, threshold in 0.01f64..0.99)| {
        let segments = find_segments(&Profile::from_values(vec![0.0; len]), threshold, len, 0.05);
        prop_assert!(segments.is_empty());
    });
}

// ============================================================================
// Profile Engine
// ============================================================================

/// Property: profiling the same region twice gives identical results
#[test]
fn proptest_profile_idempotent() {
    proptest!(ProptestConfig::with_cases(32), |(
        width in 4u32..40,
        height in 4u32..120,
        bars in prop::collection::vec((0u32..40, 0u32..120, 1u32..60), 0..4),
    )| {
        let mut region = GrayImage::from_pixel(width, height, Luma([255]));
        for (x, y, len) in bars {
            for yy in y..(y + len).min(height) {
                for xx in x.min(width - 1)..(x + 3).min(width) {
                    region.put_pixel(xx, yy, Luma([0]));
                }
            }
        }
        let params = profile_params();
        let first = vertical_profile(&region, &params);
        let second = vertical_profile(&region, &params);
        prop_assert_eq!(first, second);
    });
}

// ============================================================================
// Line Mapper
// ============================================================================

/// Property: precise mapping is monotone in y
#[test]
fn proptest_precise_mapping_monotone() {
    proptest!(|(
        shape in prop::collection::vec((0i64..40, 5i64..80), 1..12),
        y1 in -200i64..2000,
        delta in 0i64..500,
    )| {
        let lines = lines_from(&shape);
        let mapper = LineMapper::Precise { lines: &lines };
        let y2 = y1 + delta;
        prop_assert!(mapper.map_start(y1) <= mapper.map_start(y2));
        prop_assert!(mapper.map_end(y1) <= mapper.map_end(y2));
    });
}

/// Property: estimated mapping is monotone in y
#[test]
fn proptest_estimated_mapping_monotone() {
    proptest!(|(
        bar in (0usize..500, 10usize..500),
        num_lines in 1usize..20,
        y1 in -200i64..2000,
        delta in 0i64..500,
    )| {
        let config = RepetitionConfig::default();
        let segments = [BarSegment::new(bar.0, bar.0 + bar.1, 1.0)];
        let mapper = LineMapper::estimated(&segments, num_lines, 1000, &config);
        let y2 = y1 + delta;
        prop_assert!(mapper.map_start(y1) <= mapper.map_start(y2));
        prop_assert!(mapper.map_end(y1) <= mapper.map_end(y2));
    });
}

/// Property: every mapped line lies in [1, num_lines]
#[test]
fn proptest_mapping_clamped() {
    proptest!(|(
        shape in prop::collection::vec((0i64..40, 5i64..80), 0..12),
        num_lines in 0usize..20,
        y in prop::num::i64::ANY.prop_map(|v| v % 1_000_000),
    )| {
        let config = RepetitionConfig::default();
        let lines = lines_from(&shape);
        let precise = LineMapper::Precise { lines: &lines };
        let segments = [BarSegment::new(100, 400, 1.0)];
        let estimated = LineMapper::estimated(&segments, num_lines, 1000, &config);

        for mapper in [&precise, &estimated] {
            let upper = mapper.num_lines().max(1);
            for line in [mapper.map_start(y), mapper.map_end(y)] {
                prop_assert!((1..=upper).contains(&line), "line {} outside 1..={}", line, upper);
            }
        }
    });
}

/// Property: mapped ranges are well formed and fit the page
#[test]
fn proptest_mapped_ranges_fit() {
    proptest!(|(
        shape in prop::collection::vec((0i64..40, 5i64..80), 2..12),
        start in 0usize..800,
        len in 1usize..800,
    )| {
        let lines = lines_from(&shape);
        let mapper = LineMapper::Precise { lines: &lines };
        if let Some(range) = mapper.map_segment(&BarSegment::new(start, start + len, 1.0)) {
            prop_assert!(range.start >= 1);
            prop_assert!(range.start <= range.end);
            prop_assert!(range.end <= lines.len());
        }
    });
}
