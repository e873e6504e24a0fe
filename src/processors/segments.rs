//! Thresholding a vertical profile into bar segments.

use super::profile::{Profile, runs};
use super::types::BarSegment;

/// Finds the row ranges where `profile` exceeds `threshold` times its maximum.
///
/// Runs shorter than `min_height_ratio * region_height` rows are dropped as
/// noise. Segments come back sorted by `y_start` and never overlap.
///
/// # Arguments
///
/// * `profile` - Vertical profile of the region
/// * `threshold` - Relative activity threshold in `(0, 1)`
/// * `region_height` - Height of the analyzed region
/// * `min_height_ratio` - Minimum segment height as a fraction of `region_height`
pub fn find_segments(
    profile: &Profile,
    threshold: f64,
    region_height: usize,
    min_height_ratio: f64,
) -> Vec<BarSegment> {
    let Some(normalized) = profile.normalized() else {
        return Vec::new();
    };
    let active: Vec<bool> = normalized.iter().map(|&v| v > threshold).collect();
    let min_height = (region_height as f64 * min_height_ratio) as usize;

    runs(&active)
        .into_iter()
        .filter(|run| !run.is_empty() && run.len() >= min_height)
        .map(|run| {
            let intensity = mean(&normalized[run.clone()]);
            BarSegment::new(run.start, run.end, intensity)
        })
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with(len: usize, active: &[(std::ops::Range<usize>, f64)]) -> Profile {
        let mut values = vec![0.0; len];
        for (range, value) in active {
            for v in &mut values[range.clone()] {
                *v = *value;
            }
        }
        Profile::from_values(values)
    }

    #[test]
    fn test_single_run() {
        let profile = profile_with(100, &[(25..75, 6.0)]);
        let segments = find_segments(&profile, 0.15, 100, 0.05);
        assert_eq!(segments.len(), 1);
        assert_eq!((segments[0].y_start, segments[0].y_end), (25, 75));
        assert!((segments[0].intensity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_runs_dropped() {
        let profile = profile_with(200, &[(10..13, 8.0), (50..120, 8.0)]);
        let segments = find_segments(&profile, 0.15, 200, 0.05);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].y_start, 50);
    }

    #[test]
    fn test_threshold_is_relative() {
        let profile = profile_with(100, &[(10..40, 100.0), (60..90, 10.0)]);
        assert_eq!(find_segments(&profile, 0.15, 100, 0.05).len(), 1);
        assert_eq!(find_segments(&profile, 0.05, 100, 0.05).len(), 2);
    }

    #[test]
    fn test_zero_profile() {
        let profile = Profile::from_values(vec![0.0; 50]);
        assert!(find_segments(&profile, 0.15, 50, 0.05).is_empty());
        assert!(find_segments(&Profile::default(), 0.15, 0, 0.05).is_empty());
    }

    #[test]
    fn test_run_touching_end() {
        let profile = profile_with(60, &[(40..60, 3.0)]);
        let segments = find_segments(&profile, 0.15, 60, 0.05);
        assert_eq!((segments[0].y_start, segments[0].y_end), (40, 60));
    }
}
