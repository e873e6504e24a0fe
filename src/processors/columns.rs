//! Per-column analysis of the margin region.
//!
//! Nested bars are drawn side by side, the outer one furthest left. Cutting
//! the margin into vertical strips and profiling each separately keeps the
//! nesting levels apart.

use image::GrayImage;
use image::imageops;

use super::profile::{Profile, ProfileParams, vertical_profile};
use super::segments::find_segments;
use super::types::BarSegment;

/// Profile of one vertical strip of the margin.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    /// Strip index, 0 for the leftmost.
    pub index: usize,
    /// First column of the strip in the margin region.
    pub x_start: u32,
    /// One past the last column.
    pub x_end: u32,
    /// Vertical profile of the strip.
    pub profile: Profile,
}

/// Splits `region` into `num_columns` equal strips and profiles each.
///
/// The last strip absorbs the remainder of the width. Strips without pixels
/// are left out, so fewer than `num_columns` entries may come back.
pub fn analyze_columns(
    region: &GrayImage,
    num_columns: usize,
    params: &ProfileParams,
) -> Vec<ColumnProfile> {
    let (width, height) = region.dimensions();
    if width == 0 || height == 0 || num_columns == 0 {
        return Vec::new();
    }
    let column_width = width / num_columns as u32;

    (0..num_columns)
        .filter_map(|index| {
            let x_start = index as u32 * column_width;
            let x_end = if index + 1 < num_columns {
                x_start + column_width
            } else {
                width
            };
            let strip = imageops::crop_imm(region, x_start, 0, x_end - x_start, height).to_image();
            vertical_profile(&strip, params).map(|profile| ColumnProfile {
                index,
                x_start,
                x_end,
                profile,
            })
        })
        .collect()
}

/// Segments of every strip, tagged with the strip index.
pub fn column_segments(
    columns: &[ColumnProfile],
    threshold: f64,
    min_height_ratio: f64,
) -> Vec<BarSegment> {
    columns
        .iter()
        .flat_map(|column| {
            find_segments(
                &column.profile,
                threshold,
                column.profile.len(),
                min_height_ratio,
            )
            .into_iter()
            .map(move |segment| segment.in_column(column.index))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn margin_with_bars(bars: &[(u32, u32, u32)]) -> GrayImage {
        let mut region = GrayImage::from_pixel(90, 200, Luma([255]));
        for &(x, y_start, y_end) in bars {
            for y in y_start..y_end {
                for dx in 0..5 {
                    region.put_pixel(x + dx, y, Luma([0]));
                }
            }
        }
        region
    }

    #[test]
    fn test_strip_bounds() {
        let region = GrayImage::from_pixel(100, 20, Luma([255]));
        let columns = analyze_columns(&region, 3, &ProfileParams::default());
        let bounds: Vec<_> = columns.iter().map(|c| (c.x_start, c.x_end)).collect();
        assert_eq!(bounds, vec![(0, 33), (33, 66), (66, 100)]);
    }

    #[test]
    fn test_narrow_region_skips_empty_strips() {
        let region = GrayImage::from_pixel(2, 20, Luma([255]));
        let columns = analyze_columns(&region, 3, &ProfileParams::default());
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].index, 2);
    }

    #[test]
    fn test_nested_bars_land_in_separate_columns() {
        // Outer bar in the first strip, two inner bars in the last.
        let region = margin_with_bars(&[(10, 20, 180), (70, 20, 90), (70, 110, 180)]);
        let columns = analyze_columns(&region, 3, &ProfileParams::default());
        let segments = column_segments(&columns, 0.15, 0.05);

        let outer: Vec<_> = segments.iter().filter(|s| s.column == 0).collect();
        let inner: Vec<_> = segments.iter().filter(|s| s.column == 2).collect();
        assert_eq!(outer.len(), 1);
        assert_eq!(inner.len(), 2);
        assert!(segments.iter().all(|s| s.column != 1));
    }
}
