//! Projection profiles of margin regions.
//!
//! A vertical profile holds one edge-energy value per row and is what bar
//! segments are cut from. A horizontal profile holds one ink count per
//! column and is used to count bar strokes crossing a single text line.

use std::ops::Range;

use image::{GrayImage, Luma};
use imageproc::filter::separable_filter_equal;
use imageproc::gradients::horizontal_sobel;
use imageproc::morphology::{Mask, grayscale_close};

/// Parameters of the vertical edge profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileParams {
    /// Gradient magnitude (0-255) above which a pixel is an edge.
    pub edge_threshold: u8,
    /// Height of the vertical closing kernel.
    pub closing_height: u32,
}

impl Default for ProfileParams {
    fn default() -> Self {
        Self {
            edge_threshold: 20,
            closing_height: 5,
        }
    }
}

/// A 1-D sequence of non-negative values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Profile {
    values: Vec<f64>,
}

impl Profile {
    /// Wraps raw values.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// The values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the profile is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest value, 0 for an empty profile.
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Values divided by the profile's own maximum.
    ///
    /// Returns `None` when the maximum is zero.
    pub fn normalized(&self) -> Option<Vec<f64>> {
        let max = self.max();
        if max <= 0.0 {
            return None;
        }
        Some(self.values.iter().map(|v| v / max).collect())
    }

    /// A copy of `range`, clipped to the profile.
    pub fn slice(&self, range: Range<usize>) -> Profile {
        let end = range.end.min(self.values.len());
        let start = range.start.min(end);
        Profile::from_values(self.values[start..end].to_vec())
    }
}

/// Computes the vertical edge profile of a grayscale region.
///
/// The region is blurred with a 3x3 binomial kernel, differentiated with a
/// horizontal Sobel operator, binarized on the absolute gradient, closed
/// vertically, and each row's edge pixels are counted.
///
/// # Returns
///
/// `None` when the region has no pixels.
pub fn vertical_profile(region: &GrayImage, params: &ProfileParams) -> Option<Profile> {
    let (width, height) = region.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let blurred: GrayImage = separable_filter_equal(region, &[0.25f32, 0.5, 0.25]);
    let gradient = horizontal_sobel(&blurred);

    let mut edges = GrayImage::new(width, height);
    for (x, y, pixel) in gradient.enumerate_pixels() {
        let magnitude = pixel[0].unsigned_abs().min(u8::MAX as u16) as u8;
        if magnitude > params.edge_threshold {
            edges.put_pixel(x, y, Luma([255]));
        }
    }

    let closed = close_vertical(&edges, params.closing_height);
    let values = (0..height)
        .map(|y| (0..width).filter(|&x| closed.get_pixel(x, y)[0] > 0).count() as f64)
        .collect();
    Some(Profile::from_values(values))
}

/// Largest structuring element height imageproc masks accept.
pub const MAX_CLOSING_HEIGHT: u32 = 511;

/// Closes `mask` with a `1 x height` column, bridging short vertical gaps.
///
/// Heights of 0 or 1 leave the mask unchanged; heights above
/// [`MAX_CLOSING_HEIGHT`] are capped.
pub fn close_vertical(mask: &GrayImage, height: u32) -> GrayImage {
    if height <= 1 {
        return mask.clone();
    }
    let height = height.min(MAX_CLOSING_HEIGHT);
    let kernel = GrayImage::from_pixel(1, height, Luma([255]));
    let column = Mask::from_image(&kernel, 0, ((height - 1) / 2) as u8);
    grayscale_close(mask, &column)
}

/// Counts, per column, the pixels at or below `dark_threshold`.
///
/// Bars are dark strokes, so columns crossing a bar score high.
pub fn horizontal_profile(slice: &GrayImage, dark_threshold: u8) -> Profile {
    let (width, height) = slice.dimensions();
    let values = (0..width)
        .map(|x| {
            (0..height)
                .filter(|&y| slice.get_pixel(x, y)[0] <= dark_threshold)
                .count() as f64
        })
        .collect();
    Profile::from_values(values)
}

/// Maximal runs of `true` in `mask`, in order.
pub fn runs(mask: &[bool]) -> Vec<Range<usize>> {
    let mut result = Vec::new();
    let mut start = None;
    for (i, &active) in mask.iter().enumerate() {
        match (active, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                result.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        result.push(s..mask.len());
    }
    result
}
