//! Cropping of page zones.

use image::{RgbImage, imageops};

use crate::domain::Zone;

/// Copies `zone` out of `page`.
///
/// The zone is clamped to the page first. Returns `None` when the clamped
/// zone is narrower or shorter than `min_size` pixels.
pub fn crop_zone(page: &RgbImage, zone: &Zone, min_size: u32) -> Option<RgbImage> {
    let (width, height) = page.dimensions();
    let zone = zone.clamped(width, height);
    let zone_width = zone.x_end.unwrap_or(width) - zone.x_start;
    if zone.height() < min_size.max(1) || zone_width < min_size.max(1) {
        return None;
    }
    Some(imageops::crop_imm(page, zone.x_start, zone.y_start, zone_width, zone.height()).to_image())
}
