//! Debug overlays for zones and repetition bars.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::domain::{PageZones, Zone};
use crate::processors::BarSegment;

const HEADER_COLOR: Rgb<u8> = Rgb([220, 0, 0]);
const METADATA_COLOR: Rgb<u8> = Rgb([0, 160, 0]);
const BODY_COLOR: Rgb<u8> = Rgb([0, 0, 220]);
const FOOTER_COLOR: Rgb<u8> = Rgb([200, 0, 200]);
const MARGIN_COLOR: Rgb<u8> = Rgb([255, 140, 0]);

/// Per-column colors for bar segments; internal bars take the next one.
const BAR_COLORS: [Rgb<u8>; 4] = [
    Rgb([255, 0, 0]),
    Rgb([0, 170, 255]),
    Rgb([0, 200, 0]),
    Rgb([255, 0, 255]),
];

/// Outline thickness in pixels.
const THICKNESS: i32 = 3;

/// The page with each detected zone outlined in its own color.
pub fn draw_zone_overlay(page: &RgbImage, zones: &PageZones) -> RgbImage {
    let mut output = page.clone();
    let labelled = [
        (zones.header, HEADER_COLOR),
        (zones.metadata, METADATA_COLOR),
        (zones.body, BODY_COLOR),
        (zones.footer, FOOTER_COLOR),
    ];
    for (zone, color) in labelled {
        if let Some(zone) = zone {
            draw_zone(&mut output, &zone, color);
        }
    }
    output
}

/// The page with the analyzed margin outlined and bar segments filled in.
///
/// Segment rows are relative to `body`; each segment is drawn as a strip
/// whose horizontal offset follows its column.
pub fn draw_bar_overlay(
    page: &RgbImage,
    body: &Zone,
    margin_width: u32,
    segments: &[BarSegment],
) -> RgbImage {
    let mut output = page.clone();
    let (width, height) = page.dimensions();
    let body = body.clamped(width, height);
    let margin = Zone {
        x_end: Some(margin_width.min(width)),
        ..body
    };
    draw_zone(&mut output, &margin, MARGIN_COLOR);

    let strip = (margin_width / 8).max(2);
    for segment in segments {
        let color = BAR_COLORS[segment.column % BAR_COLORS.len()];
        let x = (strip as usize * (segment.column + 1)) as i32;
        let y = body.y_start as i32 + segment.y_start as i32;
        let rect = Rect::at(x, y).of_size(strip / 2, segment.height().max(1) as u32);
        draw_filled_rect_mut(&mut output, rect, color);
    }
    output
}

fn draw_zone(image: &mut RgbImage, zone: &Zone, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    let zone = zone.clamped(width, height);
    let zone_width = zone.x_end.unwrap_or(width) - zone.x_start;
    if zone_width == 0 || zone.height() == 0 {
        return;
    }
    for t in 0..THICKNESS {
        let w = zone_width as i32 - 2 * t;
        let h = zone.height() as i32 - 2 * t;
        if w <= 0 || h <= 0 {
            break;
        }
        let rect = Rect::at(zone.x_start as i32 + t, zone.y_start as i32 + t)
            .of_size(w as u32, h as u32);
        draw_hollow_rect_mut(image, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_page() -> RgbImage {
        RgbImage::from_pixel(200, 300, Rgb([255, 255, 255]))
    }

    #[test]
    fn test_zone_overlay_outlines_zones() {
        let zones = PageZones {
            header: Some(Zone::rows(0, 50)),
            body: Some(Zone::rows(100, 250)),
            ..PageZones::default()
        };
        let output = draw_zone_overlay(&white_page(), &zones);
        assert_eq!(output.get_pixel(0, 0), &HEADER_COLOR);
        assert_eq!(output.get_pixel(100, 100), &BODY_COLOR);
        assert_eq!(output.get_pixel(100, 175), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_bar_overlay_fills_segments() {
        let body = Zone::rows(100, 250);
        let segments = vec![BarSegment::new(10, 60, 1.0)];
        let output = draw_bar_overlay(&white_page(), &body, 40, &segments);
        // strip = 5, column 0 starts at x = 5
        assert_eq!(output.get_pixel(5, 130), &BAR_COLORS[0]);
        assert_eq!(output.get_pixel(5, 170), &Rgb([255, 255, 255]));
        assert_eq!(output.get_pixel(0, 100), &MARGIN_COLOR);
    }
}
