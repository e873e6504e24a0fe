//! Interfaces of the external collaborators the pipeline depends on.
//!
//! Rasterization, text recognition, and zone geometry are supplied from
//! outside the core. The library ships [`RuleZoneDetector`] as a zone
//! detector; the `hymn-ocr` binary provides pdfium and tesseract backed
//! implementations of the other two.
//!
//! [`RuleZoneDetector`]: crate::processors::RuleZoneDetector

use std::path::Path;

use image::RgbImage;

use super::HymnResult;
use crate::domain::{OcrLine, PageZones};

/// Produces page images from a PDF document.
pub trait PageRasterizer {
    /// Number of pages in the document.
    fn page_count(&self, pdf: &Path) -> HymnResult<usize>;

    /// Renders pages `first_page..=last_page` (1-indexed) at `dpi`.
    ///
    /// `None` bounds default to the first and last page.
    fn rasterize(
        &self,
        pdf: &Path,
        dpi: u32,
        first_page: Option<usize>,
        last_page: Option<usize>,
    ) -> HymnResult<Vec<RgbImage>>;
}

/// Extracts text from an image region.
///
/// Implementations must be reentrant: the pipeline calls them from several
/// threads at once, one call per region.
pub trait TextRecognizer: Send + Sync {
    /// Plain text of the region.
    fn ocr_text(&self, region: &RgbImage) -> HymnResult<String>;

    /// Text lines of the region with their vertical extent, top to bottom.
    ///
    /// Whitespace-only lines are never returned.
    fn ocr_line_boxes(&self, region: &RgbImage) -> HymnResult<Vec<OcrLine>>;
}

/// Splits a page into header, metadata, body, and footer zones.
pub trait ZoneDetector: Send + Sync {
    /// Zones of `page`, or a cover marker.
    fn detect_zones(&self, page: &RgbImage) -> PageZones;
}
