//! PDF rasterization with PDFium.

use std::path::Path;

use hymn_ocr::core::{HymnError, HymnResult, PageRasterizer};
use image::RgbImage;
use pdfium_render::prelude::*;
use tracing::debug;

/// Renders pages with a PDFium library found at startup.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
    /// Upper bound on either side of a rendered page, in pixels.
    max_dimension: u32,
}

impl PdfiumRasterizer {
    /// Binds to PDFium next to the executable or in the usual system locations.
    pub fn new() -> HymnResult<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/lib"))
            })
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    "/usr/local/lib",
                ))
            })
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    "/opt/homebrew/lib",
                ))
            })
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| HymnError::pdf(format!("could not find the PDFium library: {}", e)))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            max_dimension: 8000,
        })
    }

    fn load<'a>(&'a self, pdf: &Path) -> HymnResult<PdfDocument<'a>> {
        if !is_pdf_path(pdf) {
            return Err(HymnError::invalid_input(format!(
                "{} is not a PDF file",
                pdf.display()
            )));
        }
        self.pdfium
            .load_pdf_from_file(pdf, None)
            .map_err(|e| HymnError::pdf(format!("failed to load {}: {}", pdf.display(), e)))
    }

    fn render_page(&self, page: &PdfPage, dpi: u32) -> HymnResult<RgbImage> {
        // 72 points per inch
        let scale = dpi as f32 / 72.0;
        let mut width_px = (page.width().value * scale) as u32;
        let mut height_px = (page.height().value * scale) as u32;

        let longest = width_px.max(height_px);
        if longest > self.max_dimension {
            let ratio = self.max_dimension as f32 / longest as f32;
            width_px = (width_px as f32 * ratio) as u32;
            height_px = (height_px as f32 * ratio) as u32;
        }

        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px as i32)
            .set_target_height(height_px as i32)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| HymnError::pdf(format!("failed to render page: {}", e)))?;
        Ok(bitmap.as_image().to_rgb8())
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn page_count(&self, pdf: &Path) -> HymnResult<usize> {
        Ok(self.load(pdf)?.pages().len() as usize)
    }

    fn rasterize(
        &self,
        pdf: &Path,
        dpi: u32,
        first_page: Option<usize>,
        last_page: Option<usize>,
    ) -> HymnResult<Vec<RgbImage>> {
        let document = self.load(pdf)?;
        let page_count = document.pages().len() as usize;
        if page_count == 0 {
            return Err(HymnError::pdf(format!("{} has no pages", pdf.display())));
        }
        let first = first_page.unwrap_or(1).max(1);
        let last = last_page.unwrap_or(page_count).min(page_count);

        let mut images = Vec::with_capacity(last.saturating_sub(first) + 1);
        for number in first..=last {
            let index = PdfPageIndex::try_from(number - 1)
                .map_err(|_| HymnError::pdf(format!("page {} out of range", number)))?;
            let page = document
                .pages()
                .get(index)
                .map_err(|e| HymnError::pdf(format!("failed to open page {}: {}", number, e)))?;
            let image = self.render_page(&page, dpi)?;
            debug!(
                page = number,
                width = image.width(),
                height = image.height(),
                "Rendered page"
            );
            images.push(image);
        }
        Ok(images)
    }
}

/// Whether the path has a `.pdf` extension.
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf_path() {
        assert!(is_pdf_path(Path::new("hinario.pdf")));
        assert!(is_pdf_path(Path::new("HINARIO.PDF")));
        assert!(!is_pdf_path(Path::new("hinario.yaml")));
        assert!(!is_pdf_path(Path::new("hinario")));
    }
}
