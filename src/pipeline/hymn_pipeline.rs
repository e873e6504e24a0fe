//! Page-level conversion: from page images to [`PageData`] and hymns.
//!
//! [`HymnPipeline`] ties the collaborators together. Zones come from a
//! [`ZoneDetector`], text from a [`TextRecognizer`], and repetition ranges
//! from the [`RepetitionDetector`]. Pages are independent, so larger
//! documents are processed on the rayon pool.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use image::RgbImage;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::merger::merge_multipage_hymns;
use super::parser::{
    clean_body_text, clean_ocr_text, has_date_pattern, has_header_pattern, parse_date,
    parse_header, parse_metadata,
};
use crate::core::{
    ConfigValidator, HymnError, HymnResult, PageRasterizer, PipelineConfig, TextRecognizer,
    ZoneDetector,
};
use crate::domain::{HymnBook, PageData, PageType, PageZones, Repetitions, Zone};
use crate::processors::RuleZoneDetector;
use crate::repetition::{RepetitionDetector, precise_line_boundaries};
use crate::utils::crop_zone;

/// Zones narrower or shorter than this are not sent to the recognizer.
const MIN_ZONE_SIZE: u32 = 10;

/// Text longer than this without a closing date is a continuation.
const CONTINUATION_MIN_CHARS: usize = 50;

/// Progress callback, called with `(pages done, total pages)`.
pub type ProgressFn<'a> = &'a (dyn Fn(usize, usize) + Sync);

/// Classifies a page from its recognized text and detected zones.
///
/// A leading `NN. ` header marks a new hymn. Longer text without a
/// `(dd/mm/yyyy)` date is a continuation. Otherwise the zones decide: a
/// header zone means a new hymn, a body alone a continuation, and nothing
/// at all a blank page.
pub fn classify_page(text: &str, zones: &PageZones) -> PageType {
    if zones.is_cover {
        return PageType::Cover;
    }
    if !text.is_empty() {
        if has_header_pattern(text) {
            return PageType::NewHymn;
        }
        if !has_date_pattern(text) && text.trim().chars().count() > CONTINUATION_MIN_CHARS {
            return PageType::Continuation;
        }
    }
    match (&zones.header, &zones.body) {
        (Some(_), _) => PageType::NewHymn,
        (None, Some(_)) => PageType::Continuation,
        (None, None) => PageType::Blank,
    }
}

/// Converts page images into page results and hymn books.
///
/// Build one with [`HymnPipelineBuilder`].
pub struct HymnPipeline {
    recognizer: Arc<dyn TextRecognizer>,
    zone_detector: Arc<dyn ZoneDetector>,
    detector: RepetitionDetector,
    config: PipelineConfig,
}

impl std::fmt::Debug for HymnPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HymnPipeline")
            .field("detector", &self.detector)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HymnPipeline {
    /// The pipeline's configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The repetition detector used for page bodies.
    pub fn repetition_detector(&self) -> &RepetitionDetector {
        &self.detector
    }

    /// The zone detector used for pages.
    pub fn zone_detector(&self) -> &dyn ZoneDetector {
        self.zone_detector.as_ref()
    }

    /// Extracts everything from one page image.
    ///
    /// # Arguments
    ///
    /// * `page` - The rendered page
    /// * `page_number` - 1-indexed page number, recorded in the result
    ///
    /// # Errors
    ///
    /// Fails when the recognizer fails on any zone.
    pub fn process_page(&self, page: &RgbImage, page_number: usize) -> HymnResult<PageData> {
        let zones = self.zone_detector.detect_zones(page);
        if zones.is_cover {
            debug!(page = page_number, "Cover page");
            return Ok(PageData::new(page_number, PageType::Cover));
        }

        let header_text = self.ocr_zone(page, zones.header.as_ref())?;
        let metadata_text = self.ocr_zone(page, zones.metadata.as_ref())?;
        let body_text = self.ocr_zone(page, zones.body.as_ref())?;
        let footer_text = self.ocr_zone(page, zones.footer.as_ref())?;

        let full_text = [&header_text, &metadata_text, &body_text, &footer_text]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        let page_type = classify_page(&full_text, &zones);

        let mut data = PageData::new(page_number, page_type);
        data.body_text = body_text
            .as_deref()
            .map(clean_body_text)
            .filter(|text| !text.is_empty());

        if page_type == PageType::NewHymn
            && let Some(header) = header_text.as_deref()
        {
            if let Some(parsed) = parse_header(header) {
                data.hymn_number = Some(parsed.number);
                data.hymn_title = Some(parsed.title);
                data.original_number = parsed.original_number;
            }
            if let Some(metadata) = metadata_text.as_deref() {
                let parsed = parse_metadata(metadata);
                data.offered_to = parsed.offered_to;
                data.style = parsed.style;
                data.extra_instructions = parsed.extra_instructions;
            }
        }
        data.received_at = footer_text.as_deref().and_then(parse_date);

        if let Some(body) = zones.body.as_ref()
            && let Some(text) = data.body_text.as_deref()
        {
            data.repetitions = self.detect_repetitions(page, body, text)?;
        }

        data.header_text = header_text;
        data.metadata_text = metadata_text;
        data.footer_text = footer_text;

        debug!(
            page = page_number,
            page_type = %data.page_type,
            repetitions = ?data.repetitions.as_ref().map(|r| r.to_string()),
            "Processed page"
        );
        Ok(data)
    }

    /// Processes a batch of pages numbered from `first_page_number`.
    ///
    /// Batches above the parallel policy's threshold run on the rayon pool.
    /// A page that fails is logged and recorded as blank, so one bad page
    /// never loses the document. Results are in page order.
    pub fn process_pages(
        &self,
        pages: &[RgbImage],
        first_page_number: usize,
        progress: Option<ProgressFn<'_>>,
    ) -> Vec<PageData> {
        let total = pages.len();
        let done = AtomicUsize::new(0);
        let run = |(index, page): (usize, &RgbImage)| {
            let page_number = first_page_number + index;
            let data = self
                .process_page(page, page_number)
                .unwrap_or_else(|err| {
                    warn!(
                        page = page_number,
                        error = %err,
                        "Page processing failed; treating page as blank"
                    );
                    PageData::new(page_number, PageType::Blank)
                });
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(progress) = progress {
                progress(finished, total);
            }
            data
        };

        if self.config.parallel.should_parallelize(total) {
            debug!(pages = total, "Processing pages in parallel");
            pages.par_iter().enumerate().map(run).collect()
        } else {
            pages.iter().enumerate().map(run).collect()
        }
    }

    /// Rasterizes pages `first_page..=last_page` of a PDF and processes them.
    ///
    /// Bounds are 1-indexed and default to the whole document.
    pub fn process_pdf(
        &self,
        rasterizer: &dyn PageRasterizer,
        pdf: &Path,
        first_page: Option<usize>,
        last_page: Option<usize>,
        progress: Option<ProgressFn<'_>>,
    ) -> HymnResult<Vec<PageData>> {
        let page_count = rasterizer.page_count(pdf)?;
        let start = first_page.unwrap_or(1);
        let end = last_page.unwrap_or(page_count).min(page_count);
        if start == 0 || start > end {
            return Err(HymnError::invalid_input(format!(
                "page range {}-{} is outside 1-{}",
                start, end, page_count
            )));
        }

        let started = Instant::now();
        let images = rasterizer.rasterize(pdf, self.config.dpi, Some(start), Some(end))?;
        info!(
            pages = images.len(),
            dpi = self.config.dpi,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rasterized PDF"
        );

        let started = Instant::now();
        let pages = self.process_pages(&images, start, progress);
        info!(
            pages = pages.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Processed pages"
        );
        Ok(pages)
    }

    fn ocr_zone(&self, page: &RgbImage, zone: Option<&Zone>) -> HymnResult<Option<String>> {
        let Some(region) = zone.and_then(|zone| crop_zone(page, zone, MIN_ZONE_SIZE)) else {
            return Ok(None);
        };
        let text = clean_ocr_text(&self.recognizer.ocr_text(&region)?);
        Ok((!text.is_empty()).then_some(text))
    }

    fn detect_repetitions(
        &self,
        page: &RgbImage,
        body: &Zone,
        body_text: &str,
    ) -> HymnResult<Option<Repetitions>> {
        let Some(region) = crop_zone(page, body, MIN_ZONE_SIZE) else {
            return Ok(None);
        };
        let lines = self.recognizer.ocr_line_boxes(&region)?;
        let precise = precise_line_boundaries(&lines);
        Ok(self
            .detector
            .detect(page, Some(body), body_text, &precise))
    }
}

/// Assembles a hymn book from processed pages.
pub fn create_hymnbook(
    pages: &[PageData],
    name: &str,
    owner_name: &str,
    intro_name: Option<&str>,
) -> HymnResult<HymnBook> {
    let hymns = merge_multipage_hymns(pages);
    info!(
        pages = pages.len(),
        hymns = hymns.len(),
        "Merged pages into hymns"
    );
    let mut book = HymnBook::new(name, owner_name, hymns)?;
    book.intro_name = intro_name
        .map(str::trim)
        .filter(|intro| !intro.is_empty())
        .map(str::to_string);
    Ok(book)
}

/// Builder for [`HymnPipeline`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use hymn_ocr::core::{HymnResult, TextRecognizer};
/// use hymn_ocr::domain::OcrLine;
/// use hymn_ocr::pipeline::HymnPipelineBuilder;
///
/// struct Recognizer;
///
/// impl TextRecognizer for Recognizer {
///     fn ocr_text(&self, _: &image::RgbImage) -> HymnResult<String> {
///         Ok(String::new())
///     }
///     fn ocr_line_boxes(&self, _: &image::RgbImage) -> HymnResult<Vec<OcrLine>> {
///         Ok(Vec::new())
///     }
/// }
///
/// let pipeline = HymnPipelineBuilder::new(Arc::new(Recognizer))
///     .build()
///     .expect("default configuration is valid");
/// ```
pub struct HymnPipelineBuilder {
    recognizer: Arc<dyn TextRecognizer>,
    zone_detector: Option<Arc<dyn ZoneDetector>>,
    config: PipelineConfig,
}

impl HymnPipelineBuilder {
    /// Starts a builder around a text recognizer.
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            recognizer,
            zone_detector: None,
            config: PipelineConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a custom zone detector instead of [`RuleZoneDetector`].
    pub fn zone_detector(mut self, detector: Arc<dyn ZoneDetector>) -> Self {
        self.zone_detector = Some(detector);
        self
    }

    /// Sets the rasterization resolution.
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    /// Caps the number of threads used for parallel pages.
    pub fn max_threads(mut self, max_threads: Option<usize>) -> Self {
        self.config.parallel = self.config.parallel.with_max_threads(max_threads);
        self
    }

    /// Validates the configuration and builds the pipeline.
    pub fn build(self) -> HymnResult<HymnPipeline> {
        self.config.validate()?;
        let zone_detector = self
            .zone_detector
            .unwrap_or_else(|| Arc::new(RuleZoneDetector::new(self.config.zones.clone())));
        Ok(HymnPipeline {
            recognizer: self.recognizer,
            zone_detector,
            detector: RepetitionDetector::new(self.config.repetition.clone()),
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OcrLine;
    use image::Rgb;
    use std::sync::Mutex;

    /// Answers by zone height: tall regions are bodies, short ones headers.
    struct ScriptedRecognizer {
        header: String,
        metadata: String,
        body: String,
        footer: String,
        fail: bool,
    }

    impl ScriptedRecognizer {
        fn new_hymn() -> Self {
            Self {
                header: "07. Estrela Brilhante (603)".to_string(),
                metadata: "Ofertado a Maria - Valsa".to_string(),
                body: "Linha um do hino\nLinha dois do hino\n\nLinha três\n12".to_string(),
                footer: "(18/01/2020)".to_string(),
                fail: false,
            }
        }
    }

    impl TextRecognizer for ScriptedRecognizer {
        fn ocr_text(&self, region: &RgbImage) -> HymnResult<String> {
            if self.fail {
                return Err(HymnError::ocr("scripted", "engine crashed"));
            }
            let text = match region.height() {
                h if h == HEADER_H => &self.header,
                h if h == METADATA_H => &self.metadata,
                h if h == BODY_H => &self.body,
                _ => &self.footer,
            };
            Ok(text.clone())
        }

        fn ocr_line_boxes(&self, _region: &RgbImage) -> HymnResult<Vec<OcrLine>> {
            Ok(Vec::new())
        }
    }

    const HEADER_H: u32 = 40;
    const METADATA_H: u32 = 30;
    const BODY_H: u32 = 300;

    struct FixedZones(PageZones);

    impl ZoneDetector for FixedZones {
        fn detect_zones(&self, _page: &RgbImage) -> PageZones {
            self.0.clone()
        }
    }

    fn hymn_zones() -> PageZones {
        PageZones {
            header: Some(Zone::rows(0, HEADER_H)),
            metadata: Some(Zone::rows(HEADER_H, HEADER_H + METADATA_H)),
            body: Some(Zone::rows(100, 100 + BODY_H)),
            footer: Some(Zone::rows(420, 470)),
            is_cover: false,
        }
    }

    fn page() -> RgbImage {
        RgbImage::from_pixel(400, 500, Rgb([255, 255, 255]))
    }

    fn pipeline(recognizer: ScriptedRecognizer, zones: PageZones) -> HymnPipeline {
        HymnPipelineBuilder::new(Arc::new(recognizer))
            .zone_detector(Arc::new(FixedZones(zones)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_classify_page() {
        let zones = hymn_zones();
        assert_eq!(classify_page("12. Título", &zones), PageType::NewHymn);
        let long = "a".repeat(60);
        assert_eq!(classify_page(&long, &PageZones::default()), PageType::Continuation);
        let dated = format!("{} (18/01/2020)", long);
        assert_eq!(
            classify_page(&dated, &PageZones::default()),
            PageType::Blank
        );
        let body_only = PageZones {
            body: Some(Zone::rows(0, 10)),
            ..PageZones::default()
        };
        assert_eq!(classify_page("curto", &body_only), PageType::Continuation);
        assert_eq!(classify_page("", &zones), PageType::NewHymn);
        assert_eq!(classify_page("", &PageZones::cover()), PageType::Cover);
    }

    #[test]
    fn test_process_new_hymn_page() {
        let pipeline = pipeline(ScriptedRecognizer::new_hymn(), hymn_zones());
        let data = pipeline.process_page(&page(), 3).unwrap();
        assert_eq!(data.page_number, 3);
        assert_eq!(data.page_type, PageType::NewHymn);
        assert_eq!(data.hymn_number, Some(7));
        assert_eq!(data.hymn_title.as_deref(), Some("Estrela Brilhante"));
        assert_eq!(data.original_number, Some(63));
        assert_eq!(data.offered_to.as_deref(), Some("Maria"));
        assert_eq!(data.style.as_deref(), Some("Valsa"));
        assert_eq!(data.received_at.as_deref(), Some("2020-01-18"));
        assert_eq!(
            data.body_text.as_deref(),
            Some("Linha um do hino\nLinha dois do hino\n\nLinha três")
        );
        // blank page margin, no bars
        assert_eq!(data.repetitions, None);
    }

    #[test]
    fn test_cover_page_short_circuits() {
        let pipeline = pipeline(ScriptedRecognizer::new_hymn(), PageZones::cover());
        let data = pipeline.process_page(&page(), 1).unwrap();
        assert_eq!(data, PageData::new(1, PageType::Cover));
    }

    #[test]
    fn test_failing_page_becomes_blank() {
        let mut recognizer = ScriptedRecognizer::new_hymn();
        recognizer.fail = true;
        let pipeline = pipeline(recognizer, hymn_zones());
        assert!(pipeline.process_page(&page(), 1).is_err());

        let pages = pipeline.process_pages(&[page(), page()], 5, None);
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|p| p.page_type == PageType::Blank));
        assert_eq!(pages[1].page_number, 6);
    }

    #[test]
    fn test_process_pages_parallel_keeps_order_and_reports_progress() {
        let pipeline = pipeline(ScriptedRecognizer::new_hymn(), hymn_zones());
        let images = vec![page(); 6];
        let seen = Mutex::new(Vec::new());
        let progress = |done: usize, total: usize| {
            seen.lock().unwrap().push((done, total));
        };
        let callback: ProgressFn<'_> = &progress;
        let pages = pipeline.process_pages(&images, 1, Some(callback));
        let numbers: Vec<usize> = pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen.last(), Some(&(6, 6)));
        assert_eq!(seen.len(), 6);
    }

    struct FakeRasterizer {
        pages: usize,
    }

    impl PageRasterizer for FakeRasterizer {
        fn page_count(&self, _pdf: &Path) -> HymnResult<usize> {
            Ok(self.pages)
        }

        fn rasterize(
            &self,
            _pdf: &Path,
            _dpi: u32,
            first_page: Option<usize>,
            last_page: Option<usize>,
        ) -> HymnResult<Vec<RgbImage>> {
            let first = first_page.unwrap_or(1);
            let last = last_page.unwrap_or(self.pages);
            Ok((first..=last).map(|_| page()).collect())
        }
    }

    #[test]
    fn test_process_pdf_page_range() {
        let pipeline = pipeline(ScriptedRecognizer::new_hymn(), hymn_zones());
        let rasterizer = FakeRasterizer { pages: 10 };
        let pdf = Path::new("book.pdf");

        let pages = pipeline
            .process_pdf(&rasterizer, pdf, Some(2), Some(4), None)
            .unwrap();
        let numbers: Vec<usize> = pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![2, 3, 4]);

        let all = pipeline
            .process_pdf(&rasterizer, pdf, None, Some(50), None)
            .unwrap();
        assert_eq!(all.len(), 10);

        assert!(
            pipeline
                .process_pdf(&rasterizer, pdf, Some(8), Some(3), None)
                .is_err()
        );
    }

    #[test]
    fn test_create_hymnbook() {
        let pipeline = pipeline(ScriptedRecognizer::new_hymn(), hymn_zones());
        let pages = pipeline.process_pages(&[page()], 1, None);
        let book = create_hymnbook(&pages, "Hinário", "Dono", Some(" ")).unwrap();
        assert_eq!(book.hymns.len(), 1);
        assert_eq!(book.hymns[0].number, 7);
        assert_eq!(book.intro_name, None);

        assert!(create_hymnbook(&[], "Hinário", "Dono", None).is_err());
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = HymnPipelineBuilder::new(Arc::new(ScriptedRecognizer::new_hymn()))
            .dpi(10)
            .build();
        assert!(matches!(result, Err(HymnError::ConfigError { .. })));
    }
}
