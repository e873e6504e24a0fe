//! Command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use hymn_ocr::core::{HymnError, PageRasterizer, TextRecognizer};
use hymn_ocr::domain::{PageType, PageZones, Zone};
use hymn_ocr::pipeline::{
    HymnPipeline, HymnPipelineBuilder, ProgressFn, clean_ocr_text, compare_hymnbooks,
    count_pages_by_type, create_hymnbook, generate_yaml, load_yaml, preview_yaml, save_yaml,
};
use hymn_ocr::repetition::precise_line_boundaries;
use hymn_ocr::utils::{crop_zone, draw_bar_overlay, draw_zone_overlay};
use tracing::{info, warn};

use crate::config::{ConvertConfig, PageRange};
use crate::pdf::PdfiumRasterizer;
use crate::tesseract::TesseractRecognizer;

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Hymns shown by `--preview`.
const PREVIEW_HYMNS: usize = 3;

/// Options of the `convert` command.
pub struct ConvertArgs {
    pub pdf: PathBuf,
    pub output: Option<PathBuf>,
    pub preview: bool,
    pub pages: Option<PageRange>,
    pub name: String,
    pub owner: String,
    pub intro: Option<String>,
    pub config: ConvertConfig,
}

fn build_pipeline(config: &ConvertConfig) -> Result<HymnPipeline, HymnError> {
    let config = config.resolve()?;
    if let Err(e) = config.parallel.install_global_thread_pool() {
        warn!("Could not configure thread pool: {}", e);
    }
    let recognizer = TesseractRecognizer::new(config.language.clone());
    if !recognizer.is_available() {
        return Err(HymnError::ocr(
            "tesseract",
            "the tesseract binary was not found on PATH",
        ));
    }
    HymnPipelineBuilder::new(Arc::new(recognizer))
        .config(config)
        .build()
}

/// Converts a PDF into a hymn book.
pub fn convert(args: ConvertArgs) -> CliResult {
    let start = Instant::now();
    let pipeline = build_pipeline(&args.config)?;
    let rasterizer = PdfiumRasterizer::new()?;

    let (first, last) = match args.pages {
        Some(range) => (Some(range.first), Some(range.last)),
        None => (None, None),
    };
    info!("Processing {}", args.pdf.display());
    let progress: ProgressFn<'_> = &|done, total| info!("Page {}/{}", done, total);
    let pages = pipeline.process_pdf(&rasterizer, &args.pdf, first, last, Some(progress))?;

    let counts = count_pages_by_type(&pages);
    info!(
        cover = counts[&PageType::Cover],
        new_hymn = counts[&PageType::NewHymn],
        continuation = counts[&PageType::Continuation],
        blank = counts[&PageType::Blank],
        "Page types"
    );

    let book = create_hymnbook(&pages, &args.name, &args.owner, args.intro.as_deref())?;
    eprintln!(
        "Extracted {} hymns in {:.1}s",
        book.hymns.len(),
        start.elapsed().as_secs_f64()
    );

    if let Some(output) = &args.output {
        let path = save_yaml(&book, output)?;
        eprintln!("Saved to {}", path.display());
    }
    if args.preview {
        println!("{}", preview_yaml(&book, PREVIEW_HYMNS)?);
    } else if args.output.is_none() {
        print!("{}", generate_yaml(&book)?);
    }
    Ok(())
}

/// Prints basic information about a PDF.
pub fn info(pdf: &Path) -> CliResult {
    let rasterizer = PdfiumRasterizer::new()?;
    let pages = rasterizer.page_count(pdf)?;
    println!("File: {}", pdf.display());
    println!("Pages: {}", pages);
    Ok(())
}

/// Shows zones and repetition analysis for one page and writes overlays.
pub fn debug_page(pdf: &Path, page: usize, output_dir: &Path, config: &ConvertConfig) -> CliResult {
    let pipeline = build_pipeline(config)?;
    let rasterizer = PdfiumRasterizer::new()?;
    let dpi = pipeline.config().dpi;
    let image = rasterizer
        .rasterize(pdf, dpi, Some(page), Some(page))?
        .into_iter()
        .next()
        .ok_or_else(|| HymnError::invalid_input(format!("page {} not found", page)))?;

    std::fs::create_dir_all(output_dir)?;
    let original_path = output_dir.join(format!("page_{}_original.png", page));
    image.save(&original_path)?;

    let zones = pipeline.zone_detector().detect_zones(&image);
    print_zones(page, image.width(), image.height(), &zones);
    let zones_path = output_dir.join(format!("page_{}_zones.png", page));
    draw_zone_overlay(&image, &zones).save(&zones_path)?;
    println!("Saved {}", original_path.display());
    println!("Saved {}", zones_path.display());

    let Some(body) = zones.body else {
        println!("No body zone, nothing to analyze");
        return Ok(());
    };

    let recognizer = TesseractRecognizer::new(pipeline.config().language.clone());
    let Some(region) = crop_zone(&image, &body, 1) else {
        println!("Body zone is empty");
        return Ok(());
    };
    let body_text = clean_ocr_text(&recognizer.ocr_text(&region)?);
    let precise = precise_line_boundaries(&recognizer.ocr_line_boxes(&region)?);
    println!();
    println!("Body text lines: {}", body_text.lines().count());
    println!("Precise line boxes: {}", precise.len());

    let detector = pipeline.repetition_detector();
    let columns = detector.inspect_columns(&image, &body);
    println!("Column segments: {}", columns.len());
    for segment in &columns {
        println!(
            "  column {} rows {}-{} intensity {:.2}",
            segment.column, segment.y_start, segment.y_end, segment.intensity
        );
    }

    match detector.analyze(&image, Some(&body), &body_text, &precise) {
        Some(analysis) => {
            println!("Initial segments: {}", analysis.initial_segments.len());
            for segment in &analysis.initial_segments {
                println!(
                    "  rows {}-{} intensity {:.2}",
                    segment.y_start, segment.y_end, segment.intensity
                );
            }
            println!("Strategy: {}", analysis.strategy);
            if let Some(counts) = &analysis.bar_counts {
                println!("Bars per line: {:?}", counts);
            }
            println!("Lines: {}", analysis.num_lines);
            match &analysis.repetitions {
                Some(repetitions) => println!("Repetitions: {}", repetitions),
                None => println!("Repetitions: none"),
            }

            let margin = detector.config().margin_width(image.width());
            let bars_path = output_dir.join(format!("page_{}_bars.png", page));
            draw_bar_overlay(&image, &body, margin, &analysis.segments).save(&bars_path)?;
            println!("Saved {}", bars_path.display());

            let analysis_path = output_dir.join(format!("page_{}_bars.json", page));
            std::fs::write(&analysis_path, serde_json::to_string_pretty(&analysis)?)?;
            println!("Saved {}", analysis_path.display());
        }
        None => println!("No repetition bars detected"),
    }
    Ok(())
}

fn print_zones(page: usize, width: u32, height: u32, zones: &PageZones) {
    println!("Page {} ({}x{})", page, width, height);
    if zones.is_cover {
        println!("  cover page");
        return;
    }
    let describe = |zone: &Option<Zone>| match zone {
        Some(zone) => format!("rows {}-{}", zone.y_start, zone.y_end),
        None => "none".to_string(),
    };
    println!("  header:   {}", describe(&zones.header));
    println!("  metadata: {}", describe(&zones.metadata));
    println!("  body:     {}", describe(&zones.body));
    println!("  footer:   {}", describe(&zones.footer));
}

/// Compares an extracted YAML file with a reference and prints the report.
pub fn validate(extracted: &Path, reference: &Path) -> CliResult {
    let extracted = load_yaml(extracted)?;
    let reference = load_yaml(reference)?;
    let report = compare_hymnbooks(&extracted, &reference);
    println!("{}", report);
    Ok(())
}
