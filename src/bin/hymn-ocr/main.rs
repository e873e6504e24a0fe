//! hymn-ocr command-line tool
//!
//! Converts scanned hymnal PDFs into YAML hymn books.
//!
//! # Usage
//!
//! ```bash
//! hymn-ocr convert hinario.pdf -o hinario.yaml --name "Hinário" --owner "Maria"
//! hymn-ocr convert hinario.pdf --pages 2-10 --preview
//! hymn-ocr info hinario.pdf
//! hymn-ocr debug-page hinario.pdf 5 -o debug/
//! hymn-ocr validate hinario.yaml reference.yaml
//! ```
//!
//! Needs the PDFium library and the `tesseract` binary with the requested
//! language data installed. Set `RUST_LOG=debug` for per-page details.

mod cli;
mod config;
mod pdf;
mod tesseract;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::config::{ConvertConfig, PageRange};

#[derive(Parser)]
#[command(name = "hymn-ocr")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert scanned hymnal PDFs into YAML hymn books", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Pipeline settings shared by commands that process pages.
#[derive(clap::Args)]
struct PipelineArgs {
    /// YAML file with pipeline settings
    #[arg(long, env = "HYMN_OCR_CONFIG")]
    config: Option<PathBuf>,

    /// Rendering resolution
    #[arg(long, env = "HYMN_OCR_DPI")]
    dpi: Option<u32>,

    /// Tesseract language code
    #[arg(long, env = "HYMN_OCR_LANG")]
    lang: Option<String>,

    /// Worker threads for page processing (defaults to number of CPUs)
    #[arg(long, env = "HYMN_OCR_THREADS")]
    threads: Option<usize>,
}

impl From<PipelineArgs> for ConvertConfig {
    fn from(args: PipelineArgs) -> Self {
        Self {
            config_file: args.config,
            dpi: args.dpi,
            language: args.lang,
            threads: args.threads,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PDF into a YAML hymn book
    Convert {
        /// The hymnal PDF
        pdf: PathBuf,

        /// Write the YAML here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Print only the first hymns
        #[arg(long)]
        preview: bool,

        /// Page range to process, like 2-10 or 5
        #[arg(long)]
        pages: Option<PageRange>,

        /// Name of the hymn book
        #[arg(long, default_value = "Hymn Book")]
        name: String,

        /// Owner of the hymn book
        #[arg(long, default_value = "Unknown")]
        owner: String,

        /// Introduction name
        #[arg(long)]
        intro: Option<String>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Show the page count of a PDF
    Info {
        /// The PDF to inspect
        pdf: PathBuf,
    },
    /// Analyze a single page and write debug images
    DebugPage {
        /// The hymnal PDF
        pdf: PathBuf,

        /// 1-indexed page number
        page: usize,

        /// Directory for the debug images
        #[arg(long, short, default_value = ".")]
        output: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Compare an extracted YAML file with a reference YAML file
    Validate {
        /// YAML produced by `convert`
        extracted: PathBuf,

        /// Reference YAML
        reference: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    hymn_ocr::utils::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            pdf,
            output,
            preview,
            pages,
            name,
            owner,
            intro,
            pipeline,
        } => {
            cli::convert(cli::ConvertArgs {
                pdf,
                output,
                preview,
                pages,
                name,
                owner,
                intro,
                config: pipeline.into(),
            })?;
        }
        Commands::Info { pdf } => cli::info(&pdf)?,
        Commands::DebugPage {
            pdf,
            page,
            output,
            pipeline,
        } => {
            info!("Debugging page {} of {}", page, pdf.display());
            cli::debug_page(&pdf, page, &output, &pipeline.into())?;
        }
        Commands::Validate {
            extracted,
            reference,
        } => cli::validate(&extracted, &reference)?,
    }

    Ok(())
}
