//! From page images to a hymn book.
//!
//! [`HymnPipeline`] processes pages, [`merger`] joins them into hymns,
//! [`yaml`] writes the result, and [`validate`] scores it against a
//! reference book.

pub mod hymn_pipeline;
pub mod merger;
pub mod parser;
pub mod validate;
pub mod yaml;

pub use hymn_pipeline::{
    HymnPipeline, HymnPipelineBuilder, ProgressFn, classify_page, create_hymnbook,
};
pub use merger::{adjust_repetitions, count_pages_by_type, merge_multipage_hymns};
pub use parser::{
    ParsedHeader, ParsedMetadata, clean_body_text, clean_ocr_text, extract_page_number,
    parse_date, parse_header, parse_instructions, parse_metadata, parse_offered_to, parse_style,
};
pub use validate::{HymnIssues, ValidationReport, compare_hymnbooks, text_similarity};
pub use yaml::{generate_yaml, load_yaml, preview_yaml, save_yaml};
