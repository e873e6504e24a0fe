//! Domain types shared by the detector and the pipeline.

pub mod hymn;
pub mod page;
pub mod repetition;

pub use hymn::{Hymn, HymnBook, count_nonblank_lines};
pub use page::{OcrLine, PageData, PageType, PageZones, Zone};
pub use repetition::{RepetitionPart, RepetitionRange, Repetitions};
