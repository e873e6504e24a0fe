//! YAML output for hymn books.
//!
//! Keys are written in record order and absent optional fields are
//! omitted. Multi-line lyrics come out as literal block scalars.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::{HymnError, HymnResult, ProcessingStage};
use crate::domain::HymnBook;

/// Serializes a hymn book to a YAML document.
pub fn generate_yaml(book: &HymnBook) -> HymnResult<String> {
    Ok(serde_yaml::to_string(book)?)
}

/// Writes a hymn book to `path` and returns the path written.
pub fn save_yaml(book: &HymnBook, path: impl AsRef<Path>) -> HymnResult<PathBuf> {
    let path = path.as_ref();
    let content = generate_yaml(book)?;
    std::fs::write(path, content).map_err(|e| {
        HymnError::processing(
            ProcessingStage::Serialization,
            format!("failed to write {}", path.display()),
            e,
        )
    })?;
    info!(
        path = %path.display(),
        hymns = book.hymns.len(),
        "Saved hymn book"
    );
    Ok(path.to_path_buf())
}

/// Reads a hymn book from a YAML file.
///
/// Hymns are checked the same way merged hymns are.
pub fn load_yaml(path: impl AsRef<Path>) -> HymnResult<HymnBook> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let mut book: HymnBook = serde_yaml::from_str(&content)?;
    book.hymns = book
        .hymns
        .into_iter()
        .map(|hymn| hymn.validate())
        .collect::<HymnResult<_>>()?;
    Ok(book)
}

/// The first `max_hymns` hymns as YAML, with a note on how many were left out.
pub fn preview_yaml(book: &HymnBook, max_hymns: usize) -> HymnResult<String> {
    let preview = HymnBook {
        hymns: book.hymns.iter().take(max_hymns).cloned().collect(),
        ..book.clone()
    };
    let mut yaml = generate_yaml(&preview)?;
    if book.hymns.len() > max_hymns {
        yaml.push_str(&format!(
            "\n# ... and {} more hymns\n",
            book.hymns.len() - max_hymns
        ));
    }
    Ok(yaml)
}
