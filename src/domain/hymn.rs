//! Hymn and hymn book records, in the shape written to YAML.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Repetitions;
use crate::core::{HymnError, HymnResult};

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// A single hymn with its metadata.
///
/// Field order matches the YAML key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hymn {
    /// Number in the collection, greater than zero.
    pub number: u32,
    /// Title, non-empty.
    pub title: String,
    /// Lyrics, non-empty, stanzas separated by blank lines.
    pub text: String,
    /// Number of the hymn in the original collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_number: Option<u32>,
    /// Musical style (Valsa, Marcha, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Person the hymn is offered to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offered_to: Option<String>,
    /// Performance instructions (Em pé, Sem instrumentos, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_instructions: Option<String>,
    /// Repeated line ranges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetitions: Option<Repetitions>,
    /// Date received, `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<String>,
}

impl Hymn {
    /// Checks the record, trimming title and text.
    pub fn validate(mut self) -> HymnResult<Self> {
        self.title = self.title.trim().to_string();
        self.text = self.text.trim().to_string();
        if self.number == 0 {
            return Err(HymnError::invalid_input("hymn number must be positive"));
        }
        if self.title.is_empty() {
            return Err(HymnError::invalid_input(format!(
                "hymn {} has an empty title",
                self.number
            )));
        }
        if self.text.is_empty() {
            return Err(HymnError::invalid_input(format!(
                "hymn {} has no text",
                self.number
            )));
        }
        if self.original_number == Some(0) {
            return Err(HymnError::invalid_input(format!(
                "hymn {} has original number 0",
                self.number
            )));
        }
        if let Some(date) = &self.received_at
            && !ISO_DATE.is_match(date)
        {
            return Err(HymnError::invalid_input(format!(
                "hymn {} date '{}' is not YYYY-MM-DD",
                self.number, date
            )));
        }
        Ok(self)
    }

    /// Number of non-blank lines of the lyrics.
    pub fn line_count(&self) -> usize {
        count_nonblank_lines(&self.text)
    }
}

/// Number of non-blank lines in `text`.
pub fn count_nonblank_lines(text: &str) -> usize {
    text.lines().filter(|line| !line.trim().is_empty()).count()
}

/// A collection of hymns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HymnBook {
    /// Name of the book.
    pub name: String,
    /// Owner's name.
    pub owner_name: String,
    /// Introduction name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro_name: Option<String>,
    /// The hymns, in book order.
    pub hymns: Vec<Hymn>,
}

impl HymnBook {
    /// Builds a book, trimming and checking names.
    pub fn new(
        name: impl Into<String>,
        owner_name: impl Into<String>,
        hymns: Vec<Hymn>,
    ) -> HymnResult<Self> {
        let name = name.into().trim().to_string();
        let owner_name = owner_name.into().trim().to_string();
        if name.is_empty() || owner_name.is_empty() {
            return Err(HymnError::invalid_input(
                "hymn book name and owner must not be empty",
            ));
        }
        if hymns.is_empty() {
            return Err(HymnError::invalid_input("hymn book has no hymns"));
        }
        Ok(Self {
            name,
            owner_name,
            intro_name: None,
            hymns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_hymn(number: u32) -> Hymn {
        Hymn {
            number,
            title: "  Lua Branca ".to_string(),
            text: "Line one\nLine two\n\nLine three\n".to_string(),
            original_number: None,
            style: Some("Valsa".to_string()),
            offered_to: None,
            extra_instructions: None,
            repetitions: None,
            received_at: Some("2020-01-18".to_string()),
        }
    }

    #[test]
    fn test_validate_trims() {
        let hymn = sample_hymn(1).validate().unwrap();
        assert_eq!(hymn.title, "Lua Branca");
        assert_eq!(hymn.line_count(), 3);
    }

    #[test]
    fn test_validate_rejects() {
        assert!(sample_hymn(0).validate().is_err());
        let mut bad_date = sample_hymn(2);
        bad_date.received_at = Some("18/01/2020".to_string());
        assert!(bad_date.validate().is_err());
        let mut empty = sample_hymn(3);
        empty.text = "   \n".to_string();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_book_requires_hymns() {
        assert!(HymnBook::new("O Cruzeiro", "Mestre", vec![]).is_err());
        assert!(HymnBook::new(" ", "Mestre", vec![sample_hymn(1)]).is_err());
        let book = HymnBook::new(" O Cruzeiro ", "Mestre", vec![sample_hymn(1)]).unwrap();
        assert_eq!(book.name, "O Cruzeiro");
    }
}
