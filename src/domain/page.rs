//! Page-level types: zones, OCR lines, and per-page results.

use serde::{Deserialize, Serialize};

use super::Repetitions;

/// A rectangular band of a page.
///
/// Vertical bounds are always present; `x_end` is `None` when the zone
/// extends to the right edge of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// First row (inclusive).
    pub y_start: u32,
    /// Last row (exclusive).
    pub y_end: u32,
    /// First column (inclusive).
    #[serde(default)]
    pub x_start: u32,
    /// Last column (exclusive), or the page width when absent.
    #[serde(default)]
    pub x_end: Option<u32>,
}

impl Zone {
    /// A full-width zone covering rows `y_start..y_end`.
    pub fn rows(y_start: u32, y_end: u32) -> Self {
        Self {
            y_start,
            y_end,
            x_start: 0,
            x_end: None,
        }
    }

    /// Zone height in pixels, zero for inverted bounds.
    pub fn height(&self) -> u32 {
        self.y_end.saturating_sub(self.y_start)
    }

    /// Clamps the zone to a `width` x `height` page.
    pub fn clamped(&self, width: u32, height: u32) -> Self {
        let y_start = self.y_start.min(height);
        let x_start = self.x_start.min(width);
        Self {
            y_start,
            y_end: self.y_end.clamp(y_start, height),
            x_start,
            x_end: Some(self.x_end.unwrap_or(width).clamp(x_start, width)),
        }
    }
}

/// Zones of one page as reported by a [`ZoneDetector`](crate::core::ZoneDetector).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageZones {
    /// Hymn number and title.
    pub header: Option<Zone>,
    /// Offering, style, and instructions.
    pub metadata: Option<Zone>,
    /// Lyrics.
    pub body: Option<Zone>,
    /// Date received.
    pub footer: Option<Zone>,
    /// Whether the page is a cover page.
    pub is_cover: bool,
}

impl PageZones {
    /// Zones of a cover page.
    pub fn cover() -> Self {
        Self {
            is_cover: true,
            ..Self::default()
        }
    }
}

/// One recognized text line with its vertical extent, in region coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrLine {
    /// Top row of the line.
    pub y_min: i64,
    /// Bottom row of the line.
    pub y_max: i64,
    /// Words of the line joined by single spaces.
    pub text: String,
}

/// Kind of page in a hymnal PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    /// Title or cover page, skipped.
    Cover,
    /// First page of a hymn.
    NewHymn,
    /// Further page of the preceding hymn.
    Continuation,
    /// Page without usable content.
    Blank,
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PageType::Cover => "cover",
            PageType::NewHymn => "new_hymn",
            PageType::Continuation => "continuation",
            PageType::Blank => "blank",
        };
        f.write_str(name)
    }
}

/// Everything extracted from one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageData {
    /// 1-indexed page number in the PDF.
    pub page_number: usize,
    /// Classification of the page.
    pub page_type: PageType,
    /// Raw header text.
    pub header_text: Option<String>,
    /// Raw metadata text.
    pub metadata_text: Option<String>,
    /// Cleaned lyrics.
    pub body_text: Option<String>,
    /// Raw footer text.
    pub footer_text: Option<String>,
    /// Repetition ranges detected on this page.
    pub repetitions: Option<Repetitions>,
    /// Parsed hymn number.
    pub hymn_number: Option<u32>,
    /// Parsed title.
    pub hymn_title: Option<String>,
    /// Parsed original number.
    pub original_number: Option<u32>,
    /// Parsed offering.
    pub offered_to: Option<String>,
    /// Parsed musical style.
    pub style: Option<String>,
    /// Parsed performance instructions.
    pub extra_instructions: Option<String>,
    /// Parsed date, `YYYY-MM-DD`.
    pub received_at: Option<String>,
}

impl PageData {
    /// An empty page of the given type.
    pub fn new(page_number: usize, page_type: PageType) -> Self {
        Self {
            page_number,
            page_type,
            header_text: None,
            metadata_text: None,
            body_text: None,
            footer_text: None,
            repetitions: None,
            hymn_number: None,
            hymn_title: None,
            original_number: None,
            offered_to: None,
            style: None,
            extra_instructions: None,
            received_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_clamped() {
        let zone = Zone::rows(50, 900).clamped(300, 400);
        assert_eq!(zone.y_start, 50);
        assert_eq!(zone.y_end, 400);
        assert_eq!(zone.x_end, Some(300));
        assert_eq!(Zone::rows(500, 900).clamped(300, 400).height(), 0);
    }

    #[test]
    fn test_page_type_serde() {
        let json = serde_json::to_string(&PageType::NewHymn).unwrap();
        assert_eq!(json, "\"new_hymn\"");
        assert_eq!(PageType::Continuation.to_string(), "continuation");
    }
}
