//! Filters separating real lyric lines from OCR debris.
//!
//! Bars in the margin are often read as `|`, and stray marks as short
//! letter codes such as `XX` or `WC`. These must not be counted as lines or
//! every range after them shifts by one.

use crate::domain::OcrLine;
use crate::processors::LineBoundary;

const ARTIFACT_CODES: &[&str] = &[
    "XX", "X", "WC", "WCX", "CC", "CLX", "CX", "SDS", "PO", "I", "II",
];

const INSTRUCTION_PATTERNS: &[&str] = &[
    "sem instrumentos",
    "em pé",
    "sentados",
    "sentado",
    "de pé",
    "em pe",
    "instrumental",
];

/// Lines of `body_text` that look like lyrics, trimmed and without leading bars.
pub fn filter_text_lines(body_text: &str) -> Vec<&str> {
    body_text
        .lines()
        .filter_map(|line| {
            let line = strip_bar_prefix(line.trim());
            if line.is_empty() || is_artifact_line(line) || is_parenthesized_date(line) {
                None
            } else {
                Some(line)
            }
        })
        .collect()
}

/// Number of lyric lines in `body_text`.
pub fn count_text_lines(body_text: &str) -> usize {
    filter_text_lines(body_text).len()
}

/// Turns recognized line boxes into line boundaries, dropping artifacts.
///
/// Bar fragments, short letter codes, and dates are removed word by word;
/// lines left with three characters or fewer, and performance instructions
/// such as "Em pé", are dropped. The result is sorted top to bottom.
pub fn precise_line_boundaries(lines: &[OcrLine]) -> Vec<LineBoundary> {
    let mut boundaries: Vec<LineBoundary> = lines
        .iter()
        .filter(|line| {
            let text = line
                .text
                .split_whitespace()
                .filter(|word| !is_artifact_word(word))
                .collect::<Vec<_>>()
                .join(" ");
            if text.chars().count() <= 3 {
                return false;
            }
            let lower = text.to_lowercase();
            !INSTRUCTION_PATTERNS.iter().any(|p| lower.contains(p))
        })
        .map(|line| LineBoundary::new(line.y_min, line.y_max))
        .collect();
    boundaries.sort_by_key(|b| b.y_min);
    boundaries
}

fn strip_bar_prefix(mut line: &str) -> &str {
    while let Some(rest) = line.strip_prefix('|') {
        line = rest.trim_start();
    }
    line
}

fn compact_upper(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Short all-letter lines are stray marks, not lyrics.
fn is_artifact_line(line: &str) -> bool {
    let compact = compact_upper(line);
    compact.chars().count() <= 4
        && (compact.chars().all(char::is_alphabetic) || ARTIFACT_CODES.contains(&compact.as_str()))
}

fn is_artifact_word(word: &str) -> bool {
    if word == "|" || (word.starts_with('(') && word.contains('/')) {
        return true;
    }
    let compact = compact_upper(word);
    compact.chars().count() <= 4 && ARTIFACT_CODES.contains(&compact.as_str())
}

fn is_parenthesized_date(text: &str) -> bool {
    text.starts_with('(') && text.ends_with(')') && text.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ocr_line(y_min: i64, text: &str) -> OcrLine {
        OcrLine {
            y_min,
            y_max: y_min + 40,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_filters_artifacts() {
        let body = "| Eu pedi a Deus\n\nXX\n|| Que me desse\nWC x\n(18/01/2020)\n  Seu amor  \n";
        assert_eq!(
            filter_text_lines(body),
            vec!["Eu pedi a Deus", "Que me desse", "Seu amor"]
        );
        assert_eq!(count_text_lines(body), 3);
    }

    #[test]
    fn test_short_lines_with_digits_kept() {
        assert_eq!(count_text_lines("1-4\nAmor"), 1);
        assert_eq!(count_text_lines("Sol\nLua"), 0);
    }

    #[test]
    fn test_blank_text() {
        assert_eq!(count_text_lines("  \n|\n"), 0);
    }

    #[test]
    fn test_precise_boundaries() {
        let lines = vec![
            ocr_line(300, "Firmeza no amor"),
            ocr_line(100, "| Eu vivo"),
            ocr_line(200, "XX |"),
            ocr_line(400, "Em pé"),
            ocr_line(500, "Dai-me força (18/01/2020)"),
        ];
        let boundaries = precise_line_boundaries(&lines);
        let tops: Vec<_> = boundaries.iter().map(|b| b.y_min).collect();
        assert_eq!(tops, vec![100, 300, 500]);
    }
}
