//! Field-by-field comparison of an extracted hymn book with a reference.

use std::fmt;

use itertools::Itertools;
use serde::Serialize;

use crate::domain::{HymnBook, Repetitions};

/// Similarity at or above which lyrics count as matching.
const TEXT_MATCH_RATIO: f64 = 0.95;

/// Similarity below which lyrics are reported as an issue.
const TEXT_ISSUE_RATIO: f64 = 0.90;

/// Problems found on one hymn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HymnIssues {
    /// 1-indexed position in the book.
    pub position: usize,
    /// Reference title.
    pub title: String,
    pub problems: Vec<String>,
}

/// Match counts per field over the compared hymns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Hymns in the reference.
    pub total: usize,
    /// Hymns in the extracted book.
    pub extracted: usize,
    pub title_match: usize,
    pub text_match: usize,
    pub text_similarity_avg: f64,
    pub date_present: usize,
    pub date_match: usize,
    pub repetition_match: usize,
    pub original_number_match: usize,
    pub offered_to_match: usize,
    pub style_match: usize,
    pub issues: Vec<HymnIssues>,
}

impl ValidationReport {
    /// Share of title, text, date, repetition, and original-number matches.
    pub fn overall_score(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let matched = self.title_match
            + self.text_match
            + self.date_match
            + self.repetition_match
            + self.original_number_match;
        matched as f64 / (self.total * 5) as f64
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Extracted hymns: {}", self.extracted)?;
        writeln!(f, "Reference hymns: {}", self.total)?;
        writeln!(f)?;
        writeln!(f, "Field matching:")?;
        let rows = [
            ("Title", self.title_match),
            ("Text (95%+ similar)", self.text_match),
            ("Date (present)", self.date_present),
            ("Date (correct)", self.date_match),
            ("Repetitions", self.repetition_match),
            ("Original number", self.original_number_match),
            ("Offered to", self.offered_to_match),
            ("Style", self.style_match),
        ];
        for (name, matched) in rows {
            let pct = if self.total > 0 {
                matched as f64 / self.total as f64 * 100.0
            } else {
                0.0
            };
            writeln!(f, "  {:.<25} {:>3}/{} ({:>5.1}%)", name, matched, self.total, pct)?;
        }
        writeln!(
            f,
            "  Average text similarity: {:.1}%",
            self.text_similarity_avg * 100.0
        )?;
        if !self.issues.is_empty() {
            writeln!(f)?;
            writeln!(f, "Issues by hymn:")?;
            for issue in &self.issues {
                writeln!(f, "  #{} {}", issue.position, issue.title)?;
                for problem in &issue.problems {
                    writeln!(f, "    - {}", problem)?;
                }
            }
        }
        writeln!(f)?;
        write!(f, "Overall score: {:.1}%", self.overall_score() * 100.0)
    }
}

/// Compares hymns pairwise, in book order.
///
/// Hymns beyond the shorter book are not compared.
pub fn compare_hymnbooks(extracted: &HymnBook, reference: &HymnBook) -> ValidationReport {
    let mut report = ValidationReport {
        total: reference.hymns.len(),
        extracted: extracted.hymns.len(),
        ..ValidationReport::default()
    };
    let mut similarities = Vec::new();

    for (position, (ocr, orig)) in extracted.hymns.iter().zip(&reference.hymns).enumerate() {
        let mut problems = Vec::new();

        if ocr.title.trim().to_lowercase() == orig.title.trim().to_lowercase() {
            report.title_match += 1;
        } else {
            problems.push(format!("title: '{}' vs '{}'", ocr.title, orig.title));
        }

        let similarity = text_similarity(&ocr.text, &orig.text);
        similarities.push(similarity);
        if similarity >= TEXT_MATCH_RATIO {
            report.text_match += 1;
        } else if similarity < TEXT_ISSUE_RATIO {
            problems.push(format!("text similarity: {:.1}%", similarity * 100.0));
        }

        match (&ocr.received_at, &orig.received_at) {
            (Some(got), expected) => {
                report.date_present += 1;
                if Some(got) == expected.as_ref() {
                    report.date_match += 1;
                } else {
                    problems.push(format!(
                        "date: '{}' vs '{}'",
                        got,
                        expected.as_deref().unwrap_or("")
                    ));
                }
            }
            (None, Some(expected)) => {
                problems.push(format!("date missing (expected: {})", expected));
            }
            (None, None) => {}
        }

        match (&ocr.repetitions, &orig.repetitions) {
            (Some(got), Some(expected)) => {
                if normalize_repetitions(got) == normalize_repetitions(expected) {
                    report.repetition_match += 1;
                } else {
                    problems.push(format!("repetitions: '{}' vs '{}'", got, expected));
                }
            }
            (None, Some(expected)) => {
                problems.push(format!("repetitions missing (expected: {})", expected));
            }
            _ => {}
        }

        if let (Some(got), Some(expected)) = (ocr.original_number, orig.original_number) {
            if got == expected {
                report.original_number_match += 1;
            } else {
                problems.push(format!("original_number: {} vs {}", got, expected));
            }
        }

        compare_optional(
            "offered_to",
            &ocr.offered_to,
            &orig.offered_to,
            &mut report.offered_to_match,
            &mut problems,
        );
        compare_optional(
            "style",
            &ocr.style,
            &orig.style,
            &mut report.style_match,
            &mut problems,
        );

        if !problems.is_empty() {
            report.issues.push(HymnIssues {
                position: position + 1,
                title: orig.title.clone(),
                problems,
            });
        }
    }

    if !similarities.is_empty() {
        report.text_similarity_avg = similarities.iter().sum::<f64>() / similarities.len() as f64;
    }
    report
}

fn compare_optional(
    field: &str,
    got: &Option<String>,
    expected: &Option<String>,
    matches: &mut usize,
    problems: &mut Vec<String>,
) {
    let normalize = |value: &Option<String>| {
        value
            .as_deref()
            .map(|v| v.trim().to_lowercase())
            .unwrap_or_default()
    };
    let (got_norm, expected_norm) = (normalize(got), normalize(expected));
    if got_norm == expected_norm {
        *matches += 1;
    } else {
        problems.push(format!(
            "{}: '{}' vs '{}'",
            field,
            got.as_deref().unwrap_or(""),
            expected.as_deref().unwrap_or("")
        ));
    }
}

/// Parts without spaces, sorted, so that order differences do not count.
fn normalize_repetitions(repetitions: &Repetitions) -> Vec<String> {
    repetitions
        .parts()
        .iter()
        .map(|part| part.to_string().replace(' ', ""))
        .sorted()
        .collect()
}

/// Trimmed non-blank lines joined by newlines.
pub fn normalize_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .join("\n")
}

/// Similarity of two lyrics in `[0, 1]`, `2 * lcs / (len_a + len_b)` over characters.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = normalize_text(a).chars().collect();
    let b: Vec<char> = normalize_text(b).chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let lcs = longest_common_subsequence(&a, &b);
    2.0 * lcs as f64 / (a.len() + b.len()) as f64
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Hymn;

    fn hymn(number: u32, title: &str, text: &str) -> Hymn {
        Hymn {
            number,
            title: title.to_string(),
            text: text.to_string(),
            original_number: None,
            style: None,
            offered_to: None,
            extra_instructions: None,
            repetitions: None,
            received_at: None,
        }
    }

    fn book(hymns: Vec<Hymn>) -> HymnBook {
        HymnBook::new("Livro", "Dono", hymns).unwrap()
    }

    #[test]
    fn test_text_similarity() {
        assert_eq!(text_similarity("abc", "abc"), 1.0);
        assert_eq!(text_similarity("  abc \n\n", "abc"), 1.0);
        assert_eq!(text_similarity("abcd", "wxyz"), 0.0);
        assert!((text_similarity("abcd", "abxd") - 0.75).abs() < 1e-9);
        assert_eq!(text_similarity("", ""), 1.0);
    }

    #[test]
    fn test_identical_books_match_everywhere() {
        let mut h = hymn(1, "Luz", "linha um\nlinha dois");
        h.received_at = Some("2020-01-18".into());
        h.repetitions = Some("1-2".parse().unwrap());
        h.original_number = Some(62);
        let report = compare_hymnbooks(&book(vec![h.clone()]), &book(vec![h]));
        assert_eq!(report.title_match, 1);
        assert_eq!(report.text_match, 1);
        assert_eq!(report.date_match, 1);
        assert_eq!(report.repetition_match, 1);
        assert_eq!(report.original_number_match, 1);
        assert!(report.issues.is_empty());
        assert!((report.overall_score() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_mismatches_are_reported() {
        let mut ocr = hymn(1, "LUZ", "completamente diferente");
        ocr.repetitions = Some("3-4, 1-4".parse().unwrap());
        let mut reference = hymn(1, "Luz", "linha um\nlinha dois");
        reference.repetitions = Some("1-4,3-4".parse().unwrap());
        reference.received_at = Some("2020-01-18".into());
        reference.style = Some("Valsa".into());

        let report = compare_hymnbooks(&book(vec![ocr]), &book(vec![reference]));
        assert_eq!(report.title_match, 1);
        assert_eq!(report.repetition_match, 1);
        assert_eq!(report.text_match, 0);
        assert_eq!(report.style_match, 0);
        assert_eq!(report.offered_to_match, 1);
        let problems = &report.issues[0].problems;
        assert!(problems.iter().any(|p| p.starts_with("text similarity")));
        assert!(problems.iter().any(|p| p.starts_with("date missing")));
        assert!(problems.iter().any(|p| p.starts_with("style")));
    }

    #[test]
    fn test_report_display() {
        let h = hymn(1, "Luz", "linha");
        let report = compare_hymnbooks(&book(vec![h.clone()]), &book(vec![h]));
        let text = report.to_string();
        assert!(text.contains("Reference hymns: 1"));
        assert!(text.ends_with("Overall score: 40.0%"));
    }
}
