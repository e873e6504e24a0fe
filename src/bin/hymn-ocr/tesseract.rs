//! Text recognition through the `tesseract` command-line tool.

use std::collections::HashMap;
use std::process::Command;

use hymn_ocr::core::{HymnError, HymnResult, TextRecognizer};
use hymn_ocr::domain::OcrLine;
use image::{GrayImage, RgbImage, imageops};
use tracing::debug;

const ENGINE: &str = "tesseract";

/// Runs `tesseract` on a temporary PNG per region.
///
/// Uses a single uniform text block layout (`--psm 6`) with the default
/// engine mode.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: String,
    language: String,
}

impl TesseractRecognizer {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            binary: ENGINE.to_string(),
            language: language.into(),
        }
    }

    /// Whether the binary can be executed.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary).arg("--version").output().is_ok()
    }

    fn run(&self, region: &RgbImage, extra: &[&str]) -> HymnResult<String> {
        let input = tempfile::Builder::new()
            .prefix("hymn-ocr-")
            .suffix(".png")
            .tempfile()?;
        preprocess(region).save(input.path())?;

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .args(["-l", &self.language, "--psm", "6", "--oem", "3"])
            .args(extra)
            .output()
            .map_err(|e| HymnError::ocr(ENGINE, format!("failed to run: {}", e)))?;

        if !output.status.success() {
            return Err(HymnError::ocr(
                ENGINE,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn ocr_text(&self, region: &RgbImage) -> HymnResult<String> {
        self.run(region, &[])
    }

    fn ocr_line_boxes(&self, region: &RgbImage) -> HymnResult<Vec<OcrLine>> {
        let tsv = self.run(region, &["tsv"])?;
        let lines = parse_tsv_lines(&tsv);
        debug!(lines = lines.len(), "Recognized line boxes");
        Ok(lines)
    }
}

/// Grayscale with a light blur, which steadies tesseract's binarization.
fn preprocess(region: &RgbImage) -> GrayImage {
    let gray = imageops::grayscale(region);
    imageproc::filter::box_filter(&gray, 1, 1)
}

/// Groups word rows of tesseract TSV output into text lines.
///
/// Words are keyed by block, paragraph, and line number. Empty words are
/// skipped and lines are returned top to bottom.
pub fn parse_tsv_lines(tsv: &str) -> Vec<OcrLine> {
    let mut order: Vec<(u32, u32, u32)> = Vec::new();
    let mut lines: HashMap<(u32, u32, u32), OcrLine> = HashMap::new();

    for row in tsv.lines().skip(1) {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }
        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }
        let number = |i: usize| fields[i].trim().parse::<i64>().ok();
        let (Some(block), Some(par), Some(line), Some(top), Some(height)) =
            (number(2), number(3), number(4), number(7), number(9))
        else {
            continue;
        };
        let key = (block as u32, par as u32, line as u32);
        let entry = lines.entry(key).or_insert_with(|| {
            order.push(key);
            OcrLine {
                y_min: top,
                y_max: top + height,
                text: String::new(),
            }
        });
        entry.y_min = entry.y_min.min(top);
        entry.y_max = entry.y_max.max(top + height);
        if !entry.text.is_empty() {
            entry.text.push(' ');
        }
        entry.text.push_str(text);
    }

    let mut result: Vec<OcrLine> = order
        .into_iter()
        .filter_map(|key| lines.remove(&key))
        .collect();
    result.sort_by_key(|line| line.y_min);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word(block: u32, line: u32, top: i64, height: i64, text: &str) -> String {
        format!("5\t1\t{block}\t1\t{line}\t1\t10\t{top}\t50\t{height}\t90\t{text}")
    }

    #[test]
    fn test_parse_tsv_groups_words() {
        let tsv = [
            HEADER.to_string(),
            "1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t".to_string(),
            word(1, 2, 100, 30, "segunda"),
            word(1, 1, 20, 30, "Sou"),
            word(1, 1, 18, 34, "filho"),
            word(1, 2, 102, 30, "linha"),
            word(1, 3, 200, 30, "  "),
        ]
        .join("\n");

        let lines = parse_tsv_lines(&tsv);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Sou filho");
        assert_eq!((lines[0].y_min, lines[0].y_max), (18, 52));
        assert_eq!(lines[1].text, "segunda linha");
        assert_eq!((lines[1].y_min, lines[1].y_max), (100, 132));
    }

    #[test]
    fn test_parse_tsv_ignores_malformed_rows() {
        let tsv = format!("{HEADER}\n5\t1\tx\t1\t1\t1\t0\t0\t1\t1\t90\tbad\nshort\trow");
        assert!(parse_tsv_lines(&tsv).is_empty());
        assert!(parse_tsv_lines("").is_empty());
    }
}
