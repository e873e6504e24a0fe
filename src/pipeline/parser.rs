//! Parsing of recognized zone text into hymn fields.
//!
//! The patterns follow the layout of the hymnals this crate targets: a
//! `NN. Title (orig)` header, an `Ofertado a ...` metadata line with an
//! optional style keyword, and a `(dd/mm/yyyy)` date in the footer.

use once_cell::sync::Lazy;
use regex::Regex;

/// `NN. Title` with an optional `(orig)` suffix, one per line.
static HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(\d+)\.\s+(.+?)(?:\s*\((\d+)\))?\s*$").expect("valid header regex")
});

/// Start of a header anywhere in the page text.
static HEADER_START_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\.\s+").expect("valid header start regex"));

static DATE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d{2})/(\d{2})/(\d{4})\)").expect("valid date regex"));

static OFFERED_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)ofertado\s+(?:a|ao|à)\s+(.+?)(?:\s*[-–—]\s*|\s*$)")
        .expect("valid offering regex")
});

static INSTRUCTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(em pé|sem instrumentos|sentados?)").expect("valid instruction regex")
});

static PAGE_NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*$").expect("valid page number regex"));

/// Body lines that are never lyrics.
static BODY_NOISE_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // symbol artifacts: XX, WC, Xx x
        r"^[XxWwCc]{1,2}\s*[xX]?\s*$",
        // standalone date
        r"^\s*\(\d{2}/\d{2}/\d{4}\)\s*$",
        // instructions belong to the metadata
        r"^\s*([Ee]m pé|[Ss]em instrumentos|[Ss]entados?)\s*$",
        // bracket and round-letter noise such as "(NOINAIININN"
        r"^[\(\)\[\]oO0lI1NnAa\s]+$",
        r"^[a-zA-ZoO0\(\)\[\]]$",
        r"^\(?[NIOAL1l0]{4,}\)?$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid body noise regex"))
    .collect()
});

/// Musical styles recognized in metadata, in lookup order.
pub const STYLE_KEYWORDS: [&str; 4] = ["Valsa", "Marcha", "Mazurca", "Bolero"];

/// Largest plausible original hymn number.
const MAX_ORIGINAL_NUMBER: u32 = 200;

/// Fields of a hymn header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeader {
    pub number: u32,
    pub title: String,
    pub original_number: Option<u32>,
}

/// Fields of a metadata zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMetadata {
    pub offered_to: Option<String>,
    pub style: Option<String>,
    pub extra_instructions: Option<String>,
}

/// Parses `NN. Title (orig)` from header text.
///
/// OCR often reads the closing parenthesis of the original number as `0)`,
/// turning `63` into `603`. Originals above 200 are repaired by dropping
/// their second-to-last digit when the result is in range.
///
/// # Examples
///
/// ```
/// use hymn_ocr::pipeline::parse_header;
///
/// let header = parse_header("01. Disciplina (62)").unwrap();
/// assert_eq!(header.number, 1);
/// assert_eq!(header.title, "Disciplina");
/// assert_eq!(header.original_number, Some(62));
/// ```
pub fn parse_header(text: &str) -> Option<ParsedHeader> {
    let caps = HEADER_REGEX.captures(text.trim())?;
    let number = caps[1].parse().ok()?;
    let title = caps[2].trim().to_string();
    let original_number = caps
        .get(3)
        .and_then(|m| m.as_str().parse::<u32>().ok().map(|n| (m.as_str(), n)))
        .map(|(digits, n)| repair_original_number(digits).unwrap_or(n));
    Some(ParsedHeader {
        number,
        title,
        original_number,
    })
}

fn repair_original_number(digits: &str) -> Option<u32> {
    let value: u32 = digits.parse().ok()?;
    if value <= MAX_ORIGINAL_NUMBER || digits.len() < 2 {
        return None;
    }
    let (head, last) = digits.split_at(digits.len() - 1);
    let fixed: u32 = format!("{}{}", &head[..head.len() - 1], last).parse().ok()?;
    (1..=MAX_ORIGINAL_NUMBER).contains(&fixed).then_some(fixed)
}

/// First `(dd/mm/yyyy)` date in `text`, as `yyyy-mm-dd`.
pub fn parse_date(text: &str) -> Option<String> {
    let caps = DATE_REGEX.captures(text)?;
    Some(format!("{}-{}-{}", &caps[3], &caps[2], &caps[1]))
}

/// Name following `Ofertado a/ao/à`, without a trailing style keyword.
pub fn parse_offered_to(text: &str) -> Option<String> {
    let caps = OFFERED_REGEX.captures(text)?;
    let mut name = caps[1].trim().to_string();
    for style in STYLE_KEYWORDS {
        if name.to_lowercase().ends_with(&style.to_lowercase()) {
            let cut = name.len() - style.len();
            if name.is_char_boundary(cut) {
                name.truncate(cut);
                name = name
                    .trim()
                    .trim_end_matches(['-', '–', '—'])
                    .trim()
                    .to_string();
            }
        }
    }
    (!name.is_empty()).then_some(name)
}

/// First style keyword mentioned in `text`, case-insensitively.
pub fn parse_style(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    STYLE_KEYWORDS
        .iter()
        .find(|style| lower.contains(&style.to_lowercase()))
        .map(|style| style.to_string())
}

/// Performance instructions in `text`, normalized and comma-joined.
pub fn parse_instructions(text: &str) -> Option<String> {
    let normalized: Vec<&str> = INSTRUCTION_REGEX
        .find_iter(text)
        .filter_map(|m| {
            let lower = m.as_str().to_lowercase();
            if lower.contains("em pé") {
                Some("Em pé")
            } else if lower.contains("sem instrumentos") {
                Some("sem instrumentos")
            } else if lower.contains("sentado") {
                Some("Sentados")
            } else {
                None
            }
        })
        .collect();
    (!normalized.is_empty()).then(|| normalized.join(", "))
}

/// All metadata fields of a metadata zone.
pub fn parse_metadata(text: &str) -> ParsedMetadata {
    ParsedMetadata {
        offered_to: parse_offered_to(text),
        style: parse_style(text),
        extra_instructions: parse_instructions(text),
    }
}

/// Page number printed alone on the last line of the footer.
pub fn extract_page_number(text: &str) -> Option<u32> {
    let last = text.trim().lines().last()?;
    PAGE_NUMBER_REGEX.captures(last.trim())?[1].parse().ok()
}

/// Whether the text starts with a `NN. ` hymn header.
pub fn has_header_pattern(text: &str) -> bool {
    HEADER_START_REGEX.is_match(text)
}

/// Whether the text contains a `(dd/mm/yyyy)` date.
pub fn has_date_pattern(text: &str) -> bool {
    DATE_REGEX.is_match(text)
}

/// Normalizes raw recognizer output.
///
/// Line endings become `\n`, every line is trimmed, runs of blank lines
/// shrink to one, and leading and trailing blank lines are removed.
pub fn clean_ocr_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<&str> = Vec::new();
    for line in normalized.split('\n').map(str::trim) {
        if line.is_empty() && lines.last().is_none_or(|prev| prev.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// Cleans body text down to the lyrics.
///
/// Drops page numbers, symbol artifacts, standalone dates and instruction
/// lines, and recognizer noise. A leading bar marker `|` is stripped from
/// each line. Stanza breaks are kept as single blank lines.
pub fn clean_body_text(text: &str) -> String {
    let mut cleaned: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        let stripped = line.trim();
        if stripped.is_empty() {
            cleaned.push("");
            continue;
        }
        if stripped.chars().all(|c| c.is_ascii_digit())
            || BODY_NOISE_REGEXES.iter().any(|re| re.is_match(stripped))
        {
            continue;
        }
        let stripped = stripped
            .strip_prefix('|')
            .map(str::trim)
            .unwrap_or(stripped);
        cleaned.push(stripped);
    }

    let mut result = String::with_capacity(text.len());
    let mut blank_run = 0;
    for (i, line) in cleaned.iter().enumerate() {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        if i > 0 {
            result.push('\n');
        }
        result.push_str(line);
    }
    result.trim().to_string()
}
