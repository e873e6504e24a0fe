//! Repetition ranges and their textual form (`"1-2, 3-4, 1-4"`).

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An inclusive, 1-indexed range of text lines marked for repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RepetitionRange {
    /// First repeated line.
    pub start: usize,
    /// Last repeated line.
    pub end: usize,
}

impl RepetitionRange {
    /// Creates a range, returning `None` unless `1 <= start <= end`.
    pub fn new(start: usize, end: usize) -> Option<Self> {
        (start >= 1 && start <= end).then_some(Self { start, end })
    }

    /// Whether the range fits in a text of `num_lines` lines.
    pub fn fits(&self, num_lines: usize) -> bool {
        self.end <= num_lines
    }

    /// Shifts both ends by `offset` lines.
    pub fn offset_by(self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

impl fmt::Display for RepetitionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for RepetitionRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("'{}' is not a start-end range", s))?;
        let start = start
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("bad range start in '{}': {}", s, e))?;
        let end = end
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("bad range end in '{}': {}", s, e))?;
        Self::new(start, end).ok_or_else(|| format!("'{}' is not an ascending range", s))
    }
}

/// One comma-separated component of a repetitions field.
///
/// Text read back from YAML may contain parts that are not ranges; those are
/// kept verbatim so nothing is lost when pages are merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RepetitionPart {
    /// A well-formed range.
    Range(RepetitionRange),
    /// Anything else, trimmed.
    Raw(String),
}

impl fmt::Display for RepetitionPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepetitionPart::Range(range) => range.fmt(f),
            RepetitionPart::Raw(text) => f.write_str(text),
        }
    }
}

/// Ordered, de-duplicated list of repetition parts.
///
/// Serialized as the joined string, e.g. `"1-2, 3-4, 1-4"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repetitions {
    parts: Vec<RepetitionPart>,
}

impl Repetitions {
    /// Builds from ranges, dropping repeats while keeping first occurrences.
    pub fn from_ranges(ranges: impl IntoIterator<Item = RepetitionRange>) -> Self {
        Self {
            parts: ranges
                .into_iter()
                .unique()
                .map(RepetitionPart::Range)
                .collect(),
        }
    }

    /// Whether there are no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// The parts in order.
    pub fn parts(&self) -> &[RepetitionPart] {
        &self.parts
    }

    /// The well-formed ranges in order.
    pub fn ranges(&self) -> impl Iterator<Item = RepetitionRange> + '_ {
        self.parts.iter().filter_map(|part| match part {
            RepetitionPart::Range(range) => Some(*range),
            RepetitionPart::Raw(_) => None,
        })
    }

    /// Shifts every range by `offset` lines; raw parts are untouched.
    pub fn offset_by(&self, offset: usize) -> Self {
        Self {
            parts: self
                .parts
                .iter()
                .map(|part| match part {
                    RepetitionPart::Range(range) => RepetitionPart::Range(range.offset_by(offset)),
                    raw => raw.clone(),
                })
                .collect(),
        }
    }

    /// Appends `other` after `self`, as a continuation page does.
    pub fn concat(&self, other: &Repetitions) -> Self {
        let mut parts = self.parts.clone();
        parts.extend(other.parts.iter().cloned());
        Self { parts }
    }
}

impl fmt::Display for Repetitions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.iter().join(", "))
    }
}

impl FromStr for Repetitions {
    type Err = std::convert::Infallible;

    /// Parses a comma-separated field. Never fails: unparseable parts stay raw.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| match part.parse::<RepetitionRange>() {
                Ok(range) => RepetitionPart::Range(range),
                Err(_) => RepetitionPart::Raw(part.to_string()),
            })
            .collect();
        Ok(Self { parts })
    }
}

impl Serialize for Repetitions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Repetitions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let Ok(repetitions) = text.parse::<Repetitions>();
        Ok(repetitions)
    }
}
