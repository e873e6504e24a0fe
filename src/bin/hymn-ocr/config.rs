//! Configuration for the command-line tool.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use hymn_ocr::core::{ConfigValidator, HymnResult, PipelineConfig};

/// Settings given on the command line, applied over the config file.
#[derive(Clone, Debug, Default)]
pub struct ConvertConfig {
    pub config_file: Option<PathBuf>,
    pub dpi: Option<u32>,
    pub language: Option<String>,
    pub threads: Option<usize>,
}

impl ConvertConfig {
    /// The pipeline configuration: file values (or defaults), then overrides.
    pub fn resolve(&self) -> HymnResult<PipelineConfig> {
        let mut config = match &self.config_file {
            Some(path) => load_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(dpi) = self.dpi {
            config.dpi = dpi;
        }
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        if self.threads.is_some() {
            config.parallel = config.parallel.with_max_threads(self.threads);
        }
        config.validate()?;
        Ok(config)
    }
}

fn load_file(path: &Path) -> HymnResult<PipelineConfig> {
    Ok(PipelineConfig::from_yaml_file(path)?)
}

/// An inclusive, 1-indexed page range: `2-10` or a single page `5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRange {
    pub first: usize,
    pub last: usize,
}

impl FromStr for PageRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid page number '{}'", part.trim()))
        };
        let (first, last) = match s.split_once('-') {
            Some((first, last)) => (parse(first)?, parse(last)?),
            None => {
                let page = parse(s)?;
                (page, page)
            }
        };
        if first == 0 || first > last {
            return Err(format!("invalid page range '{}'", s));
        }
        Ok(Self { first, last })
    }
}
