//! Line normalizer: turns a raw message into clean content lines.
//!
//! Drops blank lines, site-location lines and stray header date lines
//! (`16 Oct 26`, `3 Jan 2025`). Never fails; empty input gives no lines.

use regex::Regex;

use crate::config::ParadeConfig;

/// Day, three-letter month, two- or four-digit year.
const DATE_PATTERN: &str = r"\d{1,2}\s+[A-Za-z]{3}\s+\d{2,4}";

pub struct LineNormalizer {
    /// Lower-cased site markers.
    site_markers: Vec<String>,
    date_regex: Regex,
}

impl LineNormalizer {
    pub fn new(config: &ParadeConfig) -> Self {
        Self {
            site_markers: config
                .site_markers
                .iter()
                .map(|m| m.trim().to_lowercase())
                .collect(),
            date_regex: Regex::new(DATE_PATTERN).expect("date pattern is valid"),
        }
    }

    pub fn normalize(&self, text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !self.is_site_line(line))
            .filter(|line| !self.date_regex.is_match(line))
            .map(String::from)
            .collect()
    }

    fn is_site_line(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.site_markers.iter().any(|m| lower.contains(m.as_str()))
    }
}
