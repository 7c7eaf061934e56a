//! Record parser: one personnel line in, one `PersonnelRecord` out.
//!
//! There is no failure path: a garbled line still produces a record
//! (Unknown status, unflagged) so the rest of the message is kept.

use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::config::ParadeConfig;
use crate::parade::group::Group;
use crate::parade::types::{PersonnelRecord, Status};

/// Present and absent markers.
#[derive(Debug, Clone)]
pub struct Glyphs {
    pub present: String,
    pub absent: String,
}

impl Glyphs {
    /// Present wins when a line carries both glyphs.
    pub fn status_of(&self, line: &str) -> Status {
        if line.contains(self.present.as_str()) {
            Status::Present
        } else if line.contains(self.absent.as_str()) {
            Status::Absent
        } else {
            Status::Unknown
        }
    }

    pub fn for_status(&self, status: Status) -> Option<&str> {
        match status {
            Status::Present => Some(&self.present),
            Status::Absent => Some(&self.absent),
            Status::Unknown => None,
        }
    }
}

// ── Render policies ─────────────────────────────────────────────────

/// Produces the display text for a line whose ordinal is already stripped.
pub trait RenderPolicy: Send + Sync {
    fn render(&self, line: &str, status: Status) -> String;
}

/// Shows the line as written.
pub struct VerbatimPolicy;

impl RenderPolicy for VerbatimPolicy {
    fn render(&self, line: &str, _status: Status) -> String {
        line.to_string()
    }
}

/// Rebuilds the line as `<name> <glyph> <remark>`.
///
/// The name is the line without glyphs, parenthesized text and rank tokens;
/// the remark is the first parenthesized substring.
pub struct RemarkPolicy {
    glyphs: Glyphs,
    paren_regex: Regex,
    rank_regex: Option<Regex>,
}

impl RemarkPolicy {
    pub fn new(glyphs: Glyphs, rank_regex: Option<Regex>) -> Self {
        Self {
            glyphs,
            paren_regex: Regex::new(r"\(.*?\)").expect("paren pattern is valid"),
            rank_regex,
        }
    }
}

impl RenderPolicy for RemarkPolicy {
    fn render(&self, line: &str, status: Status) -> String {
        let remark = self.paren_regex.find(line).map(|m| m.as_str());

        let without_parens = self.paren_regex.replace_all(line, "");
        let without_glyphs = without_parens
            .replace(self.glyphs.present.as_str(), "")
            .replace(self.glyphs.absent.as_str(), "");
        let name_source = match self.rank_regex {
            Some(ref re) => re.replace_all(&without_glyphs, "").into_owned(),
            None => without_glyphs,
        };
        let name = name_source.split_whitespace().collect::<Vec<_>>().join(" ");

        // Unknown status renders without a glyph.
        [Some(name.as_str()), self.glyphs.for_status(status), remark]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ── Parser ──────────────────────────────────────────────────────────

pub struct RecordParser {
    glyphs: Glyphs,
    ordinal_regex: Regex,
    rank_regex: Option<Regex>,
    /// Lower-cased name substrings that clear the category flag.
    overrides: Vec<String>,
    /// One policy per group, indexed by `Group::index`.
    policies: Vec<Arc<dyn RenderPolicy>>,
}

impl RecordParser {
    pub fn new(config: &ParadeConfig) -> Self {
        let glyphs = Glyphs {
            present: config.present_glyph.clone(),
            absent: config.absent_glyph.clone(),
        };
        let rank_regex = build_rank_regex(&config.rank_tokens);

        let verbatim: Arc<dyn RenderPolicy> = Arc::new(VerbatimPolicy);
        let remark: Arc<dyn RenderPolicy> =
            Arc::new(RemarkPolicy::new(glyphs.clone(), rank_regex.clone()));
        let policies = Group::ALL
            .iter()
            .map(|g| {
                if config.remark_groups.contains(g) {
                    Arc::clone(&remark)
                } else {
                    Arc::clone(&verbatim)
                }
            })
            .collect();

        Self {
            glyphs,
            ordinal_regex: Regex::new(r"^\d+\.\s*").expect("ordinal pattern is valid"),
            rank_regex,
            overrides: config
                .flag_overrides
                .iter()
                .map(|o| o.trim().to_lowercase())
                .filter(|o| !o.is_empty())
                .collect(),
            policies,
        }
    }

    /// Replace the render policy for one group.
    pub fn with_policy(mut self, group: Group, policy: Arc<dyn RenderPolicy>) -> Self {
        self.policies[group.index()] = policy;
        self
    }

    pub fn parse_line(&self, line: &str, group: Group) -> PersonnelRecord {
        let line = self.ordinal_regex.replace(line.trim(), "");
        let status = self.glyphs.status_of(&line);
        if status == Status::Unknown {
            debug!(line = %line, group = %group, "Personnel line has no status glyph");
        }

        let is_flagged = self.is_category_flagged(&line);
        let display_text = self.policies[group.index()].render(&line, status);

        PersonnelRecord::new(display_text, status, is_flagged)
    }

    pub fn parse_lines(&self, lines: &[String], group: Group) -> Vec<PersonnelRecord> {
        lines.iter().map(|l| self.parse_line(l, group)).collect()
    }

    /// Rank token match, cleared by any override name.
    fn is_category_flagged(&self, line: &str) -> bool {
        let rank_hit = self
            .rank_regex
            .as_ref()
            .is_some_and(|re| re.is_match(line));
        if !rank_hit {
            return false;
        }
        let lower = line.to_lowercase();
        !self.overrides.iter().any(|o| lower.contains(o.as_str()))
    }
}

/// `(?i)\b(?:TOKEN|...)\b`, or `None` when no tokens are configured.
fn build_rank_regex(tokens: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return None;
    }
    let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("Invalid rank token pattern '{}': {}", pattern, e);
            None
        }
    }
}
