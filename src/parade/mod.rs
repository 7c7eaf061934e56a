//! Parade state parsing and reporting.
//!
//! Every inbound message flows through:
//! 1. `GroupClassifier::classify()` on the raw text
//! 2. `LineNormalizer::normalize()`
//! 3. `split_sections()` into primary and attached rosters
//! 4. `RecordParser::parse_line()` per roster line
//!
//! The resulting `GroupReport` is upserted into `ParadeStore`, and
//! `ReportAggregator` renders the store on demand.

pub mod classify;
pub mod group;
pub mod normalize;
pub mod record;
pub mod report;
pub mod sections;
pub mod store;
pub mod types;

pub use classify::{ClassifierRule, GroupClassifier, MatchMode};
pub use group::Group;
pub use normalize::LineNormalizer;
pub use record::{RecordParser, RemarkPolicy, RenderPolicy, VerbatimPolicy};
pub use report::{Markup, ReportAggregator};
pub use sections::{Sections, split_sections};
pub use store::{ParadeStore, StoreSnapshot};
pub use types::{GroupReport, PersonnelRecord, Status};

use crate::config::ParadeConfig;

/// The full text-to-report pipeline, built once from config.
pub struct ParadeParser {
    classifier: GroupClassifier,
    normalizer: LineNormalizer,
    records: RecordParser,
}

impl ParadeParser {
    pub fn new(config: &ParadeConfig) -> Self {
        Self {
            classifier: GroupClassifier::new(config),
            normalizer: LineNormalizer::new(config),
            records: RecordParser::new(config),
        }
    }

    pub fn classify(&self, text: &str) -> Option<Group> {
        self.classifier.classify(text)
    }

    /// Classify and parse. `None` when no group marker is found.
    pub fn parse(&self, text: &str) -> Option<(Group, GroupReport)> {
        let group = self.classify(text)?;
        Some((group, self.parse_for(group, text)))
    }

    /// Parse a message already known to belong to `group`.
    pub fn parse_for(&self, group: Group, text: &str) -> GroupReport {
        let lines = self.normalizer.normalize(text);
        let sections = split_sections(&lines);
        GroupReport {
            personnel: self.records.parse_lines(&sections.primary, group),
            attached: self.records.parse_lines(&sections.attached, group),
        }
    }
}
