//! Group classifier: decides which company sent a parade state.
//!
//! Looks only at the first few raw lines, because the title that names the
//! company is exactly what the normalizer is allowed to throw away.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ParadeConfig;
use crate::parade::group::Group;

/// How a rule's marker is compared against the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Marker appears anywhere in the header.
    #[default]
    Contains,
    /// Some header line starts with the marker.
    LinePrefix,
}

/// One entry of the ordered marker table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRule {
    pub marker: String,
    pub group: Group,
    #[serde(default)]
    pub mode: MatchMode,
}

impl ClassifierRule {
    /// `header` must already be lower-cased.
    fn matches(&self, header: &str, marker: &str) -> bool {
        match self.mode {
            MatchMode::Contains => header.contains(marker),
            MatchMode::LinePrefix => header.lines().any(|l| l.trim_start().starts_with(marker)),
        }
    }
}

pub struct GroupClassifier {
    depth: usize,
    /// Rules paired with their lower-cased marker.
    rules: Vec<(ClassifierRule, String)>,
}

impl GroupClassifier {
    pub fn new(config: &ParadeConfig) -> Self {
        Self {
            depth: config.classifier_depth.max(1),
            rules: config
                .classifier_rules
                .iter()
                .map(|r| (r.clone(), r.marker.trim().to_lowercase()))
                .collect(),
        }
    }

    /// The lower-cased header the rules are tested against.
    pub fn header(&self, text: &str) -> String {
        text.to_lowercase()
            .lines()
            .take(self.depth)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// First matching rule's group, or `None` if no marker is present.
    pub fn classify(&self, text: &str) -> Option<Group> {
        let header = self.header(text);
        let hit = self
            .rules
            .iter()
            .find(|(rule, marker)| rule.matches(&header, marker))
            .map(|(rule, _)| rule);

        match hit {
            Some(rule) => {
                debug!(marker = %rule.marker, group = %rule.group, "Parade state classified");
                Some(rule.group)
            }
            None => {
                debug!(header = %header, "No group marker in message header");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> GroupClassifier {
        GroupClassifier::new(&ParadeConfig::default())
    }

    #[test]
    fn classifies_each_default_title() {
        let cases = [
            ("HQ Parade State", Group::Hq),
            ("Alpha Parade State", Group::Alpha),
            ("A Coy parade state", Group::Alpha),
            ("Bravo Parade State", Group::Bravo),
            ("B COY", Group::Bravo),
            ("Charlie Parade State", Group::Charlie),
            ("C Coy Parade State", Group::Charlie),
            ("MSC Parade State", Group::Msc),
            ("Support Coy Parade State", Group::Support),
            ("Support Parade State", Group::Support),
            ("SP Coy", Group::Support),
        ];
        let c = classifier();
        for (title, expected) in cases {
            let text = format!("{title}\n1. PTE Tan ✅");
            assert_eq!(c.classify(&text), Some(expected), "title: {title}");
        }
    }

    #[test]
    fn msc_coy_is_not_charlie() {
        assert_eq!(classifier().classify("MSC Coy Parade State\n1. X"), Some(Group::Msc));
    }

    #[test]
    fn marker_on_third_line_is_found() {
        let text = "Good morning sirs\n16 Oct 26\nBravo parade state\n1. PTE Tan ✅";
        assert_eq!(classifier().classify(text), Some(Group::Bravo));
    }

    #[test]
    fn marker_beyond_depth_is_ignored() {
        let text = "Good morning\nsirs\nplease see below\nHQ Parade State";
        assert_eq!(classifier().classify(text), None);
    }

    #[test]
    fn unrelated_chatter_is_not_classified() {
        assert_eq!(classifier().classify("ok noted, thanks"), None);
        assert_eq!(classifier().classify(""), None);
    }

    #[test]
    fn table_order_breaks_ties() {
        // Both "hq parade" and "alpha parade" appear; HQ comes first in the table.
        let text = "Alpha parade state (copy of HQ parade state)";
        assert_eq!(classifier().classify(text), Some(Group::Hq));
    }

    #[test]
    fn line_prefix_mode_requires_line_start() {
        let config = ParadeConfig {
            classifier_rules: vec![ClassifierRule {
                marker: "HQ".to_string(),
                group: Group::Hq,
                mode: MatchMode::LinePrefix,
            }],
            ..ParadeConfig::default()
        };
        let c = GroupClassifier::new(&config);
        assert_eq!(c.classify("hq parade state"), Some(Group::Hq));
        assert_eq!(c.classify("morning\n  HQ strength"), Some(Group::Hq));
        assert_eq!(c.classify("not hq"), None);
    }

    #[test]
    fn depth_is_configurable() {
        let config = ParadeConfig {
            classifier_depth: 1,
            ..ParadeConfig::default()
        };
        let c = GroupClassifier::new(&config);
        assert_eq!(c.classify("Morning\nHQ Parade State"), None);
        assert_eq!(c.classify("HQ Parade State\nMorning"), Some(Group::Hq));
    }
}
