//! Report aggregator: folds a store snapshot into the consolidated message.
//!
//! Rendering is a pure function of the snapshot, the date and the config,
//! so repeated calls on an unchanged store give identical text.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::config::ParadeConfig;
use crate::parade::group::Group;
use crate::parade::store::StoreSnapshot;
use crate::parade::types::PersonnelRecord;

const SEPARATOR: &str = "———————————————";

/// Markup dialect of the transport the report is sent over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Markup {
    /// Telegram legacy Markdown: `*bold*`.
    #[default]
    Markdown,
    Plain,
}

impl Markup {
    pub fn bold(self, text: &str) -> String {
        match self {
            Self::Markdown => format!("*{text}*"),
            Self::Plain => text.to_string(),
        }
    }
}

pub struct ReportAggregator {
    unit_name: String,
    flagged_label: String,
    unflagged_label: String,
    markup: Markup,
}

impl ReportAggregator {
    pub fn new(config: &ParadeConfig, markup: Markup) -> Self {
        Self {
            unit_name: config.unit_name.clone(),
            flagged_label: config.flagged_label.clone(),
            unflagged_label: config.unflagged_label.clone(),
            markup,
        }
    }

    /// Date as it appears in the report, e.g. `16 october 2026`.
    pub fn format_date(date: NaiveDate) -> String {
        date.format("%d %B %Y").to_string().to_lowercase()
    }

    /// The full consolidated report.
    pub fn render(&self, snapshot: &StoreSnapshot, date: NaiveDate) -> String {
        let date = Self::format_date(date);
        let mut msg = String::new();

        let mut summary = Vec::with_capacity(Group::COUNT);
        let (mut total_unflagged, mut total_flagged) = (0usize, 0usize);
        for (group, report) in snapshot.iter() {
            let (unflagged, flagged) = report.map_or((0, 0), |r| (r.unflagged(), r.flagged()));
            total_unflagged += unflagged;
            total_flagged += flagged;
            summary.push(format!("{} - {}/{}", group.summary_label(), unflagged, flagged));
        }

        let _ = writeln!(msg, "{} Strength CAA {}\n", self.unit_name, date);
        let _ = writeln!(
            msg,
            "Total Strength - {} ({} {} / {} {})\n",
            total_unflagged + total_flagged,
            total_unflagged,
            self.unflagged_label,
            total_flagged,
            self.flagged_label,
        );
        let _ = writeln!(msg, "{}/{}", self.unflagged_label, self.flagged_label);
        msg.push_str(&summary.join("\n"));
        msg.push_str("\n\nBreakdown\n");

        for (group, report) in snapshot.submitted() {
            let header = format!("{} Parade State for {}", group.display_name(), date);
            let _ = writeln!(msg, "{}", self.markup.bold(&header));
            let _ = writeln!(
                msg,
                "Current Strength: {}/{}\n",
                report.present(),
                report.total()
            );
            push_numbered(&mut msg, &report.personnel);
            if !report.attached.is_empty() {
                msg.push_str("\nAttached Personnel\n");
                push_numbered(&mut msg, &report.attached);
            }
            let _ = write!(msg, "\n{SEPARATOR}\n\n");
        }

        msg
    }

    /// The status board for `ParadeStore::submitted` flags.
    pub fn render_status(&self, submitted: &[(Group, bool)]) -> String {
        let mut msg = format!("📊 {}\n", self.markup.bold("Submission Status:"));
        for &(group, done) in submitted {
            let icon = if done { "✅" } else { "❌" };
            let _ = writeln!(msg, "{icon} {group}");
        }
        msg
    }
}

fn push_numbered(msg: &mut String, records: &[PersonnelRecord]) {
    for (idx, record) in records.iter().enumerate() {
        let _ = writeln!(msg, "{}. {}", idx + 1, record.display_text());
    }
}
