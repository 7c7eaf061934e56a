//! Shared types for the parade state pipeline.

use serde::Serialize;

// ── Personnel ───────────────────────────────────────────────────────

/// Attendance status read from a personnel line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Present,
    Absent,
    /// No status glyph on the line.
    Unknown,
}

/// One parsed personnel line. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonnelRecord {
    display_text: String,
    status: Status,
    is_category_flagged: bool,
}

impl PersonnelRecord {
    pub fn new(display_text: impl Into<String>, status: Status, is_category_flagged: bool) -> Self {
        Self {
            display_text: display_text.into(),
            status,
            is_category_flagged,
        }
    }

    /// Text shown in the report breakdown.
    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether a rank token marked this person as the flagged category.
    pub fn is_category_flagged(&self) -> bool {
        self.is_category_flagged
    }

    pub fn is_present(&self) -> bool {
        self.status == Status::Present
    }
}

// ── Group report ────────────────────────────────────────────────────

/// Everything parsed from one company's latest parade state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub personnel: Vec<PersonnelRecord>,
    pub attached: Vec<PersonnelRecord>,
}

impl GroupReport {
    /// Primary roster size. Attached personnel are not counted.
    pub fn total(&self) -> usize {
        self.personnel.len()
    }

    pub fn present(&self) -> usize {
        self.personnel.iter().filter(|p| p.is_present()).count()
    }

    pub fn flagged(&self) -> usize {
        self.personnel
            .iter()
            .filter(|p| p.is_category_flagged())
            .count()
    }

    pub fn unflagged(&self) -> usize {
        self.total() - self.flagged()
    }

    pub fn is_empty(&self) -> bool {
        self.personnel.is_empty() && self.attached.is_empty()
    }
}
