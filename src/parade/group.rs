//! The fixed set of sub-groups that submit parade states.

use serde::{Deserialize, Serialize};

/// A company submitting its own parade state.
///
/// Declaration order is the display order used by every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Group {
    #[serde(rename = "HQ")]
    Hq,
    Alpha,
    Bravo,
    Charlie,
    #[serde(rename = "MSC")]
    Msc,
    Support,
}

impl Group {
    /// Number of groups; the store holds exactly this many slots.
    pub const COUNT: usize = 6;

    /// All groups in display order.
    pub const ALL: [Group; Group::COUNT] = [
        Group::Hq,
        Group::Alpha,
        Group::Bravo,
        Group::Charlie,
        Group::Msc,
        Group::Support,
    ];

    /// Position in display order, also the store slot index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used in acknowledgements and breakdown headers.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Hq => "HQ",
            Self::Alpha => "Alpha",
            Self::Bravo => "Bravo",
            Self::Charlie => "Charlie",
            Self::Msc => "MSC",
            Self::Support => "Support",
        }
    }

    /// Short label used in the per-group count summary.
    pub fn summary_label(self) -> &'static str {
        match self {
            Self::Support => "SP",
            other => other.display_name(),
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_follows_display_order() {
        for (i, group) in Group::ALL.iter().enumerate() {
            assert_eq!(group.index(), i);
        }
    }

    #[test]
    fn support_has_short_label() {
        assert_eq!(Group::Support.summary_label(), "SP");
        assert_eq!(Group::Support.display_name(), "Support");
        assert_eq!(Group::Msc.summary_label(), "MSC");
    }

    #[test]
    fn serde_uses_display_names() {
        let json = serde_json::to_string(&Group::Msc).unwrap();
        assert_eq!(json, "\"MSC\"");
        let parsed: Group = serde_json::from_str("\"HQ\"").unwrap();
        assert_eq!(parsed, Group::Hq);
    }
}
