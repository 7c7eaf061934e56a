//! Section splitter: title, primary roster and attached roster.

const TITLE_PHRASE: &str = "parade state";
const ATTACHED_MARKER: &str = "attached";

/// Normalized lines divided into their report sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    pub title: Option<String>,
    pub primary: Vec<String>,
    pub attached: Vec<String>,
}

/// Split normalized lines.
///
/// A first line containing "parade state" is the title. The first content
/// line containing "attached" separates the rosters and is itself dropped.
pub fn split_sections(lines: &[String]) -> Sections {
    let (title, content) = match lines.split_first() {
        Some((first, rest)) if first.to_lowercase().contains(TITLE_PHRASE) => {
            (Some(first.clone()), rest)
        }
        _ => (None, lines),
    };

    let marker = content
        .iter()
        .position(|l| l.to_lowercase().contains(ATTACHED_MARKER));

    match marker {
        Some(a) => Sections {
            title,
            primary: content[..a].to_vec(),
            attached: content[a + 1..].to_vec(),
        },
        None => Sections {
            title,
            primary: content.to_vec(),
            attached: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn splits_title_primary_and_attached() {
        let s = split_sections(&lines(&["Title Parade State", "A", "Attached", "B"]));
        assert_eq!(s.title.as_deref(), Some("Title Parade State"));
        assert_eq!(s.primary, vec!["A"]);
        assert_eq!(s.attached, vec!["B"]);
    }

    #[test]
    fn no_attached_marker_keeps_everything_primary() {
        let s = split_sections(&lines(&["HQ Parade State", "A", "B"]));
        assert_eq!(s.primary, vec!["A", "B"]);
        assert!(s.attached.is_empty());
    }

    #[test]
    fn without_title_first_line_is_content() {
        let s = split_sections(&lines(&["A", "Attached Personnel:", "B", "C"]));
        assert!(s.title.is_none());
        assert_eq!(s.primary, vec!["A"]);
        assert_eq!(s.attached, vec!["B", "C"]);
    }

    #[test]
    fn only_first_attached_marker_splits() {
        let s = split_sections(&lines(&["A", "ATTACHED", "B", "attached from 3 SIR", "C"]));
        assert_eq!(s.primary, vec!["A"]);
        assert_eq!(s.attached, vec!["B", "attached from 3 SIR", "C"]);
    }

    #[test]
    fn marker_as_last_line_gives_empty_attached() {
        let s = split_sections(&lines(&["HQ Parade State", "A", "Attached"]));
        assert_eq!(s.primary, vec!["A"]);
        assert!(s.attached.is_empty());
    }

    #[test]
    fn title_only_gives_empty_blocks() {
        let s = split_sections(&lines(&["HQ Parade State"]));
        assert!(s.primary.is_empty());
        assert!(s.attached.is_empty());
    }

    #[test]
    fn empty_input_gives_empty_blocks() {
        assert_eq!(split_sections(&[]), Sections::default());
    }
}
