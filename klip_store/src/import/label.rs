//! Route label grammar.
//!
//! A label cell mixes a topo number, a route name, a grade and sometimes a pitch
//! marker: `"1 - Assurancetourix 6a+"`, `"L2: 6b"`, `"Les pas perdus"`.
//! Extraction order:
//! 1. pitch markers `L<n>: <grade>` (first one wins, all are removed);
//! 2. otherwise the first standalone grade (removed);
//! 3. the remainder splits as `<number> - <name>`, or is the whole name with number 0.

use once_cell::sync::Lazy;
use regex::Regex;

static PITCH_WITH_GRADE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)L([0-9]+)\s*:\s*([3-9][a-c]\+?)").expect("valid pitch marker regex")
});

static STANDALONE_GRADE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([3-9][a-c])(\+)?").expect("valid grade regex"));

static NUMBER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)\s*-\s*(.+)$").expect("valid number-name regex"));

/// Structured view of one label cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLabel {
    /// Topo number, `0` when absent.
    pub number: i32,
    /// Route name, `None` when nothing is left after extraction.
    pub name: Option<String>,
    /// Lowercased grade.
    pub grade: Option<String>,
    /// Pitch marker number (`L2` → 2).
    pub pitch_number: Option<u32>,
}

/// Parse a label. Never fails; unrecognised text ends up in [`ParsedLabel::name`].
pub fn parse_label(label: &str) -> ParsedLabel {
    let mut working = label.trim().to_string();
    let mut grade = None;
    let mut pitch_number = None;

    if let Some(caps) = PITCH_WITH_GRADE.captures(&working) {
        // digits that overflow are still a marker, just not a usable number
        pitch_number = Some(caps[1].parse().unwrap_or(u32::MAX));
        grade = Some(caps[2].to_lowercase());
        working = PITCH_WITH_GRADE.replace_all(&working, "").trim().to_string();
    } else if let Some(caps) = STANDALONE_GRADE.captures(&working) {
        let plus = caps.get(2).map_or("", |m| m.as_str());
        grade = Some(format!("{}{plus}", &caps[1]).to_lowercase());
        working = STANDALONE_GRADE.replace(&working, "").trim().to_string();
    }

    let numbered = NUMBER_NAME.captures(&working).and_then(|caps| {
        let number = caps[1].parse::<i32>().ok()?;
        Some((number, caps[2].trim().to_string()))
    });
    let (number, name) = numbered.unwrap_or((0, working));

    ParsedLabel {
        number,
        name: Some(name).filter(|n| !n.is_empty()),
        grade,
        pitch_number,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(number: i32, name: Option<&str>, grade: Option<&str>, pitch: Option<u32>) -> ParsedLabel {
        ParsedLabel {
            number,
            name: name.map(str::to_string),
            grade: grade.map(str::to_string),
            pitch_number: pitch,
        }
    }

    #[test]
    fn numbered_route_with_grade() {
        assert_eq!(
            parse_label("1 - Assurancetourix 6a+"),
            label(1, Some("Assurancetourix"), Some("6a+"), None)
        );
    }

    #[test]
    fn pitch_marker_only() {
        assert_eq!(parse_label("L2: 6b"), label(0, None, Some("6b"), Some(2)));
        assert_eq!(parse_label("l3 :7C+"), label(0, None, Some("7c+"), Some(3)));
    }

    #[test]
    fn name_without_number() {
        assert_eq!(
            parse_label("Les pas perdus"),
            label(0, Some("Les pas perdus"), None, None)
        );
    }

    #[test]
    fn first_pitch_marker_wins_and_all_are_stripped() {
        assert_eq!(
            parse_label("4 - Grande voie L1: 6a L2: 6c+"),
            label(4, Some("Grande voie"), Some("6a"), Some(1))
        );
    }

    #[test]
    fn only_first_standalone_grade_is_stripped() {
        assert_eq!(
            parse_label("Dalle 5B 6a"),
            label(0, Some("Dalle  6a"), Some("5b"), None)
        );
    }

    #[test]
    fn number_with_empty_name_falls_back() {
        // "7 -" has nothing after the dash, so the number pattern does not apply
        assert_eq!(parse_label("7 -"), label(0, Some("7 -"), None, None));
        assert_eq!(parse_label("   "), label(0, None, None, None));
    }

    #[test]
    fn overflowing_number_stays_in_name() {
        let parsed = parse_label("99999999999 - Big");
        assert_eq!(parsed.number, 0);
        assert_eq!(parsed.name.as_deref(), Some("99999999999 - Big"));
    }

    #[test]
    fn grade_outside_range_is_name() {
        assert_eq!(parse_label("2a - x").grade, None);
        assert_eq!(parse_label("L1: 2a").pitch_number, None);
    }
}
