//! Grade parsing and ordering.
//!
//! A French grade is a number, an optional letter (`a`, `b` or `c`, defaulting to
//! `a`) and an optional `+`. Grades order by number, then letter, then modifier:
//!
//! ```
//! use std::cmp::Ordering;
//! use klip_grades::compare_grades;
//!
//! assert_eq!(compare_grades("7a", "6c+"), Ordering::Greater);
//! assert_eq!(compare_grades("6", "6a"), Ordering::Equal);
//! assert_eq!(compare_grades("10a", "9a"), Ordering::Greater);
//! ```
//!
//! Two grammars:
//! - [`parse_grade`] accepts any digit sequence so that whatever is already stored
//!   (including extreme grades like `"10a"`) can still be ordered.
//! - [`is_valid_cotation`] only accepts `3`-`9` and gates user input.

use std::{cmp::Ordering, fmt, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Error returned by [`Grade::from_str`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GradeError {
    /// The text does not match `<digits>[a-c][+]`.
    #[error("invalid grade: {0:?}")]
    Invalid(String),
}

/// A parsed grade. The derived ordering is the climbing ordering because the
/// fields are declared in comparison priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Grade {
    /// Leading number (`6` in `"6a+"`). Compared as an integer.
    pub number: u32,
    /// Lowercase letter, `'a'` when the grade omits it.
    pub letter: char,
    /// `true` when the grade ends with `+`.
    pub plus: bool,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.letter)?;
        if self.plus {
            write!(f, "+")?;
        }
        Ok(())
    }
}

impl FromStr for Grade {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_grade(s).ok_or_else(|| GradeError::Invalid(s.to_string()))
    }
}

static GRADE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([0-9]+)([a-c])?(\+)?$").expect("grade regex"));

static COTATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[3-9][a-c]?\+?$").expect("cotation regex"));

/// Parse a grade, matching `^([0-9]+)([a-c])?(\+)?$` case-insensitively.
///
/// Numbers past `u32::MAX` saturate, so they still order above every smaller grade.
pub fn parse_grade(input: &str) -> Option<Grade> {
    let caps = GRADE_RE.captures(input)?;
    let number = caps[1].parse().unwrap_or(u32::MAX);
    let letter = caps
        .get(2)
        .and_then(|m| m.as_str().chars().next())
        .map_or('a', |c| c.to_ascii_lowercase());

    Some(Grade {
        number,
        letter,
        plus: caps.get(3).is_some(),
    })
}

/// Three-way comparison of two grade strings, usable with `sort_by`.
///
/// Unparseable grades sort below every valid grade and compare equal to each
/// other. That makes this a total order only over valid grades: mixing several
/// distinct invalid strings with ties is not transitive in the usual sense, so
/// filter or validate before sorting arbitrary text.
pub fn compare_grades(a: &str, b: &str) -> Ordering {
    match (parse_grade(a), parse_grade(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(ga), Some(gb)) => ga.cmp(&gb),
    }
}

/// `true` iff `s` matches `^[3-9][a-c]?(\+)?$` case-insensitively.
pub fn is_valid_cotation(s: &str) -> bool {
    COTATION_RE.is_match(s)
}

/// Anything that may carry a cotation (a pitch row, a plain string, `None`...).
pub trait HasCotation {
    /// The cotation, if any.
    fn cotation(&self) -> Option<&str>;
}

impl HasCotation for str {
    fn cotation(&self) -> Option<&str> {
        Some(self)
    }
}

impl HasCotation for String {
    fn cotation(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl<T: HasCotation + ?Sized> HasCotation for &T {
    fn cotation(&self) -> Option<&str> {
        (**self).cotation()
    }
}

impl<T: HasCotation> HasCotation for Option<T> {
    fn cotation(&self) -> Option<&str> {
        self.as_ref().and_then(HasCotation::cotation)
    }
}

/// Hardest cotation of a pitch list, ignoring pitches without one.
///
/// Ties keep the first occurrence, so `["6", "6a"]` yields `"6"`.
pub fn max_cotation<I>(pitches: I) -> Option<String>
where
    I: IntoIterator,
    I::Item: HasCotation,
{
    let mut best: Option<String> = None;
    for pitch in pitches {
        let Some(candidate) = pitch.cotation() else {
            continue;
        };
        let replace = match &best {
            None => true,
            Some(current) => compare_grades(candidate, current) == Ordering::Greater,
        };
        if replace {
            best = Some(candidate.to_string());
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_grades_compare_equal() {
        assert_eq!(compare_grades("6a", "6a"), Ordering::Equal);
        assert_eq!(compare_grades("7b+", "7b+"), Ordering::Equal);
        assert_eq!(compare_grades("5", "5"), Ordering::Equal);
    }

    #[test]
    fn number_then_letter_then_modifier() {
        assert_eq!(compare_grades("7a", "6a"), Ordering::Greater);
        assert_eq!(compare_grades("5a", "6a"), Ordering::Less);
        assert_eq!(compare_grades("8a", "7c+"), Ordering::Greater);
        assert_eq!(compare_grades("6b", "6a"), Ordering::Greater);
        assert_eq!(compare_grades("6a", "6b"), Ordering::Less);
        assert_eq!(compare_grades("6a+", "6a"), Ordering::Greater);
        assert_eq!(compare_grades("6a", "6a+"), Ordering::Less);
    }

    #[test]
    fn missing_letter_is_a() {
        assert_eq!(compare_grades("6", "6a"), Ordering::Equal);
        assert_eq!(compare_grades("6", "6b"), Ordering::Less);
        assert_eq!(compare_grades("6+", "6a+"), Ordering::Equal);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(compare_grades("6A", "6a"), Ordering::Equal);
        assert_eq!(compare_grades("6B", "6a"), Ordering::Greater);
    }

    #[test]
    fn invalid_grades_sort_first() {
        assert_eq!(compare_grades("invalid", "notvalid"), Ordering::Equal);
        assert_eq!(compare_grades("", ""), Ordering::Equal);
        assert_eq!(compare_grades("invalid", "6a"), Ordering::Less);
        assert_eq!(compare_grades("", "7b"), Ordering::Less);
        assert_eq!(compare_grades("6a", "invalid"), Ordering::Greater);
        assert_eq!(compare_grades("7b", ""), Ordering::Greater);
    }

    #[test]
    fn sorts_sample_list() {
        let mut grades = vec!["7a", "6b+", "5c", "7a+", "6b", "8a"];
        grades.sort_by(|a, b| compare_grades(a, b));
        assert_eq!(grades, ["5c", "6b", "6b+", "7a", "7a+", "8a"]);
    }

    #[test]
    fn multi_digit_numbers() {
        assert_eq!(compare_grades("10a", "9a"), Ordering::Greater);
        let mut grades = vec!["9a", "10a", "11a"];
        grades.sort_by(|a, b| compare_grades(a, b));
        assert_eq!(grades, ["9a", "10a", "11a"]);
    }

    #[test]
    fn parse_rejects_trailing_garbage() {
        assert_eq!(parse_grade("6a++"), None);
        assert_eq!(parse_grade("6d"), None);
        assert_eq!(parse_grade("a6"), None);
        assert_eq!(parse_grade(" 6a"), None);
        assert_eq!(parse_grade("6a\n"), None);
    }

    #[test]
    fn oversized_numbers_still_order() {
        assert_eq!(parse_grade("99999999999a").map(|g| g.number), Some(u32::MAX));
        assert_eq!(compare_grades("99999999999a", "6a"), Ordering::Greater);
        assert_eq!(compare_grades("99999999999b", "99999999999a"), Ordering::Greater);
        assert_eq!(compare_grades("invalid", "99999999999a"), Ordering::Less);
    }

    #[test]
    fn display_is_normalized() {
        assert_eq!("6A+".parse::<Grade>().unwrap().to_string(), "6a+");
        assert_eq!("7".parse::<Grade>().unwrap().to_string(), "7a");
        assert_eq!(
            "x".parse::<Grade>(),
            Err(GradeError::Invalid("x".to_string()))
        );
    }

    #[test]
    fn validation_is_narrower_than_parsing() {
        for ok in ["3", "6a", "6a+", "7C", "9c+", "5+"] {
            assert!(is_valid_cotation(ok), "{ok} should be valid");
        }
        for bad in ["", "2a", "10a", "6d", "6a++", "a", "6 a", "6a ", "6a\n", "6+a"] {
            assert!(!is_valid_cotation(bad), "{bad:?} should be invalid");
        }
        assert!(parse_grade("10a").is_some());
    }

    #[test]
    fn max_cotation_cases() {
        let none: [Option<&str>; 0] = [];
        assert_eq!(max_cotation(none), None);
        assert_eq!(max_cotation([None::<&str>, None]), None);
        assert_eq!(max_cotation([Some("6a")]).as_deref(), Some("6a"));
        assert_eq!(
            max_cotation([Some("6a"), Some("7b"), Some("6c+")]).as_deref(),
            Some("7b")
        );
        assert_eq!(
            max_cotation([Some("6a"), None, Some("7b"), None]).as_deref(),
            Some("7b")
        );
        assert_eq!(max_cotation(["6a", "6a+"]).as_deref(), Some("6a+"));
        assert_eq!(max_cotation(["6b", "6c", "6a+"]).as_deref(), Some("6c"));
    }

    #[test]
    fn max_cotation_keeps_first_of_ties() {
        assert_eq!(max_cotation(["6", "6a", "6A"]).as_deref(), Some("6"));
    }
}
