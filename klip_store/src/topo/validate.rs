use klip_grades::is_valid_cotation;

use super::{TopoError, TopoResult};

pub(super) const NAME_MAX: usize = 200;
pub(super) const DESCRIPTION_MAX: usize = 2000;
pub(super) const COTATION_MAX: usize = 10;
/// Metres; longer than any multi-pitch wall.
pub(super) const LENGTH_MAX: i32 = 10_000;

fn invalid(field: &'static str, reason: impl Into<String>) -> TopoError {
    TopoError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Trimmed required name, 1..=200 characters.
pub(super) fn required_name(field: &'static str, raw: &str) -> TopoResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(invalid(field, "is required"));
    }
    max_chars(field, Some(name), NAME_MAX)?;
    Ok(name.to_string())
}

/// Trimmed optional text; blank becomes `None`.
pub(super) fn optional_text(
    field: &'static str,
    raw: Option<&str>,
    max: usize,
) -> TopoResult<Option<String>> {
    let text = raw.map(str::trim).filter(|s| !s.is_empty());
    max_chars(field, text, max)?;
    Ok(text.map(str::to_string))
}

pub(super) fn max_chars(field: &'static str, value: Option<&str>, max: usize) -> TopoResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(invalid(field, format!("at most {max} characters"))),
        _ => Ok(()),
    }
}

pub(super) fn positive(field: &'static str, value: Option<i32>) -> TopoResult<()> {
    match value {
        Some(n) if n <= 0 => Err(invalid(field, "must be positive")),
        _ => Ok(()),
    }
}

/// Positive length, at most [`LENGTH_MAX`] metres.
pub(super) fn length(field: &'static str, value: Option<i32>) -> TopoResult<()> {
    positive(field, value)?;
    match value {
        Some(n) if n > LENGTH_MAX => Err(invalid(field, format!("at most {LENGTH_MAX} m"))),
        _ => Ok(()),
    }
}

pub(super) fn cotation(value: Option<&str>) -> TopoResult<()> {
    max_chars("cotation", value, COTATION_MAX)?;
    match value {
        Some(c) if !is_valid_cotation(c) => Err(invalid("cotation", "expected e.g. 6a or 7b+")),
        _ => Ok(()),
    }
}
