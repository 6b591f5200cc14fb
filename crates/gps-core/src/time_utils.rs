use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{GpsError, Result};

// ── File-name date tokens ─────────────────────────────────────────────────────

/// Pull the date token out of a session file name.
///
/// The token sits between a `separator` and the trailing `suffix`:
/// `"MD-1_Training_2024-03-15_details.csv"` with separator `"_"` and suffix
/// `"_details.csv"` yields `"2024-03-15"`. When the rendered `date_format`
/// itself contains the separator (`%Y_%m_%d` with `_`), the token spans that
/// many extra segments.
pub fn extract_date_token<'a>(
    file_name: &'a str,
    separator: &str,
    suffix: &str,
    date_format: &str,
) -> Result<&'a str> {
    let invalid = |reason: String| GpsError::InvalidFileName {
        file: file_name.to_string(),
        reason,
    };

    let stem = file_name
        .strip_suffix(suffix)
        .ok_or_else(|| invalid(format!("missing suffix {}", suffix)))?;

    if separator.is_empty() {
        return Err(invalid("date separator is empty".to_string()));
    }

    let inner = separators_in_format(date_format, separator)?;

    let mut cut = stem.len();
    for _ in 0..=inner {
        cut = stem[..cut]
            .rfind(separator)
            .ok_or_else(|| invalid(format!("no \"{}\" before the date", separator)))?;
    }
    let token = stem[cut + separator.len()..].trim();

    if token.is_empty() {
        return Err(invalid("empty date token".to_string()));
    }
    Ok(token)
}

/// Number of times `separator` occurs in a date rendered with `date_format`.
pub fn separators_in_format(date_format: &str, separator: &str) -> Result<usize> {
    // Two-digit month and day so padded and unpadded specifiers agree.
    let sample = NaiveDate::from_ymd_opt(2000, 12, 31).unwrap_or_default();
    let mut rendered = String::new();
    if write!(rendered, "{}", sample.format(date_format)).is_err() {
        return Err(GpsError::Config(format!(
            "invalid date format \"{}\"",
            date_format
        )));
    }
    if separator.is_empty() {
        return Ok(0);
    }
    Ok(rendered.matches(separator).count())
}

/// Parse the session date embedded in `file_name` with the strftime
/// pattern `date_format`.
pub fn parse_session_date(
    file_name: &str,
    separator: &str,
    suffix: &str,
    date_format: &str,
) -> Result<NaiveDate> {
    let token = extract_date_token(file_name, separator, suffix, date_format)?;
    NaiveDate::parse_from_str(token, date_format).map_err(|_| GpsError::DateParse {
        token: token.to_string(),
        format: date_format.to_string(),
    })
}

/// Check that `date_format` is a usable strftime pattern.
pub fn validate_date_format(date_format: &str) -> bool {
    !date_format.trim().is_empty()
        && !StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error))
}

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Wall-clock "now" in the local timezone, without the offset.
///
/// Session dates are naive calendar dates, so recency cutoffs are computed in
/// the same naive local frame.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Midnight at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SUFFIX: &str = "_details.csv";
    const ISO: &str = "%Y-%m-%d";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── extract_date_token ────────────────────────────────────────────────────

    #[test]
    fn test_extract_token_basic() {
        let token =
            extract_date_token("Training_2024-03-15_details.csv", "_", SUFFIX, ISO).unwrap();
        assert_eq!(token, "2024-03-15");
    }

    #[test]
    fn test_extract_token_uses_last_separator() {
        let token = extract_date_token(
            "MD-1_Annan_vs_Stranraer_15.03.2024_details.csv",
            "_",
            SUFFIX,
            "%d.%m.%Y",
        )
        .unwrap();
        assert_eq!(token, "15.03.2024");
    }

    #[test]
    fn test_extract_token_missing_suffix() {
        let err = extract_date_token("Training_2024-03-15.csv", "_", SUFFIX, ISO).unwrap_err();
        assert!(matches!(err, GpsError::InvalidFileName { .. }));
        assert!(err.to_string().contains("missing suffix"));
    }

    #[test]
    fn test_extract_token_missing_separator() {
        let err =
            extract_date_token("20240315_details.csv", "-", SUFFIX, "%Y%m%d").unwrap_err();
        assert!(matches!(err, GpsError::InvalidFileName { .. }));
    }

    #[test]
    fn test_extract_token_empty() {
        let err = extract_date_token("Training__details.csv", "_", SUFFIX, ISO).unwrap_err();
        assert!(err.to_string().contains("empty date token"));
    }

    #[test]
    fn test_extract_token_format_containing_separator() {
        let token =
            extract_date_token("Match_2024_03_15_details.csv", "_", SUFFIX, "%Y_%m_%d").unwrap();
        assert_eq!(token, "2024_03_15");
    }

    #[test]
    fn test_extract_token_separator_shared_with_iso_format() {
        let token =
            extract_date_token("MD-1-Training-2024-03-15_details.csv", "-", SUFFIX, ISO).unwrap();
        assert_eq!(token, "2024-03-15");
    }

    #[test]
    fn test_extract_token_too_few_segments_for_format() {
        let err =
            extract_date_token("2024_03_15_details.csv", "_", SUFFIX, "%Y_%m_%d").unwrap_err();
        assert!(matches!(err, GpsError::InvalidFileName { .. }));
    }

    #[test]
    fn test_separators_in_format() {
        assert_eq!(separators_in_format(ISO, "_").unwrap(), 0);
        assert_eq!(separators_in_format(ISO, "-").unwrap(), 2);
        assert_eq!(separators_in_format("%Y_%m_%d", "_").unwrap(), 2);
        assert_eq!(separators_in_format("%d %B %Y", " ").unwrap(), 2);
        assert!(matches!(
            separators_in_format("%Q", "_"),
            Err(GpsError::Config(_))
        ));
    }

    // ── parse_session_date ────────────────────────────────────────────────────

    #[test]
    fn test_parse_session_date_iso() {
        let d = parse_session_date("Training_2024-03-15_details.csv", "_", SUFFIX, "%Y-%m-%d")
            .unwrap();
        assert_eq!(d, date(2024, 3, 15));
    }

    #[test]
    fn test_parse_session_date_custom_format() {
        let d = parse_session_date("Match_15.03.2024_details.csv", "_", SUFFIX, "%d.%m.%Y")
            .unwrap();
        assert_eq!(d, date(2024, 3, 15));
    }

    #[test]
    fn test_parse_session_date_wrong_format() {
        let err = parse_session_date("Match_15.03.2024_details.csv", "_", SUFFIX, "%Y-%m-%d")
            .unwrap_err();
        assert!(matches!(err, GpsError::DateParse { .. }));
    }

    #[test]
    fn test_parse_session_date_underscore_format() {
        let d = parse_session_date("Match_2024_03_15_details.csv", "_", SUFFIX, "%Y_%m_%d")
            .unwrap();
        assert_eq!(d, date(2024, 3, 15));
    }

    #[test]
    fn test_parse_session_date_impossible_date() {
        let err = parse_session_date("Training_2024-02-30_details.csv", "_", SUFFIX, "%Y-%m-%d")
            .unwrap_err();
        assert!(matches!(err, GpsError::DateParse { .. }));
    }

    // ── validate_date_format ──────────────────────────────────────────────────

    #[test]
    fn test_validate_date_format() {
        assert!(validate_date_format("%Y-%m-%d"));
        assert!(validate_date_format("%d.%m.%Y"));
        assert!(!validate_date_format(""));
        assert!(!validate_date_format("%Q"));
    }

    #[test]
    fn test_start_of_day() {
        let dt = start_of_day(date(2024, 3, 15));
        assert_eq!(dt.to_string(), "2024-03-15 00:00:00");
    }
}
