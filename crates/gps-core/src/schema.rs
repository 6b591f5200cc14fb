//! Mapping from export column headers to canonical fields.
//!
//! GPS vendors label columns for humans ("Total Distance (m)"). This module
//! owns the table that turns those labels into [`Metric`]s and the numeric
//! coercion applied to every metric cell.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::models::Metric;

/// Bumped whenever [`HEADER_MAP`] gains or renames an entry.
pub const HEADER_MAP_VERSION: u32 = 1;

/// Export header that carries the athlete name.
pub const PLAYER_HEADER: &str = "Player Name";

/// Canonical name of the player column.
pub const PLAYER_FIELD: &str = "Player";

/// Human-readable export headers and the metric each maps to.
pub const HEADER_MAP: &[(&str, Metric)] = &[
    ("Total Distance (m)", Metric::TotalDistance),
    ("Max Speed (km/h)", Metric::MaxSpeed),
    ("Speed Zone 1 Distance (m)", Metric::SpeedZone1),
    ("Speed Zone 2 Distance (m)", Metric::SpeedZone2),
    ("Speed Zone 3 Distance (m)", Metric::SpeedZone3),
    ("Speed Zone 4 Distance (m)", Metric::SpeedZone4),
    ("Speed Zone 5 Distance (m)", Metric::SpeedZone5),
    ("Speed Zone 6 Distance (m)", Metric::SpeedZone6),
    ("No. of Sprint (times)", Metric::Sprints),
    ("No. of Exp. Acc. (times)", Metric::Accelerations),
    ("No. of Exp. Dec. (times)", Metric::Decelerations),
];

/// Grouping characters stripped from numeric cells before parsing.
///
/// Comma, no-break space, narrow no-break space and apostrophe cover the
/// thousands separators emitted by common spreadsheet locales.
pub const GROUPING_SEPARATORS: &[char] = &[',', '\u{a0}', '\u{202f}', '\''];

/// A numeric cell that does not hold a finite number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a finite number: \"{0}\"")]
pub struct NotANumber(pub String);

/// What a single header cell resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Player,
    Metric(Metric),
    /// Not part of the canonical schema; dropped.
    Ignored,
}

/// Trim whitespace and a leading UTF-8 BOM from a header cell.
pub fn normalize_header(raw: &str) -> &str {
    raw.trim().trim_start_matches('\u{feff}').trim()
}

/// Resolve a header cell to its canonical column.
///
/// Canonical names are accepted too, so exported data can be re-ingested.
pub fn classify_header(raw: &str) -> ColumnKind {
    let header = normalize_header(raw);
    if header == PLAYER_HEADER || header == PLAYER_FIELD {
        return ColumnKind::Player;
    }
    if let Some((_, metric)) = HEADER_MAP.iter().find(|(label, _)| *label == header) {
        return ColumnKind::Metric(*metric);
    }
    match Metric::from_name(header) {
        Some(metric) => ColumnKind::Metric(metric),
        None => ColumnKind::Ignored,
    }
}

/// `true` when an unmapped header looks like a metric column, i.e. carries a
/// unit suffix such as `(m)`, `(km/h)` or `(times)`.
///
/// Such headers usually mean the vendor changed a label; callers warn about
/// them instead of dropping the column silently.
pub fn looks_like_metric_header(raw: &str) -> bool {
    static UNIT_SUFFIX: OnceLock<Regex> = OnceLock::new();
    let re = UNIT_SUFFIX.get_or_init(|| {
        Regex::new(r"(?i)\((m|km|km/h|m/s|times|count|#)\)\s*$").expect("static regex is valid")
    });
    re.is_match(normalize_header(raw))
}

/// Strip grouping separators from `raw` and parse it as `f64`.
///
/// Returns `Ok(None)` for an empty cell and an error when non-numeric text
/// remains after stripping. `NaN` and infinities are rejected too.
///
/// # Examples
///
/// ```
/// use gps_core::schema::coerce_number;
///
/// assert_eq!(coerce_number("12,345.6"), Ok(Some(12345.6)));
/// assert_eq!(coerce_number(" 7 "), Ok(Some(7.0)));
/// assert_eq!(coerce_number(""), Ok(None));
/// assert!(coerce_number("n/a").is_err());
/// assert!(coerce_number("inf").is_err());
/// ```
pub fn coerce_number(raw: &str) -> Result<Option<f64>, NotANumber> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !GROUPING_SEPARATORS.contains(c))
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(NotANumber(raw.trim().to_string())),
    }
}
