use crate::models::Metric;

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// This is the inverse of the grouping that [`crate::schema::coerce_number`]
/// strips on ingest.
///
/// # Examples
///
/// ```
/// use gps_core::formatting::format_number;
///
/// assert_eq!(format_number(12345.6, 1), "12,345.6");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by a relative epsilon so exact midpoints round away from zero.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let grouped = group_thousands(&(rounded.trunc() as u64).to_string());

    let body = if decimals == 0 {
        grouped
    } else {
        let frac = format!("{:.prec$}", rounded.fract(), prec = decimals as usize);
        // `frac` looks like "0.50"; keep ".50".
        format!("{}{}", grouped, &frac[1..])
    };

    if negative && body.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", body)
    } else {
        body
    }
}

/// Number of decimals used when displaying `metric`.
pub fn metric_decimals(metric: Metric) -> u32 {
    if metric.is_count() {
        0
    } else {
        1
    }
}

/// Format a metric value for display, with its unit.
///
/// # Examples
///
/// ```
/// use gps_core::formatting::format_metric;
/// use gps_core::models::Metric;
///
/// assert_eq!(format_metric(Metric::TotalDistance, 10234.56), "10,234.6 m");
/// assert_eq!(format_metric(Metric::MaxSpeed, 31.24), "31.2 km/h");
/// assert_eq!(format_metric(Metric::Sprints, 12.0), "12");
/// ```
pub fn format_metric(metric: Metric, value: f64) -> String {
    let number = format_number(value, metric_decimals(metric));
    match metric_unit(metric) {
        Some(unit) => format!("{} {}", number, unit),
        None => number,
    }
}

/// Like [`format_metric`] but renders a missing value as `"-"`.
pub fn format_optional_metric(metric: Metric, value: Option<f64>) -> String {
    value
        .map(|v| format_metric(metric, v))
        .unwrap_or_else(|| "-".to_string())
}

/// Format a distance in metres as kilometres with two decimals.
///
/// # Examples
///
/// ```
/// use gps_core::formatting::format_km;
///
/// assert_eq!(format_km(10234.0), "10.23 km");
/// assert_eq!(format_km(0.0), "0.00 km");
/// ```
pub fn format_km(metres: f64) -> String {
    format!("{} km", format_number(metres / 1000.0, 2))
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn metric_unit(metric: Metric) -> Option<&'static str> {
    match metric {
        Metric::MaxSpeed => Some("km/h"),
        m if m.is_count() => None,
        _ => Some("m"),
    }
}

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let offset = s.len() % 3;
    for (i, c) in s.chars().enumerate() {
        if i != 0 && i % 3 == offset {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
