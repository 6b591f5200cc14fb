//! Plain-text, JSON and CSV renderings of a filtered dataset.
//!
//! Everything here returns a `String` so the caller decides where it goes.

use anyhow::Result;
use gps_core::formatting::{format_km, format_number, format_optional_metric, percentage};
use gps_core::models::{Dataset, Metric, SessionSource, SkippedFile};
use gps_data::aggregator::{AggregatedGroup, PlayerReport, SessionAggregator, HEADLINE_METRICS};
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

/// Header of the date column in row exports.
const DATE_COLUMN: &str = "date";

// ── TextTable ─────────────────────────────────────────────────────────────────

/// Column-aligned text table. The first column is left-aligned, the rest are
/// right-aligned numbers.
#[derive(Debug, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let columns = self.headers.len();
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(columns) {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let mut out = String::new();
        out.push_str(&render_line(&self.headers, &widths));
        let rule_len = widths.iter().sum::<usize>() + 2 * columns.saturating_sub(1);
        out.push_str(&"-".repeat(rule_len));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&render_line(row, &widths));
        }
        out
    }
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let mut parts = Vec::with_capacity(widths.len());
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let pad = " ".repeat(width.saturating_sub(cell.width()));
        if i == 0 {
            parts.push(format!("{cell}{pad}"));
        } else {
            parts.push(format!("{pad}{cell}"));
        }
    }
    let mut line = parts.join("  ").trim_end().to_string();
    line.push('\n');
    line
}

// ── Text views ────────────────────────────────────────────────────────────────

/// Squad (or single player) key metrics plus the speed-zone breakdown.
pub fn render_summary(dataset: &Dataset, scope: &str) -> String {
    if dataset.is_empty() {
        return render_no_data(dataset);
    }

    let totals = SessionAggregator::totals(dataset);
    let mut out = String::new();

    out.push_str(&format!("GPS summary: {}\n", scope));
    if let (Some(first), Some(last)) = (dataset.min_date(), dataset.max_date()) {
        out.push_str(&format!(
            "{} rows, {} players, {} to {}\n\n",
            dataset.len(),
            SessionAggregator::players(dataset).len(),
            first,
            last
        ));
    }

    let mut key = TextTable::new(["Metric", "Value"]);
    key.push_row(vec![
        "Total Distance".to_string(),
        totals
            .get(Metric::TotalDistance)
            .map(format_km)
            .unwrap_or_else(|| "-".to_string()),
    ]);
    for metric in HEADLINE_METRICS.into_iter().skip(1) {
        key.push_row(vec![
            label(metric),
            format_optional_metric(metric, totals.get(metric)),
        ]);
    }
    out.push_str(&key.render());

    let zones = totals.speed_zones();
    if let Some(zone_total) = totals.speed_zone_total() {
        out.push('\n');
        let mut table = TextTable::new(["Speed Zone", "Distance", "Share"]);
        for (zone, value) in zones {
            table.push_row(vec![
                label(zone),
                format_optional_metric(zone, Some(value)),
                format!("{:.1}%", percentage(value, zone_total, 1)),
            ]);
        }
        out.push_str(&table.render());
    }

    out.push_str(&render_skipped(&dataset.skipped));
    out
}

/// One line per player with the headline metrics.
pub fn render_players(dataset: &Dataset) -> String {
    if dataset.is_empty() {
        return render_no_data(dataset);
    }
    let groups = SessionAggregator::aggregate_by_player(dataset);
    render_groups("Player", &groups)
}

/// One line per session date with the headline metrics.
pub fn render_daily(dataset: &Dataset) -> String {
    if dataset.is_empty() {
        return render_no_data(dataset);
    }
    let groups = SessionAggregator::aggregate_daily(dataset);
    render_groups("Date", &groups)
}

/// Every row with every metric column present in the dataset.
pub fn render_rows(dataset: &Dataset) -> String {
    if dataset.is_empty() {
        return render_no_data(dataset);
    }
    let metrics = dataset.metric_columns();

    let mut headers = vec![DATE_COLUMN.to_string(), "Player".to_string()];
    headers.extend(metrics.iter().map(|m| m.name().to_string()));

    let mut table = TextTable::new(headers);
    for row in &dataset.rows {
        let mut cells = vec![row.date.to_string(), row.player.clone()];
        cells.extend(
            metrics
                .iter()
                .map(|m| format_optional_metric(*m, row.metric(*m))),
        );
        table.push_row(cells);
    }
    table.render()
}

/// Merged and skipped session files.
pub fn render_sessions(sources: &[SessionSource], skipped: &[SkippedFile]) -> String {
    if sources.is_empty() && skipped.is_empty() {
        return "No session files found.\n".to_string();
    }
    let mut table = TextTable::new(["Session", "Date", "Rows", "Metrics"]);
    for source in sources {
        table.push_row(vec![
            source.file_name.clone(),
            source.date.to_string(),
            source.rows.to_string(),
            format!("{}/{}", source.metrics.len(), Metric::ALL.len()),
        ]);
    }
    let mut out = table.render();
    out.push_str(&render_skipped(skipped));
    out
}

// ── Machine-readable output ───────────────────────────────────────────────────

/// JSON document for a view.
pub fn to_json(view: &str, dataset: &Dataset) -> Result<String> {
    let json = match view {
        "players" => serde_json::to_string_pretty(&SessionAggregator::player_reports(dataset))?,
        "daily" => serde_json::to_string_pretty(&SessionAggregator::aggregate_daily(dataset))?,
        "summary" => serde_json::to_string_pretty(&JsonSummary::from(dataset))?,
        _ => serde_json::to_string_pretty(dataset)?,
    };
    Ok(json + "\n")
}

/// Rows as CSV with canonical column names; absent metrics are empty cells.
pub fn rows_to_csv(dataset: &Dataset) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec![DATE_COLUMN, "Player"];
    header.extend(Metric::ALL.iter().map(|m| m.name()));
    writer.write_record(&header)?;

    for row in &dataset.rows {
        let mut record = vec![row.date.to_string(), row.player.clone()];
        record.extend(
            Metric::ALL
                .iter()
                .map(|m| row.metric(*m).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

#[derive(Serialize)]
struct JsonSummary {
    rows: usize,
    players: Vec<String>,
    first_session: Option<chrono::NaiveDate>,
    last_session: Option<chrono::NaiveDate>,
    totals: gps_data::aggregator::MetricTotals,
    reports: Vec<PlayerReport>,
    skipped: Vec<SkippedFile>,
}

impl From<&Dataset> for JsonSummary {
    fn from(dataset: &Dataset) -> Self {
        Self {
            rows: dataset.len(),
            players: SessionAggregator::players(dataset),
            first_session: dataset.min_date(),
            last_session: dataset.max_date(),
            totals: SessionAggregator::totals(dataset),
            reports: SessionAggregator::player_reports(dataset),
            skipped: dataset.skipped.clone(),
        }
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn label(metric: Metric) -> String {
    metric.name().replace('_', " ")
}

fn render_groups(key_header: &str, groups: &[AggregatedGroup]) -> String {
    let mut headers = vec![key_header.to_string(), "Sessions".to_string()];
    headers.extend(HEADLINE_METRICS.iter().map(|m| label(*m)));

    let mut table = TextTable::new(headers);
    for group in groups {
        let mut cells = vec![group.key.clone(), group.session_dates.len().to_string()];
        cells.extend(
            HEADLINE_METRICS
                .iter()
                .map(|m| format_optional_metric(*m, group.totals.get(*m))),
        );
        table.push_row(cells);
    }

    let totals = SessionAggregator::calculate_totals(groups);
    let mut total_row = vec![
        "TOTAL".to_string(),
        format_number(totals.rows as f64, 0) + " rows",
    ];
    total_row.extend(
        HEADLINE_METRICS
            .iter()
            .map(|m| format_optional_metric(*m, totals.get(*m))),
    );
    table.push_row(total_row);

    table.render()
}

fn render_no_data(dataset: &Dataset) -> String {
    let mut out = String::from("No GPS data for the current selection.\n");
    out.push_str(&render_skipped(&dataset.skipped));
    out
}

fn render_skipped(skipped: &[SkippedFile]) -> String {
    if skipped.is_empty() {
        return String::new();
    }
    let mut out = format!("\n{} session file(s) skipped:\n", skipped.len());
    for file in skipped {
        out.push_str(&format!("  {}: {}\n", file.file_name, file.reason));
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
