//! Session file discovery and loading.
//!
//! Finds per-session GPS exports in the configured folder, normalizes each one
//! into [`SessionRow`]s and merges them into a single [`Dataset`]. A file that
//! fails to load is logged and skipped; the rest of the batch still merges.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use gps_core::error::{GpsError, Result};
use gps_core::models::{Dataset, Metric, SessionRow, SessionSource, SkippedFile};
use gps_core::schema::{
    classify_header, coerce_number, looks_like_metric_header, normalize_header, ColumnKind,
    PLAYER_HEADER,
};
use gps_core::settings::DataConfig;
use gps_core::time_utils::parse_session_date;
use tracing::{debug, info, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// One successfully normalized session file.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionFile {
    pub source: SessionSource,
    pub rows: Vec<SessionRow>,
}

impl From<SessionFile> for Dataset {
    fn from(session: SessionFile) -> Self {
        Dataset {
            rows: session.rows,
            sources: vec![session.source],
            skipped: Vec::new(),
        }
    }
}

/// List session export file names directly under `dir` that end with
/// `suffix`, sorted by name.
///
/// A missing directory yields an empty list.
pub fn discover_session_files(dir: &Path, suffix: &str) -> Vec<String> {
    if !dir.exists() {
        warn!("GPS data folder does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<String> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| name.ends_with(suffix))
        .collect();

    files.sort();
    files
}

/// Order session file names for selection, most recent first.
///
/// Lexicographic descending; with a date inside the name this approximates
/// reverse chronological order.
pub fn sessions_most_recent_first(mut files: Vec<String>) -> Vec<String> {
    files.sort_by(|a, b| b.cmp(a));
    files
}

/// Load and normalize a single session file from the configured folder.
pub fn load_session(config: &DataConfig, file_name: &str) -> Result<SessionFile> {
    let date = parse_session_date(
        file_name,
        &config.date_separator,
        &config.file_suffix,
        &config.date_format,
    )?;

    let path = config.gps_data_folder.join(file_name);
    let file = std::fs::File::open(&path).map_err(|e| GpsError::FileRead {
        path: path.clone(),
        source: e,
    })?;

    normalize_session(std::io::BufReader::new(file), file_name, date)
}

/// Discover, load and merge every session file in the configured folder.
///
/// Never fails: per-file errors are logged and recorded in
/// [`Dataset::skipped`]. Rows follow discovery order.
pub fn load_all_sessions(config: &DataConfig) -> Dataset {
    let files = discover_session_files(&config.gps_data_folder, &config.file_suffix);
    if files.is_empty() {
        info!(
            "No session files matching *{} in {}",
            config.file_suffix,
            config.gps_data_folder.display()
        );
        return Dataset::default();
    }

    let mut dataset = Dataset::default();

    for file_name in &files {
        match load_session(config, file_name) {
            Ok(session) => {
                debug!(
                    "File {}: {} rows, {} metric columns",
                    file_name,
                    session.rows.len(),
                    session.source.metrics.len()
                );
                dataset.rows.extend(session.rows);
                dataset.sources.push(session.source);
            }
            Err(e) => {
                warn!("Skipping session file {}: {}", file_name, e);
                dataset.skipped.push(SkippedFile {
                    file_name: file_name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Merged {} rows from {} session files ({} skipped)",
        dataset.rows.len(),
        dataset.sources.len(),
        dataset.skipped.len()
    );

    dataset
}

/// Normalize the CSV contents of one session export.
///
/// Any coercion failure fails the whole file; no partial rows are returned.
pub fn normalize_session<R: Read>(
    reader: R,
    file_name: &str,
    date: NaiveDate,
) -> Result<SessionFile> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(csv_error)?.clone();
    let plan = ColumnPlan::from_headers(&headers, file_name)?;

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(csv_error)?;
        if let Some(row) = plan.row_from_record(&record, date)? {
            rows.push(row);
        }
    }

    Ok(SessionFile {
        source: SessionSource {
            file_name: file_name.to_string(),
            date,
            rows: rows.len(),
            metrics: plan.metrics(),
        },
        rows,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Report undecodable text as an encoding problem rather than a CSV one.
fn csv_error(err: csv::Error) -> GpsError {
    if let csv::ErrorKind::Utf8 { pos, .. } = err.kind() {
        return GpsError::Encoding {
            line: pos.as_ref().map(|p| p.line()).unwrap_or(0),
        };
    }
    GpsError::Csv(err)
}

/// Where each canonical column lives in a particular file.
struct ColumnPlan {
    player: usize,
    /// `(column index, metric)` in canonical order.
    metrics: Vec<(usize, Metric)>,
}

impl ColumnPlan {
    /// Map the header row onto canonical columns, warning about headers that
    /// look like metrics but are not in the mapping table.
    fn from_headers(headers: &StringRecord, file_name: &str) -> Result<Self> {
        let mut player = None;
        let mut metrics: Vec<(usize, Metric)> = Vec::new();
        let mut seen: HashSet<Metric> = HashSet::new();

        for (idx, raw) in headers.iter().enumerate() {
            match classify_header(raw) {
                ColumnKind::Player => {
                    if player.is_none() {
                        player = Some(idx);
                    } else {
                        debug!("{}: duplicate player column at index {}", file_name, idx);
                    }
                }
                ColumnKind::Metric(metric) => {
                    if seen.insert(metric) {
                        metrics.push((idx, metric));
                    } else {
                        debug!("{}: duplicate {} column at index {}", file_name, metric, idx);
                    }
                }
                ColumnKind::Ignored => {
                    if looks_like_metric_header(raw) {
                        warn!(
                            "{}: unrecognized metric column \"{}\" dropped",
                            file_name,
                            normalize_header(raw)
                        );
                    }
                }
            }
        }

        let player = player.ok_or_else(|| GpsError::MissingColumn(PLAYER_HEADER.to_string()))?;

        let missing: Vec<&str> = Metric::ALL
            .into_iter()
            .filter(|m| !seen.contains(m))
            .map(Metric::name)
            .collect();
        if !missing.is_empty() {
            debug!("{}: columns absent: {}", file_name, missing.join(", "));
        }

        metrics.sort_by_key(|(_, metric)| *metric);
        Ok(Self { player, metrics })
    }

    /// Canonical metrics this file provides.
    fn metrics(&self) -> Vec<Metric> {
        self.metrics.iter().map(|(_, m)| *m).collect()
    }

    /// Build one row. Returns `Ok(None)` for rows without a player name.
    fn row_from_record(
        &self,
        record: &StringRecord,
        date: NaiveDate,
    ) -> Result<Option<SessionRow>> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let player = record.get(self.player).unwrap_or("").trim();
        if player.is_empty() {
            debug!("Line {}: no player name, row ignored", line);
            return Ok(None);
        }

        let mut row = SessionRow::new(date, player);
        for &(idx, metric) in &self.metrics {
            let raw = record.get(idx).unwrap_or("");
            let value = coerce_number(raw).map_err(|_| GpsError::InvalidNumber {
                column: metric.name().to_string(),
                line,
                value: raw.to_string(),
            })?;
            if let Some(v) = value {
                row.metrics.insert(metric, v);
            }
        }

        Ok(Some(row))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
