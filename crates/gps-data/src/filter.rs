//! Recency and player filters over a merged [`Dataset`].

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use gps_core::models::Dataset;
use gps_core::time_utils::start_of_day;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Player selector that keeps the whole squad.
pub const ALL_PLAYERS: &str = "All";

// ── RecencyWindow ─────────────────────────────────────────────────────────────

/// Symbolic date range applied relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecencyWindow {
    Last7Days,
    Last14Days,
    Last30Days,
    /// Everything from the earliest session on.
    All,
}

impl RecencyWindow {
    /// Interpret a selector string.
    ///
    /// `"7 days"`, `"14 days"` and `"30 days"` are recognised; anything else
    /// (including `"all"`) means [`RecencyWindow::All`].
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim().to_lowercase().as_str() {
            "7 days" => RecencyWindow::Last7Days,
            "14 days" => RecencyWindow::Last14Days,
            "30 days" => RecencyWindow::Last30Days,
            _ => RecencyWindow::All,
        }
    }

    /// Window length, or `None` for [`RecencyWindow::All`].
    pub fn days(self) -> Option<i64> {
        match self {
            RecencyWindow::Last7Days => Some(7),
            RecencyWindow::Last14Days => Some(14),
            RecencyWindow::Last30Days => Some(30),
            RecencyWindow::All => None,
        }
    }

    /// Earliest instant kept by this window for `dataset` at time `now`.
    ///
    /// For [`RecencyWindow::All`] this is the dataset's first session date;
    /// returns `None` when that is undefined (empty dataset).
    pub fn cutoff(self, dataset: &Dataset, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self.days() {
            Some(days) => Some(now - Duration::days(days)),
            None => dataset.min_date().map(start_of_day),
        }
    }
}

impl fmt::Display for RecencyWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecencyWindow::Last7Days => "Last 7 days",
            RecencyWindow::Last14Days => "Last 14 days",
            RecencyWindow::Last30Days => "Last 30 days",
            RecencyWindow::All => "All data",
        };
        f.write_str(label)
    }
}

// ── Filters ───────────────────────────────────────────────────────────────────

/// Keep rows whose session date is on or after the window's cutoff.
///
/// `now` is injected so results are reproducible; an empty dataset always
/// yields an empty result.
pub fn filter_by_window(dataset: &Dataset, window: RecencyWindow, now: NaiveDateTime) -> Dataset {
    if dataset.is_empty() {
        return dataset.clone();
    }
    let Some(cutoff) = window.cutoff(dataset, now) else {
        return dataset.clone();
    };

    let filtered = dataset.retain_rows(|row| start_of_day(row.date) >= cutoff);
    debug!(
        "{}: {} of {} rows since {}",
        window,
        filtered.len(),
        dataset.len(),
        cutoff
    );
    filtered
}

/// Keep rows for one player; [`ALL_PLAYERS`] (any case) keeps everything.
pub fn filter_by_player(dataset: &Dataset, player: &str) -> Dataset {
    if player.eq_ignore_ascii_case(ALL_PLAYERS) {
        return dataset.clone();
    }
    dataset.retain_rows(|row| row.player == player)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
