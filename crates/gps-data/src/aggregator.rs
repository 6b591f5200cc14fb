//! Per-player and per-day aggregation of session rows.
//!
//! Metrics combine the way a coach reads them: distances and counts add up,
//! `Max_Speed` keeps the highest value. A metric that no row provides stays
//! absent instead of turning into a misleading zero.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use gps_core::models::{Dataset, Metric, SessionRow};
use serde::Serialize;

/// Metrics shown on a player report card, in display order.
pub const HEADLINE_METRICS: [Metric; 5] = [
    Metric::TotalDistance,
    Metric::MaxSpeed,
    Metric::Sprints,
    Metric::Accelerations,
    Metric::Decelerations,
];

// ── MetricTotals ──────────────────────────────────────────────────────────────

/// Metric values accumulated across several rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricTotals {
    values: BTreeMap<Metric, f64>,
    /// Number of rows folded in.
    pub rows: u32,
}

impl MetricTotals {
    /// Fold a single row's metrics into the running totals.
    pub fn add_row(&mut self, row: &SessionRow) {
        for (&metric, &value) in &row.metrics {
            self.combine(metric, value);
        }
        self.rows += 1;
    }

    /// Fold another set of totals into this one.
    pub fn merge(&mut self, other: &MetricTotals) {
        for (&metric, &value) in &other.values {
            self.combine(metric, value);
        }
        self.rows += other.rows;
    }

    /// Accumulated value for `metric`, or `None` if no row provided it.
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    /// Total distance in kilometres.
    pub fn total_distance_km(&self) -> Option<f64> {
        self.get(Metric::TotalDistance).map(|m| m / 1000.0)
    }

    /// Per-zone distances, slowest band first; absent zones are skipped.
    pub fn speed_zones(&self) -> Vec<(Metric, f64)> {
        Metric::SPEED_ZONES
            .into_iter()
            .filter_map(|zone| self.get(zone).map(|v| (zone, v)))
            .collect()
    }

    /// Sum of all zone distances, or `None` when no zone is present.
    pub fn speed_zone_total(&self) -> Option<f64> {
        let zones = self.speed_zones();
        if zones.is_empty() {
            None
        } else {
            Some(zones.iter().map(|(_, v)| v).sum())
        }
    }

    fn combine(&mut self, metric: Metric, value: f64) {
        self.values
            .entry(metric)
            .and_modify(|acc| {
                if metric == Metric::MaxSpeed {
                    *acc = acc.max(value);
                } else {
                    *acc += value;
                }
            })
            .or_insert(value);
    }
}

// ── AggregatedGroup ───────────────────────────────────────────────────────────

/// Totals for one group of rows (one player or one day).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedGroup {
    /// Player name or `"%Y-%m-%d"` date.
    pub key: String,
    pub totals: MetricTotals,
    /// Distinct session dates contributing to the group.
    pub session_dates: BTreeSet<NaiveDate>,
}

impl AggregatedGroup {
    fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            totals: MetricTotals::default(),
            session_dates: BTreeSet::new(),
        }
    }

    fn add_row(&mut self, row: &SessionRow) {
        self.totals.add_row(row);
        self.session_dates.insert(row.date);
    }
}

// ── PlayerReport ──────────────────────────────────────────────────────────────

/// Summary card for one player over the selected rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerReport {
    pub player: String,
    pub sessions: usize,
    pub first_session: Option<NaiveDate>,
    pub last_session: Option<NaiveDate>,
    /// The [`HEADLINE_METRICS`] in order, `None` where absent.
    pub headline: Vec<(Metric, Option<f64>)>,
}

// ── SessionAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that groups session rows.
pub struct SessionAggregator;

impl SessionAggregator {
    /// Unique player names in first-seen order.
    pub fn players(dataset: &Dataset) -> Vec<String> {
        let mut seen = HashSet::new();
        dataset
            .rows
            .iter()
            .filter(|r| seen.insert(r.player.as_str()))
            .map(|r| r.player.clone())
            .collect()
    }

    /// Totals across every row of `dataset`.
    pub fn totals(dataset: &Dataset) -> MetricTotals {
        let mut totals = MetricTotals::default();
        for row in &dataset.rows {
            totals.add_row(row);
        }
        totals
    }

    /// One group per player, sorted by name.
    pub fn aggregate_by_player(dataset: &Dataset) -> Vec<AggregatedGroup> {
        Self::aggregate_by(dataset, |row| row.player.clone())
    }

    /// One group per session date, oldest first.
    pub fn aggregate_daily(dataset: &Dataset) -> Vec<AggregatedGroup> {
        Self::aggregate_by(dataset, |row| row.date.format("%Y-%m-%d").to_string())
    }

    /// Fold the totals of several groups into one.
    pub fn calculate_totals(groups: &[AggregatedGroup]) -> MetricTotals {
        let mut totals = MetricTotals::default();
        for group in groups {
            totals.merge(&group.totals);
        }
        totals
    }

    /// Report card for `player`, or `None` if the player has no rows.
    pub fn player_report(dataset: &Dataset, player: &str) -> Option<PlayerReport> {
        let group = Self::aggregate_by_player(dataset)
            .into_iter()
            .find(|g| g.key == player)?;

        Some(PlayerReport {
            player: group.key,
            sessions: group.session_dates.len(),
            first_session: group.session_dates.first().copied(),
            last_session: group.session_dates.last().copied(),
            headline: HEADLINE_METRICS
                .into_iter()
                .map(|m| (m, group.totals.get(m)))
                .collect(),
        })
    }

    /// Report cards for every player, in first-seen order.
    pub fn player_reports(dataset: &Dataset) -> Vec<PlayerReport> {
        Self::players(dataset)
            .iter()
            .filter_map(|p| Self::player_report(dataset, p))
            .collect()
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn aggregate_by(
        dataset: &Dataset,
        key_fn: impl Fn(&SessionRow) -> String,
    ) -> Vec<AggregatedGroup> {
        let mut map: BTreeMap<String, AggregatedGroup> = BTreeMap::new();

        for row in &dataset.rows {
            let key = key_fn(row);
            map.entry(key.clone())
                .or_insert_with(|| AggregatedGroup::new(key))
                .add_row(row);
        }

        map.into_values().collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
