use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A canonical numeric field tracked per player and session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Total distance covered in metres.
    #[serde(rename = "Total_Distance")]
    TotalDistance,
    /// Peak speed in km/h.
    #[serde(rename = "Max_Speed")]
    MaxSpeed,
    #[serde(rename = "Speed_Zone_1")]
    SpeedZone1,
    #[serde(rename = "Speed_Zone_2")]
    SpeedZone2,
    #[serde(rename = "Speed_Zone_3")]
    SpeedZone3,
    #[serde(rename = "Speed_Zone_4")]
    SpeedZone4,
    #[serde(rename = "Speed_Zone_5")]
    SpeedZone5,
    #[serde(rename = "Speed_Zone_6")]
    SpeedZone6,
    /// Number of sprints.
    #[serde(rename = "Sprints")]
    Sprints,
    /// Number of explosive accelerations.
    #[serde(rename = "Accelerations")]
    Accelerations,
    /// Number of explosive decelerations.
    #[serde(rename = "Decelerations")]
    Decelerations,
}

impl Metric {
    /// Every metric, in canonical column order.
    pub const ALL: [Metric; 11] = [
        Metric::TotalDistance,
        Metric::MaxSpeed,
        Metric::SpeedZone1,
        Metric::SpeedZone2,
        Metric::SpeedZone3,
        Metric::SpeedZone4,
        Metric::SpeedZone5,
        Metric::SpeedZone6,
        Metric::Sprints,
        Metric::Accelerations,
        Metric::Decelerations,
    ];

    /// The six speed-zone distance metrics, slowest band first.
    pub const SPEED_ZONES: [Metric; 6] = [
        Metric::SpeedZone1,
        Metric::SpeedZone2,
        Metric::SpeedZone3,
        Metric::SpeedZone4,
        Metric::SpeedZone5,
        Metric::SpeedZone6,
    ];

    /// Canonical column name, e.g. `"Total_Distance"`.
    pub fn name(self) -> &'static str {
        match self {
            Metric::TotalDistance => "Total_Distance",
            Metric::MaxSpeed => "Max_Speed",
            Metric::SpeedZone1 => "Speed_Zone_1",
            Metric::SpeedZone2 => "Speed_Zone_2",
            Metric::SpeedZone3 => "Speed_Zone_3",
            Metric::SpeedZone4 => "Speed_Zone_4",
            Metric::SpeedZone5 => "Speed_Zone_5",
            Metric::SpeedZone6 => "Speed_Zone_6",
            Metric::Sprints => "Sprints",
            Metric::Accelerations => "Accelerations",
            Metric::Decelerations => "Decelerations",
        }
    }

    /// Look up a metric by its canonical column name.
    pub fn from_name(name: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.name() == name)
    }

    /// `true` for metrics that are counts stored as floats.
    pub fn is_count(self) -> bool {
        matches!(
            self,
            Metric::Sprints | Metric::Accelerations | Metric::Decelerations
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One normalized `(date, player)` observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    /// Session date parsed from the file name.
    pub date: NaiveDate,
    /// Athlete name as written in the export.
    #[serde(rename = "Player")]
    pub player: String,
    /// Coerced metric values. Metrics missing from the source are absent.
    #[serde(flatten)]
    pub metrics: BTreeMap<Metric, f64>,
}

impl SessionRow {
    pub fn new(date: NaiveDate, player: impl Into<String>) -> Self {
        Self {
            date,
            player: player.into(),
            metrics: BTreeMap::new(),
        }
    }

    /// Value of `metric` for this row, if the source provided one.
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }
}

/// Provenance for a session file that was merged successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSource {
    pub file_name: String,
    pub date: NaiveDate,
    pub rows: usize,
    /// Canonical metric columns present in the file header.
    pub metrics: Vec<Metric>,
}

/// A session file that was left out of the merge, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: String,
}

/// The unified dataset produced by one ingestion run.
///
/// Rows keep discovery order across files and file order within a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub rows: Vec<SessionRow>,
    #[serde(default)]
    pub sources: Vec<SessionSource>,
    #[serde(default)]
    pub skipped: Vec<SkippedFile>,
}

impl Dataset {
    /// Build a dataset from bare rows, with no provenance attached.
    pub fn from_rows(rows: Vec<SessionRow>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Earliest session date, or `None` for an empty dataset.
    pub fn min_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).min()
    }

    /// Latest session date, or `None` for an empty dataset.
    pub fn max_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).max()
    }

    /// Copy of this dataset keeping only rows accepted by `keep`.
    ///
    /// Provenance is carried over unchanged.
    pub fn retain_rows(&self, mut keep: impl FnMut(&SessionRow) -> bool) -> Dataset {
        Dataset {
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
            sources: self.sources.clone(),
            skipped: self.skipped.clone(),
        }
    }

    /// Union of metric columns present in any row, in canonical order.
    pub fn metric_columns(&self) -> Vec<Metric> {
        Metric::ALL
            .into_iter()
            .filter(|m| self.rows.iter().any(|r| r.metrics.contains_key(m)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_metric_names_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_name(metric.name()), Some(metric));
        }
        assert_eq!(Metric::from_name("Player"), None);
    }

    #[test]
    fn test_metric_counts() {
        assert!(Metric::Sprints.is_count());
        assert!(Metric::Decelerations.is_count());
        assert!(!Metric::MaxSpeed.is_count());
    }

    #[test]
    fn test_session_row_serializes_canonical_names() {
        let mut row = SessionRow::new(date(2024, 3, 1), "J. Smith");
        row.metrics.insert(Metric::TotalDistance, 5234.5);
        row.metrics.insert(Metric::Sprints, 7.0);

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["date"], "2024-03-01");
        assert_eq!(json["Player"], "J. Smith");
        assert_eq!(json["Total_Distance"], 5234.5);
        assert_eq!(json["Sprints"], 7.0);
        assert!(json.get("Max_Speed").is_none());
    }

    #[test]
    fn test_dataset_min_max_dates() {
        let ds = Dataset::from_rows(vec![
            SessionRow::new(date(2024, 3, 5), "A"),
            SessionRow::new(date(2024, 2, 20), "B"),
            SessionRow::new(date(2024, 3, 1), "C"),
        ]);
        assert_eq!(ds.min_date(), Some(date(2024, 2, 20)));
        assert_eq!(ds.max_date(), Some(date(2024, 3, 5)));
        assert_eq!(Dataset::default().min_date(), None);
    }

    #[test]
    fn test_dataset_metric_columns_union() {
        let mut a = SessionRow::new(date(2024, 3, 1), "A");
        a.metrics.insert(Metric::Sprints, 3.0);
        let mut b = SessionRow::new(date(2024, 3, 2), "B");
        b.metrics.insert(Metric::TotalDistance, 100.0);

        let ds = Dataset::from_rows(vec![a, b]);
        assert_eq!(
            ds.metric_columns(),
            vec![Metric::TotalDistance, Metric::Sprints]
        );
    }

    #[test]
    fn test_retain_rows_keeps_order() {
        let ds = Dataset::from_rows(vec![
            SessionRow::new(date(2024, 3, 1), "A"),
            SessionRow::new(date(2024, 3, 2), "B"),
            SessionRow::new(date(2024, 3, 3), "A"),
        ]);
        let only_a = ds.retain_rows(|r| r.player == "A");
        assert_eq!(only_a.len(), 2);
        assert_eq!(only_a.rows[0].date, date(2024, 3, 1));
        assert_eq!(only_a.rows[1].date, date(2024, 3, 3));
    }
}
