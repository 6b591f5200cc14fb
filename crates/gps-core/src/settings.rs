use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GpsError, Result};
use crate::time_utils::validate_date_format;

/// Default strftime pattern for the date token in session file names.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// File-name suffix marking a per-player "session details" export.
pub const DEFAULT_FILE_SUFFIX: &str = "_details.csv";

/// Separator placed immediately before the date token.
pub const DEFAULT_DATE_SEPARATOR: &str = "_";

/// Folder scanned when nothing else is configured.
pub const DEFAULT_DATA_FOLDER: &str = "gps_data";

// ── DataConfig ─────────────────────────────────────────────────────────────────

/// Everything discovery and normalization need to know about the input files.
///
/// Passed explicitly into every ingestion call; read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub gps_data_folder: PathBuf,
    pub date_format: String,
    pub file_suffix: String,
    pub date_separator: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            gps_data_folder: PathBuf::from(DEFAULT_DATA_FOLDER),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            file_suffix: DEFAULT_FILE_SUFFIX.to_string(),
            date_separator: DEFAULT_DATE_SEPARATOR.to_string(),
        }
    }
}

impl DataConfig {
    /// Default configuration pointed at `folder`.
    pub fn for_folder(folder: impl Into<PathBuf>) -> Self {
        Self {
            gps_data_folder: folder.into(),
            ..Default::default()
        }
    }

    /// Reject values that would make every file fail.
    pub fn validate(&self) -> Result<()> {
        if !validate_date_format(&self.date_format) {
            return Err(GpsError::Config(format!(
                "invalid date format \"{}\"",
                self.date_format
            )));
        }
        if self.file_suffix.is_empty() {
            return Err(GpsError::Config("file suffix is empty".to_string()));
        }
        if self.date_separator.is_empty() {
            return Err(GpsError::Config("date separator is empty".to_string()));
        }
        Ok(())
    }
}

// ── FileConfig ─────────────────────────────────────────────────────────────────

/// `paths` section of the config file.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct PathsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_data_folder: Option<PathBuf>,
}

/// Persisted configuration saved to `~/.gps-dashboard/config.json`.
///
/// Every field is optional; anything absent falls back to the built-in
/// default.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_separator: Option<String>,
}

impl FileConfig {
    /// Return the default path to the config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".gps-dashboard").join("config.json")
    }

    /// Load the config from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Atomically write the config to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Overlay the values present in this file onto `base`.
    pub fn apply_to(&self, mut base: DataConfig) -> DataConfig {
        if let Some(folder) = &self.paths.gps_data_folder {
            base.gps_data_folder = folder.clone();
        }
        if let Some(v) = &self.date_format {
            base.date_format = v.clone();
        }
        if let Some(v) = &self.file_suffix {
            base.file_suffix = v.clone();
        }
        if let Some(v) = &self.date_separator {
            base.date_separator = v.clone();
        }
        base
    }
}

impl From<&DataConfig> for FileConfig {
    fn from(c: &DataConfig) -> Self {
        FileConfig {
            paths: PathsSection {
                gps_data_folder: Some(c.gps_data_folder.clone()),
            },
            date_format: Some(c.date_format.clone()),
            file_suffix: Some(c.file_suffix.clone()),
            date_separator: Some(c.date_separator.clone()),
        }
    }
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Merge GPS session exports and report per-player training load
#[derive(Parser, Debug, Clone)]
#[command(
    name = "gps-dashboard",
    about = "Merge GPS session exports and report per-player training load",
    version
)]
pub struct Settings {
    /// Folder containing the session exports
    #[arg(long, env = "GPS_DATA_FOLDER")]
    pub data_folder: Option<PathBuf>,

    /// strftime pattern of the date embedded in file names
    #[arg(long)]
    pub date_format: Option<String>,

    /// File-name suffix of session exports
    #[arg(long)]
    pub suffix: Option<String>,

    /// Recency window ("7 days", "14 days", "30 days", anything else = all)
    #[arg(long, default_value = "all")]
    pub range: String,

    /// Player to report on ("All" for the whole squad)
    #[arg(long, default_value = "All")]
    pub player: String,

    /// Report on a single session file ("latest" for the most recent one)
    #[arg(long)]
    pub session: Option<String>,

    /// Report view
    #[arg(long, default_value = "summary", value_parser = ["summary", "players", "daily", "rows", "sessions"])]
    pub view: String,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json", "csv"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Config file to use instead of ~/.gps-dashboard/config.json
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Persist the effective data settings to the config file
    #[arg(long)]
    pub save_config: bool,

    /// Delete the saved config file before running
    #[arg(long)]
    pub clear: bool,
}

impl Settings {
    /// Parse CLI arguments and resolve the data configuration against the
    /// config file.
    pub fn load() -> (Self, DataConfig) {
        Self::load_impl(std::env::args_os().collect(), &FileConfig::config_path())
    }

    /// Full implementation: accepts args and a default config path so that
    /// tests can redirect to a temporary directory.
    ///
    /// Precedence: command line (or environment), then config file, then
    /// built-in defaults.
    pub fn load_impl(
        args: Vec<std::ffi::OsString>,
        default_config_path: &Path,
    ) -> (Self, DataConfig) {
        let mut settings = Settings::parse_from(args);
        let config_path = settings
            .config
            .clone()
            .unwrap_or_else(|| default_config_path.to_path_buf());

        let file_config = if settings.clear {
            if let Err(e) = FileConfig::clear_at(&config_path) {
                tracing::warn!("Could not remove {}: {}", config_path.display(), e);
            }
            FileConfig::default()
        } else {
            FileConfig::load_from(&config_path)
        };

        let data_config = settings.apply_overrides(file_config.apply_to(DataConfig::default()));

        if settings.save_config {
            if let Err(e) = FileConfig::from(&data_config).save_to(&config_path) {
                tracing::warn!("Could not save {}: {}", config_path.display(), e);
            }
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        (settings, data_config)
    }

    /// Apply the data options given on the command line to `base`.
    pub fn apply_overrides(&self, mut base: DataConfig) -> DataConfig {
        if let Some(folder) = &self.data_folder {
            base.gps_data_folder = folder.clone();
        }
        if let Some(v) = &self.date_format {
            base.date_format = v.clone();
        }
        if let Some(v) = &self.suffix {
            base.file_suffix = v.clone();
        }
        base
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        FileConfig::config_path_in(tmp.path())
    }

    fn args(list: &[&str]) -> Vec<std::ffi::OsString> {
        std::iter::once("gps-dashboard")
            .chain(list.iter().copied())
            .map(Into::into)
            .collect()
    }

    // ── DataConfig ────────────────────────────────────────────────────────────

    #[test]
    fn test_data_config_defaults() {
        let c = DataConfig::default();
        assert_eq!(c.gps_data_folder, PathBuf::from("gps_data"));
        assert_eq!(c.date_format, "%Y-%m-%d");
        assert_eq!(c.file_suffix, "_details.csv");
        assert_eq!(c.date_separator, "_");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_data_config_rejects_bad_format() {
        let c = DataConfig {
            date_format: "%Q".to_string(),
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(GpsError::Config(_))));
    }

    #[test]
    fn test_data_config_rejects_empty_suffix() {
        let c = DataConfig {
            file_suffix: String::new(),
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    // ── FileConfig ────────────────────────────────────────────────────────────

    #[test]
    fn test_file_config_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let config = FileConfig {
            paths: PathsSection {
                gps_data_folder: Some(PathBuf::from("/srv/gps")),
            },
            date_format: Some("%d.%m.%Y".to_string()),
            ..Default::default()
        };

        config.save_to(&path).expect("save");
        assert_eq!(FileConfig::load_from(&path), config);
    }

    #[test]
    fn test_file_config_nested_paths_layout() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"paths": {"gps_data_folder": "/data/gps"}, "date_format": "%d-%m-%Y"}"#,
        )
        .unwrap();

        let resolved = FileConfig::load_from(&path).apply_to(DataConfig::default());
        assert_eq!(resolved.gps_data_folder, PathBuf::from("/data/gps"));
        assert_eq!(resolved.date_format, "%d-%m-%Y");
        assert_eq!(resolved.file_suffix, DEFAULT_FILE_SUFFIX);
    }

    #[test]
    fn test_file_config_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        assert_eq!(
            FileConfig::load_from(&tmp_config_path(&tmp)),
            FileConfig::default()
        );

        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(FileConfig::load_from(&path), FileConfig::default());
    }

    #[test]
    fn test_file_config_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        FileConfig::default().save_to(&path).expect("save");
        assert!(path.exists());

        FileConfig::clear_at(&path).expect("clear");
        assert!(!path.exists());
        // Clearing twice is fine.
        FileConfig::clear_at(&path).expect("clear again");
    }

    #[test]
    fn test_file_config_save_reports_io_error() {
        let tmp = TempDir::new().expect("tempdir");
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let err = FileConfig::default()
            .save_to(&blocker.join("config.json"))
            .unwrap_err();
        assert!(matches!(err, GpsError::Io(_)));
    }

    // ── Settings ──────────────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["gps-dashboard"]);
        assert_eq!(settings.range, "all");
        assert_eq!(settings.player, "All");
        assert_eq!(settings.view, "summary");
        assert_eq!(settings.format, "table");
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.session.is_none());
        assert!(settings.date_format.is_none());
        assert!(!settings.debug);
        assert!(!settings.save_config);
    }

    #[test]
    fn test_load_uses_config_file_values() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        FileConfig {
            paths: PathsSection {
                gps_data_folder: Some(PathBuf::from("/from/file")),
            },
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let (_, data) = Settings::load_impl(args(&[]), &path);
        assert_eq!(data.gps_data_folder, PathBuf::from("/from/file"));
    }

    #[test]
    fn test_load_cli_overrides_config_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        FileConfig {
            paths: PathsSection {
                gps_data_folder: Some(PathBuf::from("/from/file")),
            },
            date_format: Some("%d.%m.%Y".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let (_, data) = Settings::load_impl(args(&["--data-folder", "/from/cli"]), &path);
        assert_eq!(data.gps_data_folder, PathBuf::from("/from/cli"));
        assert_eq!(data.date_format, "%d.%m.%Y");
    }

    #[test]
    fn test_load_save_config_persists() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);

        Settings::load_impl(
            args(&["--data-folder", "/season/2024", "--save-config"]),
            &path,
        );

        let saved = FileConfig::load_from(&path);
        assert_eq!(
            saved.paths.gps_data_folder,
            Some(PathBuf::from("/season/2024"))
        );
        assert_eq!(saved.date_format.as_deref(), Some(DEFAULT_DATE_FORMAT));
    }

    #[test]
    fn test_load_clear_removes_file_and_ignores_it() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        FileConfig {
            date_format: Some("%d.%m.%Y".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let (_, data) = Settings::load_impl(args(&["--clear"]), &path);
        assert!(!path.exists());
        assert_eq!(data.date_format, DEFAULT_DATE_FORMAT);
    }

    #[test]
    fn test_load_explicit_config_path() {
        let tmp = TempDir::new().expect("tempdir");
        let custom = tmp.path().join("club.json");
        FileConfig {
            file_suffix: Some("_summary.csv".to_string()),
            ..Default::default()
        }
        .save_to(&custom)
        .expect("save");

        let unused_default = tmp_config_path(&tmp);
        let (_, data) = Settings::load_impl(
            args(&["--config", custom.to_str().unwrap()]),
            &unused_default,
        );
        assert_eq!(data.file_suffix, "_summary.csv");
    }

    #[test]
    fn test_load_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let (settings, _) = Settings::load_impl(args(&["--debug"]), &tmp_config_path(&tmp));
        assert_eq!(settings.log_level, "DEBUG");
    }
}
