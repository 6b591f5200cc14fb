use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while ingesting GPS session exports.
#[derive(Error, Debug)]
pub enum GpsError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected the file contents.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The file name does not follow the `<name><sep><date><suffix>` convention.
    #[error("Invalid session file name {file}: {reason}")]
    InvalidFileName { file: String, reason: String },

    /// The embedded date token did not match the configured format.
    #[error("Invalid session date \"{token}\" (expected format {format})")]
    DateParse { token: String, format: String },

    /// A column the normalizer cannot do without is absent.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A numeric cell still held non-numeric text after separator stripping.
    #[error("Invalid number in column {column} at line {line}: \"{value}\"")]
    InvalidNumber {
        column: String,
        line: u64,
        value: String,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The file is not UTF-8 encoded.
    #[error("File is not valid UTF-8 (line {line}); re-export it as UTF-8")]
    Encoding { line: u64 },

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the GPS crates.
pub type Result<T> = std::result::Result<T, GpsError>;
