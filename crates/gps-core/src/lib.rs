//! Core domain types for the GPS session dashboard.
//!
//! Holds the canonical schema ([`models::Metric`], [`models::SessionRow`],
//! [`models::Dataset`]), the export-header mapping table, configuration and
//! the error type shared by the other crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod schema;
pub mod settings;
pub mod time_utils;

pub use error::{GpsError, Result};
