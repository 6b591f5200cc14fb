//! Data ingestion layer for the GPS session dashboard.
//!
//! Responsible for discovering and normalizing per-session GPS exports,
//! merging them into one [`gps_core::models::Dataset`], filtering it by
//! recency window and player, and aggregating the result for reports.

pub mod aggregator;
pub mod filter;
pub mod reader;

pub use gps_core as core;
