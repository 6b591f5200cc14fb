mod bootstrap;
mod report;

use anyhow::{bail, Result};
use gps_core::models::Dataset;
use gps_core::settings::{DataConfig, Settings};
use gps_core::time_utils::local_now;
use gps_data::filter::{filter_by_player, filter_by_window, RecencyWindow, ALL_PLAYERS};
use gps_data::reader::{
    discover_session_files, load_all_sessions, load_session, sessions_most_recent_first,
};

/// Session selector that picks the most recent file.
const LATEST_SESSION: &str = "latest";

fn main() -> Result<()> {
    let (settings, data_config) = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;
    data_config.validate()?;

    tracing::info!("GPS dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Folder: {}, date format: {}, range: {}, player: {}",
        data_config.gps_data_folder.display(),
        data_config.date_format,
        settings.range,
        settings.player
    );

    let merged = match settings.session.as_deref() {
        Some(selector) => load_selected_session(&data_config, selector)?,
        None => load_all_sessions(&data_config),
    };

    let window = RecencyWindow::from_selector(&settings.range);
    let selected = filter_by_window(
        &filter_by_player(&merged, &settings.player),
        window,
        local_now(),
    );
    tracing::debug!("{} of {} rows selected", selected.len(), merged.len());

    let output = match (settings.format.as_str(), settings.view.as_str()) {
        ("csv", _) => report::rows_to_csv(&selected)?,
        ("json", "sessions") => serde_json::to_string_pretty(&merged.sources)? + "\n",
        ("json", view) => report::to_json(view, &selected)?,
        (_, "players") => report::render_players(&selected),
        (_, "daily") => report::render_daily(&selected),
        (_, "rows") => report::render_rows(&selected),
        (_, "sessions") => report::render_sessions(&merged.sources, &merged.skipped),
        _ => report::render_summary(&selected, &scope_label(&settings.player, window)),
    };

    print!("{}", output);
    Ok(())
}

/// Load one session with the strict single-file loader.
///
/// Unlike the batch merge, a failure here is reported to the user.
fn load_selected_session(config: &DataConfig, selector: &str) -> Result<Dataset> {
    let file_name = if selector.eq_ignore_ascii_case(LATEST_SESSION) {
        let files = discover_session_files(&config.gps_data_folder, &config.file_suffix);
        match sessions_most_recent_first(files).into_iter().next() {
            Some(name) => name,
            None => bail!(
                "no session files matching *{} in {}",
                config.file_suffix,
                config.gps_data_folder.display()
            ),
        }
    } else {
        selector.to_string()
    };

    tracing::info!("Loading session {}", file_name);
    Ok(load_session(config, &file_name)?.into())
}

fn scope_label(player: &str, window: RecencyWindow) -> String {
    if player.eq_ignore_ascii_case(ALL_PLAYERS) {
        format!("All players, {}", window)
    } else {
        format!("{}, {}", player, window)
    }
}
