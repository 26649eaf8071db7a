mod app;
mod surface;

use std::fs::{self, File};
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Mutex;

use aether_config::SettingsStore;
use crossterm::{
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute,
};
use directories::ProjectDirs;
use ratatui::DefaultTerminal;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::app::App;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_logging();
    let store = SettingsStore::open(settings_path());
    let terminal = ratatui::init();
    let result = run(terminal, store);
    if let Err(err) = execute!(stdout(), DisableMouseCapture, DisableFocusChange) {
        warn!(error = %err, "failed to release the mouse");
    }
    ratatui::restore();
    result
}

fn run(terminal: DefaultTerminal, store: SettingsStore) -> color_eyre::Result<()> {
    execute!(stdout(), EnableMouseCapture, EnableFocusChange)?;
    let size = terminal.size()?;
    App::new(store, size).run(terminal)
}

fn settings_path() -> Option<PathBuf> {
    aether_config::config_path()
        .inspect_err(|err| warn!(error = %err, "settings will not be saved"))
        .ok()
}

/// Log to `aether.log` in the data directory; the terminal owns stdout.
/// Filter with `AETHER_LOG`, defaulting to `info`.
fn init_logging() {
    let Some(dirs) = ProjectDirs::from("", "", "aether") else {
        return;
    };
    let dir = dirs.data_dir();
    if fs::create_dir_all(dir).is_err() {
        return;
    }
    let Ok(file) = File::create(dir.join("aether.log")) else {
        return;
    };

    let filter = EnvFilter::try_from_env("AETHER_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}
