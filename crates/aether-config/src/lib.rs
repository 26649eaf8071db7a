//! Persisted user settings for aether.
//!
//! [`AppConfig`] is the on-disk `config.toml`; [`SettingsStore`] wraps it as
//! the runtime's [`SettingsBridge`](aether_runtime::SettingsBridge) and
//! writes edits back with a short debounce.

mod config;
mod error;
mod store;

pub use config::{AppConfig, EngineToggles, config_path};
pub use error::{ConfigError, Result};
pub use store::{SAVE_DEBOUNCE, SettingsStore};
