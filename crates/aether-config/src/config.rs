//! The `config.toml` file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use aether_core::{EngineSet, LayerKind, ParameterSnapshot, SavedView};
use aether_runtime::{ManagerConfig, Settings};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

const CONFIG_FILE: &str = "config.toml";

/// Location of `config.toml` in the platform config directory.
pub fn config_path() -> Result<PathBuf> {
    ProjectDirs::from("", "", "aether")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
        .ok_or(ConfigError::NoConfigDir)
}

/// Runtime switches for the optional engines. An engine that was not
/// compiled in stays unavailable regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineToggles {
    pub physics: bool,
    pub scene: bool,
}

impl Default for EngineToggles {
    fn default() -> Self {
        Self {
            physics: true,
            scene: true,
        }
    }
}

impl From<EngineToggles> for EngineSet {
    fn from(toggles: EngineToggles) -> Self {
        EngineSet {
            physics: toggles.physics,
            scene: toggles.scene,
        }
    }
}

/// Everything aether persists between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub foreground: LayerKind,
    pub background: LayerKind,
    pub parameters: ParameterSnapshot,
    /// How long to wait for settings before using the fallback layers.
    pub startup_wait_ms: u64,
    pub frame_interval_ms: u64,
    pub engines: EngineToggles,
    /// Saved camera views, newest first.
    pub views: Vec<SavedView>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            foreground: LayerKind::Particles,
            background: LayerKind::Starfield,
            parameters: ParameterSnapshot::default(),
            startup_wait_ms: 100,
            frame_interval_ms: 16,
            engines: EngineToggles::default(),
            views: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Parse a config document. Out-of-range levels are clamped.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.parameters = config.parameters.sanitized();
        config.frame_interval_ms = config.frame_interval_ms.max(1);
        Ok(config)
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Write the config, creating its directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_error)?;
        }
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text).map_err(io_error)
    }

    /// Restore the default layers, levels and timings. Saved views and the
    /// engine toggles are kept.
    pub fn reset(&mut self) {
        *self = Self {
            engines: self.engines,
            views: std::mem::take(&mut self.views),
            ..Self::default()
        };
    }

    pub fn settings(&self) -> Settings {
        Settings {
            parameters: self.parameters,
            foreground: self.foreground,
            background: self.background,
        }
    }

    pub fn engines(&self) -> EngineSet {
        self.engines.into()
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            startup_wait: Duration::from_millis(self.startup_wait_ms),
            ..ManagerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use aether_core::CameraState;

    use super::*;

    fn parse(text: &str) -> Result<AppConfig> {
        AppConfig::parse(text, Path::new("config.toml"))
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        assert_eq!(parse("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = parse(
            r#"
            foreground = "node_grid"
            background = "none"

            [parameters]
            animation_speed = 80

            [engines]
            physics = false
            "#,
        )
        .unwrap();
        assert_eq!(config.foreground, LayerKind::NodeGrid);
        assert_eq!(config.background, LayerKind::None);
        assert_eq!(config.parameters.animation_speed, 80);
        assert_eq!(config.parameters.particle_density, 50);
        assert_eq!(config.engines(), EngineSet { physics: false, scene: true });
        assert_eq!(config.startup_wait_ms, 100);
    }

    #[test]
    fn test_legacy_kind_names() {
        let config = parse("foreground = \"physics\"\nbackground = \"universe\"").unwrap();
        assert_eq!(config.foreground, LayerKind::Particles);
        assert_eq!(config.background, LayerKind::Orbital);
    }

    #[test]
    fn test_levels_are_clamped() {
        let config = parse("[parameters]\nparticle_density = 200").unwrap();
        assert_eq!(config.parameters.particle_density, 100);
    }

    #[test]
    fn test_invalid_document_is_an_error() {
        assert!(matches!(
            parse("foreground = \"lava lamp\""),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(parse("foreground = "), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("aether-config-test-{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.background = LayerKind::MatrixRain;
        config.parameters = ParameterSnapshot::new(10, 20, 30);

        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_views_survive_save_and_load() {
        let dir = std::env::temp_dir().join(format!("aether-views-test-{}", std::process::id()));
        let path = dir.join("config.toml");
        let mut config = AppConfig::default();
        config.views.push(SavedView {
            name: "view 1".into(),
            camera: CameraState {
                position: [5.0, 10.0, 40.0],
                target: [0.0, 0.0, 0.0],
            },
            saved_at: 1_700_000_000,
        });

        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.views, config.views);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_views_table_syntax() {
        let config = parse(
            r#"
            [[views]]
            name = "wide"
            camera = { position = [0.0, 50.0, 150.0], target = [0.0, 0.0, 0.0] }
            "#,
        )
        .unwrap();
        assert_eq!(config.views.len(), 1);
        assert_eq!(config.views[0].name, "wide");
        assert_eq!(config.views[0].saved_at, 0);
    }

    #[test]
    fn test_reset_keeps_views_and_engines() {
        let mut config = parse(
            r#"
            foreground = "none"
            startup_wait_ms = 900

            [parameters]
            animation_speed = 5

            [engines]
            scene = false

            [[views]]
            name = "kept"
            camera = { position = [1.0, 2.0, 3.0], target = [0.0, 0.0, 0.0] }
            "#,
        )
        .unwrap();

        config.reset();
        assert_eq!(config.foreground, LayerKind::Particles);
        assert_eq!(config.parameters, ParameterSnapshot::default());
        assert_eq!(config.startup_wait_ms, 100);
        assert!(!config.engines.scene);
        assert_eq!(config.views.len(), 1);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("aether-config-test-missing/config.toml");
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_manager_config() {
        let config = parse("startup_wait_ms = 250\nframe_interval_ms = 0").unwrap();
        assert_eq!(config.manager_config().startup_wait, Duration::from_millis(250));
        assert_eq!(config.frame_interval(), Duration::from_millis(1));
    }
}
