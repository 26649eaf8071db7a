//! Settings owner backing the lifecycle manager.

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use aether_core::{CameraState, Capability, LayerKind, SavedView, Slot};
use aether_runtime::{Settings, SettingsBridge, SettingsChange};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::Result;

/// Quiet period after the last edit before it is written to disk.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Holds the current settings, queues edits for the manager and persists
/// them.
///
/// A config file that could not be read leaves the store unavailable: it
/// reports no snapshot and never writes, so a hand-edited file with a typo
/// is not overwritten. Edits still reach the manager as changes.
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    config: AppConfig,
    available: bool,
    changes: Vec<SettingsChange>,
    dirty_since: Option<Duration>,
}

impl SettingsStore {
    /// Load the store from `path`, or keep it in memory when `path` is
    /// `None`.
    pub fn open(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::in_memory(AppConfig::default());
        };
        match AppConfig::load(&path) {
            Ok(config) => {
                info!(path = %path.display(), "settings loaded");
                Self {
                    path: Some(path),
                    ..Self::in_memory(config)
                }
            }
            Err(err) => {
                warn!(error = %err, "settings unavailable; falling back to defaults");
                Self {
                    path: Some(path),
                    available: false,
                    ..Self::in_memory(AppConfig::default())
                }
            }
        }
    }

    /// A store that never touches disk.
    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            path: None,
            config,
            available: true,
            changes: Vec::new(),
            dirty_since: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// Select a layer kind for a slot.
    pub fn set_layer(&mut self, slot: Slot, kind: LayerKind, now: Duration) {
        match slot {
            Slot::Foreground => self.config.foreground = kind,
            Slot::Background => self.config.background = kind,
        }
        debug!(%slot, %kind, "layer selected");
        self.changes.push(SettingsChange::Layer { slot, kind });
        self.touch(now);
    }

    /// Move one parameter by `delta`, clamped. Returns the new level.
    pub fn adjust(&mut self, capability: Capability, delta: i32, now: Duration) -> u8 {
        let before = self.config.parameters;
        let after = before.adjusted(capability, delta);
        let level = after.level(capability);
        if after != before {
            self.config.parameters = after;
            debug!(?capability, level, "parameter adjusted");
            self.changes.push(SettingsChange::Parameters(after));
            self.touch(now);
        }
        level
    }

    /// Saved camera views, newest first.
    pub fn views(&self) -> &[SavedView] {
        &self.config.views
    }

    /// Store a camera pose under the next free `view N` name.
    pub fn save_view(&mut self, camera: CameraState, now: Duration) -> &SavedView {
        let name = (1..)
            .map(|n| format!("view {n}"))
            .find(|name| !self.config.views.iter().any(|view| &view.name == name))
            .unwrap_or_default();
        let saved_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        info!(%name, "camera view saved");
        self.config.views.insert(
            0,
            SavedView {
                name,
                camera,
                saved_at,
            },
        );
        self.touch(now);
        &self.config.views[0]
    }

    /// Remove the view at `index`.
    pub fn delete_view(&mut self, index: usize, now: Duration) -> Option<SavedView> {
        if index >= self.config.views.len() {
            return None;
        }
        let view = self.config.views.remove(index);
        info!(name = %view.name, "camera view deleted");
        self.touch(now);
        Some(view)
    }

    /// Restore default layers and levels, keeping saved views. The manager
    /// receives the result as ordinary changes.
    pub fn reset(&mut self, now: Duration) {
        self.config.reset();
        let settings = self.config.settings();
        self.changes.push(SettingsChange::Parameters(settings.parameters));
        for slot in Slot::ALL {
            self.changes.push(SettingsChange::Layer {
                slot,
                kind: settings.kind(slot),
            });
        }
        info!("settings reset to defaults");
        self.touch(now);
    }

    fn touch(&mut self, now: Duration) {
        self.dirty_since = Some(now);
    }

    /// Write pending edits once they have been quiet for [`SAVE_DEBOUNCE`].
    /// Returns whether a save happened.
    pub fn flush_if_due(&mut self, now: Duration) -> Result<bool> {
        match self.dirty_since {
            Some(since) if now.saturating_sub(since) >= SAVE_DEBOUNCE => self.flush(),
            _ => Ok(false),
        }
    }

    /// Write pending edits immediately.
    pub fn flush(&mut self) -> Result<bool> {
        if self.dirty_since.take().is_none() {
            return Ok(false);
        }
        let Some(path) = self.path.as_deref() else {
            return Ok(false);
        };
        if !self.available {
            debug!("settings unavailable; edits kept in memory");
            return Ok(false);
        }
        self.config.save(path)?;
        debug!(path = %path.display(), "settings saved");
        Ok(true)
    }
}

impl SettingsBridge for SettingsStore {
    fn snapshot(&self) -> Option<Settings> {
        self.available.then(|| self.config.settings())
    }

    fn take_changes(&mut self) -> Vec<SettingsChange> {
        std::mem::take(&mut self.changes)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use aether_core::ParameterSnapshot;

    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("aether-store-test-{}-{name}", std::process::id()))
            .join("config.toml")
    }

    #[test]
    fn test_edits_are_queued_in_order() {
        let mut store = SettingsStore::in_memory(AppConfig::default());
        store.set_layer(Slot::Background, LayerKind::MatrixRain, ms(0));
        store.adjust(Capability::Speed, 5, ms(1));

        let changes = store.take_changes();
        assert_eq!(
            changes,
            vec![
                SettingsChange::Layer {
                    slot: Slot::Background,
                    kind: LayerKind::MatrixRain
                },
                SettingsChange::Parameters(ParameterSnapshot::new(50, 55, 50)),
            ]
        );
        assert!(store.take_changes().is_empty());
        assert_eq!(store.snapshot().unwrap().background, LayerKind::MatrixRain);
    }

    #[test]
    fn test_adjust_at_limit_is_not_a_change() {
        let mut config = AppConfig::default();
        config.parameters = ParameterSnapshot::new(100, 50, 50);
        let mut store = SettingsStore::in_memory(config);

        assert_eq!(store.adjust(Capability::Density, 5, ms(0)), 100);
        assert!(store.take_changes().is_empty());
        assert!(!store.has_unsaved_changes());
    }

    #[test]
    fn test_save_is_debounced() {
        let path = temp_path("debounce");
        let mut store = SettingsStore::open(Some(path.clone()));
        assert!(store.is_available());

        store.adjust(Capability::Intensity, -5, ms(0));
        store.adjust(Capability::Intensity, -5, ms(300));
        assert!(!store.flush_if_due(ms(700)).unwrap());
        assert!(!path.exists());

        assert!(store.flush_if_due(ms(800)).unwrap());
        assert_eq!(AppConfig::load(&path).unwrap().parameters.physics_intensity, 40);
        assert!(!store.flush_if_due(ms(2000)).unwrap());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_broken_file_has_no_snapshot_and_is_not_overwritten() {
        let path = temp_path("broken");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "foreground = [").unwrap();

        let mut store = SettingsStore::open(Some(path.clone()));
        assert!(!store.is_available());
        assert!(store.snapshot().is_none());

        store.set_layer(Slot::Foreground, LayerKind::NodeGrid, ms(0));
        assert_eq!(store.take_changes().len(), 1);
        assert!(!store.flush().unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "foreground = [");
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    fn pose(z: f32) -> CameraState {
        CameraState {
            position: [0.0, 20.0, z],
            target: [0.0, 0.0, 0.0],
        }
    }

    #[test]
    fn test_views_are_named_and_persisted() {
        let path = temp_path("views");
        let mut store = SettingsStore::open(Some(path.clone()));

        assert_eq!(store.save_view(pose(70.0), ms(0)).name, "view 1");
        assert_eq!(store.save_view(pose(40.0), ms(1)).name, "view 2");
        assert_eq!(store.views()[0].camera, pose(40.0));
        assert!(store.views()[0].saved_at > 0);
        assert!(store.flush().unwrap());

        let reopened = SettingsStore::open(Some(path.clone()));
        assert_eq!(reopened.views(), store.views());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_delete_view_frees_its_name() {
        let mut store = SettingsStore::in_memory(AppConfig::default());
        store.save_view(pose(70.0), ms(0));
        store.save_view(pose(40.0), ms(0));

        let removed = store.delete_view(1, ms(1)).unwrap();
        assert_eq!(removed.name, "view 1");
        assert!(store.delete_view(5, ms(2)).is_none());
        assert_eq!(store.views().len(), 1);
        assert_eq!(store.save_view(pose(10.0), ms(3)).name, "view 1");
        // Views never reach the manager.
        assert!(store.take_changes().is_empty());
    }

    #[test]
    fn test_reset_queues_defaults() {
        let mut store = SettingsStore::in_memory(AppConfig::default());
        store.set_layer(Slot::Foreground, LayerKind::NodeGrid, ms(0));
        store.adjust(Capability::Speed, 30, ms(0));
        store.save_view(pose(70.0), ms(0));
        store.take_changes();

        store.reset(ms(5));
        assert_eq!(
            store.take_changes(),
            vec![
                SettingsChange::Parameters(ParameterSnapshot::default()),
                SettingsChange::Layer {
                    slot: Slot::Background,
                    kind: LayerKind::Starfield
                },
                SettingsChange::Layer {
                    slot: Slot::Foreground,
                    kind: LayerKind::Particles
                },
            ]
        );
        assert_eq!(store.views().len(), 1);
        assert!(store.has_unsaved_changes());
    }

    #[test]
    fn test_in_memory_never_writes() {
        let mut store = SettingsStore::open(None);
        store.set_layer(Slot::Foreground, LayerKind::None, ms(0));
        assert!(!store.flush().unwrap());
        assert!(!store.has_unsaved_changes());
    }
}
