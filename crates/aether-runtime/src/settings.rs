//! Boundary to whatever owns the user's settings.

use aether_core::{LayerKind, ParameterSnapshot, Slot};

/// Parameters plus the layer selected for each slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub parameters: ParameterSnapshot,
    pub foreground: LayerKind,
    pub background: LayerKind,
}

impl Settings {
    /// Selected kind for a slot.
    pub fn kind(&self, slot: Slot) -> LayerKind {
        match slot {
            Slot::Foreground => self.foreground,
            Slot::Background => self.background,
        }
    }
}

/// A change notification from the settings owner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingsChange {
    Parameters(ParameterSnapshot),
    Layer { slot: Slot, kind: LayerKind },
}

/// Read accessor plus polled change path.
pub trait SettingsBridge {
    /// Current settings, or `None` while they are not available yet.
    fn snapshot(&self) -> Option<Settings>;

    /// Changes since the last call, oldest first.
    fn take_changes(&mut self) -> Vec<SettingsChange>;
}
