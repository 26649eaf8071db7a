//! Animation lifecycle runtime for aether.
//!
//! The runtime owns two slots (foreground and background), each holding at
//! most one running [`AnimationLayer`]. Layers run as self-rescheduling
//! frame loops on a single-threaded [`FrameScheduler`]; the
//! [`AnimationLifecycleManager`] guarantees that a slot's occupant is fully
//! torn down before its replacement is constructed.

mod error;
mod host;
mod layer;
mod manager;
mod settings;
mod surface;

pub use error::{LayerError, Result};
pub use host::{
    EventBus, EventKind, FrameHandle, FrameScheduler, Host, HostEvent, InputState, SubscriptionId,
};
pub use layer::{
    AnimationLayer, CameraControl, DensityControl, FrameLoop, IntensityControl, LayerContext,
    LayerState, SpeedControl, Subscriptions, apply_snapshot,
};
pub use manager::{AnimationLifecycleManager, LayerFactory, ManagerConfig};
pub use settings::{Settings, SettingsBridge, SettingsChange};
pub use surface::{RecordingSurface, Surface, SurfaceSize};
