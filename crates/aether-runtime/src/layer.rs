//! The animation layer contract and the helpers layers use to keep their
//! frame registration and event subscriptions balanced.

use std::time::Duration;

use aether_core::{CameraState, Capability, EngineSet, LayerKind, ParameterSnapshot, Slot};

use crate::error::Result;
use crate::host::{
    EventBus, EventKind, FrameHandle, FrameScheduler, HostEvent, InputState, SubscriptionId,
};
use crate::surface::Surface;

/// Lifecycle state of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    Uninitialized,
    Running,
    Destroyed,
}

/// Everything a layer may touch during a callback. The surface is lent
/// exclusively for the duration of the call; input is read-only.
pub struct LayerContext<'a> {
    pub slot: Slot,
    /// Time since the host started.
    pub now: Duration,
    pub scheduler: &'a mut FrameScheduler,
    pub events: &'a mut EventBus,
    pub input: &'a InputState,
    pub engines: EngineSet,
    pub surface: &'a mut dyn Surface,
}

/// Accepts the particle density level (`0..=100`).
pub trait DensityControl {
    fn set_particle_density(&mut self, level: u8);
}

/// Accepts the animation speed level (`0..=100`).
pub trait SpeedControl {
    fn set_animation_speed(&mut self, level: u8);
}

/// Accepts the physics intensity level (`0..=100`).
pub trait IntensityControl {
    fn set_physics_intensity(&mut self, level: u8);
}

/// Exposes a movable camera so its pose can be saved and restored.
pub trait CameraControl {
    fn camera_state(&self) -> CameraState;

    fn set_camera_state(&mut self, state: CameraState);
}

/// A unit of generative visual output occupying one slot.
///
/// Capabilities are opt-in: a variant overrides the accessor for each
/// parameter it understands and leaves the others returning `None`.
pub trait AnimationLayer {
    fn kind(&self) -> LayerKind;

    fn state(&self) -> LayerState;

    /// Acquire resources, subscribe to events and register the first frame.
    fn init(&mut self, ctx: &mut LayerContext<'_>) -> Result<()>;

    /// Frame callback for a registration made by this layer.
    fn on_frame(&mut self, handle: FrameHandle, ctx: &mut LayerContext<'_>);

    /// Event callback for a subscription made by this layer.
    fn on_event(
        &mut self,
        _subscription: SubscriptionId,
        _event: &HostEvent,
        _ctx: &mut LayerContext<'_>,
    ) {
    }

    /// Release everything acquired in `init`. Idempotent, and safe after a
    /// partial `init`.
    fn destroy(&mut self, ctx: &mut LayerContext<'_>);

    fn density_control(&mut self) -> Option<&mut dyn DensityControl> {
        None
    }

    fn speed_control(&mut self) -> Option<&mut dyn SpeedControl> {
        None
    }

    fn intensity_control(&mut self) -> Option<&mut dyn IntensityControl> {
        None
    }

    fn camera_control(&mut self) -> Option<&mut dyn CameraControl> {
        None
    }

    /// Whether this layer accepts the given parameter.
    fn supports(&mut self, capability: Capability) -> bool {
        match capability {
            Capability::Density => self.density_control().is_some(),
            Capability::Speed => self.speed_control().is_some(),
            Capability::Intensity => self.intensity_control().is_some(),
        }
    }
}

/// Push every supported field of `snapshot` into `layer`. Fields the layer
/// has no capability for are ignored.
pub fn apply_snapshot(layer: &mut dyn AnimationLayer, snapshot: &ParameterSnapshot) {
    if let Some(control) = layer.density_control() {
        control.set_particle_density(snapshot.particle_density);
    }
    if let Some(control) = layer.speed_control() {
        control.set_animation_speed(snapshot.animation_speed);
    }
    if let Some(control) = layer.intensity_control() {
        control.set_physics_intensity(snapshot.physics_intensity);
    }
}

/// Self-rescheduling frame loop with a cancellation token.
///
/// The token is checked before every re-registration, so no frame runs
/// after `cancel`.
#[derive(Debug, Default)]
pub struct FrameLoop {
    pending: Option<FrameHandle>,
    cancelled: bool,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the first frame.
    pub fn start(&mut self, scheduler: &mut FrameScheduler, slot: Slot) {
        self.cancelled = false;
        if self.pending.is_none() {
            self.pending = Some(scheduler.request(slot));
        }
    }

    /// Accept a fired registration. Returns false for stale or foreign
    /// handles, or after cancellation.
    pub fn begin(&mut self, handle: FrameHandle) -> bool {
        if self.cancelled || self.pending != Some(handle) {
            return false;
        }
        self.pending = None;
        true
    }

    /// Register the next frame unless cancelled.
    pub fn reschedule(&mut self, scheduler: &mut FrameScheduler, slot: Slot) {
        if self.cancelled || self.pending.is_some() {
            return;
        }
        self.pending = Some(scheduler.request(slot));
    }

    /// Cancel the pending registration. Idempotent.
    pub fn cancel(&mut self, scheduler: &mut FrameScheduler) {
        self.cancelled = true;
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }
}

/// Event subscriptions owned by one layer, released with the same tokens
/// they were registered with.
#[derive(Debug, Default)]
pub struct Subscriptions {
    ids: Vec<SubscriptionId>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        events: &mut EventBus,
        slot: Slot,
        kind: EventKind,
    ) -> SubscriptionId {
        let id = events.subscribe(slot, kind);
        self.ids.push(id);
        id
    }

    /// Whether `id` was registered through this set.
    pub fn owns(&self, id: SubscriptionId) -> bool {
        self.ids.contains(&id)
    }

    /// Unsubscribe everything. Idempotent.
    pub fn release(&mut self, events: &mut EventBus) {
        for id in self.ids.drain(..) {
            events.unsubscribe(id);
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
