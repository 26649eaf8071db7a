//! Slot ownership, layer switching and parameter propagation.

use std::time::Duration;

use aether_core::{CameraState, EngineSet, LayerKind, ParameterSnapshot, Slot};
use tracing::{debug, error, info, trace, warn};

use crate::error::{LayerError, Result};
use crate::host::{Host, HostEvent};
use crate::layer::{AnimationLayer, LayerContext, LayerState, apply_snapshot};
use crate::settings::{Settings, SettingsBridge, SettingsChange};
use crate::surface::{Surface, SurfaceSize};

/// Constructs layer instances on demand.
pub trait LayerFactory {
    fn create(
        &mut self,
        kind: LayerKind,
        slot: Slot,
        engines: EngineSet,
    ) -> Result<Box<dyn AnimationLayer>>;
}

/// Startup behavior of the manager.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManagerConfig {
    /// Foreground kind used when no settings arrive in time.
    pub fallback_foreground: LayerKind,
    /// Background kind used when no settings arrive in time.
    pub fallback_background: LayerKind,
    /// How long to wait for the settings snapshot before falling back.
    pub startup_wait: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            fallback_foreground: LayerKind::Particles,
            fallback_background: LayerKind::Starfield,
            startup_wait: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Startup {
    Idle,
    Waiting { deadline: Duration },
    Ready,
}

struct SlotState<S> {
    surface: Option<S>,
    layer: Option<Box<dyn AnimationLayer>>,
    kind: LayerKind,
}

impl<S> SlotState<S> {
    fn new(surface: Option<S>) -> Self {
        Self {
            surface,
            layer: None,
            kind: LayerKind::None,
        }
    }
}

/// Owns at most one running layer per slot.
pub struct AnimationLifecycleManager<S: Surface, F: LayerFactory> {
    host: Host,
    slots: [SlotState<S>; 2],
    factory: F,
    config: ManagerConfig,
    snapshot: Option<ParameterSnapshot>,
    startup: Startup,
    now: Duration,
}

fn layer_context<'a, S: Surface>(
    host: &'a mut Host,
    surface: &'a mut S,
    slot: Slot,
    now: Duration,
) -> LayerContext<'a> {
    LayerContext {
        slot,
        now,
        scheduler: &mut host.scheduler,
        events: &mut host.events,
        input: &host.input,
        engines: host.engines,
        surface,
    }
}

impl<S: Surface, F: LayerFactory> AnimationLifecycleManager<S, F> {
    /// Create a manager. A missing surface disables its slot for the
    /// lifetime of the manager; the other slot is unaffected.
    pub fn new(
        host: Host,
        foreground: Option<S>,
        background: Option<S>,
        factory: F,
        config: ManagerConfig,
    ) -> Self {
        let mut slots = [SlotState::new(foreground), SlotState::new(background)];
        for slot in Slot::ALL {
            match slots[slot.index()].surface.as_mut() {
                Some(surface) => surface.set_visible(false),
                None => error!(%slot, "drawing surface not found; slot disabled"),
            }
        }

        Self {
            host,
            slots,
            factory,
            config,
            snapshot: None,
            startup: Startup::Idle,
            now: Duration::ZERO,
        }
    }

    /// Begin waiting for the initial settings snapshot.
    pub fn start(&mut self, now: Duration) {
        self.now = now;
        self.startup = Startup::Waiting {
            deadline: now + self.config.startup_wait,
        };
        debug!(wait_ms = self.config.startup_wait.as_millis() as u64, "waiting for settings");
    }

    /// Whether the manager is still waiting for its initial settings.
    pub fn is_waiting(&self) -> bool {
        matches!(self.startup, Startup::Waiting { .. })
    }

    /// Replace the occupant of `slot` with a new layer of `kind`.
    ///
    /// The current occupant is destroyed before anything else happens. On
    /// failure the slot is left empty with its surface hidden.
    pub fn switch_layer(&mut self, slot: Slot, kind: LayerKind) -> Result<()> {
        let now = self.now;
        let state = &mut self.slots[slot.index()];
        let Some(surface) = state.surface.as_mut() else {
            warn!(%slot, %kind, "cannot switch layer: slot has no surface");
            return Err(LayerError::MissingSurface(slot));
        };

        if let Some(mut previous) = state.layer.take() {
            let previous_kind = previous.kind();
            previous.destroy(&mut layer_context(&mut self.host, surface, slot, now));
            info!(%slot, kind = %previous_kind, "layer destroyed");
        }
        state.kind = LayerKind::None;
        surface.set_visible(false);
        surface.clear();

        if kind == LayerKind::None {
            info!(%slot, "slot cleared");
            return Ok(());
        }

        if let Some(engine) = kind.required_engine()
            && !self.host.engines.has(engine)
        {
            let err = LayerError::MissingDependency { kind, engine };
            error!(%slot, "{err}");
            return Err(err);
        }

        let mut layer = match self.factory.create(kind, slot, self.host.engines) {
            Ok(layer) => layer,
            Err(err) => {
                error!(%slot, "{err}");
                return Err(err);
            }
        };

        let mut ctx = layer_context(&mut self.host, surface, slot, now);
        if let Err(err) = layer.init(&mut ctx) {
            layer.destroy(&mut ctx);
            ctx.surface.clear();
            error!(%slot, "{err}");
            return Err(err);
        }
        if let Some(snapshot) = &self.snapshot {
            apply_snapshot(layer.as_mut(), snapshot);
        }
        surface.set_visible(true);

        info!(%slot, %kind, "layer running");
        state.layer = Some(layer);
        state.kind = kind;
        Ok(())
    }

    /// Push a snapshot into every running layer that supports its fields.
    pub fn apply_parameters(&mut self, snapshot: ParameterSnapshot) {
        let snapshot = snapshot.sanitized();
        self.snapshot = Some(snapshot);
        debug!(?snapshot, "applying parameters");

        for state in &mut self.slots {
            if let Some(layer) = state.layer.as_mut()
                && layer.state() == LayerState::Running
            {
                apply_snapshot(layer.as_mut(), &snapshot);
            }
        }
    }

    /// Poll the settings owner. During startup this activates the initial
    /// selection, or the fallback pair once the wait has expired; after
    /// startup it applies change notifications. Returns the failures
    /// encountered, which are not retried.
    pub fn sync_settings(
        &mut self,
        bridge: &mut dyn SettingsBridge,
        now: Duration,
    ) -> Vec<LayerError> {
        self.now = now;
        let mut failures = Vec::new();

        if let Startup::Waiting { deadline } = self.startup {
            if let Some(settings) = bridge.snapshot() {
                info!(
                    foreground = %settings.foreground,
                    background = %settings.background,
                    "loading initial layers from settings"
                );
                // The snapshot already reflects anything queued so far.
                bridge.take_changes();
                self.startup = Startup::Ready;
                failures.extend(self.activate(settings));
                return failures;
            }
            if now < deadline {
                return failures;
            }

            warn!("settings not available in time; using fallback layers");
            self.startup = Startup::Ready;
            let fallback = Settings {
                parameters: self.snapshot.unwrap_or_default(),
                foreground: self.config.fallback_foreground,
                background: self.config.fallback_background,
            };
            failures.extend(self.activate(fallback));
            return failures;
        }

        for change in bridge.take_changes() {
            match change {
                SettingsChange::Parameters(snapshot) => self.apply_parameters(snapshot),
                SettingsChange::Layer { slot, kind } => {
                    if let Err(err) = self.switch_layer(slot, kind) {
                        failures.push(err);
                    }
                }
            }
        }
        failures
    }

    fn activate(&mut self, settings: Settings) -> Vec<LayerError> {
        self.apply_parameters(settings.parameters);
        [Slot::Foreground, Slot::Background]
            .into_iter()
            .filter_map(|slot| self.switch_layer(slot, settings.kind(slot)).err())
            .collect()
    }

    /// Run every frame registration that is due.
    pub fn tick(&mut self, now: Duration) {
        self.now = now;
        for (handle, slot) in self.host.scheduler.take_due() {
            let state = &mut self.slots[slot.index()];
            if let (Some(layer), Some(surface)) = (state.layer.as_mut(), state.surface.as_mut()) {
                layer.on_frame(handle, &mut layer_context(&mut self.host, surface, slot, now));
            } else {
                trace!(%slot, "dropping frame for empty slot");
            }
        }
    }

    /// Record input in the host state and deliver it to subscribers.
    pub fn dispatch(&mut self, event: HostEvent) {
        self.host.input.record(&event);

        let now = self.now;
        for (id, slot) in self.host.events.listeners(event.kind()) {
            let state = &mut self.slots[slot.index()];
            if let (Some(layer), Some(surface)) = (state.layer.as_mut(), state.surface.as_mut()) {
                layer.on_event(id, &event, &mut layer_context(&mut self.host, surface, slot, now));
            }
        }
    }

    /// Resize both surfaces and notify subscribed layers.
    pub fn resize(&mut self, size: SurfaceSize) {
        for state in &mut self.slots {
            if let Some(surface) = state.surface.as_mut() {
                surface.resize(size);
            }
        }
        self.dispatch(HostEvent::Resized(size));
    }

    /// Destroy both layers and hide both surfaces.
    pub fn shutdown(&mut self) {
        let now = self.now;
        for slot in Slot::ALL {
            let state = &mut self.slots[slot.index()];
            let Some(surface) = state.surface.as_mut() else {
                continue;
            };
            if let Some(mut layer) = state.layer.take() {
                layer.destroy(&mut layer_context(&mut self.host, surface, slot, now));
                info!(%slot, kind = %layer.kind(), "layer destroyed on shutdown");
            }
            state.kind = LayerKind::None;
            surface.set_visible(false);
        }
    }

    /// Kind currently running in `slot`.
    pub fn active_kind(&self, slot: Slot) -> LayerKind {
        self.slots[slot.index()].kind
    }

    pub fn surface(&self, slot: Slot) -> Option<&S> {
        self.slots[slot.index()].surface.as_ref()
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Last applied snapshot.
    pub fn snapshot(&self) -> Option<ParameterSnapshot> {
        self.snapshot
    }

    /// Pose of the first running layer with a camera, foreground first.
    pub fn camera_state(&mut self) -> Option<CameraState> {
        Slot::ALL.into_iter().rev().find_map(|slot| {
            let layer = self.slots[slot.index()].layer.as_mut()?;
            layer.camera_control().map(|camera| camera.camera_state())
        })
    }

    /// Move the first camera found to `state`. Returns false when no running
    /// layer has one.
    pub fn restore_camera(&mut self, state: CameraState) -> bool {
        for slot in Slot::ALL.into_iter().rev() {
            let Some(layer) = self.slots[slot.index()].layer.as_mut() else {
                continue;
            };
            if let Some(camera) = layer.camera_control() {
                camera.set_camera_state(state);
                debug!(%slot, "camera restored");
                return true;
            }
        }
        false
    }
}

impl<S: Surface, F: LayerFactory> Drop for AnimationLifecycleManager<S, F> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use aether_core::Engine;

    use super::*;
    use crate::host::{EventKind, FrameHandle, SubscriptionId};
    use crate::layer::{CameraControl, DensityControl, FrameLoop, SpeedControl, Subscriptions};
    use crate::surface::RecordingSurface;

    type Log = Rc<RefCell<Vec<String>>>;

    struct MockLayer {
        kind: LayerKind,
        state: LayerState,
        fail_init: bool,
        frames: FrameLoop,
        subscriptions: Subscriptions,
        camera: CameraState,
        log: Log,
    }

    impl MockLayer {
        fn record(&self, entry: String) {
            self.log.borrow_mut().push(entry);
        }
    }

    impl DensityControl for MockLayer {
        fn set_particle_density(&mut self, level: u8) {
            self.record(format!("density {} {level}", self.kind));
        }
    }

    impl SpeedControl for MockLayer {
        fn set_animation_speed(&mut self, level: u8) {
            self.record(format!("speed {} {level}", self.kind));
        }
    }

    impl CameraControl for MockLayer {
        fn camera_state(&self) -> CameraState {
            self.camera
        }

        fn set_camera_state(&mut self, state: CameraState) {
            self.camera = state;
        }
    }

    impl AnimationLayer for MockLayer {
        fn kind(&self) -> LayerKind {
            self.kind
        }

        fn state(&self) -> LayerState {
            self.state
        }

        fn init(&mut self, ctx: &mut LayerContext<'_>) -> Result<()> {
            self.record(format!("init {} {}", ctx.slot, self.kind));
            // What the host still holds for this slot before we register.
            self.record(format!(
                "inherited {} listeners={} frames={}",
                ctx.slot,
                ctx.events.count_for(ctx.slot),
                ctx.scheduler.pending_for(ctx.slot)
            ));
            self.subscriptions
                .subscribe(ctx.events, ctx.slot, EventKind::Resize);
            self.subscriptions
                .subscribe(ctx.events, ctx.slot, EventKind::PointerMove);
            if self.fail_init {
                return Err(LayerError::InitFailed {
                    kind: self.kind,
                    reason: "mock failure".into(),
                });
            }
            self.frames.start(ctx.scheduler, ctx.slot);
            self.state = LayerState::Running;
            Ok(())
        }

        fn on_frame(&mut self, handle: FrameHandle, ctx: &mut LayerContext<'_>) {
            if !self.frames.begin(handle) {
                return;
            }
            self.record(format!("frame {} {}", ctx.slot, self.kind));
            self.frames.reschedule(ctx.scheduler, ctx.slot);
        }

        fn on_event(
            &mut self,
            subscription: SubscriptionId,
            event: &HostEvent,
            _ctx: &mut LayerContext<'_>,
        ) {
            if self.subscriptions.owns(subscription) {
                self.record(format!("event {} {:?}", self.kind, event.kind()));
            }
        }

        fn destroy(&mut self, ctx: &mut LayerContext<'_>) {
            self.frames.cancel(ctx.scheduler);
            self.subscriptions.release(ctx.events);
            if self.state != LayerState::Destroyed {
                self.record(format!("destroy {} {}", ctx.slot, self.kind));
            }
            self.state = LayerState::Destroyed;
        }

        fn density_control(&mut self) -> Option<&mut dyn DensityControl> {
            if self.kind == LayerKind::Particles {
                Some(self)
            } else {
                None
            }
        }

        fn speed_control(&mut self) -> Option<&mut dyn SpeedControl> {
            Some(self)
        }

        fn camera_control(&mut self) -> Option<&mut dyn CameraControl> {
            if self.kind == LayerKind::Orbital {
                Some(self)
            } else {
                None
            }
        }
    }

    struct MockFactory {
        log: Log,
        fail_init: Option<LayerKind>,
    }

    impl LayerFactory for MockFactory {
        fn create(
            &mut self,
            kind: LayerKind,
            slot: Slot,
            _engines: EngineSet,
        ) -> Result<Box<dyn AnimationLayer>> {
            self.log.borrow_mut().push(format!("create {slot} {kind}"));
            Ok(Box::new(MockLayer {
                kind,
                state: LayerState::Uninitialized,
                fail_init: self.fail_init == Some(kind),
                frames: FrameLoop::new(),
                subscriptions: Subscriptions::new(),
                camera: CameraState::default(),
                log: self.log.clone(),
            }))
        }
    }

    #[derive(Default)]
    struct MockBridge {
        settings: Option<Settings>,
        changes: Vec<SettingsChange>,
    }

    impl SettingsBridge for MockBridge {
        fn snapshot(&self) -> Option<Settings> {
            self.settings
        }

        fn take_changes(&mut self) -> Vec<SettingsChange> {
            std::mem::take(&mut self.changes)
        }
    }

    type TestManager = AnimationLifecycleManager<RecordingSurface, MockFactory>;

    fn manager_with(engines: EngineSet, fail_init: Option<LayerKind>) -> (TestManager, Log) {
        let log: Log = Rc::default();
        let size = SurfaceSize::new(800.0, 600.0);
        let manager = AnimationLifecycleManager::new(
            Host::new(engines, size),
            Some(RecordingSurface::new(size)),
            Some(RecordingSurface::new(size)),
            MockFactory {
                log: log.clone(),
                fail_init,
            },
            ManagerConfig::default(),
        );
        (manager, log)
    }

    fn position(log: &Log, entry: &str) -> usize {
        log.borrow()
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("missing log entry {entry:?}"))
    }

    #[test]
    fn test_switch_destroys_before_construct() {
        let (mut manager, log) = manager_with(EngineSet::ALL, None);
        manager
            .switch_layer(Slot::Foreground, LayerKind::Particles)
            .unwrap();
        manager
            .switch_layer(Slot::Foreground, LayerKind::MatrixRain)
            .unwrap();

        let destroyed = position(&log, "destroy foreground particles");
        let created = position(&log, "create foreground matrix rain");
        let initialized = position(&log, "init foreground matrix rain");
        assert!(destroyed < created);
        assert!(created < initialized);
        // The replacement starts from a slot with nothing left registered.
        assert_eq!(
            log.borrow()[initialized + 1],
            "inherited foreground listeners=0 frames=0"
        );

        // Only the replacement's listeners and frame remain.
        assert_eq!(manager.host().events.count_for(Slot::Foreground), 2);
        assert_eq!(manager.host().scheduler.pending_for(Slot::Foreground), 1);
        assert_eq!(manager.active_kind(Slot::Foreground), LayerKind::MatrixRain);
        assert!(manager.surface(Slot::Foreground).unwrap().is_visible());
    }

    #[test]
    fn test_missing_dependency_leaves_slot_empty() {
        let engines = EngineSet {
            physics: false,
            scene: true,
        };
        let (mut manager, log) = manager_with(engines, None);
        manager
            .switch_layer(Slot::Foreground, LayerKind::MatrixRain)
            .unwrap();

        let err = manager
            .switch_layer(Slot::Foreground, LayerKind::Particles)
            .unwrap_err();
        assert_eq!(
            err,
            LayerError::MissingDependency {
                kind: LayerKind::Particles,
                engine: Engine::Physics,
            }
        );
        assert_eq!(manager.active_kind(Slot::Foreground), LayerKind::None);
        assert!(!manager.surface(Slot::Foreground).unwrap().is_visible());
        assert_eq!(manager.host().events.count_for(Slot::Foreground), 0);
        assert_eq!(manager.host().scheduler.pending_for(Slot::Foreground), 0);
        assert!(!log.borrow().iter().any(|e| e == "create foreground particles"));

        // The other slot is unaffected.
        manager
            .switch_layer(Slot::Background, LayerKind::Starfield)
            .unwrap();
        assert!(manager.surface(Slot::Background).unwrap().is_visible());
    }

    #[test]
    fn test_missing_surface_is_confined_to_slot() {
        let size = SurfaceSize::new(100.0, 100.0);
        let log: Log = Rc::default();
        let mut manager = AnimationLifecycleManager::new(
            Host::new(EngineSet::ALL, size),
            None,
            Some(RecordingSurface::new(size)),
            MockFactory {
                log: log.clone(),
                fail_init: None,
            },
            ManagerConfig::default(),
        );

        assert_eq!(
            manager.switch_layer(Slot::Foreground, LayerKind::NodeGrid),
            Err(LayerError::MissingSurface(Slot::Foreground))
        );
        manager
            .switch_layer(Slot::Background, LayerKind::NodeGrid)
            .unwrap();
        assert_eq!(manager.active_kind(Slot::Background), LayerKind::NodeGrid);
    }

    #[test]
    fn test_failed_init_is_cleaned_up() {
        let (mut manager, log) = manager_with(EngineSet::ALL, Some(LayerKind::NodeGrid));
        let err = manager
            .switch_layer(Slot::Background, LayerKind::NodeGrid)
            .unwrap_err();
        assert!(matches!(err, LayerError::InitFailed { .. }));

        assert!(position(&log, "init background node grid") < position(&log, "destroy background node grid"));
        assert_eq!(manager.host().events.count_for(Slot::Background), 0);
        assert_eq!(manager.host().scheduler.pending(), 0);
        assert!(!manager.surface(Slot::Background).unwrap().is_visible());
        assert_eq!(manager.active_kind(Slot::Background), LayerKind::None);
    }

    #[test]
    fn test_parameters_follow_capabilities() {
        let (mut manager, log) = manager_with(EngineSet::ALL, None);
        manager
            .switch_layer(Slot::Foreground, LayerKind::Particles)
            .unwrap();
        manager
            .switch_layer(Slot::Background, LayerKind::Starfield)
            .unwrap();
        log.borrow_mut().clear();

        manager.apply_parameters(ParameterSnapshot::new(10, 20, 30));
        let entries = log.borrow().clone();
        assert!(entries.contains(&"density particles 10".to_string()));
        assert!(entries.contains(&"speed particles 20".to_string()));
        assert!(entries.contains(&"speed starfield 20".to_string()));
        assert!(!entries.iter().any(|e| e.starts_with("density starfield")));
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_new_layer_receives_current_snapshot() {
        let (mut manager, log) = manager_with(EngineSet::ALL, None);
        manager.apply_parameters(ParameterSnapshot::new(70, 40, 50));
        manager
            .switch_layer(Slot::Foreground, LayerKind::Particles)
            .unwrap();
        assert!(position(&log, "init foreground particles") < position(&log, "density particles 70"));
    }

    #[test]
    fn test_tick_runs_each_layer_once_per_frame() {
        let (mut manager, log) = manager_with(EngineSet::ALL, None);
        manager
            .switch_layer(Slot::Foreground, LayerKind::NodeGrid)
            .unwrap();
        manager.tick(Duration::from_millis(16));
        manager.tick(Duration::from_millis(32));

        let frames = log
            .borrow()
            .iter()
            .filter(|e| *e == "frame foreground node grid")
            .count();
        assert_eq!(frames, 2);
        assert_eq!(manager.host().scheduler.pending(), 1);
    }

    #[test]
    fn test_startup_uses_settings_snapshot() {
        let (mut manager, _log) = manager_with(EngineSet::ALL, None);
        let mut bridge = MockBridge {
            settings: Some(Settings {
                parameters: ParameterSnapshot::new(20, 30, 40),
                foreground: LayerKind::MatrixRain,
                background: LayerKind::Orbital,
            }),
            changes: Vec::new(),
        };

        manager.start(Duration::ZERO);
        assert!(manager.is_waiting());
        let failures = manager.sync_settings(&mut bridge, Duration::from_millis(5));
        assert!(failures.is_empty());
        assert!(!manager.is_waiting());
        assert_eq!(manager.active_kind(Slot::Foreground), LayerKind::MatrixRain);
        assert_eq!(manager.active_kind(Slot::Background), LayerKind::Orbital);
        assert_eq!(manager.snapshot(), Some(ParameterSnapshot::new(20, 30, 40)));
    }

    #[test]
    fn test_startup_falls_back_after_wait() {
        let (mut manager, _log) = manager_with(EngineSet::ALL, None);
        let mut bridge = MockBridge::default();

        manager.start(Duration::ZERO);
        manager.sync_settings(&mut bridge, Duration::from_millis(50));
        assert_eq!(manager.active_kind(Slot::Foreground), LayerKind::None);

        manager.sync_settings(&mut bridge, Duration::from_millis(100));
        assert_eq!(manager.active_kind(Slot::Foreground), LayerKind::Particles);
        assert_eq!(manager.active_kind(Slot::Background), LayerKind::Starfield);

        // A late snapshot does not replace the fallback by itself.
        bridge.settings = Some(Settings {
            parameters: ParameterSnapshot::default(),
            foreground: LayerKind::NodeGrid,
            background: LayerKind::None,
        });
        manager.sync_settings(&mut bridge, Duration::from_millis(200));
        assert_eq!(manager.active_kind(Slot::Foreground), LayerKind::Particles);

        // Explicit change notifications still apply.
        bridge.changes.push(SettingsChange::Layer {
            slot: Slot::Foreground,
            kind: LayerKind::NodeGrid,
        });
        manager.sync_settings(&mut bridge, Duration::from_millis(300));
        assert_eq!(manager.active_kind(Slot::Foreground), LayerKind::NodeGrid);
    }

    #[test]
    fn test_failed_switch_is_reported_not_retried() {
        let engines = EngineSet {
            physics: true,
            scene: false,
        };
        let (mut manager, log) = manager_with(engines, None);
        let mut bridge = MockBridge::default();
        manager.start(Duration::ZERO);
        let failures = manager.sync_settings(&mut bridge, Duration::from_millis(150));
        assert_eq!(failures.len(), 1);
        assert_eq!(manager.active_kind(Slot::Foreground), LayerKind::Particles);
        assert_eq!(manager.active_kind(Slot::Background), LayerKind::None);

        let creates = log.borrow().iter().filter(|e| e.starts_with("create")).count();
        manager.sync_settings(&mut bridge, Duration::from_millis(300));
        manager.tick(Duration::from_millis(316));
        let creates_after = log.borrow().iter().filter(|e| e.starts_with("create")).count();
        assert_eq!(creates, creates_after);
    }

    #[test]
    fn test_dispatch_updates_input_and_delivers() {
        let (mut manager, log) = manager_with(EngineSet::ALL, None);
        manager
            .switch_layer(Slot::Foreground, LayerKind::NodeGrid)
            .unwrap();

        manager.dispatch(HostEvent::PointerMoved(glam::Vec2::new(3.0, 4.0)));
        assert_eq!(manager.host().input.pointer, Some(glam::Vec2::new(3.0, 4.0)));
        assert!(log.borrow().iter().any(|e| e == "event node grid PointerMove"));

        manager.dispatch(HostEvent::PointerLeft);
        assert_eq!(manager.host().input.pointer, None);

        manager.resize(SurfaceSize::new(320.0, 200.0));
        assert_eq!(manager.host().input.viewport, SurfaceSize::new(320.0, 200.0));
        assert_eq!(
            manager.surface(Slot::Background).unwrap().size(),
            SurfaceSize::new(320.0, 200.0)
        );
        assert!(log.borrow().iter().any(|e| e == "event node grid Resize"));
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let (mut manager, _log) = manager_with(EngineSet::ALL, None);
        manager
            .switch_layer(Slot::Foreground, LayerKind::Particles)
            .unwrap();
        manager
            .switch_layer(Slot::Background, LayerKind::NodeGrid)
            .unwrap();

        manager.shutdown();
        manager.shutdown();
        assert!(manager.host().events.is_empty());
        assert_eq!(manager.host().scheduler.pending(), 0);
        for slot in Slot::ALL {
            assert_eq!(manager.active_kind(slot), LayerKind::None);
            assert!(!manager.surface(slot).unwrap().is_visible());
        }
    }

    #[test]
    fn test_camera_found_in_either_slot() {
        let (mut manager, _log) = manager_with(EngineSet::ALL, None);
        manager
            .switch_layer(Slot::Foreground, LayerKind::Particles)
            .unwrap();
        assert_eq!(manager.camera_state(), None);
        assert!(!manager.restore_camera(CameraState::default()));

        manager
            .switch_layer(Slot::Background, LayerKind::Orbital)
            .unwrap();
        let pose = CameraState {
            position: [0.0, 2.0, 9.0],
            target: [1.0, 0.0, 0.0],
        };
        assert!(manager.restore_camera(pose));
        assert_eq!(manager.camera_state(), Some(pose));
    }
}
