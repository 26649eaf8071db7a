//! Headless harness for driving a layer outside the manager.

use std::time::Duration;

use aether_core::{EngineSet, Slot};
use aether_runtime::{AnimationLayer, Host, HostEvent, LayerContext, RecordingSurface, SurfaceSize};

pub(crate) const FRAME: Duration = Duration::from_millis(16);

pub(crate) struct Harness {
    pub host: Host,
    pub surface: RecordingSurface,
    pub now: Duration,
}

impl Harness {
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_engines(EngineSet::ALL, width, height)
    }

    pub fn with_engines(engines: EngineSet, width: f32, height: f32) -> Self {
        let size = SurfaceSize::new(width, height);
        Self {
            host: Host::new(engines, size),
            surface: RecordingSurface::new(size),
            now: Duration::ZERO,
        }
    }

    pub fn ctx(&mut self) -> LayerContext<'_> {
        LayerContext {
            slot: Slot::Foreground,
            now: self.now,
            scheduler: &mut self.host.scheduler,
            events: &mut self.host.events,
            input: &self.host.input,
            engines: self.host.engines,
            surface: &mut self.surface,
        }
    }

    /// Advance the clock one frame and run every due registration.
    pub fn frame(&mut self, layer: &mut dyn AnimationLayer) {
        self.now += FRAME;
        for (handle, _) in self.host.scheduler.take_due() {
            layer.on_frame(handle, &mut self.ctx());
        }
    }

    pub fn frames(&mut self, layer: &mut dyn AnimationLayer, count: usize) {
        for _ in 0..count {
            self.frame(layer);
        }
    }

    /// Deliver an event the way the manager does.
    pub fn send(&mut self, layer: &mut dyn AnimationLayer, event: HostEvent) {
        self.host.input.record(&event);
        if let HostEvent::Resized(size) = event {
            aether_runtime::Surface::resize(&mut self.surface, size);
        }
        for (id, _) in self.host.events.listeners(event.kind()) {
            layer.on_event(id, &event, &mut self.ctx());
        }
    }

    /// Whether the layer left nothing registered behind.
    pub fn is_released(&self) -> bool {
        self.host.scheduler.pending() == 0 && self.host.events.is_empty()
    }
}
