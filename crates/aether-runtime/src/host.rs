//! Host services shared by running layers: frame scheduling, event
//! subscriptions, read-only input state and engine availability.

use std::collections::BTreeMap;

use aether_core::{EngineSet, Slot};
use glam::Vec2;

use crate::surface::SurfaceSize;

/// Token for one pending frame registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

/// Per-frame callback registry.
///
/// A registration fires once. Layers re-register at the end of every frame
/// callback, so a layer that stops re-registering stops running.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_id: u64,
    pending: BTreeMap<FrameHandle, Slot>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a frame callback for the layer in `slot`.
    pub fn request(&mut self, slot: Slot) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending.insert(handle, slot);
        handle
    }

    /// Cancel a pending registration. Returns false if it already fired or
    /// was cancelled before.
    pub fn cancel(&mut self, handle: FrameHandle) -> bool {
        self.pending.remove(&handle).is_some()
    }

    /// Drain the registrations that are due now, oldest first.
    pub fn take_due(&mut self) -> Vec<(FrameHandle, Slot)> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    /// Number of pending registrations.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of pending registrations for one slot.
    pub fn pending_for(&self, slot: Slot) -> usize {
        self.pending.values().filter(|s| **s == slot).count()
    }
}

/// The kinds of host events a layer can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerMove,
    PointerLeave,
    /// Primary button pressed or released.
    PointerButton,
    Resize,
}

/// Raw input delivered to subscribed layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    /// Pointer moved to a position in surface pixels.
    PointerMoved(Vec2),
    /// Pointer left the surface.
    PointerLeft,
    /// Primary button went down at a position in surface pixels.
    PointerPressed(Vec2),
    /// Primary button went up.
    PointerReleased,
    /// The viewport changed size.
    Resized(SurfaceSize),
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::PointerMoved(_) => EventKind::PointerMove,
            HostEvent::PointerLeft => EventKind::PointerLeave,
            HostEvent::PointerPressed(_) | HostEvent::PointerReleased => EventKind::PointerButton,
            HostEvent::Resized(_) => EventKind::Resize,
        }
    }
}

/// Token identifying one event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy)]
struct Subscription {
    slot: Slot,
    kind: EventKind,
}

/// Event subscription registry. Unsubscribing requires the exact token
/// returned by [`EventBus::subscribe`].
#[derive(Debug, Default)]
pub struct EventBus {
    next_id: u64,
    subscriptions: BTreeMap<SubscriptionId, Subscription>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, slot: Slot, kind: EventKind) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.insert(id, Subscription { slot, kind });
        id
    }

    /// Remove a subscription. Returns false for unknown tokens.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Subscriptions listening for `kind`, in registration order.
    pub fn listeners(&self, kind: EventKind) -> Vec<(SubscriptionId, Slot)> {
        self.subscriptions
            .iter()
            .filter(|(_, sub)| sub.kind == kind)
            .map(|(id, sub)| (*id, sub.slot))
            .collect()
    }

    /// Total live subscriptions.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Live subscriptions owned by one slot.
    pub fn count_for(&self, slot: Slot) -> usize {
        self.subscriptions
            .values()
            .filter(|sub| sub.slot == slot)
            .count()
    }
}

/// Latest pointer and viewport state. Written by the input router, read
/// by layers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub pointer: Option<Vec2>,
    /// Whether the primary button is held.
    pub pressed: bool,
    pub viewport: SurfaceSize,
}

impl InputState {
    /// Fold an event into the input state.
    pub fn record(&mut self, event: &HostEvent) {
        match *event {
            HostEvent::PointerMoved(position) => self.pointer = Some(position),
            HostEvent::PointerLeft => {
                self.pointer = None;
                self.pressed = false;
            }
            HostEvent::PointerPressed(position) => {
                self.pointer = Some(position);
                self.pressed = true;
            }
            HostEvent::PointerReleased => self.pressed = false,
            HostEvent::Resized(size) => self.viewport = size,
        }
    }
}

/// Host context owned by the lifecycle manager.
#[derive(Debug, Default)]
pub struct Host {
    pub scheduler: FrameScheduler,
    pub events: EventBus,
    pub input: InputState,
    pub engines: EngineSet,
}

impl Host {
    pub fn new(engines: EngineSet, viewport: SurfaceSize) -> Self {
        Self {
            scheduler: FrameScheduler::new(),
            events: EventBus::new(),
            input: InputState {
                pointer: None,
                pressed: false,
                viewport,
            },
            engines,
        }
    }
}
