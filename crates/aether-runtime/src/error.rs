//! Errors raised while switching or constructing layers.

use aether_core::{Engine, LayerKind, Slot};
use thiserror::Error;

/// Failure to bring a layer into a slot. Always confined to one slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    /// A required external engine is absent.
    #[error("{kind} requires the {engine} engine, which is not available")]
    MissingDependency { kind: LayerKind, engine: Engine },

    /// The slot has no drawing surface.
    #[error("no drawing surface for the {0} slot")]
    MissingSurface(Slot),

    /// `init()` failed part way through.
    #[error("{kind} failed to initialize: {reason}")]
    InitFailed { kind: LayerKind, reason: String },
}

pub type Result<T, E = LayerError> = std::result::Result<T, E>;
