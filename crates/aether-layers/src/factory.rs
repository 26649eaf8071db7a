//! Construction of layers by kind.

use aether_core::{EngineSet, LayerKind, Slot};
use aether_runtime::{AnimationLayer, LayerError, LayerFactory, Result};
use tracing::debug;

use crate::animations::grid::InteractiveNodeGrid;
use crate::animations::matrix::DigitalRainField;
#[cfg(feature = "scene")]
use crate::animations::orbital::OrbitalSystemRenderer;
#[cfg(feature = "physics")]
use crate::animations::particles::PhysicsParticleField;
#[cfg(feature = "scene")]
use crate::animations::starfield::StarfieldRenderer;

/// Engines compiled into this build.
pub fn compiled_engines() -> EngineSet {
    EngineSet {
        physics: cfg!(feature = "physics"),
        scene: cfg!(feature = "scene"),
    }
}

/// Builds every variant this crate was compiled with.
#[derive(Default)]
pub struct DefaultLayerFactory {
    seed_source: Option<fastrand::Rng>,
}

impl DefaultLayerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose layers draw from a reproducible random sequence.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed_source: Some(fastrand::Rng::with_seed(seed)),
        }
    }

    fn rng(&mut self) -> fastrand::Rng {
        match self.seed_source.as_mut() {
            Some(source) => source.fork(),
            None => fastrand::Rng::new(),
        }
    }
}

impl LayerFactory for DefaultLayerFactory {
    fn create(
        &mut self,
        kind: LayerKind,
        slot: Slot,
        engines: EngineSet,
    ) -> Result<Box<dyn AnimationLayer>> {
        let available = engines.intersect(compiled_engines());
        if let Some(engine) = kind.required_engine()
            && !available.has(engine)
        {
            return Err(LayerError::MissingDependency { kind, engine });
        }

        debug!(%slot, %kind, "creating layer");
        let rng = self.rng();
        let layer: Box<dyn AnimationLayer> = match kind {
            LayerKind::MatrixRain => Box::new(DigitalRainField::with_rng(rng)),
            LayerKind::NodeGrid => Box::new(InteractiveNodeGrid::with_rng(rng)),
            #[cfg(feature = "physics")]
            LayerKind::Particles => Box::new(PhysicsParticleField::with_rng(rng)),
            #[cfg(feature = "scene")]
            LayerKind::Starfield => Box::new(StarfieldRenderer::with_rng(rng)),
            #[cfg(feature = "scene")]
            LayerKind::Orbital => Box::new(OrbitalSystemRenderer::with_rng(rng)),
            #[allow(unreachable_patterns)]
            other => {
                return Err(LayerError::InitFailed {
                    kind: other,
                    reason: "no layer for this kind".into(),
                });
            }
        };
        Ok(layer)
    }
}
