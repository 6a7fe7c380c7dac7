//! Brain: orquestador de nivel superior.
//!
//! Provee el `Brain` (dueño de los samplers y del pipeline), su builder y los
//! tipos de control del run (`RunTarget`, `RunSummary`).

pub mod builder;
pub mod orchestrator;
pub mod summary;

pub use builder::BrainBuilder;
pub use orchestrator::Brain;
pub use summary::{HaltedChain, RunSummary, RunTarget, Termination};

use serde::{Deserialize, Serialize};

use crate::pipeline::GatingPolicy;
use crate::step::ArtifactRef;

/// Contadores globales. Sólo se modifican en el punto de coordinación donde
/// el `Brain` procesa un step terminado.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrainCounters {
    /// `g`: se incrementa una vez por step terminado, antes del pipeline.
    pub global_step: u64,
    /// Steps comprometidos (sin seeds).
    pub total_steps: u64,
    pub total_accepts: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BrainConfig {
    pub gating: GatingPolicy,
    /// La cadena `i` usa `base_seed + i` para su regla de aceptación.
    pub base_seed: u64,
}

/// Transición inicial de una cadena (se instala como step 0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialPath {
    pub artifact: Option<ArtifactRef>,
    pub states_reached: Option<Vec<f64>>,
}

impl InitialPath {
    pub fn new(artifact: Option<ArtifactRef>, states_reached: Option<Vec<f64>>) -> Self {
        Self { artifact,
               states_reached }
    }
}
