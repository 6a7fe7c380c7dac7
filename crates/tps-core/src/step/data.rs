use serde::{Deserialize, Serialize};

use crate::constants::SEED_STEP_NUMBER;

/// Handle opaco a datos pesados externos (p. ej. archivos de trayectoria).
/// El core nunca interpreta su contenido, sólo lo reenvía.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef(pub String);

impl ArtifactRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Resultado de un trial MC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub chain_index: usize,
    /// 1-indexado para steps propuestos; 0 es el seed.
    pub step_number: u64,
    /// Tipo de move que lo produjo (None para el seed).
    pub mover_kind: Option<String>,
    pub acceptance_probability: f64,
    pub accepted: bool,
    pub weight: f64,
    /// Conteos por estado alcanzado (resultado del shot).
    pub states_reached: Option<Vec<f64>>,
    pub predicted_values: Option<Vec<f64>>,
    /// Descriptores del shooting point (entrada del modelo predictivo).
    pub descriptors: Option<Vec<f64>>,
    pub artifact: Option<ArtifactRef>,
}

impl Step {
    /// Step 0 de una cadena: siempre aceptado, sin mover.
    pub fn seed(chain_index: usize, artifact: Option<ArtifactRef>, states_reached: Option<Vec<f64>>) -> Self {
        Self { chain_index,
               step_number: SEED_STEP_NUMBER,
               mover_kind: None,
               acceptance_probability: 1.0,
               accepted: true,
               weight: 1.0,
               states_reached,
               predicted_values: None,
               descriptors: None,
               artifact }
    }

    pub fn is_seed(&self) -> bool {
        self.step_number == SEED_STEP_NUMBER
    }
}
