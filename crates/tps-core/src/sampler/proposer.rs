use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ProposalFailure;
use crate::step::{ArtifactRef, StepRecord};

/// Lo que el sampler entrega al proposer para un trial.
#[derive(Debug, Clone)]
pub struct ProposalRequest {
    pub chain_index: usize,
    /// Número que llevará el step resultante.
    pub step_number: u64,
    /// Posición actual de la cadena (último step aceptado).
    pub current: StepRecord,
}

/// Candidato producido por el proposer. No lleva identidad de cadena ni
/// número de step: eso lo fija el sampler.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Proposal {
    /// Sobrescribe `MoveProposer::kind` cuando un proposer maneja varios
    /// tipos de move.
    #[serde(default)]
    pub mover_kind: Option<String>,
    pub acceptance_probability: f64,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub states_reached: Option<Vec<f64>>,
    #[serde(default)]
    pub predicted_values: Option<Vec<f64>>,
    #[serde(default)]
    pub descriptors: Option<Vec<f64>>,
    #[serde(default)]
    pub artifact: Option<ArtifactRef>,
}

fn default_weight() -> f64 {
    1.0
}

impl Proposal {
    pub fn with_probability(acceptance_probability: f64) -> Self {
        Self { acceptance_probability,
               weight: 1.0,
               ..Self::default() }
    }
}

/// Generador de candidatos a partir del estado de la cadena.
///
/// `propose` puede tardar arbitrariamente (espera un proceso externo) y es el
/// único punto de suspensión del sampler. Debe ser cancel-safe: si el run
/// termina, el future se descarta. Puede consultar el modelo predictivo sólo
/// en lectura.
#[async_trait]
pub trait MoveProposer: Send + Sync {
    /// `mover_kind` por defecto de los steps producidos.
    fn kind(&self) -> &str;

    async fn propose(&self, request: ProposalRequest) -> Result<Proposal, ProposalFailure>;
}
