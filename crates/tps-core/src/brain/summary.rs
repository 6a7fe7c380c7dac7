use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{FatalError, ProposalFailure};

/// Condición de parada de un run (sumada sobre todas las cadenas).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunTarget {
    Steps(u64),
    Accepts(u64),
}

impl RunTarget {
    pub fn reached(self, steps: u64, accepts: u64) -> bool {
        match self {
            RunTarget::Steps(n) => steps >= n,
            RunTarget::Accepts(n) => accepts >= n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Termination {
    TargetReached,
    /// Todas las cadenas quedaron detenidas por fallos de propuesta.
    AllChainsHalted,
    Fatal(FatalError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaltedChain {
    pub chain_index: usize,
    pub failure: ProposalFailure,
}

/// Resumen de una llamada `run_for_n_*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub target: RunTarget,
    pub steps_completed: u64,
    pub accepts_completed: u64,
    /// Steps comprometidos por cadena durante este run.
    pub steps_per_chain: Vec<u64>,
    /// Cadenas detenidas durante este run.
    pub halted: Vec<HaltedChain>,
    pub termination: Termination,
}

impl RunSummary {
    pub(crate) fn new(run_id: Uuid, target: RunTarget, n_chains: usize) -> Self {
        Self { run_id,
               target,
               steps_completed: 0,
               accepts_completed: 0,
               steps_per_chain: vec![0; n_chains],
               halted: Vec::new(),
               termination: Termination::TargetReached }
    }

    pub(crate) fn target_reached(&self) -> bool {
        self.target.reached(self.steps_completed, self.accepts_completed)
    }

    pub fn reached_target(&self) -> bool {
        matches!(self.termination, Termination::TargetReached)
    }

    pub fn fatal_error(&self) -> Option<&FatalError> {
        match &self.termination {
            Termination::Fatal(e) => Some(e),
            _ => None,
        }
    }

    /// Convierte una terminación fatal en `Err`.
    pub fn into_result(self) -> Result<Self, FatalError> {
        match self.termination {
            Termination::Fatal(e) => Err(e),
            _ => Ok(self),
        }
    }
}
