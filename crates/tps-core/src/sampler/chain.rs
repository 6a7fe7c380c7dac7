use std::future::Future;
use std::sync::Arc;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{MoveProposer, Proposal, ProposalRequest};
use crate::errors::{BrainError, ProposalFailure};
use crate::step::{Step, StepDraft, StepRecord};

/// Estado observable de una cadena.
#[derive(Debug, Clone)]
pub struct ChainState {
    pub chain_index: usize,
    /// Último `step_number` comprometido (0 tras el seed).
    pub step_number: u64,
    /// Posición actual: último step aceptado. None antes del seed.
    pub current: Option<StepRecord>,
    /// Conteos de steps propuestos (el seed no cuenta).
    pub accepted_count: u64,
    pub total_count: u64,
    /// Causa de detención, si la cadena falló.
    pub halted: Option<ProposalFailure>,
}

impl ChainState {
    fn new(chain_index: usize) -> Self {
        Self { chain_index,
               step_number: 0,
               current: None,
               accepted_count: 0,
               total_count: 0,
               halted: None }
    }

    pub fn is_seeded(&self) -> bool {
        self.current.is_some()
    }
}

pub struct ChainSampler {
    state: ChainState,
    proposer: Arc<dyn MoveProposer>,
    seed: u64,
}

impl std::fmt::Debug for ChainSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSampler")
         .field("state", &self.state)
         .field("proposer", &self.proposer.kind())
         .finish()
    }
}

impl ChainSampler {
    pub fn new(chain_index: usize, proposer: Arc<dyn MoveProposer>, seed: u64) -> Self {
        Self { state: ChainState::new(chain_index),
               proposer,
               seed }
    }

    pub fn chain_index(&self) -> usize {
        self.state.chain_index
    }

    pub fn state(&self) -> &ChainState {
        &self.state
    }

    /// Con seed y sin fallo.
    pub fn is_active(&self) -> bool {
        self.state.is_seeded() && self.state.halted.is_none()
    }

    pub(crate) fn install_seed(&mut self, record: StepRecord) -> Result<(), BrainError> {
        if self.state.is_seeded() {
            return Err(BrainError::AlreadySeeded(self.state.chain_index));
        }
        self.state.step_number = record.step_number;
        self.state.current = Some(record);
        Ok(())
    }

    /// Arma la siguiente propuesta a partir de la posición actual.
    ///
    /// El future resultante es independiente del sampler (`'static`), de modo
    /// que el `Brain` puede lanzarlo y seguir atendiendo otras cadenas. La
    /// variable uniforme de la regla de aceptación depende sólo de la semilla
    /// de la cadena y del `step_number`: ni el orden de llegada ni las
    /// propuestas abortadas al cerrar un run la alteran.
    pub fn produce_next_step(&mut self) -> Result<impl Future<Output = Result<StepDraft, ProposalFailure>> + Send + 'static, BrainError> {
        let current = self.state
                          .current
                          .clone()
                          .ok_or(BrainError::NotSeeded(self.state.chain_index))?;
        let request = ProposalRequest { chain_index: self.state.chain_index,
                                        step_number: self.state.step_number + 1,
                                        current };
        let u = uniform_for_step(self.seed, request.step_number);
        let proposer = Arc::clone(&self.proposer);
        Ok(async move {
            let chain_index = request.chain_index;
            let step_number = request.step_number;
            let proposal = proposer.propose(request).await?;
            build_draft(chain_index, step_number, proposer.kind(), proposal, u)
        })
    }

    /// Compromete un step ya procesado y persistido.
    ///
    /// Si `record.accepted` la posición avanza a `record`; si no, la cadena
    /// sigue en la misma posición. El `step_number` avanza siempre.
    pub fn commit(&mut self, record: StepRecord) {
        debug_assert_eq!(record.chain_index, self.state.chain_index);
        debug_assert_eq!(record.step_number, self.state.step_number + 1);
        self.state.step_number = record.step_number;
        self.state.total_count += 1;
        if record.accepted {
            self.state.accepted_count += 1;
            self.state.current = Some(record);
        }
        debug!("sampler:commit chain={} step={} accepted={}/{}",
               self.state.chain_index,
               self.state.step_number,
               self.state.accepted_count,
               self.state.total_count);
    }

    pub(crate) fn halt(&mut self, failure: ProposalFailure) {
        warn!("sampler:halt chain={} cause={failure}", self.state.chain_index);
        self.state.halted = Some(failure);
    }
}

/// Uniforme en `[0, 1)` fija para `(seed, step_number)`.
pub(crate) fn uniform_for_step(seed: u64, step_number: u64) -> f64 {
    let mixed = seed ^ step_number.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(mixed).gen()
}

/// Regla de aceptación: `u < min(1, p)`.
pub(crate) fn accept(acceptance_probability: f64, u: f64) -> bool {
    u < acceptance_probability.min(1.0)
}

fn build_draft(chain_index: usize,
               step_number: u64,
               default_kind: &str,
               proposal: Proposal,
               u: f64)
               -> Result<StepDraft, ProposalFailure> {
    let p = proposal.acceptance_probability;
    if !p.is_finite() || p < 0.0 {
        return Err(ProposalFailure::InvalidOutput(format!("acceptance probability {p}")));
    }
    if !proposal.weight.is_finite() || proposal.weight < 0.0 {
        return Err(ProposalFailure::InvalidOutput(format!("weight {}", proposal.weight)));
    }
    let step = Step { chain_index,
                      step_number,
                      mover_kind: Some(proposal.mover_kind.unwrap_or_else(|| default_kind.to_string())),
                      acceptance_probability: p,
                      accepted: accept(p, u),
                      weight: proposal.weight,
                      states_reached: proposal.states_reached,
                      predicted_values: proposal.predicted_values,
                      descriptors: proposal.descriptors,
                      artifact: proposal.artifact };
    Ok(StepDraft::new(step))
}
