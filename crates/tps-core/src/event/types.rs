//! Tipos de evento del journal y estructura `RunEvent`.
//!
//! El journal es append-only y local al `Brain`: documenta qué pasó en cada
//! run (inicio, seeds, commits, cadenas detenidas, fin) sin participar en la
//! lógica de scheduling.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::brain::{RunTarget, Termination};
use crate::errors::ProposalFailure;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Seeds instalados (fuera de cualquier run).
    ChainsSeeded { n_chains: usize },
    RunStarted { target: RunTarget, active_chains: usize },
    /// Step procesado por el pipeline, persistido y comprometido.
    StepCommitted {
        chain_index: usize,
        step_number: u64,
        accepted: bool,
        global_step: u64,
        tasks: Vec<String>,
    },
    ChainHalted { chain_index: usize, failure: ProposalFailure },
    RunFinished { termination: Termination, steps_completed: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64, // contiguo desde 0 (orden append)
    /// None para eventos fuera de un run (seeding).
    pub run_id: Option<Uuid>,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>,
}
