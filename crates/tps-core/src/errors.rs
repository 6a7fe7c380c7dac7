//! Errores del núcleo.
//!
//! Taxonomía:
//! - `ProposalFailure`: el Move Proposer / Engine falló. Aísla y detiene sólo
//!   la cadena dueña; el resto sigue corriendo.
//! - `TaskError`: una task del pipeline falló. Fatal para el run en curso.
//! - `StoreError`: el Storage rechazó o no pudo completar una operación.
//!   Durante un run es fatal y nunca se reintenta en silencio.
//! - `FatalError`: causa de terminación anticipada de un run (va dentro del
//!   `RunSummary`).
//! - `BrainError`: errores de precondición devueltos como `Err` por la API del
//!   `Brain` (sin seed, intervalos inválidos, ...).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone, Serialize, Deserialize)]
pub enum ProposalFailure {
    #[error("engine crashed (exit code {exit_code:?})")]
    EngineCrashed { exit_code: Option<i32> },
    #[error("engine timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid proposal output: {0}")]
    InvalidOutput(String),
    #[error("proposer error: {0}")]
    Proposer(String),
}

/// Error devuelto por una task del pipeline.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[error("task '{task}' failed: {message}")]
pub struct TaskError {
    pub task: String,
    pub message: String,
}

impl TaskError {
    pub fn new(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self { task: task.into(),
               message: message.into() }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum StoreError {
    #[error("duplicate step {step_number} for chain {chain_index}")]
    Duplicate { chain_index: usize, step_number: u64 },
    #[error("out of order step for chain {chain_index}: expected {expected}, got {got}")]
    OutOfOrder { chain_index: usize, expected: u64, got: u64 },
    #[error("fingerprint mismatch for chain {chain_index} step {step_number}")]
    Corrupted { chain_index: usize, step_number: u64 },
    #[error("invalid step {step_number} for chain {chain_index}: {reason}")]
    InvalidStep {
        chain_index: usize,
        step_number: u64,
        reason: String,
    },
    #[error("storage closed")]
    Closed,
    #[error("not found")]
    NotFound,
    #[error("storage backend: {0}")]
    Backend(String),
}

/// Causa de un fin anticipado del run.
#[derive(Debug, Error, PartialEq, Clone, Serialize, Deserialize)]
pub enum FatalError {
    #[error("pipeline task '{task}' failed at g={g} (chain {chain_index}, step {step_number}): {message}")]
    Task {
        task: String,
        g: u64,
        chain_index: usize,
        step_number: u64,
        message: String,
    },
    #[error("persisting step {step_number} of chain {chain_index} failed: {source}")]
    Persistence {
        chain_index: usize,
        step_number: u64,
        source: StoreError,
    },
    #[error("proposal task panicked: {0}")]
    ProposalPanicked(String),
    #[error("internal: {0}")]
    Internal(String),
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum BrainError {
    #[error("brain has no samplers")]
    NoSamplers,
    #[error("chain {0} has no seed step")]
    NotSeeded(usize),
    #[error("chain {0} is already seeded")]
    AlreadySeeded(usize),
    #[error("expected {expected} initial paths (or 1), got {got}")]
    SeedCountMismatch { expected: usize, got: usize },
    #[error("task interval must be a positive integer")]
    InvalidInterval,
    #[error("unknown chain {0}")]
    UnknownChain(usize),
    #[error(transparent)]
    Store(#[from] StoreError),
}
