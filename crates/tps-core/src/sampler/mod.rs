//! Chain Sampler: dueño de una cadena de Markov.
//!
//! - `MoveProposer`: colaborador externo que produce el candidato (envuelve
//!   la ejecución del engine).
//! - `ChainSampler`: fija numeración y regla de aceptación, y avanza la
//!   posición de la cadena en `commit`.

mod chain;
mod proposer;

pub use chain::{ChainSampler, ChainState};
pub use proposer::{MoveProposer, Proposal, ProposalRequest};
