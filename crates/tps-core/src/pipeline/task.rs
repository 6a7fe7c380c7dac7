use async_trait::async_trait;

use crate::brain::BrainCounters;
use crate::errors::TaskError;
use crate::sampler::{ChainSampler, ChainState};
use crate::step::StepDraft;

/// Vista de sólo lectura del `Brain` que reciben las tasks.
pub struct BrainView<'a> {
    samplers: &'a [ChainSampler],
    counters: &'a BrainCounters,
}

impl<'a> BrainView<'a> {
    pub(crate) fn new(samplers: &'a [ChainSampler], counters: &'a BrainCounters) -> Self {
        Self { samplers, counters }
    }

    pub fn n_chains(&self) -> usize {
        self.samplers.len()
    }

    pub fn chain(&self, chain_index: usize) -> Option<&'a ChainState> {
        self.samplers.get(chain_index).map(ChainSampler::state)
    }

    pub fn chains(&self) -> impl Iterator<Item = &'a ChainState> + 'a {
        self.samplers.iter().map(ChainSampler::state)
    }

    /// Contador global `g` del step en curso.
    pub fn global_step(&self) -> u64 {
        self.counters.global_step
    }

    pub fn counters(&self) -> &'a BrainCounters {
        self.counters
    }
}

/// Capacidad de una task de extensión.
///
/// `run` puede leer todo el `Brain` y mutar `step`; las mutaciones son
/// visibles para las tasks siguientes del mismo pase y terminan persistidas.
///
/// Recursos compartidos: el modelo predictivo y el storage son comunes a
/// todas las cadenas. Toda task que los mute debe tomar exclusión mutua por
/// su cuenta (p. ej. `tokio::sync::Mutex`); el pipeline no serializa pases
/// por ella.
#[async_trait]
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, brain: &BrainView<'_>, step: &mut StepDraft, chain_index: usize) -> Result<(), TaskError>;
}
