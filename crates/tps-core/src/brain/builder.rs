//! Builder para `Brain`.
//!
//! Los samplers y las tasks se registran en orden; el orden de registro de
//! las tasks es el orden de ejecución del pipeline. El builder sólo valida al
//! final (`build`), devolviendo el primer error de registro.
//!
//! ```ignore
//! let brain = Brain::builder(Arc::new(InMemoryStorage::new()))
//!     .config(BrainConfig { gating: GatingPolicy::Global, base_seed: 42 })
//!     .add_samplers(4, proposer)
//!     .add_task(TrainingTask::new(model, trainset), 1)
//!     .add_task(SaveModelTask::new(model, storage.clone(), "rcmodel"), 10)
//!     .build()?;
//! ```

use std::sync::Arc;

use super::{Brain, BrainConfig};
use crate::errors::BrainError;
use crate::pipeline::{PipelineEntry, Task, TaskPipeline};
use crate::sampler::{ChainSampler, MoveProposer};
use crate::store::Storage;

pub struct BrainBuilder {
    storage: Arc<dyn Storage>,
    config: BrainConfig,
    proposers: Vec<Arc<dyn MoveProposer>>,
    entries: Vec<Result<PipelineEntry, BrainError>>,
}

impl BrainBuilder {
    pub(crate) fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage,
               config: BrainConfig::default(),
               proposers: Vec::new(),
               entries: Vec::new() }
    }

    pub fn config(mut self, config: BrainConfig) -> Self {
        self.config = config;
        self
    }

    /// Añade una cadena con su proposer. El índice de cadena es el orden de
    /// registro.
    pub fn add_sampler<P>(mut self, proposer: P) -> Self
        where P: MoveProposer + 'static
    {
        self.proposers.push(Arc::new(proposer));
        self
    }

    /// Añade `n` cadenas que comparten el mismo proposer.
    pub fn add_samplers(mut self, n: usize, proposer: Arc<dyn MoveProposer>) -> Self {
        self.proposers
            .extend(std::iter::repeat_with(|| Arc::clone(&proposer)).take(n));
        self
    }

    /// Registra una task al final del pipeline con su intervalo (> 0).
    pub fn add_task<T>(mut self, task: T, interval: u64) -> Self
        where T: Task + 'static
    {
        self.entries.push(PipelineEntry::new(Box::new(task), interval));
        self
    }

    pub fn add_boxed_task(mut self, task: Box<dyn Task>, interval: u64) -> Self {
        self.entries.push(PipelineEntry::new(task, interval));
        self
    }

    pub fn build(self) -> Result<Brain, BrainError> {
        if self.proposers.is_empty() {
            return Err(BrainError::NoSamplers);
        }
        let mut pipeline = TaskPipeline::new(self.config.gating);
        for entry in self.entries {
            pipeline.push(entry?);
        }
        let samplers = self.proposers
                           .into_iter()
                           .enumerate()
                           .map(|(i, p)| ChainSampler::new(i, p, self.config.base_seed.wrapping_add(i as u64)))
                           .collect();
        Ok(Brain::from_parts(samplers, pipeline, self.storage, self.config))
    }
}
