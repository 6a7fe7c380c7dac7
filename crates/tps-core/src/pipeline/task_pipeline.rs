use std::fmt;

use log::{debug, error};

use super::{BrainView, GatingPolicy, Task};
use crate::errors::{BrainError, TaskError};
use crate::step::StepDraft;

/// Entrada `(task, interval)` del pipeline.
pub struct PipelineEntry {
    task: Box<dyn Task>,
    interval: u64,
}

impl PipelineEntry {
    pub fn new(task: Box<dyn Task>, interval: u64) -> Result<Self, BrainError> {
        if interval == 0 {
            return Err(BrainError::InvalidInterval);
        }
        Ok(Self { task, interval })
    }

    pub fn name(&self) -> &str {
        self.task.name()
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }
}

impl fmt::Debug for PipelineEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineEntry")
         .field("task", &self.task.name())
         .field("interval", &self.interval)
         .finish()
    }
}

/// Resultado de un pase: tasks ejecutadas, en orden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub executed: Vec<String>,
}

#[derive(Debug, Default)]
pub struct TaskPipeline {
    entries: Vec<PipelineEntry>,
    gating: GatingPolicy,
}

impl TaskPipeline {
    pub fn new(gating: GatingPolicy) -> Self {
        Self { entries: Vec::new(),
               gating }
    }

    /// Registra al final; el orden de registro es el orden de ejecución.
    pub fn push(&mut self, entry: PipelineEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[PipelineEntry] {
        &self.entries
    }

    pub fn gating(&self) -> GatingPolicy {
        self.gating
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ejecuta secuencialmente las entradas habilitadas para `global_step`.
    ///
    /// El primer error corta el pase: las entradas siguientes no ven el step.
    pub async fn apply(&self,
                       brain: &BrainView<'_>,
                       step: &mut StepDraft,
                       chain_index: usize,
                       global_step: u64)
                       -> Result<PassReport, TaskError> {
        let mut report = PassReport::default();
        for entry in &self.entries {
            if !self.gating.should_run(entry.interval, global_step, step.step_number) {
                continue;
            }
            debug!("pipeline:run task={} g={global_step} chain={chain_index} step={}",
                   entry.name(),
                   step.step_number);
            if let Err(e) = entry.task.run(brain, step, chain_index).await {
                error!("pipeline:abort task={} g={global_step} chain={chain_index} err={}",
                       entry.name(),
                       e.message);
                return Err(e);
            }
            report.executed.push(entry.name().to_string());
        }
        Ok(report)
    }
}
