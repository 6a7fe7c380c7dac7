use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use tps_core::{BrainView, StepDraft, Storage, Task, TaskError};
use tps_model::RcModel;

use super::SharedTrainer;

/// Guarda un snapshot del `Trainer` en el `Storage` bajo `key`.
pub struct SaveModelTask<M> {
    trainer: SharedTrainer<M>,
    storage: Arc<dyn Storage>,
    key: String,
}

impl<M> SaveModelTask<M> {
    pub fn new(trainer: SharedTrainer<M>, storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        Self { trainer,
               storage,
               key: key.into() }
    }
}

#[async_trait]
impl<M> Task for SaveModelTask<M> where M: RcModel + 'static
{
    fn name(&self) -> &str {
        "save_model"
    }

    async fn run(&self, brain: &BrainView<'_>, _step: &mut StepDraft, _chain_index: usize) -> Result<(), TaskError> {
        let snapshot = {
            let trainer = self.trainer.lock().await;
            trainer.snapshot()
                   .map_err(|e| TaskError::new(self.name(), e.to_string()))?
        };
        self.storage
            .save_model_state(&self.key, snapshot)
            .await
            .map_err(|e| TaskError::new(self.name(), e.to_string()))?;
        info!("save_model:done key={} g={}", self.key, brain.global_step());
        Ok(())
    }
}
