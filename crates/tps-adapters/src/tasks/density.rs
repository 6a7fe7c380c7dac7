use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tps_core::{BrainView, StepDraft, Task, TaskError};
use tps_model::DensityCollector;

/// Alimenta el colector con `predicted_values[0]` y el peso del step.
/// Debe ir después de `TrainingTask` en el pipeline.
pub struct DensityCollectionTask {
    collector: Arc<Mutex<DensityCollector>>,
}

impl DensityCollectionTask {
    pub fn new(collector: Arc<Mutex<DensityCollector>>) -> Self {
        Self { collector }
    }
}

#[async_trait]
impl Task for DensityCollectionTask {
    fn name(&self) -> &str {
        "density_collection"
    }

    async fn run(&self, _brain: &BrainView<'_>, step: &mut StepDraft, _chain_index: usize) -> Result<(), TaskError> {
        let Some(p) = step.predicted_values.as_ref().and_then(|v| v.first().copied()) else {
            return Ok(());
        };
        self.collector
            .lock()
            .await
            .add(p, step.weight)
            .map_err(|e| TaskError::new(self.name(), e.to_string()))
    }
}
