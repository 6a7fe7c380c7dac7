use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tps_core::{BrainView, StepDraft, Task, TaskError};
use tps_model::{ExpectedEfficiency, ModelError, RcModel, TrainOutcome, TrainSet};

/// Modelo + trainset + política de entrenamiento, siempre juntos bajo el
/// mismo lock.
#[derive(Debug)]
pub struct Trainer<M> {
    pub model: M,
    pub trainset: TrainSet,
    pub ee: ExpectedEfficiency,
}

pub type SharedTrainer<M> = Arc<Mutex<Trainer<M>>>;

pub fn shared_trainer<M: RcModel>(model: M, trainset: TrainSet, ee: ExpectedEfficiency) -> SharedTrainer<M> {
    Arc::new(Mutex::new(Trainer { model, trainset, ee }))
}

impl<M: RcModel> Trainer<M> {
    /// Estado serializable completo (modelo, trainset y política).
    pub fn snapshot(&self) -> Result<Value, ModelError> {
        Ok(json!({
            "model": self.model.state()?,
            "trainset": serde_json::to_value(&self.trainset)?,
            "ee": serde_json::to_value(&self.ee)?,
        }))
    }

    fn train_hook(&mut self) -> Result<TrainOutcome, ModelError> {
        self.ee.train_hook(&mut self.model, &self.trainset)
    }
}

impl<M: RcModel + DeserializeOwned> Trainer<M> {
    pub fn from_snapshot(snapshot: Value) -> Result<Self, ModelError> {
        let field = |name: &str| {
            snapshot.get(name)
                    .cloned()
                    .ok_or_else(|| ModelError::State(format!("snapshot without '{name}'")))
        };
        Ok(Self { model: serde_json::from_value(field("model")?)?,
                  trainset: serde_json::from_value(field("trainset")?)?,
                  ee: serde_json::from_value(field("ee")?)? })
    }
}

/// Agrega el resultado del shot al trainset, anota la predicción del modelo
/// en `predicted_values` y decide si entrenar (política EE).
///
/// Los steps sin `descriptors` o sin `states_reached` se dejan pasar.
pub struct TrainingTask<M> {
    trainer: SharedTrainer<M>,
}

impl<M> TrainingTask<M> {
    pub fn new(trainer: SharedTrainer<M>) -> Self {
        Self { trainer }
    }
}

const NAME: &str = "training";

#[async_trait]
impl<M> Task for TrainingTask<M> where M: RcModel + 'static
{
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, brain: &BrainView<'_>, step: &mut StepDraft, chain_index: usize) -> Result<(), TaskError> {
        let (Some(descriptors), Some(shots)) = (step.descriptors.clone(), step.states_reached.clone()) else {
            debug!("training:skip chain={chain_index} step={} reason=no_shot_data", step.step_number);
            return Ok(());
        };
        let err = |e: ModelError| TaskError::new(NAME, e.to_string());

        let mut guard = Arc::clone(&self.trainer).lock_owned().await;
        let p = guard.model.p(&descriptors).map_err(err)?;
        // `expected_p` y trainset deben crecer juntos: primero el punto.
        guard.trainset
             .append_point(descriptors, shots, step.weight)
             .map_err(err)?;
        guard.ee.register_sp(p.clone());
        step.set_predicted_values(Some(p));

        // El entrenamiento es CPU puro: fuera del loop async, con el lock tomado.
        let outcome = tokio::task::spawn_blocking(move || guard.train_hook()).await
                                                                             .map_err(|e| TaskError::new(NAME, e.to_string()))?
                                                                             .map_err(err)?;
        if !outcome.losses.is_empty() {
            info!("training:trained g={} chain={chain_index} epochs={} loss={:?}",
                  brain.global_step(),
                  outcome.losses.len(),
                  outcome.losses.last());
        }
        Ok(())
    }
}
