//! Demo de extremo a extremo: shooting de dos vías sobre un modelo de juguete
//! con committor conocido, entrenamiento EE en línea y colección de densidad.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tps_adapters::{shared_trainer, DensityCollectionTask, SaveModelTask, TrainingTask};
use tps_core::{ArtifactRef, Brain, BrainConfig, InitialPath, MoveProposer, Proposal, ProposalFailure, ProposalRequest, RunSummary, Storage};
use tps_model::{sigmoid, DensityCollector, EeParams, ExpectedEfficiency, LogisticRcModel, RcModel, TrainSet};

use crate::config::AppConfig;
use crate::errors::AppError;

/// Pendiente del committor verdadero `p_B(x) = sigmoid(SLOPE * x)`.
const SLOPE: f64 = 2.5;

pub const MODEL_KEY: &str = "rcmodel";

/// Proposer de juguete: elige un shooting point `x` y dispara dos shots que
/// terminan en B con probabilidad `p_B(x)`. El trial se acepta sólo si es
/// reactivo (un shot en cada estado).
pub struct ToyShooter {
    rng: Mutex<StdRng>,
    latency: Duration,
}

impl ToyShooter {
    pub fn new(seed: u64, latency: Duration) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)),
               latency }
    }
}

#[async_trait]
impl MoveProposer for ToyShooter {
    fn kind(&self) -> &str {
        "toy_two_way_shooting"
    }

    async fn propose(&self, request: ProposalRequest) -> Result<Proposal, ProposalFailure> {
        let (x, n_b) = {
            let mut rng = self.rng
                              .lock()
                              .map_err(|_| ProposalFailure::Proposer("rng lock poisoned".into()))?;
            let x: f64 = rng.gen_range(-2.0..2.0);
            let p_b = sigmoid(SLOPE * x);
            let n_b = (0..2).filter(|_| rng.gen::<f64>() < p_b).count() as f64;
            (x, n_b)
        };
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let reactive = n_b == 1.0;
        let mut proposal = Proposal::with_probability(if reactive { 1.0 } else { 0.0 });
        proposal.descriptors = Some(vec![x]);
        proposal.states_reached = Some(vec![2.0 - n_b, n_b]);
        proposal.artifact = Some(ArtifactRef::new(format!("toy://chain_{}/step_{}", request.chain_index, request.step_number)));
        Ok(proposal)
    }
}

#[derive(Debug)]
pub struct DemoReport {
    pub summary: RunSummary,
    /// `p_B` predicho en `x = -1, 0, 1` tras el run.
    pub predictions: Vec<f64>,
    pub trainset_len: usize,
    pub density: Vec<f64>,
}

pub async fn run_demo(cfg: &AppConfig, storage: Arc<dyn Storage>, latency: Duration) -> Result<DemoReport, AppError> {
    let trainer = shared_trainer(LogisticRcModel::new(1),
                                 TrainSet::new(2),
                                 ExpectedEfficiency::new(EeParams { lr_0: 1.0,
                                                                    ..EeParams::default() }));
    let collector = Arc::new(tokio::sync::Mutex::new(DensityCollector::new(10)?));

    let mut builder = Brain::builder(Arc::clone(&storage)).config(BrainConfig { gating: cfg.gating,
                                                                                base_seed: cfg.seed });
    for i in 0..cfg.n_chains {
        builder = builder.add_sampler(ToyShooter::new(cfg.seed.wrapping_add(1000 + i as u64), latency));
    }
    let mut brain = builder.add_task(TrainingTask::new(Arc::clone(&trainer)), 1)
                           .add_task(DensityCollectionTask::new(Arc::clone(&collector)), 1)
                           .add_task(SaveModelTask::new(Arc::clone(&trainer), Arc::clone(&storage), MODEL_KEY), 10)
                           .build()?;

    let seed = InitialPath::new(Some(ArtifactRef::new("toy://initial_tp")), Some(vec![1.0, 1.0]));
    brain.seed_initial_paths(vec![seed]).await?;
    info!("demo:start chains={} steps={}", cfg.n_chains, cfg.n_steps);
    let summary = brain.run_for_n_steps(cfg.n_steps).await?.into_result()?;

    let t = trainer.lock().await;
    let predictions = [-1.0, 0.0, 1.0].iter()
                                      .map(|x| t.model.p(&[*x]).map(|p| p[0]))
                                      .collect::<Result<Vec<_>, _>>()?;
    let density = collector.lock().await.density();
    Ok(DemoReport { summary,
                    predictions,
                    trainset_len: t.trainset.len(),
                    density })
}
