//! Orquestador: fan-out de una propuesta por cadena activa y fan-in a medida
//! que terminan.
//!
//! Todo el estado global (`BrainCounters`, estado de los samplers, journal) se
//! muta sólo aquí, en `process_step`, que corre en el único hilo lógico de
//! coordinación. Las propuestas son tasks de tokio independientes que no
//! tocan ese estado: devuelven un `StepDraft` y el `Brain` decide.
//!
//! Orden por step: `g += 1` -> pipeline -> `Storage::append` -> `commit`.
//! La siguiente propuesta de una cadena no sale hasta que su step anterior
//! quedó comprometido.

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::task::JoinSet;
use uuid::Uuid;

use super::{BrainBuilder, BrainConfig, BrainCounters, HaltedChain, InitialPath, RunSummary, RunTarget, Termination};
use crate::errors::{BrainError, FatalError, ProposalFailure};
use crate::event::{RunEventKind, RunJournal};
use crate::pipeline::{BrainView, TaskPipeline};
use crate::sampler::{ChainSampler, ChainState};
use crate::step::{Step, StepDraft, StepRecord};
use crate::store::{InMemoryStorage, Storage};

type ProposalOutcome = (usize, Result<StepDraft, ProposalFailure>);

pub struct Brain {
    samplers: Vec<ChainSampler>,
    pipeline: TaskPipeline,
    storage: Arc<dyn Storage>,
    config: BrainConfig,
    counters: BrainCounters,
    journal: RunJournal,
}

impl std::fmt::Debug for Brain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Brain")
         .field("samplers", &self.samplers)
         .field("pipeline", &self.pipeline)
         .field("config", &self.config)
         .field("counters", &self.counters)
         .finish()
    }
}

impl Brain {
    pub fn builder(storage: Arc<dyn Storage>) -> BrainBuilder {
        BrainBuilder::new(storage)
    }

    /// Builder con `InMemoryStorage`.
    pub fn builder_in_memory() -> BrainBuilder {
        BrainBuilder::new(Arc::new(InMemoryStorage::new()))
    }

    pub(crate) fn from_parts(samplers: Vec<ChainSampler>,
                             pipeline: TaskPipeline,
                             storage: Arc<dyn Storage>,
                             config: BrainConfig)
                             -> Self {
        Self { samplers,
               pipeline,
               storage,
               config,
               counters: BrainCounters::default(),
               journal: RunJournal::default() }
    }

    /// Instala el step 0 de cada cadena, sin pasar por proposer ni pipeline.
    ///
    /// Acepta un path por cadena o uno solo que se replica. Los seeds se
    /// persisten, quedan `accepted = true` y no incrementan `g`.
    ///
    /// Cada cadena queda instalada apenas su seed se persiste, así memoria y
    /// storage coinciden aunque falle una cadena posterior. Reintentar tras un
    /// error sólo siembra las cadenas que faltan; si ya están todas sembradas
    /// devuelve `AlreadySeeded`.
    pub async fn seed_initial_paths(&mut self, paths: Vec<InitialPath>) -> Result<(), BrainError> {
        let n = self.samplers.len();
        let paths = match paths.len() {
            len if len == n => paths,
            1 => vec![paths[0].clone(); n],
            got => return Err(BrainError::SeedCountMismatch { expected: n, got }),
        };
        if n > 0 && self.samplers.iter().all(|s| s.state().is_seeded()) {
            return Err(BrainError::AlreadySeeded(0));
        }
        let mut seeded = 0;
        for (sampler, path) in self.samplers.iter_mut().zip(paths) {
            if sampler.state().is_seeded() {
                continue;
            }
            let seed = Step::seed(sampler.chain_index(), path.artifact, path.states_reached);
            let record = match self.storage.append(StepDraft::new(seed)).await {
                Ok(record) => record,
                Err(e) => {
                    warn!("brain:seed_failed chain={} seeded={seeded} err={e}", sampler.chain_index());
                    return Err(e.into());
                }
            };
            sampler.install_seed(record)?;
            seeded += 1;
        }
        self.journal
            .append(None, RunEventKind::ChainsSeeded { n_chains: seeded });
        info!("brain:seed n_chains={seeded}");
        Ok(())
    }

    /// Corre hasta completar `n` steps sumando todas las cadenas.
    pub async fn run_for_n_steps(&mut self, n: u64) -> Result<RunSummary, BrainError> {
        self.run(RunTarget::Steps(n)).await
    }

    /// Corre hasta acumular `n` steps aceptados sumando todas las cadenas.
    pub async fn run_for_n_accepts(&mut self, n: u64) -> Result<RunSummary, BrainError> {
        self.run(RunTarget::Accepts(n)).await
    }

    async fn run(&mut self, target: RunTarget) -> Result<RunSummary, BrainError> {
        if self.samplers.is_empty() {
            return Err(BrainError::NoSamplers);
        }
        if let Some(s) = self.samplers.iter().find(|s| !s.state().is_seeded()) {
            return Err(BrainError::NotSeeded(s.chain_index()));
        }
        let run_id = Uuid::new_v4();
        let mut summary = RunSummary::new(run_id, target, self.samplers.len());
        let active_chains = self.samplers.iter().filter(|s| s.is_active()).count();
        self.journal
            .append(Some(run_id), RunEventKind::RunStarted { target, active_chains });
        info!("brain:run_start run={run_id} target={target:?} active_chains={active_chains}");

        let mut in_flight: JoinSet<ProposalOutcome> = JoinSet::new();
        if !summary.target_reached() {
            for chain_index in 0..self.samplers.len() {
                if self.samplers[chain_index].is_active() {
                    self.issue(&mut in_flight, chain_index)?;
                }
            }
        }

        let termination = loop {
            if summary.target_reached() {
                break Termination::TargetReached;
            }
            let Some(joined) = in_flight.join_next().await else {
                break Termination::AllChainsHalted;
            };
            let (chain_index, outcome) = match joined {
                Ok(done) => done,
                Err(e) if e.is_cancelled() => continue,
                Err(e) => {
                    error!("brain:proposal_panic run={run_id} err={e}");
                    break Termination::Fatal(FatalError::ProposalPanicked(e.to_string()));
                }
            };
            if !self.samplers[chain_index].is_active() {
                debug!("brain:discard chain={chain_index} reason=halted");
                continue;
            }
            match outcome {
                Err(failure) => self.halt_chain(run_id, chain_index, failure, &mut summary),
                Ok(draft) => {
                    if let Err(fatal) = self.process_step(run_id, draft, &mut summary).await {
                        error!("brain:fatal run={run_id} err={fatal}");
                        break Termination::Fatal(fatal);
                    }
                    if !summary.target_reached() {
                        self.issue(&mut in_flight, chain_index)?;
                    }
                }
            }
        };

        // Las propuestas pendientes no consumen número de step: el sampler sólo
        // avanza al comprometer.
        in_flight.abort_all();
        while in_flight.join_next().await.is_some() {}

        summary.termination = termination;
        self.journal
            .append(Some(run_id),
                    RunEventKind::RunFinished { termination: summary.termination.clone(),
                                                steps_completed: summary.steps_completed });
        info!("brain:run_finish run={run_id} steps={} accepts={} halted={} termination={:?}",
              summary.steps_completed,
              summary.accepts_completed,
              summary.halted.len(),
              summary.termination);
        Ok(summary)
    }

    fn issue(&mut self, in_flight: &mut JoinSet<ProposalOutcome>, chain_index: usize) -> Result<(), BrainError> {
        let proposal = self.samplers[chain_index].produce_next_step()?;
        in_flight.spawn(async move { (chain_index, proposal.await) });
        Ok(())
    }

    fn halt_chain(&mut self, run_id: Uuid, chain_index: usize, failure: ProposalFailure, summary: &mut RunSummary) {
        warn!("brain:chain_halted run={run_id} chain={chain_index} cause={failure}");
        self.samplers[chain_index].halt(failure.clone());
        self.journal
            .append(Some(run_id),
                    RunEventKind::ChainHalted { chain_index,
                                                failure: failure.clone() });
        summary.halted.push(HaltedChain { chain_index, failure });
    }

    /// Único punto de coordinación: contadores, pipeline, persistencia y commit.
    async fn process_step(&mut self, run_id: Uuid, mut draft: StepDraft, summary: &mut RunSummary) -> Result<(), FatalError> {
        let chain_index = draft.chain_index;
        let step_number = draft.step_number;
        self.counters.global_step += 1;
        let g = self.counters.global_step;

        let view = BrainView::new(&self.samplers, &self.counters);
        let report = self.pipeline
                         .apply(&view, &mut draft, chain_index, g)
                         .await
                         .map_err(|e| FatalError::Task { task: e.task,
                                                         g,
                                                         chain_index,
                                                         step_number,
                                                         message: e.message })?;

        let record = self.storage
                         .append(draft)
                         .await
                         .map_err(|source| FatalError::Persistence { chain_index,
                                                                     step_number,
                                                                     source })?;
        let accepted = record.accepted;
        self.samplers[chain_index].commit(record);

        self.counters.total_steps += 1;
        summary.steps_completed += 1;
        summary.steps_per_chain[chain_index] += 1;
        if accepted {
            self.counters.total_accepts += 1;
            summary.accepts_completed += 1;
        }
        debug!("brain:commit chain={chain_index} step={step_number} accepted={accepted} g={g} tasks={:?}",
               report.executed);
        self.journal
            .append(Some(run_id),
                    RunEventKind::StepCommitted { chain_index,
                                                  step_number,
                                                  accepted,
                                                  global_step: g,
                                                  tasks: report.executed });
        Ok(())
    }

    pub fn n_chains(&self) -> usize {
        self.samplers.len()
    }

    pub fn chain(&self, chain_index: usize) -> Option<&ChainState> {
        self.samplers.get(chain_index).map(ChainSampler::state)
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainState> {
        self.samplers.iter().map(ChainSampler::state)
    }

    pub fn counters(&self) -> BrainCounters {
        self.counters
    }

    pub fn config(&self) -> &BrainConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &TaskPipeline {
        &self.pipeline
    }

    pub fn journal(&self) -> &RunJournal {
        &self.journal
    }

    pub fn storage(&self) -> Arc<dyn Storage> {
        Arc::clone(&self.storage)
    }

    /// Historia persistida de una cadena, seed incluido.
    pub async fn chain_history(&self, chain_index: usize) -> Result<Vec<StepRecord>, BrainError> {
        if chain_index >= self.samplers.len() {
            return Err(BrainError::UnknownChain(chain_index));
        }
        Ok(self.storage.iterate(chain_index).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{MoveProposer, Proposal, ProposalRequest};
    use async_trait::async_trait;

    struct Always(f64);

    #[async_trait]
    impl MoveProposer for Always {
        fn kind(&self) -> &str {
            "always"
        }
        async fn propose(&self, _r: ProposalRequest) -> Result<Proposal, ProposalFailure> {
            Ok(Proposal::with_probability(self.0))
        }
    }

    #[tokio::test]
    async fn run_requires_seed() {
        let mut brain = Brain::builder_in_memory().add_sampler(Always(1.0))
                                                  .build()
                                                  .unwrap();
        assert_eq!(brain.run_for_n_steps(1).await.unwrap_err(), BrainError::NotSeeded(0));
    }

    #[tokio::test]
    async fn seed_count_must_match_or_be_one() {
        let mut brain = Brain::builder_in_memory().add_sampler(Always(1.0))
                                                  .add_sampler(Always(1.0))
                                                  .add_sampler(Always(1.0))
                                                  .build()
                                                  .unwrap();
        let err = brain.seed_initial_paths(vec![InitialPath::default(); 2])
                       .await
                       .unwrap_err();
        assert_eq!(err, BrainError::SeedCountMismatch { expected: 3, got: 2 });
        brain.seed_initial_paths(vec![InitialPath::default()]).await.unwrap();
        assert!(brain.chains().all(ChainState::is_seeded));
        assert_eq!(brain.seed_initial_paths(vec![InitialPath::default()]).await.unwrap_err(),
                   BrainError::AlreadySeeded(0));
    }

    #[tokio::test]
    async fn counters_track_steps_and_accepts() {
        let mut brain = Brain::builder_in_memory().add_sampler(Always(1.0))
                                                  .add_sampler(Always(0.0))
                                                  .build()
                                                  .unwrap();
        brain.seed_initial_paths(vec![InitialPath::default()]).await.unwrap();
        let summary = brain.run_for_n_steps(10).await.unwrap();
        assert!(summary.reached_target());
        assert_eq!(summary.steps_completed, 10);
        let c = brain.counters();
        assert_eq!(c.global_step, 10);
        assert_eq!(c.total_steps, 10);
        // la cadena 0 acepta todo, la 1 nada
        assert_eq!(c.total_accepts, summary.steps_per_chain[0]);
        assert_eq!(brain.chain(1).unwrap().accepted_count, 0);
    }

    #[tokio::test]
    async fn zero_target_returns_immediately() {
        let mut brain = Brain::builder_in_memory().add_sampler(Always(1.0))
                                                  .build()
                                                  .unwrap();
        brain.seed_initial_paths(vec![InitialPath::default()]).await.unwrap();
        let summary = brain.run_for_n_accepts(0).await.unwrap();
        assert_eq!(summary.steps_completed, 0);
        assert!(summary.reached_target());
        assert_eq!(brain.chain_history(0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_chain_history_is_an_error() {
        let brain = Brain::builder_in_memory().add_sampler(Always(1.0))
                                              .build()
                                              .unwrap();
        assert_eq!(brain.chain_history(5).await.unwrap_err(), BrainError::UnknownChain(5));
    }
}
