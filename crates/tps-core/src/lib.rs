//! tps-core: orquestación de muestreo TPS (cadenas concurrentes + pipeline de tasks)
pub mod brain;
pub mod constants;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod pipeline;
pub mod sampler;
pub mod step;
pub mod store;

pub use brain::{Brain, BrainBuilder, BrainConfig, BrainCounters, HaltedChain, InitialPath, RunSummary, RunTarget, Termination};
pub use errors::{BrainError, FatalError, ProposalFailure, StoreError, TaskError};
pub use event::{RunEvent, RunEventKind, RunJournal};
pub use pipeline::{BrainView, GatingPolicy, PassReport, PipelineEntry, Task, TaskPipeline};
pub use sampler::{ChainSampler, ChainState, MoveProposer, Proposal, ProposalRequest};
pub use step::{ArtifactRef, Step, StepDraft, StepRecord};
pub use store::{InMemoryStorage, Storage};
