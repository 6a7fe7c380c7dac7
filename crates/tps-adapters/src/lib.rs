//! tps-adapters: piezas concretas que se enchufan al core.
//!
//! - `engine`: Engine Adapter por subproceso y un `MoveProposer` basado en él.
//! - `tasks`: tasks de pipeline para el modelo predictivo (entrenamiento,
//!   guardado, densidad).

pub mod engine;
pub mod errors;
pub mod tasks;

pub use engine::{Engine, EngineJob, EngineOutput, EngineProposer, SubprocessEngine};
pub use errors::EngineError;
pub use tasks::{shared_trainer, DensityCollectionTask, SaveModelTask, SharedTrainer, Trainer, TrainingTask};
