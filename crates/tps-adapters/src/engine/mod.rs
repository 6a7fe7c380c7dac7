//! Engine Adapter: ejecución de la simulación externa que produce los shots.

mod proposer;
mod subprocess;

pub use proposer::EngineProposer;
pub use subprocess::{EngineJob, EngineOutput, SubprocessEngine};

use async_trait::async_trait;

use crate::errors::EngineError;

/// Ejecuta un trabajo del engine. El future debe ser cancel-safe: si se
/// descarta, el proceso externo se termina.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn run(&self, job: EngineJob) -> Result<EngineOutput, EngineError>;
}
