use thiserror::Error;
use tps_adapters::EngineError;
use tps_core::{BrainError, FatalError, StoreError};
use tps_model::ModelError;
use tps_persistence::PersistenceError;

/// Errores de la aplicación (demo y glue).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error(transparent)]
    Brain(#[from] BrainError),
    #[error("Run abortado: {0}")]
    Fatal(#[from] FatalError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}
