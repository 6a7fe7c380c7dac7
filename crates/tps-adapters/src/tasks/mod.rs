//! Tasks de pipeline incluidas: entrenamiento del modelo, guardado de
//! estado y colección de densidad.
//!
//! El modelo y el trainset son compartidos entre cadenas: todas las tasks
//! que los tocan toman el `tokio::sync::Mutex` de `SharedTrainer`.

mod density;
mod save_model;
mod training;

pub use density::DensityCollectionTask;
pub use save_model::SaveModelTask;
pub use training::{shared_trainer, SharedTrainer, Trainer, TrainingTask};
