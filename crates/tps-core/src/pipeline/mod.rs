//! Task Pipeline: lista ordenada de tasks de extensión con gating por
//! intervalo, ejecutada una vez por step terminado y antes de persistirlo.
//!
//! El pipeline no contiene lógica de dominio: sólo impone orden y gating.
//! Entrenamiento, densidades, diagnósticos o acoplamiento entre cadenas se
//! expresan como `Task`.

mod gating;
mod task;
mod task_pipeline;

pub use gating::GatingPolicy;
pub use task::{BrainView, Task};
pub use task_pipeline::{PassReport, PipelineEntry, TaskPipeline};
