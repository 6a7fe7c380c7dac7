//! Ciclo de vida de un Step (un trial MC).
//!
//! Dos fases con transferencia de ownership:
//! - `StepDraft`: fase mutable, existe entre "producido" y "persistido". Sólo
//!   el pipeline de tasks lo modifica.
//! - `StepRecord`: fase inmutable. Se obtiene únicamente entregando el draft
//!   al `Storage` (`Storage::append` consume el draft).
//!
//! `Step` es el dato plano compartido por ambas fases.

mod data;
mod draft;
mod record;

pub use data::{ArtifactRef, Step};
pub use draft::StepDraft;
pub use record::{fingerprint_step, StepRecord};
