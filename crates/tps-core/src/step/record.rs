use std::ops::Deref;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use super::{Step, StepDraft};
use crate::constants::STEP_SCHEMA_VERSION;
use crate::errors::StoreError;
use crate::hashing::hash_value;

/// Fingerprint determinista de un step (blake3 sobre JSON canónico).
pub fn fingerprint_step(step: &Step) -> String {
    let body = serde_json::to_value(step).unwrap_or_default();
    hash_value(&json!({
        "schema_version": STEP_SCHEMA_VERSION,
        "step": body,
    }))
}

/// Step persistido: inmutable, compartido por `Arc`.
///
/// No expone ningún acceso mutable; clonar un `StepRecord` sólo clona el
/// puntero.
#[derive(Debug, Clone)]
pub struct StepRecord {
    step: Arc<Step>,
    fingerprint: String,
    persisted_at: DateTime<Utc>,
}

impl StepRecord {
    /// Cierra la fase mutable. Sólo los `Storage` deben llamarlo, justo antes
    /// de confirmar el append.
    pub fn seal(draft: StepDraft) -> Self {
        let step = draft.into_step();
        let fingerprint = fingerprint_step(&step);
        Self { step: Arc::new(step),
               fingerprint,
               persisted_at: Utc::now() }
    }

    /// Reconstruye un record leído de un backend verificando su fingerprint.
    pub fn restore(step: Step, fingerprint: String, persisted_at: DateTime<Utc>) -> Result<Self, StoreError> {
        if fingerprint_step(&step) != fingerprint {
            return Err(StoreError::Corrupted { chain_index: step.chain_index,
                                               step_number: step.step_number });
        }
        Ok(Self { step: Arc::new(step),
                  fingerprint,
                  persisted_at })
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn persisted_at(&self) -> DateTime<Utc> {
        self.persisted_at
    }

    /// `true` si el contenido sigue coincidiendo con el fingerprint sellado.
    pub fn verify(&self) -> bool {
        fingerprint_step(&self.step) == self.fingerprint
    }
}

impl Deref for StepRecord {
    type Target = Step;

    fn deref(&self) -> &Step {
        &self.step
    }
}
