use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StoreError;
use crate::step::{StepDraft, StepRecord};

/// Almacenamiento append-only.
///
/// Contrato:
/// - `append` consume el draft y devuelve el record inmutable. Es durable al
///   retornar. Rechaza duplicados y huecos: el `step_number` debe ser igual a
///   la cantidad de records ya guardados para esa cadena.
/// - `iterate` devuelve los records de una cadena en orden de `step_number`.
/// - Tras `close`, toda operación falla con `StoreError::Closed`.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn append(&self, draft: StepDraft) -> Result<StepRecord, StoreError>;

    async fn iterate(&self, chain_index: usize) -> Result<Vec<StepRecord>, StoreError>;

    /// Guarda una nueva versión del estado de un modelo bajo `key`.
    async fn save_model_state(&self, key: &str, state: Value) -> Result<(), StoreError>;

    /// Última versión guardada bajo `key`.
    async fn load_model_state(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn close(&self) -> Result<(), StoreError>;
}

/// Valida que `draft` sea el siguiente step de una cadena con `stored`
/// records ya persistidos y que su contenido sea persistible.
pub fn expected_next(draft: &StepDraft, stored: u64) -> Result<(), StoreError> {
    validate_payload(draft)?;
    let got = draft.step_number;
    if got < stored {
        return Err(StoreError::Duplicate { chain_index: draft.chain_index,
                                           step_number: got });
    }
    if got > stored {
        return Err(StoreError::OutOfOrder { chain_index: draft.chain_index,
                                            expected: stored,
                                            got });
    }
    Ok(())
}

/// Peso finito y `>= 0`; payloads numéricos finitos (JSON no representa
/// NaN ni infinitos).
pub fn validate_payload(draft: &StepDraft) -> Result<(), StoreError> {
    let invalid = |reason: String| StoreError::InvalidStep { chain_index: draft.chain_index,
                                                             step_number: draft.step_number,
                                                             reason };
    if !draft.weight.is_finite() || draft.weight < 0.0 {
        return Err(invalid(format!("weight {}", draft.weight)));
    }
    let p = draft.acceptance_probability;
    if !p.is_finite() || p < 0.0 {
        return Err(invalid(format!("acceptance probability {p}")));
    }
    let payloads = [("states_reached", &draft.states_reached),
                    ("predicted_values", &draft.predicted_values),
                    ("descriptors", &draft.descriptors)];
    for (field, values) in payloads {
        if values.as_ref().is_some_and(|v| v.iter().any(|x| !x.is_finite())) {
            return Err(invalid(format!("non-finite value in {field}")));
        }
    }
    Ok(())
}
