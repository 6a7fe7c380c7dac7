use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{expected_next, Storage};
use crate::errors::StoreError;
use crate::step::{StepDraft, StepRecord};

#[derive(Default)]
struct Inner {
    chains: HashMap<usize, Vec<StepRecord>>,
    models: HashMap<String, Vec<Value>>,
    closed: bool,
}

/// Storage en memoria (tests, demos y runs sin base de datos).
#[derive(Default)]
pub struct InMemoryStorage {
    inner: Mutex<Inner>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let guard = self.inner
                        .lock()
                        .map_err(|_| StoreError::Backend("in-memory storage lock poisoned".into()))?;
        if guard.closed {
            return Err(StoreError::Closed);
        }
        Ok(guard)
    }

    /// Cantidad de versiones guardadas para un modelo.
    pub fn model_versions(&self, key: &str) -> usize {
        self.lock()
            .map(|g| g.models.get(key).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn append(&self, draft: StepDraft) -> Result<StepRecord, StoreError> {
        let mut inner = self.lock()?;
        let records = inner.chains.entry(draft.chain_index).or_default();
        expected_next(&draft, records.len() as u64)?;
        let record = StepRecord::seal(draft);
        records.push(record.clone());
        Ok(record)
    }

    async fn iterate(&self, chain_index: usize) -> Result<Vec<StepRecord>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.chains.get(&chain_index).cloned().unwrap_or_default())
    }

    async fn save_model_state(&self, key: &str, state: Value) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.models.entry(key.to_string()).or_default().push(state);
        Ok(())
    }

    async fn load_model_state(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.models.get(key).and_then(|v| v.last().cloned()))
    }

    async fn close(&self) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.closed = true;
        Ok(())
    }
}
