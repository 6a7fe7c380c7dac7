//! Implementación Postgres (Diesel) del `Storage` del core.
//!
//! - `step_log`: append-only, clave `(store_id, chain_index, step_number)`.
//!   Un trigger rechaza cualquier UPDATE.
//! - `model_states`: versiones del estado del modelo; se lee la última.
//! - Cada `PgStorage` escribe bajo su `store_id`, de modo que varios stores
//!   conviven en la misma base. `PgStorage::open` retoma uno existente.
//!
//! Diesel es bloqueante: cada operación corre en `spawn_blocking`. Las
//! lecturas reintentan ante errores transitorios; `append` nunca reintenta
//! (un reintento silencioso podría duplicar o reordenar records).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::{debug, warn};
use serde_json::Value;
use uuid::Uuid;

use tps_core::store::expected_next;
use tps_core::{Step, StepDraft, StepRecord, Storage, StoreError};

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::{model_states, step_log};

pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub type PgConn = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones (pool real o dobles de test).
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PgConn, PersistenceError>;
}

pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PgConn, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = step_log)]
pub struct NewStepRow<'a> {
    pub store_id: &'a Uuid,
    pub chain_index: i32,
    pub step_number: i64,
    pub accepted: bool,
    pub fingerprint: &'a str,
    pub payload: &'a Value,
}

/// Fila de `step_log`; `payload` es el `Step` completo en JSON.
#[derive(Queryable, Debug)]
pub struct StepRow {
    pub store_id: Uuid,
    pub chain_index: i32,
    pub step_number: i64,
    pub accepted: bool,
    pub fingerprint: String,
    pub payload: Value,
    pub persisted_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = model_states)]
pub struct NewModelStateRow<'a> {
    pub store_id: &'a Uuid,
    pub model_key: &'a str,
    pub state: &'a Value,
}

fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict => true,
        PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected")
            || m.contains("terminating connection due to administrator command")
            || m.contains("connection closed")
            || m.contains("connection refused")
            || m.contains("timeout")
        }
        _ => false,
    }
}

/// Reintento con backoff corto (3 intentos: 15ms, 30ms, 45ms). Sólo lecturas
/// e inserciones idempotentes.
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms",
                      attempts + 1,
                      e,
                      delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Reconstruye el record verificando identidad y fingerprint.
fn row_to_record(row: StepRow) -> Result<StepRecord, StoreError> {
    let corrupted = StoreError::Corrupted { chain_index: row.chain_index as usize,
                                            step_number: row.step_number as u64 };
    let step: Step = serde_json::from_value(row.payload).map_err(|_| corrupted.clone())?;
    if step.chain_index != row.chain_index as usize
       || step.step_number != row.step_number as u64
       || step.accepted != row.accepted
    {
        return Err(corrupted);
    }
    StepRecord::restore(step, row.fingerprint, row.persisted_at)
}

fn append_blocking<P: ConnectionProvider>(provider: &P, store_id: Uuid, draft: StepDraft) -> Result<StepRecord, StoreError> {
    let chain_index = draft.chain_index;
    let step_number = draft.step_number;
    let mut conn = provider.connection()?;
    let stored: i64 = step_log::table.filter(step_log::store_id.eq(store_id))
                                     .filter(step_log::chain_index.eq(chain_index as i32))
                                     .count()
                                     .get_result(&mut conn)
                                     .map_err(PersistenceError::from)?;
    expected_next(&draft, stored as u64)?;

    let sealed = StepRecord::seal(draft);
    let payload = serde_json::to_value(sealed.step()).map_err(|e| StoreError::Backend(format!("serialize step: {e}")))?;
    let row = NewStepRow { store_id: &store_id,
                           chain_index: chain_index as i32,
                           step_number: step_number as i64,
                           accepted: sealed.accepted,
                           fingerprint: sealed.fingerprint(),
                           payload: &payload };
    let persisted_at: DateTime<Utc> =
        diesel::insert_into(step_log::table).values(&row)
                                            .returning(step_log::persisted_at)
                                            .get_result(&mut conn)
                                            .map_err(|e| match PersistenceError::from(e) {
                                                PersistenceError::UniqueViolation(_) => StoreError::Duplicate { chain_index,
                                                                                                                step_number },
                                                other => other.into(),
                                            })?;
    debug!("pg:append store={store_id} chain={chain_index} step={step_number}");
    // la marca de tiempo visible es la de la base
    StepRecord::restore(sealed.step().clone(), sealed.fingerprint().to_string(), persisted_at)
}

pub struct PgStorage<P: ConnectionProvider> {
    provider: Arc<P>,
    store_id: Uuid,
    closed: AtomicBool,
}

impl<P: ConnectionProvider> PgStorage<P> {
    /// Store nuevo con `store_id` aleatorio.
    pub fn new(provider: P) -> Self {
        Self::open(provider, Uuid::new_v4())
    }

    /// Retoma un store existente.
    pub fn open(provider: P, store_id: Uuid) -> Self {
        Self { provider: Arc::new(provider),
               store_id,
               closed: AtomicBool::new(false) }
    }

    pub fn store_id(&self) -> Uuid {
        self.store_id
    }

    async fn blocking<F, T>(&self, f: F) -> Result<T, StoreError>
        where F: FnOnce(&P, Uuid) -> Result<T, StoreError> + Send + 'static,
              T: Send + 'static
    {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        let provider = Arc::clone(&self.provider);
        let store_id = self.store_id;
        tokio::task::spawn_blocking(move || f(&provider, store_id)).await
                                                                   .map_err(|e| StoreError::Backend(format!("blocking task: {e}")))?
    }

    /// Cantidad de versiones guardadas para un modelo.
    pub async fn model_versions(&self, key: &str) -> Result<u64, StoreError> {
        let key = key.to_string();
        self.blocking(move |provider, store_id| {
                let n: i64 = with_retry(|| {
                    let mut conn = provider.connection()?;
                    model_states::table.filter(model_states::store_id.eq(store_id))
                                       .filter(model_states::model_key.eq(&key))
                                       .count()
                                       .get_result(&mut conn)
                                       .map_err(PersistenceError::from)
                })?;
                Ok(n as u64)
            })
            .await
    }
}

#[async_trait]
impl<P: ConnectionProvider> Storage for PgStorage<P> {
    async fn append(&self, draft: StepDraft) -> Result<StepRecord, StoreError> {
        self.blocking(move |provider, store_id| append_blocking(provider, store_id, draft))
            .await
    }

    async fn iterate(&self, chain_index: usize) -> Result<Vec<StepRecord>, StoreError> {
        self.blocking(move |provider, store_id| {
                let rows: Vec<StepRow> = with_retry(|| {
                    let mut conn = provider.connection()?;
                    step_log::table.filter(step_log::store_id.eq(store_id))
                                   .filter(step_log::chain_index.eq(chain_index as i32))
                                   .order(step_log::step_number.asc())
                                   .load(&mut conn)
                                   .map_err(PersistenceError::from)
                })?;
                debug!("pg:iterate store={store_id} chain={chain_index} count={}", rows.len());
                rows.into_iter().map(row_to_record).collect()
            })
            .await
    }

    async fn save_model_state(&self, key: &str, state: Value) -> Result<(), StoreError> {
        let key = key.to_string();
        self.blocking(move |provider, store_id| {
                let mut conn = provider.connection()?;
                diesel::insert_into(model_states::table).values(NewModelStateRow { store_id: &store_id,
                                                                                   model_key: &key,
                                                                                   state: &state })
                                                        .execute(&mut conn)
                                                        .map_err(PersistenceError::from)?;
                debug!("pg:save_model store={store_id} key={key}");
                Ok(())
            })
            .await
    }

    async fn load_model_state(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let key = key.to_string();
        self.blocking(move |provider, store_id| {
                let state = with_retry(|| {
                    let mut conn = provider.connection()?;
                    model_states::table.filter(model_states::store_id.eq(store_id))
                                       .filter(model_states::model_key.eq(&key))
                                       .order(model_states::id.desc())
                                       .select(model_states::state)
                                       .first::<Value>(&mut conn)
                                       .optional()
                                       .map_err(PersistenceError::from)
                })?;
                Ok(state)
            })
            .await
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        debug!("pg:close store={}", self.store_id);
        Ok(())
    }
}

/// Construye un pool r2d2 y corre las migraciones pendientes una vez.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let max = max_size.max(1);
    let min = min_size.max(1).min(max);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(min))
                                    .max_size(max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

/// Carga `.env`, lee `DbConfig` y construye un pool ya migrado.
pub fn build_pool_from_env() -> Result<PgPool, PersistenceError> {
    crate::config::init_dotenv();
    let cfg = crate::config::DbConfig::from_env()?;
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retried() {
        assert!(is_retryable(&PersistenceError::SerializationConflict));
        assert!(is_retryable(&PersistenceError::Unknown("Deadlock detected".into())));
        assert!(!is_retryable(&PersistenceError::UniqueViolation("dup".into())));
        assert!(!is_retryable(&PersistenceError::NotFound));
    }

    #[test]
    fn retry_gives_up_after_three_attempts() {
        let mut calls = 0;
        let res: Result<(), _> = with_retry(|| {
            calls += 1;
            Err(PersistenceError::TransientIo("down".into()))
        });
        assert!(res.is_err());
        assert_eq!(calls, 4);
    }

    #[test]
    fn row_with_mismatched_identity_is_corrupted() {
        let record = StepRecord::seal(StepDraft::new(Step::seed(1, None, None)));
        let row = StepRow { store_id: Uuid::new_v4(),
                            chain_index: 2,
                            step_number: 0,
                            accepted: true,
                            fingerprint: record.fingerprint().to_string(),
                            payload: serde_json::to_value(record.step()).unwrap(),
                            persisted_at: record.persisted_at() };
        assert_eq!(row_to_record(row).unwrap_err(),
                   StoreError::Corrupted { chain_index: 2, step_number: 0 });
    }
}
