#![allow(dead_code)]

use once_cell::sync::Lazy;
use tps_persistence::pg::{build_pool, PgPool, PgStorage, PoolProvider};
use tps_persistence::DbConfig;

pub static TEST_POOL: Lazy<Option<PgPool>> = Lazy::new(|| {
    let cfg = DbConfig::from_env().ok()?;
    match build_pool(&cfg.url, 1, 2) {
        Ok(p) => Some(p),
        Err(e) => {
            eprintln!("No se pudo construir pool de test: {e}");
            None
        }
    }
});

/// Store nuevo (store_id aleatorio) sobre el pool de test, o None si no hay
/// base de datos.
pub fn fresh_store() -> Option<PgStorage<PoolProvider>> {
    TEST_POOL.as_ref()
             .map(|pool| PgStorage::new(PoolProvider { pool: pool.clone() }))
}
