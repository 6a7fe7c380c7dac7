//! Migraciones Diesel embebidas (`migrations/` de este crate). Se corren al
//! construir el pool.

use diesel::pg::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::info;

use crate::error::PersistenceError;

pub const TPS_MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Aplica las migraciones pendientes y devuelve cuántas se aplicaron.
pub fn run_pending_migrations(conn: &mut PgConnection) -> Result<usize, PersistenceError> {
    let applied = conn.run_pending_migrations(TPS_MIGRATIONS)
                      .map_err(|e| PersistenceError::Unknown(format!("migration error: {e}")))?;
    for version in &applied {
        info!("migrations:applied version={version}");
    }
    Ok(applied.len())
}
