//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) una sola vez y expone `app_config()`.

use std::env;
use std::str::FromStr;

use once_cell::sync::Lazy;
use tps_core::GatingPolicy;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Cadenas concurrentes (`TPS_N_CHAINS`, default 2).
    pub n_chains: usize,
    /// Steps totales del run (`TPS_N_STEPS`, default 20).
    pub n_steps: u64,
    /// Semilla base (`TPS_SEED`, default 42).
    pub seed: u64,
    /// `TPS_GATING`: `global` | `per_chain`.
    pub gating: GatingPolicy,
    /// Store Postgres opcional.
    pub database_url: Option<String>,
    /// `TPS_RUN_PG_DEMO=1` activa el store Postgres en el demo.
    pub run_pg_demo: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { n_chains: 2,
               n_steps: 20,
               seed: 42,
               gating: GatingPolicy::Global,
               database_url: None,
               run_pg_demo: false }
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError> {
    match lookup(key) {
        Some(raw) => raw.trim()
                        .parse()
                        .map_err(|_| AppError::Config(format!("{key} inválido: '{raw}'"))),
        None => Ok(default),
    }
}

impl AppConfig {
    /// Construye la configuración a partir de una función de lookup
    /// (el entorno en producción, un mapa en tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let d = Self::default();
        let n_chains = parse(&lookup, "TPS_N_CHAINS", d.n_chains)?;
        if n_chains == 0 {
            return Err(AppError::Config("TPS_N_CHAINS debe ser > 0".into()));
        }
        Ok(Self { n_chains,
                  n_steps: parse(&lookup, "TPS_N_STEPS", d.n_steps)?,
                  seed: parse(&lookup, "TPS_SEED", d.seed)?,
                  gating: parse(&lookup, "TPS_GATING", d.gating)?,
                  database_url: lookup("DATABASE_URL").filter(|u| !u.is_empty()),
                  run_pg_demo: lookup("TPS_RUN_PG_DEMO").is_some_and(|v| v == "1") })
    }

    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }
}

/// Instancia global perezosa, evaluada una sola vez.
static CONFIG: Lazy<Result<AppConfig, String>> = Lazy::new(|| AppConfig::from_env().map_err(|e| e.to_string()));

pub fn app_config() -> Result<&'static AppConfig, AppError> {
    CONFIG.as_ref().map_err(|e| AppError::Config(e.clone()))
}
