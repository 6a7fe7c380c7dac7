use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tps_core::{InMemoryStorage, Storage};
use tps_persistence::pg::{build_pool_from_env, PgStorage, PoolProvider};
use tpsflow_rust::demo::run_demo;
use tpsflow_rust::{app_config, AppError};

fn storage_for(run_pg: bool) -> Result<Arc<dyn Storage>, AppError> {
    if run_pg {
        let pool = build_pool_from_env()?;
        let store = PgStorage::new(PoolProvider { pool });
        println!("[PG DEMO] store_id={}", store.store_id());
        return Ok(Arc::new(store));
    }
    Ok(Arc::new(InMemoryStorage::new()))
}

async fn run() -> Result<(), AppError> {
    let cfg = app_config()?;
    let run_pg = cfg.run_pg_demo && cfg.database_url.is_some();
    if cfg.run_pg_demo && !run_pg {
        eprintln!("[PG DEMO] Skipping (DATABASE_URL no definido)");
    }
    let storage = storage_for(run_pg)?;
    let report = run_demo(cfg, Arc::clone(&storage), Duration::from_millis(5)).await?;

    let s = &report.summary;
    println!("run {}: steps={} accepts={} termination={:?}",
             s.run_id, s.steps_completed, s.accepts_completed, s.termination);
    for (chain, n) in s.steps_per_chain.iter().enumerate() {
        println!("  chain {chain}: {n} steps");
    }
    for h in &s.halted {
        println!("  chain {} halted: {}", h.chain_index, h.failure);
    }
    println!("trainset: {} puntos", report.trainset_len);
    println!("p_B(-1, 0, 1) = {:.3?}", report.predictions);
    println!("densidad p_B: {:.2?}", report.density);
    storage.close().await?;
    info!("demo:done");
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run().await {
        error!("demo:failed err={e}");
        std::process::exit(1);
    }
}
