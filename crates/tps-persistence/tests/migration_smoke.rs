mod test_support;

use diesel::RunQueryDsl;
use test_support::{fresh_store, TEST_POOL};
use tps_core::{Step, StepDraft, Storage};

#[tokio::test]
async fn step_log_rejects_updates() {
    let Some(store) = fresh_store() else {
        eprintln!("skip (no DATABASE_URL)");
        return;
    };
    store.append(StepDraft::new(Step::seed(0, None, None))).await.expect("append");

    let pool = TEST_POOL.as_ref().expect("pool");
    let mut conn = pool.get().expect("conn");
    diesel::sql_query("SELECT 1 FROM model_states LIMIT 1").execute(&mut conn)
                                                           .expect("model_states exists");
    let res = diesel::sql_query("UPDATE step_log SET accepted = NOT accepted WHERE store_id = $1")
        .bind::<diesel::sql_types::Uuid, _>(store.store_id())
        .execute(&mut conn);
    assert!(res.is_err(), "step_log must be append-only");

    let history = store.iterate(0).await.expect("iterate");
    assert!(history[0].accepted);
}
