
use tps_core::{Brain, FatalError, InitialPath, StoreError, Termination};
use test_support::{call_log, FailingTask, FixedProposer, RecordingTask, SetWeight};

#[tokio::test]
async fn failing_second_task_stops_pass_and_persistence() {
    let log = call_log();
    let mut brain = Brain::builder_in_memory().add_sampler(FixedProposer::new(1.0))
                                              .add_task(RecordingTask::new("first", &log), 1)
                                              .add_task(FailingTask { log: log.clone() }, 1)
                                              .add_task(RecordingTask::new("third", &log), 1)
                                              .build()
                                              .expect("build");
    brain.seed_initial_paths(vec![InitialPath::default()]).await.expect("seed");

    let summary = brain.run_for_n_steps(5).await.expect("run returns a summary");
    assert_eq!(summary.steps_completed, 0);
    match summary.fatal_error() {
        Some(FatalError::Task { task, g, chain_index, step_number, .. }) => {
            assert_eq!(task, "failing");
            assert_eq!((*g, *chain_index, *step_number), (1, 0, 1));
        }
        other => panic!("unexpected termination: {other:?}"),
    }

    let names: Vec<String> = log.lock().unwrap().iter().map(|c| c.task.clone()).collect();
    assert_eq!(names, vec!["first".to_string(), "failing".to_string()]);
    // sólo el seed quedó persistido y la cadena no avanzó
    assert_eq!(brain.chain_history(0).await.unwrap().len(), 1);
    assert_eq!(brain.chain(0).unwrap().step_number, 0);
}

#[tokio::test]
async fn steps_persisted_before_the_failure_remain_valid() {
    let log = call_log();
    let mut brain = Brain::builder_in_memory().add_sampler(FixedProposer::new(1.0))
                                              .add_task(FailingTask { log: log.clone() }, 4)
                                              .build()
                                              .expect("build");
    brain.seed_initial_paths(vec![InitialPath::default()]).await.expect("seed");

    let summary = brain.run_for_n_steps(10).await.expect("run");
    assert!(matches!(summary.termination, Termination::Fatal(FatalError::Task { g: 4, .. })));
    assert_eq!(summary.steps_completed, 3);
    let history = brain.chain_history(0).await.unwrap();
    assert_eq!(history.len(), 4);
    assert!(history.iter().all(|r| r.verify()));
}

#[tokio::test]
async fn persistence_failure_is_fatal_and_not_retried() {
    let mut brain = Brain::builder_in_memory().add_sampler(FixedProposer::new(1.0))
                                              .add_sampler(FixedProposer::new(1.0))
                                              .build()
                                              .expect("build");
    brain.seed_initial_paths(vec![InitialPath::default()]).await.expect("seed");
    brain.storage().close().await.expect("close");

    let summary = brain.run_for_n_steps(4).await.expect("run");
    match summary.into_result() {
        Err(FatalError::Persistence { source, step_number, .. }) => {
            assert_eq!(source, StoreError::Closed);
            assert_eq!(step_number, 1);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(brain.chains().all(|c| c.step_number == 0));
}

#[tokio::test]
async fn task_writing_an_invalid_weight_is_not_persisted() {
    let log = call_log();
    let mut brain = Brain::builder_in_memory().add_sampler(FixedProposer::new(1.0))
                                              .add_task(SetWeight { weight: -3.0 }, 2)
                                              .add_task(RecordingTask::new("after", &log), 1)
                                              .build()
                                              .expect("build");
    brain.seed_initial_paths(vec![InitialPath::default()]).await.expect("seed");

    let summary = brain.run_for_n_steps(5).await.expect("run");
    match summary.fatal_error() {
        Some(FatalError::Persistence { step_number, source: StoreError::InvalidStep { .. }, .. }) => {
            assert_eq!(*step_number, 2);
        }
        other => panic!("unexpected termination: {other:?}"),
    }
    assert_eq!(summary.steps_completed, 1);
    let weights: Vec<f64> = brain.chain_history(0)
                                 .await
                                 .unwrap()
                                 .iter()
                                 .map(|r| r.weight)
                                 .collect();
    assert_eq!(weights, vec![1.0, 1.0]);
    assert_eq!(brain.chain(0).unwrap().step_number, 1);
}
