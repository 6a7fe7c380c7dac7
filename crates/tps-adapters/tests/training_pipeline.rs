use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tps_adapters::{shared_trainer, DensityCollectionTask, SaveModelTask, Trainer, TrainingTask};
use tps_core::{Brain, InitialPath, InMemoryStorage, MoveProposer, Proposal, ProposalFailure, ProposalRequest, Storage};
use tps_model::{DensityCollector, EeParams, ExpectedEfficiency, LogisticRcModel, RcModel, TrainSet};

/// Shots deterministas: descriptor positivo termina en B, negativo en A.
struct ToyShooter;

#[async_trait]
impl MoveProposer for ToyShooter {
    fn kind(&self) -> &str {
        "two_way_shooting"
    }

    async fn propose(&self, request: ProposalRequest) -> Result<Proposal, ProposalFailure> {
        let x = if (request.step_number + request.chain_index as u64) % 2 == 0 { 1.0 } else { -1.0 };
        let mut proposal = Proposal::with_probability(0.7);
        proposal.descriptors = Some(vec![x]);
        proposal.states_reached = Some(if x > 0.0 { vec![0.0, 2.0] } else { vec![2.0, 0.0] });
        Ok(proposal)
    }
}

#[tokio::test]
async fn training_tasks_annotate_steps_and_save_model() {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let trainer = shared_trainer(LogisticRcModel::new(1),
                                 TrainSet::new(2),
                                 ExpectedEfficiency::new(EeParams { lr_0: 5.0,
                                                                    interval: 2,
                                                                    ..EeParams::default() }));
    let collector = Arc::new(Mutex::new(DensityCollector::new(10).unwrap()));

    let mut brain = Brain::builder(Arc::clone(&storage)).add_sampler(ToyShooter)
                                                        .add_sampler(ToyShooter)
                                                        .add_task(TrainingTask::new(Arc::clone(&trainer)), 1)
                                                        .add_task(DensityCollectionTask::new(Arc::clone(&collector)), 1)
                                                        .add_task(SaveModelTask::new(Arc::clone(&trainer), Arc::clone(&storage), "rcmodel"), 5)
                                                        .build()
                                                        .expect("build");
    brain.seed_initial_paths(vec![InitialPath::default()]).await.expect("seed");
    let summary = brain.run_for_n_steps(20).await.expect("run");
    assert!(summary.reached_target());

    // cada step persistido lleva la predicción hecha por la task
    for chain in 0..2 {
        let history = brain.chain_history(chain).await.unwrap();
        assert!(history[1..].iter().all(|r| r.predicted_values.as_ref().map(Vec::len) == Some(1)));
        assert!(history[0].predicted_values.is_none());
    }

    {
        let t = trainer.lock().await;
        assert_eq!(t.trainset.len(), 20);
        assert_eq!(t.ee.hook_count(), 20);
        assert_eq!(t.ee.expected_p().len(), 20);
        assert!(t.model.p(&[1.0]).unwrap()[0] > 0.5);
    }
    assert_eq!(collector.lock().await.total_weight(), 20.0);

    // guardado en g = 5, 10, 15, 20; la última versión es restaurable
    let saved = storage.load_model_state("rcmodel").await.unwrap().expect("saved model");
    let restored = Trainer::<LogisticRcModel>::from_snapshot(saved).unwrap();
    assert_eq!(restored.trainset.len(), 20);
}

#[tokio::test]
async fn steps_without_shot_data_pass_through() {
    struct Bare;

    #[async_trait]
    impl MoveProposer for Bare {
        fn kind(&self) -> &str {
            "bare"
        }
        async fn propose(&self, _r: ProposalRequest) -> Result<Proposal, ProposalFailure> {
            Ok(Proposal::with_probability(1.0))
        }
    }

    let trainer = shared_trainer(LogisticRcModel::new(1), TrainSet::new(2), ExpectedEfficiency::default());
    let mut brain = Brain::builder_in_memory().add_sampler(Bare)
                                              .add_task(TrainingTask::new(Arc::clone(&trainer)), 1)
                                              .build()
                                              .expect("build");
    brain.seed_initial_paths(vec![InitialPath::default()]).await.expect("seed");
    let summary = brain.run_for_n_steps(3).await.expect("run");
    assert!(summary.reached_target());
    assert!(trainer.lock().await.trainset.is_empty());
}

#[tokio::test]
async fn descriptor_mismatch_is_a_fatal_task_error() {
    let trainer = shared_trainer(LogisticRcModel::new(3), TrainSet::new(2), ExpectedEfficiency::default());
    let mut brain = Brain::builder_in_memory().add_sampler(ToyShooter)
                                              .add_task(TrainingTask::new(trainer), 1)
                                              .build()
                                              .expect("build");
    brain.seed_initial_paths(vec![InitialPath::default()]).await.expect("seed");
    let summary = brain.run_for_n_steps(3).await.expect("run");
    match summary.fatal_error() {
        Some(tps_core::FatalError::Task { task, .. }) => assert_eq!(task, "training"),
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(brain.chain_history(0).await.unwrap().len(), 1);
}

#[tokio::test]
async fn rejected_point_leaves_expected_p_in_step_with_trainset() {
    struct ThreeStates;

    #[async_trait]
    impl MoveProposer for ThreeStates {
        fn kind(&self) -> &str {
            "three_states"
        }
        async fn propose(&self, _r: ProposalRequest) -> Result<Proposal, ProposalFailure> {
            let mut proposal = Proposal::with_probability(1.0);
            proposal.descriptors = Some(vec![0.3]);
            proposal.states_reached = Some(vec![1.0, 0.0, 1.0]);
            Ok(proposal)
        }
    }

    let trainer = shared_trainer(LogisticRcModel::new(1), TrainSet::new(2), ExpectedEfficiency::default());
    let mut brain = Brain::builder_in_memory().add_sampler(ThreeStates)
                                              .add_task(TrainingTask::new(Arc::clone(&trainer)), 1)
                                              .build()
                                              .expect("build");
    brain.seed_initial_paths(vec![InitialPath::default()]).await.expect("seed");
    let summary = brain.run_for_n_steps(2).await.expect("run");
    assert!(matches!(summary.fatal_error(), Some(tps_core::FatalError::Task { .. })));

    let t = trainer.lock().await;
    assert!(t.trainset.is_empty());
    assert!(t.ee.expected_p().is_empty());
    assert_eq!(t.ee.hook_count(), 0);
}
