#![cfg(unix)]

use std::path::PathBuf;
use std::time::Duration;

use tps_adapters::{Engine, EngineError, EngineJob, EngineProposer, SubprocessEngine};
use tps_core::{Brain, InitialPath, ProposalFailure, Termination};

fn workdir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("tps-adapters-{name}-{}", std::process::id()))
}

fn job(chain_index: usize, step_number: u64) -> EngineJob {
    EngineJob { chain_index,
                step_number,
                input: "{}".into() }
}

#[tokio::test]
async fn successful_run_returns_stdout_and_workdir() {
    let root = workdir("ok");
    let engine = SubprocessEngine::new("sh", &root).args(["-c", "echo chain={chain} step={step}"]);
    let out = engine.run(job(1, 4)).await.expect("engine run");
    assert_eq!(out.stdout.trim(), "chain=1 step=4");
    assert_eq!(out.workdir, root.join("chain_1").join("step_4"));
    assert!(out.workdir.is_dir());
}

#[tokio::test]
async fn non_zero_exit_is_a_crash() {
    let engine = SubprocessEngine::new("sh", workdir("crash")).args(["-c", "echo oops >&2; exit 3"]);
    match engine.run(job(0, 1)).await {
        Err(EngineError::Crashed { exit_code, stderr }) => {
            assert_eq!(exit_code, Some(3));
            assert_eq!(stderr.trim(), "oops");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn slow_engine_times_out() {
    let engine = SubprocessEngine::new("sh", workdir("slow")).args(["-c", "sleep 5"])
                                                             .timeout(Duration::from_millis(200));
    assert!(matches!(engine.run(job(0, 1)).await, Err(EngineError::Timeout { .. })));
}

#[tokio::test]
async fn timeout_covers_blocked_stdin_write() {
    let engine = SubprocessEngine::new("sh", workdir("stdin")).args(["-c", "sleep 5"])
                                                              .timeout(Duration::from_millis(200));
    let big = EngineJob { chain_index: 0,
                          step_number: 1,
                          input: "x".repeat(1 << 20) };
    let started = std::time::Instant::now();
    assert!(matches!(engine.run(big).await, Err(EngineError::Timeout { .. })));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn engine_proposer_drives_a_brain() {
    let script = r#"cat > /dev/null; echo '{"acceptance_probability": 1.0, "states_reached": [1.0, 1.0]}'"#;
    let ok = SubprocessEngine::new("sh", workdir("brain")).args(["-c", script]);
    let broken = SubprocessEngine::new("sh", workdir("brain-broken")).args(["-c", "exit 9"]);

    let mut brain = Brain::builder_in_memory().add_sampler(EngineProposer::new(ok, "two_way_shooting"))
                                              .add_sampler(EngineProposer::new(broken, "two_way_shooting"))
                                              .build()
                                              .expect("build");
    brain.seed_initial_paths(vec![InitialPath::default()]).await.expect("seed");
    let summary = brain.run_for_n_steps(4).await.expect("run");

    assert_eq!(summary.termination, Termination::TargetReached);
    assert_eq!(summary.steps_per_chain, vec![4, 0]);
    assert_eq!(summary.halted[0].failure, ProposalFailure::EngineCrashed { exit_code: Some(9) });

    let history = brain.chain_history(0).await.unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.mover_kind.as_deref(), Some("two_way_shooting"));
    assert!(last.artifact.as_ref().unwrap().as_str().ends_with("step_4"));
}
