//! Cross-crate pipeline scenarios (`spec.md` §8). These exercise the
//! full stack — store, state, boundary, audit — through `khoregos_hook`,
//! so unlike the rest of this workspace they live in an integration
//! `tests/` directory rather than inline `#[cfg(test)]` modules.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use khoregos_boundary::{Boundary, Enforcement};
use khoregos_hook::{run, NoOpReason, PipelineConfig, PipelineContext, PipelineOutcome};
use khoregos_state::StateManager;
use khoregos_store::layout;
use khoregos_store::Store;

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git").args(args).current_dir(dir).status().unwrap();
    assert!(status.success());
}

fn init_project(dir: &Path) -> String {
    let store = Arc::new(Store::new(dir));
    store.connect().unwrap();
    let state = StateManager::new(store);
    let session = state.create_session(None, None, None).unwrap();
    fs::create_dir_all(dir.join(layout::STATE_DIR)).unwrap();
    fs::write(
        layout::daemon_state_path(dir),
        format!(r#"{{"session_id":"{}"}}"#, session.id),
    )
    .unwrap();
    session.id
}

fn strict_boundary() -> Boundary {
    Boundary {
        pattern: "*".to_string(),
        allowed_paths: Vec::new(),
        forbidden_paths: vec!["**/secrets/**".to_string()],
        enforcement: Enforcement::Strict,
        max_tool_calls_per_session: None,
    }
}

#[test]
fn unknown_project_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = PipelineContext::new(dir.path(), PipelineConfig::default());
    let payload = br#"{"tool_name":"Write","tool_input":{"file_path":"a.txt"}}"#;
    let outcome = run(payload, &mut ctx).unwrap();
    assert!(matches!(outcome, PipelineOutcome::NoOp(NoOpReason::NoLiveSession)));
}

#[test]
fn internal_tools_are_not_logged() {
    let dir = tempfile::tempdir().unwrap();
    init_project(dir.path());
    let mut ctx = PipelineContext::new(dir.path(), PipelineConfig::default());
    let payload = br#"{"tool_name":"TodoWrite","tool_input":{}}"#;
    let outcome = run(payload, &mut ctx).unwrap();
    assert!(matches!(outcome, PipelineOutcome::NoOp(NoOpReason::InternalTool)));
}

#[test]
fn scenario_e_strict_revert_restores_tracked_file() {
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init"]);
    git(dir.path(), &["config", "user.email", "test@example.com"]);
    git(dir.path(), &["config", "user.name", "test"]);
    fs::create_dir_all(dir.path().join("secrets")).unwrap();
    fs::write(dir.path().join("secrets/token.txt"), "original-token").unwrap();
    git(dir.path(), &["add", "secrets/token.txt"]);
    git(dir.path(), &["commit", "-m", "initial"]);

    init_project(dir.path());
    // Simulate the tool having already tampered with the file before the
    // post-tool-use hook runs.
    fs::write(dir.path().join("secrets/token.txt"), "leaked-token").unwrap();

    let config = PipelineConfig { boundaries: vec![strict_boundary()], ..Default::default() };
    let mut ctx = PipelineContext::new(dir.path(), config);
    let payload = br#"{"tool_name":"Write","tool_input":{"file_path":"secrets/token.txt"}}"#;
    let outcome = run(payload, &mut ctx).unwrap();

    let PipelineOutcome::Processed(processed) = outcome else {
        panic!("expected a processed outcome");
    };
    assert_eq!(processed.violation_ids.len(), 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("secrets/token.txt")).unwrap(),
        "original-token"
    );
}

#[test]
fn scenario_f_resource_limit_logs_once() {
    let dir = tempfile::tempdir().unwrap();
    init_project(dir.path());

    let config = PipelineConfig {
        boundaries: vec![Boundary {
            pattern: "*".to_string(),
            allowed_paths: Vec::new(),
            forbidden_paths: Vec::new(),
            enforcement: Enforcement::Advisory,
            max_tool_calls_per_session: Some(2),
        }],
        ..Default::default()
    };
    let mut ctx = PipelineContext::new(dir.path(), config);
    let payload = br#"{"tool_name":"Read","tool_input":{"file_path":"a.txt"}}"#;

    run(payload, &mut ctx).unwrap();
    run(payload, &mut ctx).unwrap();
    let outcome = run(payload, &mut ctx).unwrap();

    let PipelineOutcome::Processed(_) = outcome else {
        panic!("expected a processed outcome");
    };
    // Exactly one boundary_violation row should exist for the third call
    // that pushed the count to 3 against a limit of 2.
    let store = Arc::new(Store::new(dir.path()));
    store.connect().unwrap();
    let count: i64 = store
        .fetch_one(
            "SELECT COUNT(*) FROM audit_events WHERE event_type = 'boundary_violation'",
            &[],
            |row| row.get(0),
        )
        .unwrap()
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn scenario_g_dependency_diff_emits_four_events() {
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init"]);
    git(dir.path(), &["config", "user.email", "test@example.com"]);
    git(dir.path(), &["config", "user.name", "test"]);
    fs::write(
        dir.path().join("package.json"),
        r#"{
            "dependencies": {"lodash": "^4.17.20", "chalk": "^4.0.0"},
            "devDependencies": {"typescript": "^5.0.0", "vitest": "^1.0.0"}
        }"#,
    )
    .unwrap();
    git(dir.path(), &["add", "package.json"]);
    git(dir.path(), &["commit", "-m", "initial"]);

    init_project(dir.path());
    fs::write(
        dir.path().join("package.json"),
        r#"{
            "dependencies": {"lodash": "^4.17.21", "zod": "^3.22.0"},
            "devDependencies": {"typescript": "^5.0.0", "vitest": "^1.1.0"}
        }"#,
    )
    .unwrap();

    let mut ctx = PipelineContext::new(dir.path(), PipelineConfig::default());
    let payload = br#"{"tool_name":"Edit","tool_input":{"file_path":"package.json"}}"#;
    let outcome = run(payload, &mut ctx).unwrap();

    let PipelineOutcome::Processed(processed) = outcome else {
        panic!("expected a processed outcome");
    };
    assert_eq!(processed.dependency_event_ids.len(), 4);
}
