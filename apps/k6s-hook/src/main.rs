//! Thin hook-subprocess entry point (`spec.md` §6): the host agent
//! runtime execs this once per tool call, feeding the tool-use payload
//! on stdin. All orchestration lives in `khoregos_hook`; this binary
//! only wires stdin to it and decides the exit code.
//!
//! Configuration (`k6s.yaml`) is parsed and validated by the
//! surrounding CLI, not here (`spec.md` §7) — a pipeline run without
//! any boundaries configured still logs tool-use events, it just never
//! denies anything.

use std::io::Read;

use anyhow::{Context, Result};
use khoregos_hook::{run, PipelineConfig, PipelineContext, PipelineOutcome};
use tracing_subscriber::EnvFilter;

/// Stdin payloads larger than this are rejected by `khoregos_hook::run`
/// itself, but capping the read here keeps a misbehaving parent from
/// making this process buffer an unbounded amount of memory.
const MAX_STDIN_BYTES: u64 = 1024 * 1024;

fn main() {
    install_tracing();

    match run_hook() {
        Ok(()) => {}
        Err(err) => tracing::error!(error = %err, "hook subprocess failed"),
    }
    // Never fail the parent tool call over anything happening in here.
    std::process::exit(0);
}

fn install_tracing() {
    let filter = match std::env::var("KHOREGOS_LOG") {
        Ok(directive) => EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("off")),
        Err(_) => EnvFilter::new("off"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

fn run_hook() -> Result<()> {
    let cwd = std::env::current_dir().context("resolving current directory")?;

    let mut payload = Vec::new();
    std::io::stdin()
        .take(MAX_STDIN_BYTES)
        .read_to_end(&mut payload)
        .context("reading hook payload from stdin")?;

    let mut ctx = PipelineContext::new(cwd, PipelineConfig::default());
    match run(&payload, &mut ctx)? {
        PipelineOutcome::NoOp(reason) => {
            tracing::debug!(?reason, "hook pipeline produced no audit activity");
        }
        PipelineOutcome::Processed(outcome) => {
            tracing::debug!(
                event_id = %outcome.primary_event_id,
                agent_id = %outcome.agent_id,
                violations = outcome.violation_ids.len(),
                "hook pipeline processed tool call"
            );
        }
    }
    Ok(())
}
