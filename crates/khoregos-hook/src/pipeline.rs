//! The post-tool-use pipeline itself (`spec.md` §4.7): one call per tool
//! invocation, independently testable without a subprocess.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use khoregos_audit::{AuditLogger, LogRequest};
use khoregos_boundary::BoundaryEnforcer;
use khoregos_state::StateManager;
use khoregos_store::model::{EventType, Severity};
use khoregos_store::Store;

use crate::agent_identity::resolve_agent;
use crate::config::PipelineConfig;
use crate::dependency_diff::diff_package_json;
use crate::error::Result;
use crate::files_affected::derive_files_affected;
use crate::internal_tools::is_internal_tool;
use crate::payload::HookPayload;
use crate::project_root::{read_live_session_id, resolve_project_root};
use crate::severity::classify;
use crate::{sensitive, strict};

/// Why a pipeline run produced no audit activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoOpReason {
    MalformedPayload,
    NoLiveSession,
    InternalTool,
}

#[derive(Debug, Clone)]
pub struct ProcessedOutcome {
    pub primary_event_id: String,
    pub agent_id: String,
    pub violation_ids: Vec<String>,
    pub gate_event_ids: Vec<String>,
    pub dependency_event_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    NoOp(NoOpReason),
    Processed(ProcessedOutcome),
}

/// Per-invocation context: the working directory to resolve the
/// governed project from, and the already-parsed configuration the
/// pipeline enforces against. Reused across calls within one process so
/// the backing `Store` connection is not re-opened every time.
pub struct PipelineContext {
    cwd: PathBuf,
    config: PipelineConfig,
    store: Option<Arc<Store>>,
}

impl PipelineContext {
    pub fn new(cwd: impl Into<PathBuf>, config: PipelineConfig) -> Self {
        Self { cwd: cwd.into(), config, store: None }
    }

    fn store_for(&mut self, project_root: &std::path::Path) -> Arc<Store> {
        let wanted = khoregos_store::layout::db_path(project_root);
        if let Some(store) = &self.store {
            if store.path() == wanted.as_path() {
                return store.clone();
            }
        }
        let store = Arc::new(Store::new(project_root));
        self.store = Some(store.clone());
        store
    }
}

/// Run the pipeline for one hook invocation.
pub fn run(payload: &[u8], ctx: &mut PipelineContext) -> Result<PipelineOutcome> {
    let Some(parsed) = HookPayload::parse(payload) else {
        return Ok(PipelineOutcome::NoOp(NoOpReason::MalformedPayload));
    };

    let Some(project_root) = resolve_project_root(&ctx.cwd) else {
        return Ok(PipelineOutcome::NoOp(NoOpReason::NoLiveSession));
    };
    let Some(session_id) = read_live_session_id(&project_root) else {
        return Ok(PipelineOutcome::NoOp(NoOpReason::NoLiveSession));
    };

    if is_internal_tool(&parsed.tool_name) {
        return Ok(PipelineOutcome::NoOp(NoOpReason::InternalTool));
    }

    let _span = khoregos_telemetry::hook_span(&parsed.tool_name, &session_id).entered();

    let store = ctx.store_for(&project_root);
    store.connect()?;
    let state = StateManager::new(store.clone());

    let trace_id = state.get_session(&session_id)?.and_then(|s| s.trace_id);
    let signing_key = khoregos_signing::load_key(&project_root)?;
    let mut logger = AuditLogger::start(store.clone(), session_id.clone(), trace_id, signing_key)?;
    if let Some(sink) = &ctx.config.telemetry {
        logger = logger.with_telemetry(sink.clone());
    }
    if let Some(webhook) = &ctx.config.webhook {
        logger = logger.with_webhook(webhook.clone());
    }

    let agent = resolve_agent(&state, &session_id, parsed.session_id.as_deref())?;
    let files = derive_files_affected(&parsed.tool_input);

    let enforcer = BoundaryEnforcer::new(
        store.clone(),
        session_id.clone(),
        project_root.clone(),
        ctx.config.boundaries.clone(),
    );

    let new_count = state.increment_tool_call_count(&agent.id)?;
    if let Some(limit) = enforcer
        .get_boundary_for_agent(&agent.name)
        .and_then(|b| b.max_tool_calls_per_session)
    {
        let limit = i64::from(limit);
        if new_count == limit + 1 {
            logger.log(
                LogRequest::new(
                    EventType::BoundaryViolation,
                    format!("tool_call_count exceeded ({new_count}/{limit})"),
                )
                .with_agent(agent.id.clone())
                .with_severity(Severity::Warning),
            )?;
        }
    }

    let violation_ids = if enforcer.is_strict_for(&agent.name) && strict::is_write_like(&parsed.tool_name) {
        strict::enforce(&logger, &enforcer, &project_root, &agent.id, &agent.name, &files)?
    } else {
        Vec::new()
    };

    let command = parsed.tool_input.get("command").and_then(|v| v.as_str());
    let severity = classify(&files, command, !violation_ids.is_empty());

    let mut details = serde_json::Map::new();
    if let Some(duration_ms) = parsed.duration_ms() {
        details.insert("duration_ms".to_string(), serde_json::json!(duration_ms));
        if let Some(sink) = &ctx.config.telemetry {
            let mut labels = BTreeMap::new();
            labels.insert("tool_name".to_string(), parsed.tool_name.clone());
            sink.record_histogram("tool_call_duration_seconds", duration_ms as f64 / 1000.0, &labels);
        }
    }

    let primary = logger.log(
        LogRequest::new(EventType::ToolUse, parsed.tool_name.clone())
            .with_agent(agent.id.clone())
            .with_files(files.clone())
            .with_severity(severity)
            .with_details(serde_json::Value::Object(details)),
    )?;

    let gate_event_ids = if strict::is_write_like(&parsed.tool_name) {
        sensitive::annotate(&logger, &agent.id, &files, &ctx.config.review_rules)?
    } else {
        Vec::new()
    };

    let mut dependency_event_ids = Vec::new();
    for file in &files {
        if std::path::Path::new(file).file_name().and_then(|n| n.to_str()) != Some("package.json") {
            continue;
        }
        let absolute = if std::path::Path::new(file).is_absolute() {
            PathBuf::from(file)
        } else {
            project_root.join(file)
        };
        for change in diff_package_json(&project_root, &absolute) {
            let event = logger.log(
                LogRequest::new(change.event_type(), change.describe())
                    .with_agent(agent.id.clone())
                    .with_files(vec![file.clone()])
                    .with_severity(Severity::Warning),
            )?;
            dependency_event_ids.push(event.id);
        }
    }

    Ok(PipelineOutcome::Processed(ProcessedOutcome {
        primary_event_id: primary.id,
        agent_id: agent.id,
        violation_ids,
        gate_event_ids,
        dependency_event_ids,
    }))
}
