//! Pipeline configuration. Parsing `k6s.yaml` itself is out of scope
//! here (`spec.md` §1, §6 — that's the surrounding CLI's job); this
//! crate only accepts the already-parsed shape.

use std::sync::Arc;

use khoregos_boundary::Boundary;
use khoregos_telemetry::MetricsSink;
use khoregos_webhook::WebhookDispatcher;

#[derive(Clone, Default)]
pub struct PipelineConfig {
    pub boundaries: Vec<Boundary>,
    /// Glob patterns for the sensitive-file annotation (`spec.md` §4.7,
    /// GLOSSARY "Review rule").
    pub review_rules: Vec<String>,
    pub webhook: Option<Arc<WebhookDispatcher>>,
    pub telemetry: Option<Arc<dyn MetricsSink>>,
}
