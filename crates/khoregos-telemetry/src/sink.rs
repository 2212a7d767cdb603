//! A small facade over metrics export, deliberately narrow: `spec.md`
//! §1 puts OTLP/Prometheus exporters out of scope for the core, but the
//! two concrete signals it names in-line — the `audit_events_total`
//! counter (§4.3) and the tool-call duration histogram (§4.7) — still
//! need somewhere to go. An external exporter implements [`MetricsSink`];
//! the core ships only [`NoopMetricsSink`] and [`LoggingMetricsSink`].

use std::collections::BTreeMap;

/// A destination for the two metric shapes the governance engine emits.
/// `Send + Sync` so a single sink can be shared across hook invocations
/// and lifecycle processes via `Arc`.
pub trait MetricsSink: Send + Sync {
    /// Increment a named counter by one, tagged with string labels.
    fn incr_counter(&self, name: &str, labels: &BTreeMap<String, String>);

    /// Record one sample (in seconds) into a named histogram.
    fn record_histogram(&self, name: &str, seconds: f64, labels: &BTreeMap<String, String>);
}

/// Discards every signal. The default for hook processes that have not
/// been configured with an OTLP exporter (`spec.md` §5).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn incr_counter(&self, _name: &str, _labels: &BTreeMap<String, String>) {}
    fn record_histogram(&self, _name: &str, _seconds: f64, _labels: &BTreeMap<String, String>) {}
}

/// Emits every signal as a `tracing` event at `debug` level instead of
/// exporting it anywhere — useful for local development and for the
/// test suite's fan-out assertions.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMetricsSink;

impl MetricsSink for LoggingMetricsSink {
    fn incr_counter(&self, name: &str, labels: &BTreeMap<String, String>) {
        tracing::debug!(metric = name, ?labels, "counter incremented");
    }

    fn record_histogram(&self, name: &str, seconds: f64, labels: &BTreeMap<String, String>) {
        tracing::debug!(metric = name, seconds, ?labels, "histogram sample recorded");
    }
}
