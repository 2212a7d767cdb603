//! Ambient structured-logging/metrics facade consumed by `khoregos-audit`,
//! `khoregos-hook`, and `khoregos-webhook` (`SPEC_FULL.md` §4.10).

pub mod sink;
pub mod span;

pub use sink::{LoggingMetricsSink, MetricsSink, NoopMetricsSink};
pub use span::{hook_span, lifecycle_span};
