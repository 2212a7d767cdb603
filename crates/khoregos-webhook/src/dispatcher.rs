//! Fire-and-forget HTTP delivery of signed event envelopes
//! (`spec.md` §4.8). `dispatch` schedules one asynchronous delivery per
//! interested target and returns immediately; per the Design Notes'
//! guidance on modeling "async-await hook fan-out," each delivery is a
//! `JoinHandle` a test may join and production code drops.

use std::sync::Arc;
use std::thread::JoinHandle;

use khoregos_store::model::AuditEvent;
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::config::WebhookTarget;
use crate::signature::sign;
use crate::state::run_delivery;
use crate::transport::{ReqwestTransport, Transport};

/// The correlation fields `spec.md` §6's envelope nests under `session`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "traceId")]
    pub trace_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    event: &'a AuditEvent,
    session: &'a SessionContext,
    timestamp: String,
}

pub struct WebhookDispatcher {
    targets: Vec<WebhookTarget>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
}

impl WebhookDispatcher {
    pub fn new(targets: Vec<WebhookTarget>) -> Self {
        Self {
            targets,
            transport: Arc::new(ReqwestTransport::new()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Construct with injected transport/clock — used by tests so no
    /// delivery touches the network or sleeps in real time.
    pub fn with_backends(
        targets: Vec<WebhookTarget>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            targets,
            transport,
            clock,
        }
    }

    /// Schedule a delivery to every target whose `events` filter matches
    /// `event`'s type. Never blocks the caller; never returns an error —
    /// per-target failures are logged once after retries exhaust
    /// (`spec.md` §4.8, §7).
    pub fn dispatch(&self, event: &AuditEvent, session: &SessionContext) -> Vec<JoinHandle<()>> {
        let body = match serde_json::to_vec(&Envelope {
            event,
            session,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(%err, "failed to serialize webhook envelope");
                return Vec::new();
            }
        };

        self.targets
            .iter()
            .filter(|target| target.wants(&event.event_type))
            .map(|target| {
                let url = target.url.clone();
                let secret = target.resolved_secret();
                let body = body.clone();
                let transport = self.transport.clone();
                let clock = self.clock.clone();

                std::thread::spawn(move || {
                    let signature = secret.as_deref().map(|secret| sign(secret, &body));
                    let outcome =
                        run_delivery(transport.as_ref(), clock.as_ref(), &url, &body, signature.as_deref());
                    if !outcome.succeeded() {
                        tracing::error!(url, attempts = outcome.attempts, "webhook delivery failed");
                    }
                })
            })
            .collect()
    }
}
