//! `AuditLogger` — append audit events with correct sequence and chain,
//! then fan out to telemetry/webhook/plugin (`spec.md` §4.3).
//!
//! Side-effect handles (telemetry sink, webhook dispatcher, plugin
//! manager) are explicitly passed at construction rather than reached
//! for as ambient singletons, per the Design Notes' guidance; once a
//! logger has served its first `log()` call they should not be swapped
//! out from under it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use khoregos_store::model::{AuditEvent, EventType, Severity};
use khoregos_store::Store;
use khoregos_telemetry::MetricsSink;
use khoregos_webhook::{SessionContext, WebhookDispatcher};
use rusqlite::OptionalExtension;

use crate::error::{AuditError, Result};
use crate::request::{EventQuery, LogRequest};

pub struct AuditLogger {
    store: Arc<Store>,
    session_id: String,
    trace_id: Option<String>,
    signing_key: Option<[u8; khoregos_signing::KEY_LEN]>,
    telemetry: Option<Arc<dyn MetricsSink>>,
    webhook: Option<Arc<WebhookDispatcher>>,
    plugins: Option<Arc<khoregos_plugin::PluginManager>>,
}

impl AuditLogger {
    /// Load `max(sequence)` for the session (for reporting purposes —
    /// `log()` always re-reads it fresh inside its own transaction, per
    /// `spec.md` §5's concurrency guarantee).
    pub fn start(
        store: Arc<Store>,
        session_id: impl Into<String>,
        trace_id: Option<String>,
        signing_key: Option<[u8; khoregos_signing::KEY_LEN]>,
    ) -> Result<Self> {
        let session_id = session_id.into();
        store.connect()?;
        Ok(Self {
            store,
            session_id,
            trace_id,
            signing_key,
            telemetry: None,
            webhook: None,
            plugins: None,
        })
    }

    pub fn with_telemetry(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    pub fn with_webhook(mut self, dispatcher: Arc<WebhookDispatcher>) -> Self {
        self.webhook = Some(dispatcher);
        self
    }

    pub fn with_plugins(mut self, plugins: Arc<khoregos_plugin::PluginManager>) -> Self {
        self.plugins = Some(plugins);
        self
    }

    /// Writes are synchronous; there is no in-memory buffer to flush.
    pub fn stop(&self) {}

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Append one audit event. Sequence and (if signing is enabled) the
    /// hmac chain link are both recomputed from the freshest row inside
    /// one transaction, so concurrent hook processes serialize correctly
    /// through the database's own locking (`spec.md` §5) instead of
    /// through any in-process cache.
    pub fn log(&self, request: LogRequest) -> Result<AuditEvent> {
        let session_id = self.session_id.clone();
        let trace_id = self.trace_id.clone();
        let signing_key = self.signing_key;

        let event = self.store.transaction(move |conn| {
            let current_max: i64 = conn.query_row(
                "SELECT COALESCE(MAX(sequence), 0) FROM audit_events WHERE session_id = ?1",
                rusqlite::params![session_id],
                |row| row.get(0),
            )?;
            let sequence = current_max + 1;

            let mut event = AuditEvent::new(&session_id, sequence, request.event_type.clone(), request.action.clone());
            if let Some(agent_id) = &request.agent_id {
                event = event.with_agent(agent_id.clone());
            }
            if let Some(details) = merge_trace_id(request.details.clone(), trace_id.as_deref()) {
                event = event.with_details(details);
            }
            if !request.files.is_empty() {
                event = event.with_files(request.files.clone());
            }
            if let Some(gate_id) = &request.gate_id {
                event = event.with_gate(gate_id.clone());
            }
            event = event.with_severity(request.severity.unwrap_or(Severity::Info));

            if let Some(key) = &signing_key {
                let previous_hmac: Option<String> = conn
                    .query_row(
                        "SELECT hmac FROM audit_events WHERE session_id = ?1 AND sequence = ?2",
                        rusqlite::params![session_id, sequence - 1],
                        |row| row.get::<_, Option<String>>(0),
                    )
                    .optional()?
                    .flatten();
                let previous = previous_hmac.unwrap_or_else(|| khoregos_signing::genesis(&session_id));
                let hmac = khoregos_signing::compute_hmac(key, &previous, &event)
                    .map_err(|err| khoregos_store::StoreError::Schema(err.to_string()))?;
                event = event.with_hmac(hmac);
            }

            let columns = event.to_columns();
            let col_list = columns.iter().map(|(c, _)| *c).collect::<Vec<_>>().join(", ");
            let placeholders = (1..=columns.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!("INSERT INTO audit_events ({col_list}) VALUES ({placeholders})");
            let params: Vec<&dyn rusqlite::ToSql> = columns.iter().map(|(_, v)| v.as_ref()).collect();
            conn.execute(&sql, params.as_slice())?;

            Ok(event)
        }).map_err(AuditError::from)?;

        self.fan_out(&event);
        Ok(event)
    }

    fn fan_out(&self, event: &AuditEvent) {
        if let Some(telemetry) = &self.telemetry {
            let mut labels = BTreeMap::new();
            labels.insert("event_type".to_string(), event.event_type.clone());
            labels.insert("severity".to_string(), event.severity.clone());
            telemetry.incr_counter("audit_events_total", &labels);
        }

        if let Some(webhook) = &self.webhook {
            let session = SessionContext {
                session_id: self.session_id.clone(),
                trace_id: self.trace_id.clone(),
            };
            // Deliveries run on their own threads; production drops the
            // handles (spec.md §9 Design Notes), tests join them.
            let _ = webhook.dispatch(event, &session);
        }

        if let Some(plugins) = &self.plugins {
            plugins.on_audit_event(event);
            match event.event_type() {
                EventType::ToolUse => plugins.on_tool_use(event),
                EventType::GateTriggered => plugins.on_gate_trigger(event),
                _ => {}
            }
        }
    }

    pub fn get_events(&self, query: EventQuery) -> Result<Vec<AuditEvent>> {
        let mut where_clauses = vec!["session_id = ?1".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(self.session_id.clone())];

        if let Some(event_type) = &query.event_type {
            params.push(Box::new(event_type.clone()));
            where_clauses.push(format!("event_type = ?{}", params.len()));
        }
        if let Some(agent_id) = &query.agent_id {
            params.push(Box::new(agent_id.clone()));
            where_clauses.push(format!("agent_id = ?{}", params.len()));
        }
        if let Some(since) = &query.since {
            params.push(Box::new(since.to_rfc3339()));
            where_clauses.push(format!("timestamp >= ?{}", params.len()));
        }
        if let Some(severity) = &query.severity {
            params.push(Box::new(severity.as_str().to_string()));
            where_clauses.push(format!("severity = ?{}", params.len()));
        }
        if let Some(trace_id) = &query.trace_id {
            params.push(Box::new(trace_id.clone()));
            where_clauses.push(format!(
                "json_extract(details, '$.trace_id') = ?{}",
                params.len()
            ));
        }

        let mut sql = format!(
            "SELECT * FROM audit_events WHERE {} ORDER BY sequence DESC",
            where_clauses.join(" AND ")
        );
        if let Some(limit) = query.limit {
            params.push(Box::new(limit));
            sql.push_str(&format!(" LIMIT ?{}", params.len()));
        }
        if let Some(offset) = query.offset {
            params.push(Box::new(offset));
            sql.push_str(&format!(" OFFSET ?{}", params.len()));
        }

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        Ok(self.store.fetch_all(&sql, &param_refs, AuditEvent::from_row)?)
    }

    pub fn get_event_count(&self) -> Result<i64> {
        Ok(self
            .store
            .fetch_one(
                "SELECT COUNT(*) FROM audit_events WHERE session_id = ?1",
                &[&self.session_id],
                |row| row.get(0),
            )?
            .unwrap_or(0))
    }
}

fn merge_trace_id(details: Option<serde_json::Value>, trace_id: Option<&str>) -> Option<serde_json::Value> {
    let Some(trace_id) = trace_id else {
        return details;
    };
    let mut map = match details {
        Some(serde_json::Value::Object(map)) => map,
        Some(other) => {
            let mut map = serde_json::Map::new();
            map.insert("value".to_string(), other);
            map
        }
        None => serde_json::Map::new(),
    };
    map.insert("trace_id".to_string(), serde_json::Value::String(trace_id.to_string()));
    Some(serde_json::Value::Object(map))
}
