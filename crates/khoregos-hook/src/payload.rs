//! Stdin payload parsing for the post-tool-use pipeline (`spec.md` §4.7,
//! §6 "Hook-pipeline stdin payload"). Fields are read defensively: the
//! host agent runtime's exact key names vary by release, so every time-
//! and duration-bearing field is looked up under a short list of known
//! aliases instead of a single fixed name.

use chrono::{DateTime, Utc};

/// Stdin reads are bounded to 1 MiB (`spec.md` §4.7); a payload at or
/// past this size is treated as truncated and the pipeline no-ops.
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct HookPayload {
    pub tool_name: String,
    pub tool_input: serde_json::Value,
    pub tool_response: Option<serde_json::Value>,
    /// The host runtime's correlation id for this conversation-like
    /// session — what `spec.md`'s glossary calls "external session id".
    /// Not to be confused with the governed-work `Session.id`.
    pub session_id: Option<String>,
    pub tool_use_id: Option<String>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    explicit_duration_ms: Option<f64>,
}

impl HookPayload {
    /// Parse one stdin payload. Returns `None` for anything that isn't a
    /// well-formed JSON object carrying a `tool_name` string — per
    /// `spec.md` §4.7 that becomes a pipeline no-op, never an error.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= MAX_PAYLOAD_BYTES {
            return None;
        }
        let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
        let obj = value.as_object()?;

        let tool_name = obj.get("tool_name")?.as_str()?.to_string();
        let tool_input = obj.get("tool_input").cloned().unwrap_or(serde_json::Value::Null);
        let tool_response = first_value(obj, &["tool_response", "tool_result", "result"]);
        let session_id = first_str(obj, &["session_id"]);
        let tool_use_id = first_str(obj, &["tool_use_id"]);
        let started_at = first_str(obj, &["started_at", "start_time", "startTime"]);
        let ended_at = first_str(
            obj,
            &["ended_at", "finished_at", "end_time", "endTime", "timestamp"],
        );

        const DURATION_KEYS: &[&str] = &["duration_ms", "durationMs", "elapsed_ms", "elapsedMs"];
        let explicit_duration_ms = first_f64(obj, DURATION_KEYS).or_else(|| {
            obj.get("timing")
                .and_then(|v| v.as_object())
                .and_then(|timing| first_f64(timing, DURATION_KEYS))
        });

        Some(Self {
            tool_name,
            tool_input,
            tool_response,
            session_id,
            tool_use_id,
            started_at,
            ended_at,
            explicit_duration_ms,
        })
    }

    /// Resolve a usable duration in milliseconds: an explicit field
    /// takes precedence; otherwise it is derived from the gap between
    /// `started_at` and `ended_at`. Any value outside `[0, 3_600_000]`
    /// is discarded (`spec.md` §4.7).
    pub fn duration_ms(&self) -> Option<i64> {
        let candidate = self
            .explicit_duration_ms
            .map(|ms| ms.round() as i64)
            .or_else(|| {
                let start: DateTime<Utc> = self.started_at.as_deref()?.parse().ok()?;
                let end: DateTime<Utc> = self.ended_at.as_deref()?.parse().ok()?;
                Some((end - start).num_milliseconds())
            })?;
        (0..=3_600_000).contains(&candidate).then_some(candidate)
    }
}

fn first_str(obj: &serde_json::Map<String, serde_json::Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(|v| v.as_str()).map(str::to_string))
}

fn first_value(
    obj: &serde_json::Map<String, serde_json::Value>,
    keys: &[&str],
) -> Option<serde_json::Value> {
    keys.iter().find_map(|k| obj.get(*k).cloned())
}

fn first_f64(obj: &serde_json::Map<String, serde_json::Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| obj.get(*k).and_then(|v| v.as_f64()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_payload() {
        let payload = HookPayload::parse(br#"{"tool_name":"Write","tool_input":{"path":"a.txt"}}"#).unwrap();
        assert_eq!(payload.tool_name, "Write");
        assert_eq!(payload.tool_input["path"], "a.txt");
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let huge = vec![b' '; MAX_PAYLOAD_BYTES];
        assert!(HookPayload::parse(&huge).is_none());
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(HookPayload::parse(b"not json").is_none());
    }

    #[test]
    fn missing_tool_name_is_rejected() {
        assert!(HookPayload::parse(br#"{"tool_input":{}}"#).is_none());
    }

    #[test]
    fn explicit_duration_takes_precedence_over_timestamps() {
        let payload = HookPayload::parse(
            br#"{"tool_name":"Write","tool_input":{},"duration_ms":250,
                 "started_at":"2026-01-01T00:00:00.000Z","ended_at":"2026-01-01T00:00:05.000Z"}"#,
        )
        .unwrap();
        assert_eq!(payload.duration_ms(), Some(250));
    }

    #[test]
    fn duration_falls_back_to_timestamp_gap() {
        let payload = HookPayload::parse(
            br#"{"tool_name":"Write","tool_input":{},
                 "started_at":"2026-01-01T00:00:00.000Z","ended_at":"2026-01-01T00:00:01.500Z"}"#,
        )
        .unwrap();
        assert_eq!(payload.duration_ms(), Some(1500));
    }

    #[test]
    fn out_of_range_duration_is_discarded() {
        let payload =
            HookPayload::parse(br#"{"tool_name":"Write","tool_input":{},"duration_ms":-5}"#).unwrap();
        assert_eq!(payload.duration_ms(), None);

        let payload =
            HookPayload::parse(br#"{"tool_name":"Write","tool_input":{},"duration_ms":3600001}"#).unwrap();
        assert_eq!(payload.duration_ms(), None);
    }

    #[test]
    fn duration_read_from_nested_timing_object() {
        let payload = HookPayload::parse(
            br#"{"tool_name":"Write","tool_input":{},"timing":{"durationMs":42}}"#,
        )
        .unwrap();
        assert_eq!(payload.duration_ms(), Some(42));
    }
}
