//! Webhook target configuration (`spec.md` §4.8). Parsing `k6s.yaml`
//! itself is out of core scope; `WebhookTarget` is the shape the
//! surrounding configuration layer is expected to deserialize into.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookTarget {
    pub url: String,
    /// Event types this target receives. Empty means "every event".
    #[serde(default)]
    pub events: Vec<String>,
    /// A literal secret, or `$VAR_NAME` to resolve from the environment.
    #[serde(default)]
    pub secret: Option<String>,
}

impl WebhookTarget {
    pub fn wants(&self, event_type: &str) -> bool {
        self.events.is_empty() || self.events.iter().any(|e| e == event_type)
    }

    /// Resolve `secret` against the process environment when prefixed
    /// with `$`. Returns `None` if no secret is configured, or if an
    /// env-var reference does not resolve.
    pub fn resolved_secret(&self) -> Option<String> {
        let raw = self.secret.as_ref()?;
        match raw.strip_prefix('$') {
            Some(var) => std::env::var(var).ok(),
            None => Some(raw.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_events_list_wants_everything() {
        let target = WebhookTarget {
            url: "https://example.com".into(),
            events: vec![],
            secret: None,
        };
        assert!(target.wants("tool_use"));
        assert!(target.wants("boundary_violation"));
    }

    #[test]
    fn non_empty_events_list_filters() {
        let target = WebhookTarget {
            url: "https://example.com".into(),
            events: vec!["boundary_violation".into()],
            secret: None,
        };
        assert!(target.wants("boundary_violation"));
        assert!(!target.wants("tool_use"));
    }

    #[test]
    fn literal_secret_is_used_as_is() {
        let target = WebhookTarget {
            url: "https://example.com".into(),
            events: vec![],
            secret: Some("literal-secret".into()),
        };
        assert_eq!(target.resolved_secret(), Some("literal-secret".to_string()));
    }

    #[test]
    fn dollar_prefixed_secret_resolves_from_env() {
        std::env::set_var("KHOREGOS_TEST_WEBHOOK_SECRET", "env-secret");
        let target = WebhookTarget {
            url: "https://example.com".into(),
            events: vec![],
            secret: Some("$KHOREGOS_TEST_WEBHOOK_SECRET".into()),
        };
        assert_eq!(target.resolved_secret(), Some("env-secret".to_string()));
        std::env::remove_var("KHOREGOS_TEST_WEBHOOK_SECRET");
    }
}
