//! Types that mirror the task monitor's event JSON schema.

use serde::Deserialize;
use serde_json::Value;

/// One message pushed over the update channel: `{ "type": ..., "data": {...} }`.
#[derive(Debug, Deserialize, Clone)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    /// Swap target the server may attach. Never routed on: dispatch is by
    /// `kind` alone. Kept so the envelope mirrors the server's event schema.
    #[serde(default)]
    pub target: Option<String>,
}

impl Envelope {
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Activity {
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SystemMetrics {
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_keeps_data_as_raw_json() {
        let env = Envelope::parse(
            r#"{"type":"activity","data":{"message":"hi","timestamp":"2024-01-01T10:00:00Z"}}"#,
        )
        .unwrap();
        assert_eq!(env.kind, "activity");
        assert!(env.target.is_none());
        let a: Activity = serde_json::from_value(env.data).unwrap();
        assert_eq!(a.message, "hi");
    }

    #[test]
    fn envelope_carries_optional_target() {
        let env = Envelope::parse(r##"{"type":"task_update","data":{},"target":"#task-list"}"##)
            .unwrap();
        assert_eq!(env.kind, "task_update");
        assert_eq!(env.target.as_deref(), Some("#task-list"));
    }

    #[test]
    fn envelope_without_data_defaults_to_null() {
        let env = Envelope::parse(r#"{"type":"heartbeat"}"#).unwrap();
        assert!(env.data.is_null());
    }

    #[test]
    fn non_json_payload_is_an_error() {
        assert!(Envelope::parse("hello there").is_err());
        assert!(Envelope::parse(r#"{"data":{}}"#).is_err());
    }
}
