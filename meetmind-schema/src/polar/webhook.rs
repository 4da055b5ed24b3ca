use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope of a Polar webhook delivery.
///
/// `data` is left untyped because its shape depends on `type`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolarWebhookEvent {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub data: Value,
}

impl PolarWebhookEvent {
    /// Top-level keys of `data`, for logging.
    pub fn data_keys(&self) -> Vec<&str> {
        self.data
            .as_object()
            .map(|obj| obj.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_event_without_id() {
        let raw = r#"{"type":"order.paid","data":{"id":"ord_1","amount":100}}"#;
        let event: PolarWebhookEvent = serde_json::from_str(raw).expect("parse event");

        assert_eq!(event.event_type, "order.paid");
        assert!(event.id.is_none());
        assert_eq!(event.data_keys(), vec!["amount", "id"]);
    }

    #[test]
    fn rejects_event_without_type() {
        let raw = r#"{"data":{}}"#;
        assert!(serde_json::from_str::<PolarWebhookEvent>(raw).is_err());
    }
}
