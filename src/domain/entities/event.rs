use serde::{Deserialize, Serialize};

/// One raw inbound event as delivered by the messaging service.
///
/// Only the fields the classifier looks at are typed; everything else the
/// service sent rides along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Event {
    pub fn message(
        channel: impl Into<String>,
        user: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            text: Some(text.into()),
            channel: Some(channel.into()),
            user: Some(user.into()),
            extra: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_keeps_passthrough_fields() {
        let raw = serde_json::json!({
            "type": "message",
            "text": "!ping",
            "channel": "C1",
            "user": "U1",
            "ts": "1700000000.000100"
        });
        let event: Event = serde_json::from_value(raw).unwrap();
        assert_eq!(event.text.as_deref(), Some("!ping"));
        assert_eq!(event.channel.as_deref(), Some("C1"));
        assert_eq!(event.extra.get("ts").and_then(|v| v.as_str()), Some("1700000000.000100"));
    }

    #[test]
    fn test_missing_text_is_none() {
        let raw = serde_json::json!({ "type": "presence_change", "user": "U1" });
        let event: Event = serde_json::from_value(raw).unwrap();
        assert!(event.text.is_none());
        assert!(event.channel.is_none());
    }
}
