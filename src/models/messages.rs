use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Author id stamped on the snapshot a client receives when it joins.
pub const SERVER_AUTHOR: &str = "server";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Full replacement text submitted by a client.
    Update,
    /// Server snapshot of the current text.
    Sync,
    /// Any kind this server does not understand. Ignored by rooms.
    #[serde(other)]
    Unknown,
}

/// Edit message exchanged over the socket in both directions.
///
/// `position` is reserved for partial updates and is always `0` on output.
/// Only `type` and `text` can make a frame undecodable; a malformed
/// `position` or `timestamp` falls back to `0` / `None`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EditMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(rename = "docID", default)]
    pub doc_id: String,
    #[serde(default, deserialize_with = "lenient_position")]
    pub position: i64,
    pub text: String,
    #[serde(rename = "userID", default)]
    pub user_id: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

fn lenient_position<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_i64().unwrap_or(0))
}

/// RFC 3339, or a zoneless date-time read as UTC. Anything else is `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Some(raw) = value.as_str() else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    Ok(NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc()))
}

impl EditMessage {
    /// Build a `sync` snapshot stamped with the current time.
    pub fn sync(doc_id: &str, text: &str, user_id: &str) -> Self {
        Self {
            kind: MessageKind::Sync,
            doc_id: doc_id.to_string(),
            position: 0,
            text: text.to_string(),
            user_id: user_id.to_string(),
            timestamp: Some(Utc::now()),
        }
    }

    pub fn update(doc_id: &str, text: &str, user_id: &str) -> Self {
        Self {
            kind: MessageKind::Update,
            ..Self::sync(doc_id, text, user_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_client_update() {
        let raw = r#"{"type":"update","docID":"doc1","position":12,"text":"hello","userID":"alice","timestamp":"2024-05-01T10:00:00Z"}"#;
        let msg: EditMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.kind, MessageKind::Update);
        assert_eq!(msg.doc_id, "doc1");
        assert_eq!(msg.text, "hello");
        assert_eq!(msg.user_id, "alice");
        assert!(msg.timestamp.is_some());
    }

    #[test]
    fn unknown_kind_is_not_a_decode_error() {
        let raw = r#"{"type":"cursor","docID":"doc1","text":""}"#;
        let msg: EditMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.kind, MessageKind::Unknown);
        assert_eq!(msg.text, "");
    }

    #[test]
    fn missing_type_is_rejected() {
        assert!(serde_json::from_str::<EditMessage>(r#"{"text":"x"}"#).is_err());
        assert!(serde_json::from_str::<EditMessage>("not json").is_err());
    }

    #[test]
    fn update_without_string_text_is_rejected() {
        let missing = r#"{"type":"update","docID":"doc1","userID":"A"}"#;
        assert!(serde_json::from_str::<EditMessage>(missing).is_err());
        let null = r#"{"type":"update","docID":"doc1","text":null,"userID":"A"}"#;
        assert!(serde_json::from_str::<EditMessage>(null).is_err());
        let number = r#"{"type":"update","docID":"doc1","text":42,"userID":"A"}"#;
        assert!(serde_json::from_str::<EditMessage>(number).is_err());
    }

    #[test]
    fn empty_timestamp_is_ignored() {
        let raw = r#"{"type":"update","docID":"doc1","text":"hi","timestamp":""}"#;
        let msg: EditMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.text, "hi");
        assert!(msg.timestamp.is_none());
    }

    #[test]
    fn zoneless_timestamp_is_read_as_utc() {
        let raw = r#"{"type":"update","docID":"doc1","text":"hi","timestamp":"0001-01-01T00:00:00"}"#;
        let msg: EditMessage = serde_json::from_str(raw).unwrap();
        let ts = msg.timestamp.unwrap();
        assert_eq!(ts.to_rfc3339(), "0001-01-01T00:00:00+00:00");
    }

    #[test]
    fn non_integer_position_falls_back_to_zero() {
        for position in ["1.5", "\"12\"", "null", "{}"] {
            let raw = format!(r#"{{"type":"update","docID":"doc1","position":{position},"text":"hi"}}"#);
            let msg: EditMessage = serde_json::from_str(&raw).unwrap();
            assert_eq!(msg.position, 0);
            assert_eq!(msg.text, "hi");
        }
    }

    #[test]
    fn sync_uses_wire_field_names() {
        let msg = EditMessage::sync("doc1", "hi", SERVER_AUTHOR);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "sync");
        assert_eq!(value["docID"], "doc1");
        assert_eq!(value["position"], 0);
        assert_eq!(value["text"], "hi");
        assert_eq!(value["userID"], "server");
        let ts = value["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
