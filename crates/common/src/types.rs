use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Default notification title used when the triggering message carries none.
pub const DEFAULT_NOTIFICATION_TITLE: &str = "New message";

/// A structured reference to another document, stored inside chat and message
/// records as `{"path": "clients/abc123"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRef {
    pub path: String,
}

/// A participant or sender reference as it appears on disk.
///
/// The chat feature has written two shapes over time: structured document
/// references and bare path strings. Both normalize to an identity via
/// [`Reference::identity`]; anything else is discarded at the boundary so the
/// rest of the pipeline only ever sees identity strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Doc(DocRef),
    Path(String),
    /// Unrecognized shape — normalizes to nothing.
    Other(Value),
}

impl Reference {
    /// Resolve this reference to an identity string, if possible.
    pub fn identity(&self) -> Option<String> {
        match self {
            Reference::Doc(doc) => trailing_segment(&doc.path),
            Reference::Path(path) => trailing_segment(path),
            Reference::Other(_) => None,
        }
    }
}

/// Extract the trailing path segment of a reference path.
///
/// `"clients/abc123"` and `"abc123"` both resolve to `"abc123"`.
/// Returns `None` when no non-empty segment exists.
pub fn trailing_segment(path: &str) -> Option<String> {
    path.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
}

/// The message document that triggered the pipeline. Read-only to this system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageRecord {
    /// Structured sender reference, preferred when present.
    pub sender_ref: Option<Reference>,
    /// Plain sender identity, used when no structured reference exists.
    pub sender_id: Option<String>,
    /// Free-text message body.
    pub text: Option<String>,
    /// Optional notification title override.
    pub title: Option<String>,
}

impl MessageRecord {
    /// Resolve the sender's identity.
    ///
    /// Prefers the structured reference's trailing path segment, falls back
    /// to the plain identity field. `None` means nobody is excluded from the
    /// recipient set.
    pub fn sender_identity(&self) -> Option<String> {
        self.sender_ref
            .as_ref()
            .and_then(Reference::identity)
            .or_else(|| {
                self.sender_id
                    .as_deref()
                    .and_then(trailing_segment)
            })
    }
}

/// The chat document holding the participant list. Read-only to this system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatRecord {
    /// Structured participant references, preferred when present.
    pub participant_refs: Option<Vec<Reference>>,
    /// Plain identity-path strings, the legacy representation.
    pub participants: Option<Vec<String>>,
}

impl ChatRecord {
    /// Normalize the participant list to identity strings, preserving order.
    ///
    /// Prefers `participantRefs`, falls back to `participants`. Entries that
    /// do not map to a non-empty identity are discarded.
    pub fn participant_identities(&self) -> Vec<String> {
        if let Some(refs) = &self.participant_refs {
            refs.iter().filter_map(Reference::identity).collect()
        } else if let Some(paths) = &self.participants {
            paths
                .iter()
                .filter_map(|path| trailing_segment(path))
                .collect()
        } else {
            Vec::new()
        }
    }
}

/// A user's profile document, holding their registered device tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileRecord {
    /// Registered push-delivery tokens. A missing or non-list-shaped field
    /// reads as empty rather than failing the lookup.
    #[serde(deserialize_with = "lenient_string_list")]
    pub device_tokens: Vec<String>,
}

/// Deserialize a list of strings, tolerating a missing or malformed field.
///
/// Non-array values and non-string elements collapse to nothing; profile
/// documents are written by several clients and token fields have been
/// observed in odd shapes.
fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let tokens = match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(token) => Some(token),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(tokens)
}

/// Human-visible part of a push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationBody {
    pub title: String,
    pub body: String,
}

/// Data map carried alongside the visible notification so the client can
/// route a tap to the right chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub chat_id: String,
    pub message_id: String,
}

/// The payload handed to the push transport, built fresh per event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub notification: NotificationBody,
    pub data: NotificationData,
}

impl NotificationPayload {
    /// Build the payload for a created message.
    ///
    /// Title defaults to [`DEFAULT_NOTIFICATION_TITLE`] and body to the empty
    /// string when the message omits them.
    pub fn for_message(message: &MessageRecord, chat_id: &str, message_id: &str) -> Self {
        Self {
            notification: NotificationBody {
                title: message
                    .title
                    .clone()
                    .unwrap_or_else(|| DEFAULT_NOTIFICATION_TITLE.to_string()),
                body: message.text.clone().unwrap_or_default(),
            },
            data: NotificationData {
                chat_id: chat_id.to_string(),
                message_id: message_id.to_string(),
            },
        }
    }
}

/// Trigger event: a message record was created under a chat.
///
/// Carries the new record's data plus its identifying path segments, so the
/// pipeline never has to re-read the triggering document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreated {
    pub chat_id: String,
    pub message_id: String,
    /// Raw message document as written by the chat feature.
    pub message: Value,
    #[serde(default = "Utc::now")]
    pub occurred_at: DateTime<Utc>,
}

/// Terminal result of one pipeline invocation.
///
/// Every variant except `Delivered` describes a successful no-op; absence of
/// data is never an error in this pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// No chat record exists for the event's chat id.
    ChatNotFound,
    /// The participant list was empty after sender exclusion.
    NoRecipients,
    /// No recipient profile contributed any device token.
    NoTokens,
    /// The batch send completed; counts are per-token.
    Delivered { delivered: usize, failed: usize },
    /// The batch send itself failed. Logged, never propagated.
    TransportFailed,
}

impl std::fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryOutcome::ChatNotFound => write!(f, "chat_not_found"),
            DeliveryOutcome::NoRecipients => write!(f, "no_recipients"),
            DeliveryOutcome::NoTokens => write!(f, "no_tokens"),
            DeliveryOutcome::Delivered { delivered, failed } => {
                write!(f, "delivered ({} ok, {} failed)", delivered, failed)
            }
            DeliveryOutcome::TransportFailed => write!(f, "transport_failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trailing_segment_handles_paths_and_bare_ids() {
        assert_eq!(trailing_segment("clients/u1"), Some("u1".to_string()));
        assert_eq!(trailing_segment("u1"), Some("u1".to_string()));
        assert_eq!(trailing_segment("a/b/c"), Some("c".to_string()));
        assert_eq!(trailing_segment(""), None);
    }

    #[test]
    fn reference_parses_both_shapes() {
        let structured: Reference = serde_json::from_value(json!({"path": "clients/u7"})).unwrap();
        assert_eq!(structured.identity(), Some("u7".to_string()));

        let plain: Reference = serde_json::from_value(json!("coaches/u8")).unwrap();
        assert_eq!(plain.identity(), Some("u8".to_string()));

        let junk: Reference = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(junk.identity(), None);
    }

    #[test]
    fn sender_identity_prefers_structured_ref() {
        let message: MessageRecord = serde_json::from_value(json!({
            "senderRef": {"path": "clients/u1"},
            "senderId": "u2",
            "text": "hello"
        }))
        .unwrap();
        assert_eq!(message.sender_identity(), Some("u1".to_string()));
    }

    #[test]
    fn sender_identity_falls_back_to_plain_id() {
        let message: MessageRecord =
            serde_json::from_value(json!({"senderId": "u2", "text": "hello"})).unwrap();
        assert_eq!(message.sender_identity(), Some("u2".to_string()));

        let anonymous: MessageRecord = serde_json::from_value(json!({"text": "hello"})).unwrap();
        assert_eq!(anonymous.sender_identity(), None);
    }

    #[test]
    fn participants_prefer_structured_refs_and_discard_junk() {
        let chat: ChatRecord = serde_json::from_value(json!({
            "participantRefs": [
                {"path": "clients/a"},
                "coaches/b",
                17,
                {"unexpected": true}
            ],
            "participants": ["clients/ignored"]
        }))
        .unwrap();
        assert_eq!(chat.participant_identities(), vec!["a", "b"]);
    }

    #[test]
    fn participants_fall_back_to_plain_strings() {
        let chat: ChatRecord = serde_json::from_value(json!({
            "participants": ["clients/a", "b", ""]
        }))
        .unwrap();
        assert_eq!(chat.participant_identities(), vec!["a", "b"]);
    }

    #[test]
    fn profile_tolerates_malformed_token_field() {
        let profile: ProfileRecord =
            serde_json::from_value(json!({"deviceTokens": ["t1", 5, "t2"]})).unwrap();
        assert_eq!(profile.device_tokens, vec!["t1", "t2"]);

        let missing: ProfileRecord = serde_json::from_value(json!({})).unwrap();
        assert!(missing.device_tokens.is_empty());

        let wrong_shape: ProfileRecord =
            serde_json::from_value(json!({"deviceTokens": "t1"})).unwrap();
        assert!(wrong_shape.device_tokens.is_empty());
    }

    #[test]
    fn payload_defaults_title_and_body() {
        let message: MessageRecord = serde_json::from_value(json!({"senderId": "u1"})).unwrap();
        let payload = NotificationPayload::for_message(&message, "c1", "m1");
        assert_eq!(payload.notification.title, DEFAULT_NOTIFICATION_TITLE);
        assert_eq!(payload.notification.body, "");
        assert_eq!(payload.data.chat_id, "c1");
        assert_eq!(payload.data.message_id, "m1");
    }
}
