//! Wire envelope codec for relayed messages.
//!
//! A client sends one text payload per message, in one of two recognized
//! shapes: the literal `ping` control token (case-insensitive), or a JSON
//! object carrying `toUser`/`content`/`type`. Anything else is an opaque
//! client message: accepted, never forwarded, never an error.
//!
//! The forwarded shape mirrors the inbound one with `fromUser` substituted
//! server-side from the authenticated connection.

use serde::{Deserialize, Serialize};

/// Literal control token a client sends as an application-level heartbeat.
pub const PING: &str = "ping";

/// Literal reply to [`PING`], sent on the same connection.
pub const PONG: &str = "pong";

/// Content subtype applied when the client omits `type`.
pub const DEFAULT_CONTENT_TYPE: &str = "text";

/// Returns true when the payload is the heartbeat control token.
pub fn is_ping(payload: &str) -> bool {
    payload.eq_ignore_ascii_case(PING)
}

/// A structured client message addressed to another user.
///
/// There is deliberately no sender field on the inbound shape; the sender
/// identity is bound to the connection at handshake time, so any sender
/// claim present in the raw JSON is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    /// Target user identifier.
    pub to_user: String,

    /// Opaque payload handed through unchanged.
    pub content: String,

    /// Free-form content subtype tag.
    #[serde(rename = "type", default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

impl DirectMessage {
    /// Parses a text frame as a structured direct message.
    ///
    /// Failure is a normal outcome: constrained clients send unstructured
    /// control text over the same channel, so the caller logs and discards
    /// rather than reporting an error to anyone.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

/// The forwarded form delivered to the target connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedMessage {
    /// Authenticated identity of the producing connection.
    pub from_user: String,

    /// Payload carried over from the inbound message.
    pub content: String,

    /// Content subtype carried over from the inbound message.
    #[serde(rename = "type")]
    pub content_type: String,
}

impl RelayedMessage {
    /// Builds the outbound envelope for `message` as produced by `from_user`.
    pub fn new(from_user: impl Into<String>, message: DirectMessage) -> Self {
        Self {
            from_user: from_user.into(),
            content: message.content,
            content_type: message.content_type,
        }
    }

    /// Serializes to the wire JSON representation.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("RelayedMessage serialization should not fail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_matches_case_insensitively() {
        assert!(is_ping("ping"));
        assert!(is_ping("PING"));
        assert!(is_ping("Ping"));
        assert!(!is_ping("ping "));
        assert!(!is_ping("pong"));
    }

    #[test]
    fn parses_full_direct_message() {
        let msg = DirectMessage::parse(r#"{"toUser":"u2","content":"hi","type":"image"}"#).unwrap();
        assert_eq!(msg.to_user, "u2");
        assert_eq!(msg.content, "hi");
        assert_eq!(msg.content_type, "image");
    }

    #[test]
    fn type_defaults_to_text_when_omitted() {
        let msg = DirectMessage::parse(r#"{"toUser":"u2","content":"hi"}"#).unwrap();
        assert_eq!(msg.content_type, "text");
    }

    #[test]
    fn missing_target_is_a_parse_failure() {
        assert!(DirectMessage::parse(r#"{"content":"hi"}"#).is_err());
    }

    #[test]
    fn missing_content_is_a_parse_failure() {
        assert!(DirectMessage::parse(r#"{"toUser":"u2"}"#).is_err());
    }

    #[test]
    fn plain_text_is_a_parse_failure() {
        assert!(DirectMessage::parse("hello there").is_err());
        assert!(DirectMessage::parse("").is_err());
    }

    #[test]
    fn client_supplied_sender_field_is_ignored() {
        // The inbound shape has no sender; a forged fromUser is dropped by
        // deserialization and identity comes from the connection instead.
        let msg =
            DirectMessage::parse(r#"{"toUser":"u2","content":"hi","fromUser":"forged"}"#).unwrap();
        let relayed = RelayedMessage::new("u1", msg);
        assert_eq!(relayed.from_user, "u1");
    }

    #[test]
    fn relayed_message_uses_wire_field_names() {
        let relayed = RelayedMessage {
            from_user: "u1".to_string(),
            content: "hi".to_string(),
            content_type: "text".to_string(),
        };
        let json = relayed.to_json();
        assert!(json.contains(r#""fromUser":"u1""#));
        assert!(json.contains(r#""content":"hi""#));
        assert!(json.contains(r#""type":"text""#));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_never_panics(payload in ".*") {
                let _ = DirectMessage::parse(&payload);
            }

            #[test]
            fn relayed_message_round_trips(
                from_user in "[a-zA-Z0-9_-]{1,16}",
                content in ".*",
                content_type in "[a-z]{1,12}",
            ) {
                let relayed = RelayedMessage {
                    from_user,
                    content,
                    content_type,
                };
                let decoded: RelayedMessage =
                    serde_json::from_str(&relayed.to_json()).unwrap();
                prop_assert_eq!(decoded, relayed);
            }

            #[test]
            fn forwarding_preserves_content_and_type(
                to_user in "[a-zA-Z0-9_-]{1,16}",
                content in ".*",
            ) {
                let raw = serde_json::json!({
                    "toUser": to_user,
                    "content": content,
                })
                .to_string();
                let msg = DirectMessage::parse(&raw).unwrap();
                let relayed = RelayedMessage::new("u1", msg.clone());
                prop_assert_eq!(relayed.content, msg.content);
                prop_assert_eq!(relayed.content_type, "text");
            }
        }
    }
}
