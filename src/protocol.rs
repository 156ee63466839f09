use crate::types::*;
use serde::{Deserialize, Serialize};

/// Display name used when the host does not supply one
pub const ANONYMOUS_NICKNAME: &str = "神秘人";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    Owner,
    Admin,
    #[default]
    Member,
}

/// Event as delivered by the host framework adapter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostEvent {
    #[serde(default)]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub role: SenderRole,
    #[serde(default)]
    pub text: String,
}

impl HostEvent {
    /// Narrow the event to what the game needs.
    /// Returns `None` for events without a group or user.
    pub fn incoming(&self) -> Option<IncomingMessage> {
        let group_id = self.group_id.as_ref().filter(|g| !g.is_empty())?;
        let user_id = self.user_id.as_ref().filter(|u| !u.is_empty())?;

        Some(IncomingMessage {
            group_id: group_id.clone(),
            user_id: user_id.clone(),
            display_name: self
                .nickname
                .as_ref()
                .filter(|n| !n.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| ANONYMOUS_NICKNAME.to_string()),
            text: self.text.clone(),
        })
    }
}

/// The four fields the game core reads from an event
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub display_name: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Segment {
    Text(String),
    Image(EncodedImage),
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// One message addressed to a group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutgoingMessage {
    pub group_id: GroupId,
    pub segments: Vec<Segment>,
}

impl OutgoingMessage {
    /// Concatenated text of all text segments
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text(t) => Some(t.as_str()),
                Segment::Image(_) => None,
            })
            .collect()
    }

    pub fn has_image(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Image(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_event_parses_with_defaults() {
        let event: HostEvent =
            serde_json::from_str(r#"{"group_id":"g1","user_id":"u1","text":"/whois"}"#).unwrap();

        assert_eq!(event.role, SenderRole::Member);
        let msg = event.incoming().unwrap();
        assert_eq!(msg.group_id, "g1");
        assert_eq!(msg.display_name, ANONYMOUS_NICKNAME);
        assert_eq!(msg.text, "/whois");
    }

    #[test]
    fn test_incoming_requires_group_and_user() {
        let private = HostEvent {
            user_id: Some("u1".to_string()),
            text: "hi".to_string(),
            ..Default::default()
        };
        assert!(private.incoming().is_none());

        let anonymous = HostEvent {
            group_id: Some("g1".to_string()),
            user_id: Some(String::new()),
            ..Default::default()
        };
        assert!(anonymous.incoming().is_none());
    }

    #[test]
    fn test_segment_wire_format() {
        let msg = OutgoingMessage {
            group_id: "g1".to_string(),
            segments: vec![
                Segment::text("hello "),
                Segment::Image(EncodedImage("base64://AAAA".to_string())),
            ],
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["segments"][0]["type"], "text");
        assert_eq!(json["segments"][1]["data"], "base64://AAAA");
        assert_eq!(msg.plain_text(), "hello ");
        assert!(msg.has_image());
    }
}
