use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionAttributes;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,
    pub content: String,
}

/// Transport-agnostic answer for one conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillResponse {
    pub text: String,
    pub card: Card,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<String>,
    pub session_attributes: SessionAttributes,
    pub should_end_session: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SkillRequest {
    Launch,
    Intent {
        name: String,
        #[serde(default)]
        slots: BTreeMap<String, String>,
    },
    SessionEnded {
        #[serde(default)]
        reason: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequestEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionAttributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub request: SkillRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillResponseEnvelope {
    pub version: String,
    pub session_id: String,
    pub response: SkillResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_intent_request_with_session() {
        let raw = serde_json::json!({
            "sessionId": "abc",
            "session": { "querySubject": "categories", "startIndex": 5 },
            "request": {
                "type": "intent",
                "name": "MoveNextIntent",
            },
        });
        let envelope: SkillRequestEnvelope = serde_json::from_value(raw).expect("envelope");
        assert_eq!(envelope.session_id.as_deref(), Some("abc"));
        let SkillRequest::Intent { name, slots } = envelope.request else {
            panic!("expected intent request");
        };
        assert_eq!(name, "MoveNextIntent");
        assert!(slots.is_empty());
        assert_eq!(envelope.session.expect("session").start_index, Some(5));
    }

    #[test]
    fn decodes_launch_without_session() {
        let envelope: SkillRequestEnvelope =
            serde_json::from_value(serde_json::json!({ "request": { "type": "launch" } }))
                .expect("envelope");
        assert!(matches!(envelope.request, SkillRequest::Launch));
        assert!(envelope.session.is_none());
    }
}
