use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ChatMessage, ConversationId, GroupId, RoomId, User};

/// Payload shared by every room-scoped transport event. Exactly one of
/// `conversation_id` / `group_id` is set by well-behaved peers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl RoomPayload {
    pub fn new(room: &RoomId, user: Option<User>) -> Self {
        let mut payload = Self {
            user,
            ..Self::default()
        };
        match room {
            RoomId::Conversation(id) => payload.conversation_id = Some(id.clone()),
            RoomId::Group(id) => payload.group_id = Some(id.clone()),
        }
        payload
    }

    pub fn room(&self) -> Option<RoomId> {
        match (&self.conversation_id, &self.group_id) {
            (Some(id), _) => Some(RoomId::Conversation(id.clone())),
            (None, Some(id)) => Some(RoomId::Group(id.clone())),
            (None, None) => None,
        }
    }
}

/// Frames emitted by the client, encoded as `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientRequest {
    #[serde(rename = "onConversationJoin")]
    ConversationJoin(RoomPayload),
    #[serde(rename = "onConversationLeave")]
    ConversationLeave(RoomPayload),
    #[serde(rename = "onGroupJoin")]
    GroupJoin(RoomPayload),
    #[serde(rename = "onGroupLeave")]
    GroupLeave(RoomPayload),
    #[serde(rename = "onTypingStart")]
    TypingStart(RoomPayload),
    #[serde(rename = "onTypingStop")]
    TypingStop(RoomPayload),
}

impl ClientRequest {
    pub fn join(room: &RoomId) -> Self {
        let payload = RoomPayload::new(room, None);
        match room {
            RoomId::Conversation(_) => Self::ConversationJoin(payload),
            RoomId::Group(_) => Self::GroupJoin(payload),
        }
    }

    /// Group leaves carry the leaving user, conversation leaves do not.
    pub fn leave(room: &RoomId, user: &User) -> Self {
        match room {
            RoomId::Conversation(_) => Self::ConversationLeave(RoomPayload::new(room, None)),
            RoomId::Group(_) => Self::GroupLeave(RoomPayload::new(room, Some(user.clone()))),
        }
    }

    pub fn typing_start(room: &RoomId, user: &User) -> Self {
        Self::TypingStart(RoomPayload::new(room, Some(user.clone())))
    }

    pub fn typing_stop(room: &RoomId, user: &User) -> Self {
        Self::TypingStop(RoomPayload::new(room, Some(user.clone())))
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            Self::ConversationJoin(_) => "onConversationJoin",
            Self::ConversationLeave(_) => "onConversationLeave",
            Self::GroupJoin(_) => "onGroupJoin",
            Self::GroupLeave(_) => "onGroupLeave",
            Self::TypingStart(_) => "onTypingStart",
            Self::TypingStop(_) => "onTypingStop",
        }
    }

    pub fn payload(&self) -> &RoomPayload {
        match self {
            Self::ConversationJoin(payload)
            | Self::ConversationLeave(payload)
            | Self::GroupJoin(payload)
            | Self::GroupLeave(payload)
            | Self::TypingStart(payload)
            | Self::TypingStop(payload) => payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Presence frames may arrive without a `data` key.
    #[serde(rename = "userJoin")]
    UserJoin(Option<Value>),
    #[serde(rename = "userLeave")]
    UserLeave(Option<Value>),
    #[serde(rename = "onTypingStart")]
    TypingStart(RoomPayload),
    #[serde(rename = "onTypingStop")]
    TypingStop(RoomPayload),
    #[serde(rename = "onMessage")]
    MessageCreated(ChatMessage),
    #[serde(rename = "onMessageUpdate")]
    MessageUpdated(ChatMessage),
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
