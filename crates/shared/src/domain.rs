use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(ConversationId);
id_newtype!(GroupId);
id_newtype!(MessageId);

/// Unit of transport-level join/leave.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomId {
    Conversation(ConversationId),
    Group(GroupId),
}

impl RoomId {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Conversation(id) => id.as_str(),
            Self::Group(id) => id.as_str(),
        }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conversation(id) => write!(f, "conversation:{id}"),
            Self::Group(id) => write!(f, "group:{id}"),
        }
    }
}

impl From<ConversationId> for RoomId {
    fn from(value: ConversationId) -> Self {
        Self::Conversation(value)
    }
}

impl From<GroupId> for RoomId {
    fn from(value: GroupId) -> Self {
        Self::Group(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub creator: User,
    pub recipient: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// The participant shown in the conversation header for `me`.
    pub fn other_participant(&self, me: &UserId) -> &User {
        if &self.creator.id == me {
            &self.recipient
        } else {
            &self.creator
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub owner: User,
    #[serde(default)]
    pub members: Vec<User>,
}

/// Fields shared by conversation and group messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub id: MessageId,
    pub content: String,
    pub author: User,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<MessageId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub conversation_id: ConversationId,
    #[serde(flatten)]
    pub body: MessageBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessage {
    pub group_id: GroupId,
    #[serde(flatten)]
    pub body: MessageBody,
}

/// A conversation or group message. Untagged on the wire: the room field
/// (`conversationId` or `groupId`) decides the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatMessage {
    Direct(Message),
    Group(GroupMessage),
}

impl ChatMessage {
    pub fn body(&self) -> &MessageBody {
        match self {
            Self::Direct(message) => &message.body,
            Self::Group(message) => &message.body,
        }
    }

    pub fn id(&self) -> &MessageId {
        &self.body().id
    }

    pub fn author(&self) -> &User {
        &self.body().author
    }

    pub fn content(&self) -> &str {
        &self.body().content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.body().created_at
    }

    pub fn reply_to_id(&self) -> Option<&MessageId> {
        self.body().reply_to_id.as_ref()
    }

    pub fn room(&self) -> RoomId {
        match self {
            Self::Direct(message) => RoomId::Conversation(message.conversation_id.clone()),
            Self::Group(message) => RoomId::Group(message.group_id.clone()),
        }
    }
}

impl From<Message> for ChatMessage {
    fn from(value: Message) -> Self {
        Self::Direct(value)
    }
}

impl From<GroupMessage> for ChatMessage {
    fn from(value: GroupMessage) -> Self {
        Self::Group(value)
    }
}
