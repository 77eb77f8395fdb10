use shared::domain::{ChatMessage, MessageId, RoomId, User};

/// What a message's reply reference points at once the history is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyPreview {
    Resolved(Box<ChatMessage>),
    /// The referenced message is not in the loaded set.
    Tombstone(MessageId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMessage {
    pub room: RoomId,
    pub message: ChatMessage,
    pub reply: Option<ReplyPreview>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub room: RoomId,
    pub load_state: LoadState,
    /// Empty while loading.
    pub messages: Vec<DisplayMessage>,
    pub typing_users: Vec<User>,
}

#[derive(Debug, Clone)]
pub enum PresenceChange {
    Joined(serde_json::Value),
    Left(serde_json::Value),
}

/// Notifications published by a mounted room view.
#[derive(Debug, Clone)]
pub enum ViewEvent {
    HistoryLoaded,
    HistoryFailed(String),
    MessagesChanged,
    TypingChanged(Vec<User>),
    Presence(PresenceChange),
}
