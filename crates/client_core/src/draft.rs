use shared::domain::ChatMessage;

/// Composer target. A single enum slot keeps replying and editing mutually
/// exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DraftState {
    #[default]
    None,
    Replying(ChatMessage),
    Editing(ChatMessage),
}

impl DraftState {
    pub fn start_reply(&mut self, message: ChatMessage) {
        *self = Self::Replying(message);
    }

    pub fn start_edit(&mut self, message: ChatMessage) {
        *self = Self::Editing(message);
    }

    pub fn cancel_reply(&mut self) {
        if matches!(self, Self::Replying(_)) {
            *self = Self::None;
        }
    }

    pub fn cancel_edit(&mut self) {
        if matches!(self, Self::Editing(_)) {
            *self = Self::None;
        }
    }

    pub fn replying(&self) -> Option<&ChatMessage> {
        match self {
            Self::Replying(message) => Some(message),
            _ => None,
        }
    }

    pub fn editing(&self) -> Option<&ChatMessage> {
        match self {
            Self::Editing(message) => Some(message),
            _ => None,
        }
    }
}
