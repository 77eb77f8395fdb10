//! Merges fetched history with live messages and formats the result for
//! display.

use std::collections::HashMap;

use shared::domain::{ChatMessage, MessageId, RoomId};

use crate::types::{DisplayMessage, ReplyPreview};

/// Orders `messages` chronologically (stable for equal timestamps), resolves
/// reply references within the set and tags each item with `room`.
pub fn format_history(room: &RoomId, messages: &[ChatMessage]) -> Vec<DisplayMessage> {
    let by_id: HashMap<&MessageId, &ChatMessage> =
        messages.iter().map(|message| (message.id(), message)).collect();

    let mut ordered: Vec<&ChatMessage> = messages.iter().collect();
    ordered.sort_by_key(|message| message.created_at());

    ordered
        .into_iter()
        .map(|message| DisplayMessage {
            room: room.clone(),
            message: message.clone(),
            reply: message.reply_to_id().map(|target| match by_id.get(target) {
                Some(original) => ReplyPreview::Resolved(Box::new((*original).clone())),
                None => ReplyPreview::Tombstone(target.clone()),
            }),
        })
        .collect()
}

/// Message set of one room, unique by id and kept in display order.
#[derive(Debug, Clone)]
pub struct MessageTimeline {
    room: RoomId,
    messages: Vec<ChatMessage>,
}

impl MessageTimeline {
    pub fn new(room: RoomId) -> Self {
        Self {
            room,
            messages: Vec::new(),
        }
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Adds fetched history. Records already present (received live while
    /// the fetch was pending) are newer and win.
    pub fn merge_history(&mut self, history: &[ChatMessage]) {
        for message in history {
            if !self.contains(message.id()) {
                self.messages.push(message.clone());
            }
        }
        self.reorder();
    }

    /// Inserts a live message or replaces the record with the same id.
    /// Messages for another room are ignored. Returns `true` when accepted.
    pub fn upsert(&mut self, message: ChatMessage) -> bool {
        if message.room() != self.room {
            return false;
        }
        match self
            .messages
            .iter_mut()
            .find(|existing| existing.id() == message.id())
        {
            Some(existing) => *existing = message,
            None => self.messages.push(message),
        }
        self.reorder();
        true
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages.iter().any(|message| message.id() == id)
    }

    pub fn get(&self, id: &MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|message| message.id() == id)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn display(&self) -> Vec<DisplayMessage> {
        format_history(&self.room, &self.messages)
    }

    fn reorder(&mut self) {
        self.messages.sort_by_key(|message| message.created_at());
    }
}

#[cfg(test)]
#[path = "tests/timeline_tests.rs"]
mod tests;
