//! Plain-text rendering of room snapshots.

use client_core::{DisplayMessage, DraftState, LoadState, ReplyPreview, RoomSnapshot};
use shared::domain::User;

const REPLY_SNIPPET_LEN: usize = 40;

pub fn snippet(text: &str) -> String {
    if text.chars().count() <= REPLY_SNIPPET_LEN {
        return text.to_string();
    }
    let cut: String = text.chars().take(REPLY_SNIPPET_LEN).collect();
    format!("{cut}...")
}

pub fn message_line(item: &DisplayMessage, me: &User) -> String {
    let author = item.message.author();
    let name = if author.id == me.id {
        "you"
    } else {
        author.username.as_str()
    };
    let time = item.message.created_at().format("%H:%M");
    let mut line = format!(
        "[{time}] #{} {name}: {}",
        item.message.id(),
        item.message.content()
    );
    match &item.reply {
        Some(ReplyPreview::Resolved(original)) => line.push_str(&format!(
            "  (re {}: {})",
            original.author().username,
            snippet(original.content())
        )),
        Some(ReplyPreview::Tombstone(_)) => line.push_str("  (re: message deleted)"),
        None => {}
    }
    line
}

pub fn typing_line(users: &[User]) -> Option<String> {
    match users {
        [] => None,
        [one] => Some(format!("{} is typing...", one.username)),
        [first, second] => Some(format!(
            "{} and {} are typing...",
            first.username, second.username
        )),
        [first, rest @ ..] => Some(format!(
            "{} and {} others are typing...",
            first.username,
            rest.len()
        )),
    }
}

pub fn draft_line(draft: &DraftState) -> Option<String> {
    match draft {
        DraftState::None => None,
        DraftState::Replying(message) => Some(format!(
            "replying to {}: {}",
            message.author().username,
            snippet(message.content())
        )),
        DraftState::Editing(message) => Some(format!("editing #{}", message.id())),
    }
}

pub fn snapshot_lines(snapshot: &RoomSnapshot, me: &User) -> Vec<String> {
    match &snapshot.load_state {
        LoadState::Loading => vec!["loading...".to_string()],
        LoadState::Failed(reason) => vec![format!(
            "failed to load messages: {reason} (type /retry)"
        )],
        LoadState::Ready => {
            let mut lines: Vec<String> = snapshot
                .messages
                .iter()
                .map(|item| message_line(item, me))
                .collect();
            if lines.is_empty() {
                lines.push("no messages yet".to_string());
            }
            lines.extend(typing_line(&snapshot.typing_users));
            lines
        }
    }
}
