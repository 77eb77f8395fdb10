use super::*;
use crate::test_support::{direct, grouped};
use shared::domain::{ConversationId, GroupId};

fn conversation() -> RoomId {
    RoomId::Conversation(ConversationId::from("c-1"))
}

fn ids(items: &[DisplayMessage]) -> Vec<&str> {
    items.iter().map(|item| item.message.id().as_str()).collect()
}

#[test]
fn history_is_ordered_by_timestamp() {
    let history = vec![
        direct("c-1", "1", 10, None),
        direct("c-1", "3", 30, None),
        direct("c-1", "2", 20, None),
    ];
    let formatted = format_history(&conversation(), &history);
    assert_eq!(ids(&formatted), vec!["1", "2", "3"]);
    assert!(formatted.iter().all(|item| item.room == conversation()));
}

#[test]
fn equal_timestamps_keep_their_fetched_order() {
    let history = vec![
        direct("c-1", "b", 10, None),
        direct("c-1", "a", 10, None),
        direct("c-1", "c", 5, None),
    ];
    let formatted = format_history(&conversation(), &history);
    assert_eq!(ids(&formatted), vec!["c", "b", "a"]);
}

#[test]
fn reply_targets_resolve_or_become_tombstones() {
    let history = vec![
        direct("c-1", "1", 10, None),
        direct("c-1", "2", 20, Some("1")),
        direct("c-1", "3", 30, Some("deleted")),
    ];
    let formatted = format_history(&conversation(), &history);

    assert_eq!(formatted[0].reply, None);
    match &formatted[1].reply {
        Some(ReplyPreview::Resolved(original)) => assert_eq!(original.id().as_str(), "1"),
        other => panic!("unexpected reply: {other:?}"),
    }
    assert_eq!(
        formatted[2].reply,
        Some(ReplyPreview::Tombstone(MessageId::from("deleted")))
    );
}

#[test]
fn live_messages_dedupe_by_id_and_reorder() {
    let mut timeline = MessageTimeline::new(conversation());
    timeline.merge_history(&[direct("c-1", "1", 10, None), direct("c-1", "3", 30, None)]);

    assert!(timeline.upsert(direct("c-1", "2", 20, None)));
    let mut edited = direct("c-1", "3", 30, None);
    if let ChatMessage::Direct(message) = &mut edited {
        message.body.content = "edited".to_string();
    }
    assert!(timeline.upsert(edited));

    assert_eq!(timeline.len(), 3);
    assert_eq!(ids(&timeline.display()), vec!["1", "2", "3"]);
    assert_eq!(
        timeline.get(&MessageId::from("3")).map(ChatMessage::content),
        Some("edited")
    );
}

#[test]
fn live_messages_received_before_history_survive_the_merge() {
    let mut timeline = MessageTimeline::new(conversation());
    let mut live = direct("c-1", "2", 20, None);
    if let ChatMessage::Direct(message) = &mut live {
        message.body.content = "newer".to_string();
    }
    timeline.upsert(live);
    timeline.merge_history(&[direct("c-1", "1", 10, None), direct("c-1", "2", 20, None)]);

    assert_eq!(ids(&timeline.display()), vec!["1", "2"]);
    assert_eq!(
        timeline.get(&MessageId::from("2")).map(ChatMessage::content),
        Some("newer")
    );
}

#[test]
fn messages_for_other_rooms_are_rejected() {
    let mut timeline = MessageTimeline::new(RoomId::Group(GroupId::from("g-1")));
    assert!(!timeline.upsert(grouped("g-2", "1", 10, None)));
    assert!(!timeline.upsert(direct("g-1", "1", 10, None)));
    assert!(timeline.upsert(grouped("g-1", "1", 10, None)));
    assert_eq!(timeline.len(), 1);
}
