//! 消息历史的排序、分页、搜索与未读统计

use crate::entities::message::Message;
use crate::value_objects::Username;

/// 按 (timestamp, id) 插入到已排序的序列中，时钟回拨时同样保持有序
pub fn insert_chronologically(messages: &mut Vec<Message>, message: Message) {
    let key = message.ordering_key();
    let position = messages.partition_point(|existing| existing.ordering_key() <= key);
    messages.insert(position, message);
}

/// 从最早的消息开始跳过 `skip` 条，最多取 `limit` 条。
///
/// 输入必须已按时间排序。
pub fn page(messages: &[Message], skip: usize, limit: usize) -> Vec<Message> {
    messages.iter().skip(skip).take(limit).cloned().collect()
}

/// 大小写不敏感的文本子串搜索，结果保持时间顺序
pub fn search(messages: &[Message], query: &str) -> Vec<Message> {
    let needle = query.to_lowercase();
    messages
        .iter()
        .filter(|message| message.text_contains(&needle))
        .cloned()
        .collect()
}

/// 用户尚未读过的消息数
pub fn unread_count(messages: &[Message], username: &Username) -> usize {
    messages
        .iter()
        .filter(|message| !message.is_read_by(username))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::message::NewMessage;
    use crate::value_objects::{FileRef, MessageId, RoomName};
    use chrono::{Duration, TimeZone, Utc};

    fn message(id: u64, seconds: i64, text: Option<&str>) -> Message {
        let room = RoomName::parse("general").unwrap();
        let sender = Username::parse("alice").unwrap();
        let file = match text {
            Some(_) => None,
            None => Some(FileRef::new("https://files/a.bin", "a.bin").unwrap()),
        };
        let draft = NewMessage::new(room, sender, text.map(str::to_owned), file).unwrap();
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Message::new(MessageId(id), draft, base + Duration::seconds(seconds))
    }

    #[test]
    fn equal_timestamps_are_ordered_by_id() {
        let mut messages = Vec::new();
        insert_chronologically(&mut messages, message(1, 9, Some("a")));
        insert_chronologically(&mut messages, message(3, 5, Some("c")));
        insert_chronologically(&mut messages, message(2, 5, Some("b")));
        let ids: Vec<u64> = messages.iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn page_counts_from_oldest() {
        let messages: Vec<Message> = (1..=5).map(|i| message(i, i as i64, Some("x"))).collect();
        let first = page(&messages, 0, 2);
        assert_eq!(first.iter().map(|m| m.id.0).collect::<Vec<_>>(), vec![1, 2]);
        let last = page(&messages, 4, 10);
        assert_eq!(last.len(), 1);
        assert!(page(&messages, 10, 10).is_empty());
        assert!(page(&messages, 0, 0).is_empty());
    }

    #[test]
    fn search_ignores_case_and_file_only_messages() {
        let messages = vec![message(1, 1, Some("Hello there")), message(2, 2, None)];
        let hits = search(&messages, "hello");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, MessageId(1));
        assert_eq!(search(&messages, "").len(), 1);
    }

    #[test]
    fn unread_excludes_sender() {
        let messages = vec![message(1, 1, Some("a")), message(2, 2, Some("b"))];
        assert_eq!(unread_count(&messages, &Username::parse("alice").unwrap()), 0);
        assert_eq!(unread_count(&messages, &Username::parse("bob").unwrap()), 2);
    }
}
