//! 消息实体定义
//!
//! 消息创建后只有 `delivered`、`read_by`、`reactions` 三个字段允许变化，
//! 其余字段（包括决定排序的 `timestamp` 与 `id`）保持不变。

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{Emoji, FileRef, MessageId, RoomName, Timestamp, Username};

/// 单个用户对消息的一个表情回应
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reaction {
    pub user: Username,
    pub emoji: Emoji,
}

/// 待写入日志的消息草稿
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub room: RoomName,
    pub sender: Username,
    pub text: Option<String>,
    pub file: Option<FileRef>,
}

impl NewMessage {
    /// 创建消息草稿，文本和文件引用至少要有一个
    pub fn new(
        room: RoomName,
        sender: Username,
        text: Option<String>,
        file: Option<FileRef>,
    ) -> DomainResult<Self> {
        let text = match text {
            Some(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::validation("text", "cannot be empty"));
                }
                Some(trimmed.to_owned())
            }
            None => None,
        };

        if text.is_none() && file.is_none() {
            return Err(DomainError::validation(
                "text",
                "a message needs text or a file reference",
            ));
        }

        Ok(Self {
            room,
            sender,
            text,
            file,
        })
    }

    /// 纯文本消息
    pub fn text(room: RoomName, sender: Username, text: impl Into<String>) -> DomainResult<Self> {
        Self::new(room, sender, Some(text.into()), None)
    }
}

/// 消息可变状态上的原子修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageMutation {
    MarkDelivered,
    MarkRead(Username),
    ToggleReaction { user: Username, emoji: Emoji },
}

/// 消息实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub room: RoomName,
    pub sender: Username,
    pub text: Option<String>,
    #[serde(flatten)]
    pub file: Option<FileRef>,
    pub timestamp: Timestamp,
    pub delivered: bool,
    pub read_by: BTreeSet<Username>,
    pub reactions: BTreeSet<Reaction>,
}

impl Message {
    /// 由草稿构造消息，发送者默认已读
    pub fn new(id: MessageId, draft: NewMessage, timestamp: Timestamp) -> Self {
        let mut read_by = BTreeSet::new();
        read_by.insert(draft.sender.clone());

        Self {
            id,
            room: draft.room,
            sender: draft.sender,
            text: draft.text,
            file: draft.file,
            timestamp,
            delivered: false,
            read_by,
            reactions: BTreeSet::new(),
        }
    }

    /// 房间内的全序排序键：时间戳优先，相同时按 id
    pub fn ordering_key(&self) -> (Timestamp, MessageId) {
        (self.timestamp, self.id)
    }

    pub fn is_read_by(&self, username: &Username) -> bool {
        self.read_by.contains(username)
    }

    pub fn mark_delivered(&mut self) -> bool {
        let changed = !self.delivered;
        self.delivered = true;
        changed
    }

    pub fn mark_read(&mut self, username: Username) -> bool {
        self.read_by.insert(username)
    }

    /// 切换表情回应：不存在则添加，存在则移除。返回操作后是否持有该回应。
    pub fn toggle_reaction(&mut self, user: Username, emoji: Emoji) -> bool {
        let reaction = Reaction { user, emoji };
        if self.reactions.remove(&reaction) {
            false
        } else {
            self.reactions.insert(reaction);
            true
        }
    }

    /// 应用一次修改，返回消息是否发生了变化
    pub fn apply(&mut self, mutation: MessageMutation) -> bool {
        match mutation {
            MessageMutation::MarkDelivered => self.mark_delivered(),
            MessageMutation::MarkRead(username) => self.mark_read(username),
            MessageMutation::ToggleReaction { user, emoji } => {
                self.toggle_reaction(user, emoji);
                true
            }
        }
    }

    /// 大小写不敏感的子串匹配，无文本的消息永不匹配
    pub fn text_contains(&self, needle_lowercase: &str) -> bool {
        self.text
            .as_deref()
            .map(|text| text.to_lowercase().contains(needle_lowercase))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn draft(text: &str) -> NewMessage {
        NewMessage::text(
            RoomName::parse("general").unwrap(),
            Username::parse("alice").unwrap(),
            text,
        )
        .unwrap()
    }

    #[test]
    fn new_message_is_read_by_sender_only() {
        let message = Message::new(MessageId(1), draft("hi"), Utc::now());
        assert!(!message.delivered);
        assert!(message.reactions.is_empty());
        assert_eq!(message.read_by.len(), 1);
        assert!(message.is_read_by(&Username::parse("alice").unwrap()));
    }

    #[test]
    fn draft_requires_text_or_file() {
        let room = RoomName::parse("general").unwrap();
        let sender = Username::parse("alice").unwrap();
        assert!(NewMessage::new(room.clone(), sender.clone(), None, None).is_err());
        assert!(NewMessage::new(room.clone(), sender.clone(), Some("  ".into()), None).is_err());

        let file = FileRef::new("https://files/x.png", "x.png").unwrap();
        let file_only = NewMessage::new(room, sender, None, Some(file)).unwrap();
        assert!(file_only.text.is_none());
    }

    #[test]
    fn toggling_twice_restores_reactions() {
        let mut message = Message::new(MessageId(1), draft("hi"), Utc::now());
        let bob = Username::parse("bob").unwrap();
        let thumbs = Emoji::parse("👍").unwrap();
        let original = message.reactions.clone();

        assert!(message.toggle_reaction(bob.clone(), thumbs.clone()));
        assert_eq!(message.reactions.len(), 1);
        assert!(!message.toggle_reaction(bob, thumbs));
        assert_eq!(message.reactions, original);
    }

    #[test]
    fn mark_delivered_and_read_are_idempotent() {
        let mut message = Message::new(MessageId(1), draft("hi"), Utc::now());
        assert!(message.apply(MessageMutation::MarkDelivered));
        let once = message.clone();
        assert!(!message.apply(MessageMutation::MarkDelivered));
        assert_eq!(message, once);

        let bob = Username::parse("bob").unwrap();
        assert!(message.apply(MessageMutation::MarkRead(bob.clone())));
        assert!(!message.apply(MessageMutation::MarkRead(bob)));
        assert_eq!(message.read_by.len(), 2);
    }

    #[test]
    fn serializes_with_camel_case_file_fields() {
        let room = RoomName::parse("general").unwrap();
        let sender = Username::parse("alice").unwrap();
        let file = FileRef::new("https://files/x.png", "x.png").unwrap();
        let draft = NewMessage::new(room, sender, None, Some(file)).unwrap();
        let message = Message::new(MessageId(7), draft, Utc::now());

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["fileUrl"], "https://files/x.png");
        assert_eq!(json["fileName"], "x.png");
        assert_eq!(json["readBy"][0], "alice");
        assert!(json["text"].is_null());
    }
}
