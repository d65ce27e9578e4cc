//! 消息日志
//!
//! 每个房间一份只追加的有序日志，维护投递、已读与表情回应状态。

use std::sync::Arc;

use domain::{
    DomainError, Emoji, FileRef, Message, MessageId, MessageMutation, MessageRepository,
    NewMessage, RoomName, Username,
};

use crate::{clock::Clock, error::ApplicationError};

#[derive(Clone)]
pub struct MessageLog {
    repository: Arc<dyn MessageRepository>,
    clock: Arc<dyn Clock>,
}

impl MessageLog {
    pub fn new(repository: Arc<dyn MessageRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// 追加消息，发送者自动计入已读
    pub async fn append(
        &self,
        room: &RoomName,
        sender: &Username,
        text: Option<String>,
        file: Option<FileRef>,
    ) -> Result<Message, ApplicationError> {
        let draft = NewMessage::new(room.clone(), sender.clone(), text, file)?;
        let message = self.repository.append(draft, self.clock.now()).await?;
        Ok(message)
    }

    pub async fn find(&self, id: MessageId) -> Result<Option<Message>, ApplicationError> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// 从最早的消息起跳过 `skip` 条，最多返回 `limit` 条，升序
    pub async fn page(
        &self,
        room: &RoomName,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Message>, ApplicationError> {
        let messages = self.repository.list_room(room).await?;
        Ok(domain::page(&messages, skip, limit))
    }

    /// 大小写不敏感的文本搜索
    pub async fn search(
        &self,
        room: &RoomName,
        query: &str,
    ) -> Result<Vec<Message>, ApplicationError> {
        let messages = self.repository.list_room(room).await?;
        Ok(domain::search(&messages, query))
    }

    /// 标记已送达。未知 id 是迟到的确认，直接忽略
    pub async fn mark_delivered(&self, id: MessageId) -> Result<(), ApplicationError> {
        if self
            .repository
            .mutate(id, MessageMutation::MarkDelivered)
            .await?
            .is_none()
        {
            tracing::debug!(message_id = %id, "delivery ack for unknown message ignored");
        }
        Ok(())
    }

    /// 标记已读。未知 id 同样忽略
    pub async fn mark_read(
        &self,
        id: MessageId,
        username: &Username,
    ) -> Result<(), ApplicationError> {
        if self
            .repository
            .mutate(id, MessageMutation::MarkRead(username.clone()))
            .await?
            .is_none()
        {
            tracing::debug!(message_id = %id, username = %username, "read ack for unknown message ignored");
        }
        Ok(())
    }

    /// 将房间内用户未读的消息全部标记为已读，返回本次标记的消息 id
    pub async fn mark_room_read(
        &self,
        room: &RoomName,
        username: &Username,
    ) -> Result<Vec<MessageId>, ApplicationError> {
        let unread: Vec<MessageId> = self
            .repository
            .list_room(room)
            .await?
            .into_iter()
            .filter(|message| !message.is_read_by(username))
            .map(|message| message.id)
            .collect();

        for id in &unread {
            self.mark_read(*id, username).await?;
        }
        Ok(unread)
    }

    /// 切换表情回应，未知 id 返回 `MessageNotFound`
    pub async fn toggle_reaction(
        &self,
        id: MessageId,
        emoji: Emoji,
        username: &Username,
    ) -> Result<Message, ApplicationError> {
        self.repository
            .mutate(
                id,
                MessageMutation::ToggleReaction {
                    user: username.clone(),
                    emoji,
                },
            )
            .await?
            .ok_or_else(|| DomainError::MessageNotFound(id).into())
    }

    pub async fn unread_count(
        &self,
        room: &RoomName,
        username: &Username,
    ) -> Result<usize, ApplicationError> {
        let messages = self.repository.list_room(room).await?;
        Ok(domain::unread_count(&messages, username))
    }
}
