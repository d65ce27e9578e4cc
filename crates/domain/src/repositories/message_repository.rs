//! 消息Repository接口定义

use async_trait::async_trait;

use crate::entities::message::{Message, MessageMutation, NewMessage};
use crate::repositories::RepositoryResult;
use crate::value_objects::{MessageId, RoomName, Timestamp};

/// 按房间划分、只追加的消息存储
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// 分配新 id 并写入消息
    async fn append(&self, draft: NewMessage, timestamp: Timestamp) -> RepositoryResult<Message>;

    /// 根据ID查找消息
    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>>;

    /// 在存储内部原子地修改消息可变状态，id 不存在时返回 `None`
    async fn mutate(
        &self,
        id: MessageId,
        mutation: MessageMutation,
    ) -> RepositoryResult<Option<Message>>;

    /// 房间消息快照，按 (timestamp, id) 升序；未知房间返回空列表
    async fn list_room(&self, room: &RoomName) -> RepositoryResult<Vec<Message>>;

    /// 清空所有消息
    async fn clear(&self) -> RepositoryResult<()>;
}
