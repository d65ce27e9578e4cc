//! 在线状态Repository接口定义

use async_trait::async_trait;

use crate::entities::presence::PresenceEntry;
use crate::repositories::RepositoryResult;
use crate::value_objects::{ConnectionId, RoomName, Username};

#[async_trait]
pub trait PresenceRepository: Send + Sync {
    /// 原子地插入在线记录。
    ///
    /// 同一连接已有记录，或同房间内已有同名在线用户时返回 `RepositoryError::Conflict`。
    async fn insert_unique(&self, entry: PresenceEntry) -> RepositoryResult<()>;

    /// 移除并返回连接对应的记录
    async fn remove(&self, connection_id: ConnectionId) -> RepositoryResult<Option<PresenceEntry>>;

    async fn find(&self, connection_id: ConnectionId) -> RepositoryResult<Option<PresenceEntry>>;

    async fn find_by_username(
        &self,
        room: &RoomName,
        username: &Username,
    ) -> RepositoryResult<Option<PresenceEntry>>;

    /// 房间内全部在线记录
    async fn list_room(&self, room: &RoomName) -> RepositoryResult<Vec<PresenceEntry>>;
}
