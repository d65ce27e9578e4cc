//! 在线状态注册表
//!
//! 跟踪 连接 ↔ 用户 ↔ 房间 的绑定，每条存活连接一条记录。
//! 唯一性只在加入时校验。

use std::collections::BTreeSet;
use std::sync::Arc;

use domain::{
    ConnectionId, DomainError, PresenceEntry, PresenceRepository, RepositoryError, RoomName,
    Username,
};

use crate::error::ApplicationError;

#[derive(Clone)]
pub struct PresenceRegistry {
    repository: Arc<dyn PresenceRepository>,
}

impl PresenceRegistry {
    pub fn new(repository: Arc<dyn PresenceRepository>) -> Self {
        Self { repository }
    }

    /// 规范化用户名和房间后登记在线记录
    pub async fn join(
        &self,
        connection_id: ConnectionId,
        username: &str,
        room: &str,
    ) -> Result<PresenceEntry, ApplicationError> {
        let username = Username::parse(username)?;
        let room = RoomName::parse(room)?;

        if let Some(existing) = self.repository.find(connection_id).await? {
            return Err(DomainError::AlreadyJoined {
                room: existing.room.to_string(),
            }
            .into());
        }

        let entry = PresenceEntry::new(connection_id, username, room);
        match self.repository.insert_unique(entry.clone()).await {
            Ok(()) => {
                tracing::info!(
                    connection_id = %connection_id,
                    username = %entry.username,
                    room = %entry.room,
                    "user joined room"
                );
                Ok(entry)
            }
            Err(RepositoryError::Conflict) => Err(DomainError::Conflict {
                username: entry.username.to_string(),
                room: entry.room.to_string(),
            }
            .into()),
            Err(err) => Err(err.into()),
        }
    }

    /// 移除连接的在线记录；重复的断开事件返回 `None`
    pub async fn leave(
        &self,
        connection_id: ConnectionId,
    ) -> Result<Option<PresenceEntry>, ApplicationError> {
        let removed = self.repository.remove(connection_id).await?;
        if let Some(entry) = &removed {
            tracing::info!(
                connection_id = %connection_id,
                username = %entry.username,
                room = %entry.room,
                "user left room"
            );
        }
        Ok(removed)
    }

    pub async fn entry(
        &self,
        connection_id: ConnectionId,
    ) -> Result<Option<PresenceEntry>, ApplicationError> {
        Ok(self.repository.find(connection_id).await?)
    }

    /// 房间内在线用户名
    pub async fn users_in(&self, room: &RoomName) -> Result<BTreeSet<Username>, ApplicationError> {
        Ok(self
            .repository
            .list_room(room)
            .await?
            .into_iter()
            .map(|entry| entry.username)
            .collect())
    }

    /// 房间内在线连接，可排除一条
    pub async fn connections_in(
        &self,
        room: &RoomName,
        except: Option<ConnectionId>,
    ) -> Result<Vec<ConnectionId>, ApplicationError> {
        Ok(self
            .repository
            .list_room(room)
            .await?
            .into_iter()
            .map(|entry| entry.connection_id)
            .filter(|id| Some(*id) != except)
            .collect())
    }

    /// 私聊路由用：查找房间内某用户的连接
    pub async fn find_by_username(
        &self,
        room: &RoomName,
        username: &Username,
    ) -> Result<Option<ConnectionId>, ApplicationError> {
        Ok(self
            .repository
            .find_by_username(room, username)
            .await?
            .map(|entry| entry.connection_id))
    }
}
