//! 在线状态实体
//!
//! 一条在线记录绑定一条连接与一个 (用户名, 房间) 组合。

use serde::{Deserialize, Serialize};

use crate::value_objects::{ConnectionId, RoomName, Username};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEntry {
    pub connection_id: ConnectionId,
    pub username: Username,
    pub room: RoomName,
    pub online: bool,
}

impl PresenceEntry {
    pub fn new(connection_id: ConnectionId, username: Username, room: RoomName) -> Self {
        Self {
            connection_id,
            username,
            room,
            online: true,
        }
    }

    /// 是否与另一条记录在同一房间占用同一用户名
    pub fn collides_with(&self, other: &PresenceEntry) -> bool {
        self.online && other.online && self.room == other.room && self.username == other.username
    }
}
