//! 应用层实现。
//!
//! 消息日志、在线状态注册表与历史查询服务，以及把连接事件
//! 转换为修改和广播的房间会话协调器。

pub mod clock;
pub mod error;
pub mod room_lock;
pub mod services;
pub mod session;

pub use clock::{Clock, SystemClock};
pub use error::ApplicationError;
pub use room_lock::RoomLocks;
pub use services::{HistoryPage, HistoryQueryService, MessageLog, PageRequest, PresenceRegistry};
pub use session::{CoordinatorDependencies, RoomSessionCoordinator, SessionSettings};
