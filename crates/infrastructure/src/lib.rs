//! 基础设施层实现。
//!
//! 提供进程内的易失存储和连接路由器，实现领域层定义的接口。

pub mod memory;
pub mod router;

pub use memory::{InMemoryMessageRepository, InMemoryPresenceRepository};
pub use router::InMemoryConnectionRouter;
