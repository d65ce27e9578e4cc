//! 内存存储实现
//!
//! 进程退出后数据即丢失。读路径返回快照副本，不阻塞写入方。

mod message_repository;
mod presence_repository;

pub use message_repository::InMemoryMessageRepository;
pub use presence_repository::InMemoryPresenceRepository;
