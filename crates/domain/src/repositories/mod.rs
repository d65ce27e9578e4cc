//! Repository接口定义
//!
//! 内层定义接口，外层实现接口。当前实现是进程内的易失存储，
//! 换成持久化存储时不需要改动上层契约。

pub mod message_repository;
pub mod presence_repository;

pub use message_repository::MessageRepository;
pub use presence_repository::PresenceRepository;

use crate::errors::RepositoryError;

pub type RepositoryResult<T> = Result<T, RepositoryError>;
