//! 领域模型错误定义
//!
//! 所有错误都只作用于发起请求的连接，不会影响进程或其他连接。

use thiserror::Error;

use crate::value_objects::MessageId;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 输入校验失败（空用户名、空房间名、空消息等）
    #[error("validation failed: {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// 用户名在该房间内已被在线用户占用
    #[error("username '{username}' is already taken in room '{room}'")]
    Conflict { username: String, room: String },

    /// 消息不存在
    #[error("message {0} not found")]
    MessageNotFound(MessageId),

    /// 连接尚未加入任何房间
    #[error("connection has not joined a room")]
    NotJoined,

    /// 连接已经在某个房间中，换房间需要先离开
    #[error("connection already joined room '{room}'")]
    AlreadyJoined { room: String },
}

impl DomainError {
    /// 创建校验错误
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// 存储层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("storage failure: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

/// 事件投递错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// 连接已关闭或从未注册
    #[error("connection {0} is closed")]
    ConnectionClosed(crate::value_objects::ConnectionId),
}
