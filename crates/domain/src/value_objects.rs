use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// 统一的时间戳类型。
pub type Timestamp = DateTime<Utc>;

/// 系统合成消息使用的发送者名称。
pub const SYSTEM_SENDER: &str = "System";

/// 私聊合成房间的前缀，用户提交的房间名不能使用。
pub const PRIVATE_ROOM_PREFIX: &str = "pm_";

/// 私聊房间名中分隔两个用户名的字符，用户名不能包含。
const PRIVATE_ROOM_SEPARATOR: char = '_';

/// 单条连接的标识，连接存活期间唯一。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ConnectionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// 消息唯一标识，进程内单调递增。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MessageId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// 去掉首尾空白并转为小写，空结果视为非法。
fn normalize(field: &'static str, value: &str) -> Result<String, DomainError> {
    let value = value.trim().to_lowercase();
    if value.is_empty() {
        return Err(DomainError::validation(field, "cannot be empty"));
    }
    Ok(value)
}

/// 规范化后的房间名（大小写不敏感）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    /// 解析客户端提交的房间名，私聊房间只能由 [`RoomName::private_between`] 构造。
    pub fn parse(value: impl AsRef<str>) -> Result<Self, DomainError> {
        let value = normalize("room", value.as_ref())?;
        if value.starts_with(PRIVATE_ROOM_PREFIX) {
            return Err(DomainError::validation(
                "room",
                format!("prefix '{PRIVATE_ROOM_PREFIX}' is reserved"),
            ));
        }
        Ok(Self(value))
    }

    /// 两个用户私聊使用的合成房间，按字典序排列保证双向共享同一份日志。
    pub fn private_between(a: &Username, b: &Username) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self(format!(
            "{PRIVATE_ROOM_PREFIX}{}{PRIVATE_ROOM_SEPARATOR}{}",
            first.as_str(),
            second.as_str()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 规范化后的用户名（去空白、小写）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn parse(value: impl AsRef<str>) -> Result<Self, DomainError> {
        let value = normalize("username", value.as_ref())?;
        if value.contains(PRIVATE_ROOM_SEPARATOR) {
            return Err(DomainError::validation(
                "username",
                format!("cannot contain '{PRIVATE_ROOM_SEPARATOR}'"),
            ));
        }
        Ok(Self(value))
    }

    /// 系统消息的发送者，不经过规范化。
    pub fn system() -> Self {
        Self(SYSTEM_SENDER.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 表情回应，原样保存（仅去除首尾空白）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Emoji(String);

impl Emoji {
    pub fn parse(value: impl AsRef<str>) -> Result<Self, DomainError> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(DomainError::validation("emoji", "cannot be empty"));
        }
        Ok(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 外部存储返回的文件引用，核心只保存地址和文件名。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub file_url: String,
    pub file_name: String,
}

impl FileRef {
    pub fn new(file_url: impl Into<String>, file_name: impl Into<String>) -> Result<Self, DomainError> {
        let file_url = file_url.into().trim().to_owned();
        let file_name = file_name.into().trim().to_owned();
        if file_url.is_empty() {
            return Err(DomainError::validation("fileUrl", "cannot be empty"));
        }
        if file_name.is_empty() {
            return Err(DomainError::validation("fileName", "cannot be empty"));
        }
        Ok(Self {
            file_url,
            file_name,
        })
    }
}
