//! 会话协议实体
//!
//! 客户端事件与服务器事件的线上格式均为 `{"event": "<name>", "data": ...}`。

use serde::{Deserialize, Serialize};

use crate::entities::message::Message;
use crate::value_objects::{ConnectionId, MessageId, RoomName, Timestamp, Username};

/// 客户端发往核心的事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// 加入房间
    Join { username: String, room: String },
    /// 离开当前房间
    Leave {},
    /// 发送文本消息
    SendMessage { text: String },
    /// 输入状态
    Typing { is_typing: bool },
    /// 分享文件（文件内容已由外部存储保存）
    ShareFile {
        file_name: String,
        file_url: String,
        #[serde(default)]
        text: Option<String>,
    },
    /// 切换表情回应
    ReactToMessage { message_id: MessageId, emoji: String },
    /// 将当前房间全部消息标记为已读
    MarkAsRead {},
    /// 客户端确认收到消息
    MessageDelivered { message_id: MessageId },
    /// 加载历史消息
    LoadMoreMessages {
        #[serde(default)]
        skip: usize,
        #[serde(default)]
        limit: Option<usize>,
    },
    /// 私聊
    PrivateMessage { recipient: String, text: String },
    /// 传输层通知连接已断开，客户端不能发送
    #[serde(skip)]
    Disconnect,
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave {} => "leave",
            Self::SendMessage { .. } => "sendMessage",
            Self::Typing { .. } => "typing",
            Self::ShareFile { .. } => "shareFile",
            Self::ReactToMessage { .. } => "reactToMessage",
            Self::MarkAsRead {} => "markAsRead",
            Self::MessageDelivered { .. } => "messageDelivered",
            Self::LoadMoreMessages { .. } => "loadMoreMessages",
            Self::PrivateMessage { .. } => "privateMessage",
            Self::Disconnect => "disconnect",
        }
    }
}

/// 需要应答的请求类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AckKind {
    Join,
    SendMessage,
    PrivateMessage,
}

/// 错误描述，只发给发起请求的连接
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// 请求应答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub request: AckKind,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message_id: Option<MessageId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<ErrorBody>,
}

impl Ack {
    pub fn ok(request: AckKind, message_id: Option<MessageId>) -> Self {
        Self {
            request,
            ok: true,
            message_id,
            error: None,
        }
    }

    pub fn failed(request: AckKind, error: ErrorBody) -> Self {
        Self {
            request,
            ok: false,
            message_id: None,
            error: Some(error),
        }
    }
}

/// 系统合成消息（欢迎、加入、离开），不写入消息日志
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemNotice {
    pub sender: Username,
    pub text: String,
    pub timestamp: Timestamp,
}

impl SystemNotice {
    pub fn new(text: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            sender: Username::system(),
            text: text.into(),
            timestamp,
        }
    }
}

/// 核心发往连接的事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    Ack(Ack),
    Message(Message),
    System(SystemNotice),
    UserTyping { username: Username, is_typing: bool },
    RoomUsers(Vec<Username>),
    UnreadCount(usize),
    Notification { sender: Username, room: RoomName },
    MessageReaction(Message),
    ReadReceipt {
        room: RoomName,
        username: Username,
        message_ids: Vec<MessageId>,
    },
    FileShared(Message),
    OlderMessages(Vec<Message>),
    PrivateMessage(Message),
    Error(ErrorBody),
}

/// 投递目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// 单条连接
    Connection(ConnectionId),
    /// 房间内全部在线连接，可排除一条
    Room {
        room: RoomName,
        except: Option<ConnectionId>,
    },
}

/// 一条待投递的服务器事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub target: Target,
    pub event: ServerEvent,
}

impl Outbound {
    pub fn to_connection(connection_id: ConnectionId, event: ServerEvent) -> Self {
        Self {
            target: Target::Connection(connection_id),
            event,
        }
    }

    pub fn to_room(room: RoomName, event: ServerEvent) -> Self {
        Self {
            target: Target::Room { room, except: None },
            event,
        }
    }

    pub fn to_room_except(room: RoomName, except: ConnectionId, event: ServerEvent) -> Self {
        Self {
            target: Target::Room {
                room,
                except: Some(except),
            },
            event,
        }
    }
}
