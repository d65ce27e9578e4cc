//! 领域实体定义
//!
//! 聊天核心的实体：消息、在线记录，以及会话协议事件。

pub mod message;
pub mod presence;
pub mod protocol;

pub use message::{Message, MessageMutation, NewMessage, Reaction};
pub use presence::PresenceEntry;
pub use protocol::{
    Ack, AckKind, ClientEvent, ErrorBody, Outbound, ServerEvent, SystemNotice, Target,
};
