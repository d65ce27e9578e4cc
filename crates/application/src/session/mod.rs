//! 房间会话协调
//!
//! 把连接事件转换为消息日志/在线状态的修改，并按房间串行地投递结果事件。

mod coordinator;


pub use coordinator::{CoordinatorDependencies, RoomSessionCoordinator};

/// 协调器运行参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub max_text_length: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
            max_text_length: 4000,
        }
    }
}

impl From<&config::AppConfig> for SessionSettings {
    fn from(config: &config::AppConfig) -> Self {
        Self {
            default_page_size: config.history.default_page_size,
            max_page_size: config.history.max_page_size,
            max_text_length: config.message.max_text_length,
        }
    }
}
