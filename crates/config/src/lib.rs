//! 统一配置中心
//!
//! 配置来源按优先级从低到高：
//! - 内置默认值
//! - YAML 文件（默认 `chat.yaml`，可用 `CHAT_CONFIG` 指定路径）
//! - `CHAT_` 前缀的环境变量，嵌套字段用 `__` 分隔，例如 `CHAT_SERVER__PORT=9000`

use std::env;
use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "chat.yaml";

/// 全局应用配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// 服务配置
    pub server: ServerConfig,
    /// 历史消息分页配置
    pub history: HistoryConfig,
    /// 消息内容限制
    pub message: MessageConfig,
    /// 日志配置
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// 历史消息分页配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// 消息内容限制
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageConfig {
    pub max_text_length: usize,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            max_text_length: 4000,
        }
    }
}

/// 日志配置，`RUST_LOG` 存在时优先使用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// 从默认路径（或 `CHAT_CONFIG`）加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("CHAT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(path)
    }

    /// 从指定 YAML 文件加载配置，文件不存在时只使用默认值和环境变量
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("CHAT_").ignore(&["config"]).split("__"))
            .extract()
            .map_err(Box::new)?;

        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidServerConfig(
                "port must be greater than 0".to_string(),
            ));
        }

        if self.history.default_page_size == 0 {
            return Err(ConfigError::InvalidHistoryConfig(
                "default_page_size must be greater than 0".to_string(),
            ));
        }

        if self.history.default_page_size > self.history.max_page_size {
            return Err(ConfigError::InvalidHistoryConfig(format!(
                "default_page_size ({}) exceeds max_page_size ({})",
                self.history.default_page_size, self.history.max_page_size
            )));
        }

        if self.message.max_text_length == 0 {
            return Err(ConfigError::InvalidMessageConfig(
                "max_text_length must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// 监听地址
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("Invalid server configuration: {0}")]
    InvalidServerConfig(String),
    #[error("Invalid history configuration: {0}")]
    InvalidHistoryConfig(String),
    #[error("Invalid message configuration: {0}")]
    InvalidMessageConfig(String),
}
