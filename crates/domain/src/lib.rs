//! 聊天室会话核心领域模型
//!
//! 包含消息、在线记录等实体，存储接口，以及与存储无关的历史查询规则。

pub mod entities;
pub mod errors;
pub mod repositories;
pub mod services;
pub mod value_objects;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
pub use value_objects::*;
