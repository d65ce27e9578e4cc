//! 领域服务定义
//!
//! 与存储无关的历史查询规则，以及传输层的路由接口。

pub mod history;
pub mod routing;

pub use history::*;
pub use routing::ConnectionRouter;
