//! Web API 层。
//!
//! 提供 Axum 路由：WebSocket 连接交给房间会话协调器处理，
//! REST 接口提供只读的历史查询。

mod error;
mod routes;
mod state;
mod ws_connection;

pub use error::{ApiError, ErrorBody};
pub use routes::router;
pub use state::AppState;
