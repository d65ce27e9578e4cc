//! 连接路由接口
//!
//! 传输层为每条连接提供可寻址的通道，核心只通过这个接口投递事件。

use async_trait::async_trait;

use crate::entities::protocol::ServerEvent;
use crate::errors::RouteError;
use crate::value_objects::ConnectionId;

#[async_trait]
pub trait ConnectionRouter: Send + Sync {
    /// 路由事件到指定连接
    async fn route_to_connection(
        &self,
        connection_id: ConnectionId,
        event: ServerEvent,
    ) -> Result<(), RouteError>;
}
