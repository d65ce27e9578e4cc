//! 内存连接路由器
//!
//! 每条连接一个无界 mpsc 队列。入队不阻塞，因此可以在房间锁内调用，
//! 同一连接上的事件顺序与入队顺序一致。

use std::collections::HashMap;

use async_trait::async_trait;
use domain::{ConnectionId, ConnectionRouter, RouteError, ServerEvent};
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

#[derive(Default)]
pub struct InMemoryConnectionRouter {
    /// 连接发送器映射
    senders: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>>,
}

impl InMemoryConnectionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册连接，返回该连接的事件接收端
    pub async fn register(
        &self,
        connection_id: ConnectionId,
    ) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut senders = self.senders.write().await;
        senders.insert(connection_id, tx);
        debug!(connection_id = %connection_id, "connection registered");
        rx
    }

    /// 注销连接发送器
    pub async fn unregister(&self, connection_id: ConnectionId) {
        let mut senders = self.senders.write().await;
        if senders.remove(&connection_id).is_some() {
            debug!(connection_id = %connection_id, "connection unregistered");
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.senders.read().await.len()
    }
}

#[async_trait]
impl ConnectionRouter for InMemoryConnectionRouter {
    async fn route_to_connection(
        &self,
        connection_id: ConnectionId,
        event: ServerEvent,
    ) -> Result<(), RouteError> {
        let senders = self.senders.read().await;
        let sender = senders
            .get(&connection_id)
            .ok_or(RouteError::ConnectionClosed(connection_id))?;

        sender
            .send(event)
            .map_err(|_| RouteError::ConnectionClosed(connection_id))
    }
}
