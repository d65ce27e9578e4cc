use application::ApplicationError;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use domain::{ClientEvent, ConnectionId, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::state::AppState;

/// WebSocket 连接
///
/// 负责把一条 WebSocket 连接接入会话核心：
/// - 在路由器上注册连接的事件队列
/// - 解析客户端帧并交给协调器
/// - 把协调器投递的事件写回客户端
/// - 连接关闭时通知协调器并注销
pub struct WebSocketConnection {
    socket: WebSocket,
    state: AppState,
    connection_id: ConnectionId,
    events: mpsc::UnboundedReceiver<ServerEvent>,
}

impl WebSocketConnection {
    pub async fn new(socket: WebSocket, state: AppState, connection_id: ConnectionId) -> Self {
        let events = state.connections.register(connection_id).await;
        tracing::info!(connection_id = %connection_id, "WebSocket 连接已建立");

        Self {
            socket,
            state,
            connection_id,
            events,
        }
    }

    /// 运行连接主循环，直到任意一侧结束
    pub async fn run(self) {
        let Self {
            socket,
            state,
            connection_id,
            mut events,
        } = self;
        let (mut sender, mut incoming) = socket.split();

        // 只有 pong 走命令通道，业务事件都经由路由器队列，保证顺序
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<WsCommand>(32);

        let mut send_task = tokio::spawn(async move {
            loop {
                let frame = tokio::select! {
                    Some(cmd) = cmd_rx.recv() => match cmd {
                        WsCommand::SendPong(data) => WsMessage::Pong(data.into()),
                    },
                    Some(event) = events.recv() => match serde_json::to_string(&event) {
                        Ok(json) => WsMessage::Text(json.into()),
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to serialize websocket payload");
                            continue;
                        }
                    },
                    else => break,
                };

                if sender.send(frame).await.is_err() {
                    tracing::debug!(connection_id = %connection_id, "websocket sink closed");
                    break;
                }
            }
        });

        // 写端结束后通知读循环退出；只在等待下一帧时响应，已开始的事件总会处理完
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let mut recv_task = {
            let state = state.clone();
            tokio::spawn(async move {
                loop {
                    let message = tokio::select! {
                        _ = &mut stop_rx => break,
                        message = incoming.next() => message,
                    };
                    let Some(Ok(message)) = message else {
                        break;
                    };
                    if Self::handle_incoming(&state, connection_id, message, &cmd_tx)
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            })
        };

        tokio::select! {
            _ = &mut send_task => {
                let _ = stop_tx.send(());
                if let Err(err) = recv_task.await {
                    tracing::warn!(connection_id = %connection_id, error = %err, "websocket receive task failed");
                }
            }
            _ = &mut recv_task => send_task.abort(),
        }

        state.coordinator.disconnect(connection_id).await;
        state.connections.unregister(connection_id).await;
        tracing::info!(connection_id = %connection_id, "WebSocket连接已断开，在线状态已清理");
    }

    /// 处理来自客户端的一帧
    async fn handle_incoming(
        state: &AppState,
        connection_id: ConnectionId,
        message: WsMessage,
        cmd_tx: &mpsc::Sender<WsCommand>,
    ) -> Result<(), ()> {
        match message {
            WsMessage::Close(_) => {
                tracing::debug!(connection_id = %connection_id, "WebSocket收到关闭消息");
                return Err(());
            }
            WsMessage::Ping(data) => {
                if cmd_tx
                    .send(WsCommand::SendPong(data.to_vec()))
                    .await
                    .is_err()
                {
                    return Err(());
                }
            }
            WsMessage::Pong(_) => {}
            WsMessage::Text(text) => match parse_client_event(text.as_str()) {
                Ok(event) => {
                    tracing::debug!(connection_id = %connection_id, event = event.name(), "client event");
                    state.coordinator.handle(connection_id, event).await;
                }
                Err(err) => {
                    tracing::warn!(connection_id = %connection_id, error = %err, "malformed client frame");
                    state
                        .coordinator
                        .reject(
                            connection_id,
                            None,
                            ApplicationError::protocol(format!("malformed frame: {err}")),
                        )
                        .await;
                }
            },
            WsMessage::Binary(_) => {
                state
                    .coordinator
                    .reject(
                        connection_id,
                        None,
                        ApplicationError::protocol("binary frames are not supported"),
                    )
                    .await;
            }
        }
        Ok(())
    }
}

/// 解析客户端帧，没有负载的事件可以省略 `data`
fn parse_client_event(text: &str) -> Result<ClientEvent, serde_json::Error> {
    let mut frame: Value = serde_json::from_str(text)?;
    if let Value::Object(fields) = &mut frame {
        fields
            .entry("data")
            .or_insert_with(|| Value::Object(Default::default()));
    }
    serde_json::from_value(frame)
}

/// WebSocket 写操作命令
#[derive(Debug)]
enum WsCommand {
    SendPong(Vec<u8>),
}
