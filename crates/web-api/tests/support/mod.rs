#![allow(dead_code)]

use std::{net::SocketAddr, time::Duration};

use application::SessionSettings;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::{net::TcpListener, net::TcpStream, sync::oneshot, time::timeout};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as TungsteniteMessage, MaybeTlsStream, WebSocketStream,
};
use web_api::{router, AppState};

pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub fn build_state() -> AppState {
    AppState::in_memory(SessionSettings {
        default_page_size: 2,
        max_page_size: 5,
        max_text_length: 200,
    })
}

/// 在临时端口上启动服务，返回地址和关闭句柄
pub async fn spawn_server(state: AppState) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, router(state).into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    (addr, shutdown_tx)
}

pub async fn connect(addr: SocketAddr) -> Ws {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("ws connect");
    ws
}

pub async fn send_event(ws: &mut Ws, frame: Value) {
    ws.send(TungsteniteMessage::Text(frame.to_string().into()))
        .await
        .expect("ws send");
}

/// 读取下一条文本帧
pub async fn next_event(ws: &mut Ws) -> Value {
    loop {
        let message = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("ws error");
        if let TungsteniteMessage::Text(payload) = message {
            return serde_json::from_str(payload.as_str()).expect("json");
        }
    }
}

/// 跳过其他事件，直到收到指定名称的事件
pub async fn next_named(ws: &mut Ws, name: &str) -> Value {
    loop {
        let event = next_event(ws).await;
        if event["event"] == name {
            return event;
        }
    }
}

/// 加入房间并读完加入时的四个事件
pub async fn join(ws: &mut Ws, username: &str, room: &str) -> Vec<Value> {
    send_event(
        ws,
        json!({"event": "join", "data": {"username": username, "room": room}}),
    )
    .await;

    let mut events = Vec::new();
    for _ in 0..4 {
        events.push(next_event(ws).await);
    }
    assert_eq!(events[0]["event"], "ack");
    assert_eq!(events[0]["data"]["ok"], true, "join failed: {:?}", events[0]);
    events
}
