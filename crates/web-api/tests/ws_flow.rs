mod support;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use serde_json::json;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;

use support::{build_state, connect, join, next_event, next_named, send_event, spawn_server};

#[tokio::test]
async fn join_and_message_flow() {
    let (addr, shutdown_tx) = spawn_server(build_state()).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    let events = join(&mut alice, "Alice", "General").await;
    assert_eq!(events[1]["event"], "system");
    assert_eq!(events[1]["data"]["sender"], "System");
    assert_eq!(events[1]["data"]["text"], "Welcome to general, alice!");
    assert_eq!(events[2]["event"], "roomUsers");
    assert_eq!(events[2]["data"], json!(["alice"]));
    assert_eq!(events[3], json!({"event": "unreadCount", "data": 0}));

    join(&mut bob, "bob", "general").await;
    let joined = next_event(&mut alice).await;
    assert_eq!(joined["data"]["text"], "bob has joined the chat");
    let users = next_event(&mut alice).await;
    assert_eq!(users["data"], json!(["alice", "bob"]));

    send_event(
        &mut alice,
        json!({"event": "sendMessage", "data": {"text": "hello"}}),
    )
    .await;

    let message = next_event(&mut alice).await;
    assert_eq!(message["event"], "message");
    assert_eq!(message["data"]["text"], "hello");
    assert_eq!(message["data"]["sender"], "alice");
    assert_eq!(message["data"]["delivered"], false);
    assert_eq!(message["data"]["readBy"], json!(["alice"]));

    let ack = next_event(&mut alice).await;
    assert_eq!(ack["event"], "ack");
    assert_eq!(ack["data"]["request"], "sendMessage");
    assert_eq!(ack["data"]["messageId"], message["data"]["id"]);

    let seen_by_bob = next_event(&mut bob).await;
    assert_eq!(seen_by_bob["data"]["id"], message["data"]["id"]);
    let notification = next_event(&mut bob).await;
    assert_eq!(
        notification,
        json!({"event": "notification", "data": {"sender": "alice", "room": "general"}})
    );

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn taken_username_gets_conflict_ack() {
    let (addr, shutdown_tx) = spawn_server(build_state()).await;
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;
    join(&mut first, "alice", "general").await;

    send_event(
        &mut second,
        json!({"event": "join", "data": {"username": "ALICE", "room": "general"}}),
    )
    .await;
    let ack = next_event(&mut second).await;
    assert_eq!(ack["event"], "ack");
    assert_eq!(ack["data"]["ok"], false);
    assert_eq!(ack["data"]["error"]["code"], "CONFLICT");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn malformed_frames_get_protocol_errors() {
    let (addr, shutdown_tx) = spawn_server(build_state()).await;
    let mut ws = connect(addr).await;

    ws.send(TungsteniteMessage::Text("not json".into()))
        .await
        .expect("send");
    let error = next_event(&mut ws).await;
    assert_eq!(error["event"], "error");
    assert_eq!(error["data"]["code"], "PROTOCOL_ERROR");

    send_event(&mut ws, json!({"event": "typing", "data": {"isTyping": true}})).await;
    let error = next_event(&mut ws).await;
    assert_eq!(error["data"]["code"], "PROTOCOL_ERROR");

    // 连接仍然可用
    join(&mut ws, "alice", "general").await;

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn closing_a_socket_leaves_the_room() {
    let state = build_state();
    let (addr, shutdown_tx) = spawn_server(state.clone()).await;
    let mut alice = connect(addr).await;
    let mut carol = connect(addr).await;
    join(&mut alice, "alice", "x").await;
    join(&mut carol, "carol", "x").await;
    next_named(&mut alice, "roomUsers").await;

    carol.close(None).await.expect("close");

    let left = next_named(&mut alice, "system").await;
    assert_eq!(left["data"]["text"], "carol has left the chat");
    let users = next_named(&mut alice, "roomUsers").await;
    assert_eq!(users["data"], json!(["alice"]));

    let body: serde_json::Value = Client::new()
        .get(format!("http://{}/api/v1/rooms/x/users", addr))
        .send()
        .await
        .expect("users request")
        .json()
        .await
        .expect("users json");
    assert_eq!(body, json!({"users": ["alice"]}));

    let mut again = connect(addr).await;
    join(&mut again, "carol", "x").await;

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn history_is_available_over_rest() {
    let (addr, shutdown_tx) = spawn_server(build_state()).await;
    let mut alice = connect(addr).await;
    join(&mut alice, "alice", "general").await;

    for text in ["one", "two", "three"] {
        send_event(
            &mut alice,
            json!({"event": "sendMessage", "data": {"text": text}}),
        )
        .await;
        next_named(&mut alice, "ack").await;
    }

    let client = Client::new();
    let page: serde_json::Value = client
        .get(format!(
            "http://{}/api/v1/rooms/General/messages?skip=0&limit=2",
            addr
        ))
        .send()
        .await
        .expect("page request")
        .json()
        .await
        .expect("page json");
    assert_eq!(page["hasMore"], true);
    assert_eq!(page["messages"][0]["text"], "one");
    assert_eq!(page["messages"][1]["text"], "two");

    let unread: serde_json::Value = client
        .get(format!("http://{}/api/v1/rooms/general/unread/bob", addr))
        .send()
        .await
        .expect("unread request")
        .json()
        .await
        .expect("unread json");
    assert_eq!(unread, json!({"unread": 3}));

    send_event(
        &mut alice,
        json!({"event": "loadMoreMessages", "data": {"skip": 2}}),
    )
    .await;
    let older = next_named(&mut alice, "olderMessages").await;
    assert_eq!(older["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(older["data"][0]["text"], "three");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn websocket_ping_pong_flow() {
    let (addr, shutdown_tx) = spawn_server(build_state()).await;
    let mut ws = connect(addr).await;

    ws.send(TungsteniteMessage::Ping(b"ping".to_vec().into()))
        .await
        .expect("send ping");

    let pong = timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(TungsteniteMessage::Pong(data))) => return data,
                Some(Ok(_)) => continue,
                other => panic!("unexpected frame {other:?}"),
            }
        }
    })
    .await
    .expect("pong timeout");
    assert_eq!(pong.as_ref(), b"ping");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn mark_as_read_and_leave_accept_empty_data() {
    let (addr, shutdown_tx) = spawn_server(build_state()).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    join(&mut alice, "alice", "general").await;
    join(&mut bob, "bob", "general").await;
    next_named(&mut alice, "roomUsers").await;

    for text in ["one", "two"] {
        send_event(
            &mut alice,
            json!({"event": "sendMessage", "data": {"text": text}}),
        )
        .await;
        next_named(&mut alice, "ack").await;
        next_named(&mut bob, "notification").await;
    }

    send_event(&mut bob, json!({"event": "markAsRead", "data": {}})).await;
    let receipt = next_named(&mut bob, "readReceipt").await;
    assert_eq!(receipt["data"]["username"], "bob");
    assert_eq!(receipt["data"]["room"], "general");
    assert_eq!(receipt["data"]["messageIds"].as_array().map(Vec::len), Some(2));
    let unread = next_event(&mut bob).await;
    assert_eq!(unread, json!({"event": "unreadCount", "data": 0}));

    let seen_by_alice = next_named(&mut alice, "readReceipt").await;
    assert_eq!(seen_by_alice["data"]["username"], "bob");

    send_event(&mut bob, json!({"event": "leave", "data": {}})).await;
    let left = next_named(&mut alice, "system").await;
    assert_eq!(left["data"]["text"], "bob has left the chat");
    let users = next_named(&mut alice, "roomUsers").await;
    assert_eq!(users["data"], json!(["alice"]));

    // data 省略时同样可以离开，离开后才能加入别的房间
    send_event(&mut alice, json!({"event": "leave"})).await;
    join(&mut alice, "alice", "random").await;

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn events_sent_before_closing_are_fully_applied() {
    let (addr, shutdown_tx) = spawn_server(build_state()).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    join(&mut alice, "alice", "general").await;
    join(&mut bob, "bob", "general").await;
    next_named(&mut alice, "roomUsers").await;

    for text in ["one", "two", "three"] {
        send_event(
            &mut alice,
            json!({"event": "sendMessage", "data": {"text": text}}),
        )
        .await;
        next_named(&mut alice, "ack").await;
    }

    send_event(&mut bob, json!({"event": "markAsRead", "data": {}})).await;
    bob.close(None).await.expect("close");

    let left = next_named(&mut alice, "system").await;
    assert_eq!(left["data"]["text"], "bob has left the chat");

    let unread: serde_json::Value = Client::new()
        .get(format!("http://{}/api/v1/rooms/general/unread/bob", addr))
        .send()
        .await
        .expect("unread request")
        .json()
        .await
        .expect("unread json");
    assert_eq!(unread, json!({"unread": 0}));

    let _ = shutdown_tx.send(());
}
