use axum::{
    extract::{ws::WebSocketUpgrade, Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use application::{HistoryPage, PageRequest};
use domain::{ConnectionId, Message, Username};

use crate::{error::ApiError, state::AppState, ws_connection::WebSocketConnection};

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
struct MessagesResponse {
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct UnreadResponse {
    unread: usize,
}

#[derive(Debug, Serialize)]
struct UsersResponse {
    users: Vec<Username>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(websocket_upgrade))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/rooms/{room}/messages", get(list_messages))
        .route("/rooms/{room}/messages/search", get(search_messages))
        .route("/rooms/{room}/unread/{username}", get(unread_count))
        .route("/rooms/{room}/users", get(room_users))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn list_messages(
    State(state): State<AppState>,
    Path(room): Path<String>,
    Query(request): Query<PageRequest>,
) -> Result<Json<HistoryPage>, ApiError> {
    let page = state.history().page(&room, request).await?;
    Ok(Json(page))
}

async fn search_messages(
    State(state): State<AppState>,
    Path(room): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let messages = state.history().search(&room, &query.q).await?;
    Ok(Json(MessagesResponse { messages }))
}

async fn unread_count(
    State(state): State<AppState>,
    Path((room, username)): Path<(String, String)>,
) -> Result<Json<UnreadResponse>, ApiError> {
    let unread = state.history().unread_count(&room, &username).await?;
    Ok(Json(UnreadResponse { unread }))
}

async fn room_users(
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> Result<Json<UsersResponse>, ApiError> {
    let users = state.history().users_in(&room).await?;
    Ok(Json(UsersResponse { users }))
}

async fn websocket_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| async move {
        let connection = WebSocketConnection::new(socket, state, ConnectionId::new()).await;
        connection.run().await;
    })
}
