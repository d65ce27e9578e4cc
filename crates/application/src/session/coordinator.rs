use std::sync::Arc;

use domain::{
    Ack, AckKind, ClientEvent, ConnectionId, ConnectionRouter, DomainError, Emoji, FileRef,
    MessageId, MessageRepository, Outbound, PresenceEntry, PresenceRepository, RoomName,
    ServerEvent, SystemNotice, Target, Username,
};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

use crate::{
    clock::Clock,
    error::ApplicationError,
    room_lock::RoomLocks,
    services::{HistoryQueryService, MessageLog, PageRequest, PresenceRegistry},
    session::SessionSettings,
};

pub struct CoordinatorDependencies {
    pub message_repository: Arc<dyn MessageRepository>,
    pub presence_repository: Arc<dyn PresenceRepository>,
    pub router: Arc<dyn ConnectionRouter>,
    pub clock: Arc<dyn Clock>,
    pub settings: SessionSettings,
}

/// 房间会话协调器
///
/// 每条连接的状态只有 未加入 → 已加入(room) → 未加入，是否已加入由在线状态注册表决定。
/// 同一房间的修改和随后的事件投递在房间锁内完成，保证所有观察者看到的顺序与修改顺序一致。
pub struct RoomSessionCoordinator {
    log: MessageLog,
    presence: PresenceRegistry,
    history: HistoryQueryService,
    router: Arc<dyn ConnectionRouter>,
    clock: Arc<dyn Clock>,
    pub(super) locks: RoomLocks,
    settings: SessionSettings,
}

impl RoomSessionCoordinator {
    pub fn new(deps: CoordinatorDependencies) -> Self {
        let log = MessageLog::new(deps.message_repository, deps.clock.clone());
        let presence = PresenceRegistry::new(deps.presence_repository);
        let history = HistoryQueryService::new(
            log.clone(),
            presence.clone(),
            deps.settings.default_page_size,
            deps.settings.max_page_size,
        );

        Self {
            log,
            presence,
            history,
            router: deps.router,
            clock: deps.clock,
            locks: RoomLocks::new(),
            settings: deps.settings,
        }
    }

    pub fn message_log(&self) -> &MessageLog {
        &self.log
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    pub fn history(&self) -> &HistoryQueryService {
        &self.history
    }

    /// 处理一条连接事件。
    ///
    /// 返回值中的事件已经通过路由器投递，仅供调用方观察。
    /// 任何错误都只回复给发起请求的连接。
    pub async fn handle(&self, connection_id: ConnectionId, event: ClientEvent) -> Vec<Outbound> {
        let name = event.name();
        let ack_kind = match &event {
            ClientEvent::Join { .. } => Some(AckKind::Join),
            ClientEvent::SendMessage { .. } => Some(AckKind::SendMessage),
            ClientEvent::PrivateMessage { .. } => Some(AckKind::PrivateMessage),
            _ => None,
        };

        match self.process(connection_id, event).await {
            Ok(outbound) => outbound,
            Err(err) => {
                warn!(
                    connection_id = %connection_id,
                    event = name,
                    code = err.code(),
                    error = %err,
                    "client event rejected"
                );
                self.reject(connection_id, ack_kind, err).await
            }
        }
    }

    /// 传输层通知连接断开
    pub async fn disconnect(&self, connection_id: ConnectionId) -> Vec<Outbound> {
        self.handle(connection_id, ClientEvent::Disconnect).await
    }

    /// 向单条连接回复解析失败等传输层错误
    pub async fn reject(
        &self,
        connection_id: ConnectionId,
        ack_kind: Option<AckKind>,
        err: ApplicationError,
    ) -> Vec<Outbound> {
        let body = err.to_body();
        let event = match ack_kind {
            Some(kind) => ServerEvent::Ack(Ack::failed(kind, body)),
            None => ServerEvent::Error(body),
        };
        let outbound = vec![Outbound::to_connection(connection_id, event)];
        self.dispatch(&outbound).await;
        outbound
    }

    async fn process(
        &self,
        connection_id: ConnectionId,
        event: ClientEvent,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        match event {
            ClientEvent::Join { username, room } => self.join(connection_id, &username, &room).await,
            ClientEvent::Leave {} => self.leave(connection_id, true).await,
            ClientEvent::Disconnect => self.leave(connection_id, false).await,
            ClientEvent::SendMessage { text } => self.send_message(connection_id, text).await,
            ClientEvent::Typing { is_typing } => self.typing(connection_id, is_typing).await,
            ClientEvent::ShareFile {
                file_name,
                file_url,
                text,
            } => {
                self.share_file(connection_id, file_name, file_url, text)
                    .await
            }
            ClientEvent::ReactToMessage { message_id, emoji } => {
                self.react(connection_id, message_id, &emoji).await
            }
            ClientEvent::MarkAsRead {} => self.mark_as_read(connection_id).await,
            ClientEvent::MessageDelivered { message_id } => {
                self.message_delivered(connection_id, message_id).await
            }
            ClientEvent::LoadMoreMessages { skip, limit } => {
                self.load_more(connection_id, skip, limit).await
            }
            ClientEvent::PrivateMessage { recipient, text } => {
                self.private_message(connection_id, &recipient, text).await
            }
        }
    }

    async fn join(
        &self,
        connection_id: ConnectionId,
        username: &str,
        room: &str,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        let room = RoomName::parse(room)?;
        let guard = self.locks.lock(&room).await;

        let entry = match self.presence.join(connection_id, username, room.as_str()).await {
            Ok(entry) => entry,
            Err(err) => {
                drop(guard);
                self.locks.release_if_idle(&room);
                return Err(err);
            }
        };
        let now = self.clock.now();
        let users = self.room_users(&entry.room).await?;
        let unread = self.log.unread_count(&entry.room, &entry.username).await?;

        let outbound = vec![
            Outbound::to_connection(connection_id, ServerEvent::Ack(Ack::ok(AckKind::Join, None))),
            Outbound::to_connection(
                connection_id,
                ServerEvent::System(SystemNotice::new(
                    format!("Welcome to {}, {}!", entry.room, entry.username),
                    now,
                )),
            ),
            Outbound::to_room_except(
                entry.room.clone(),
                connection_id,
                ServerEvent::System(SystemNotice::new(
                    format!("{} has joined the chat", entry.username),
                    now,
                )),
            ),
            Outbound::to_room(entry.room.clone(), ServerEvent::RoomUsers(users)),
            Outbound::to_connection(connection_id, ServerEvent::UnreadCount(unread)),
        ];
        self.dispatch(&outbound).await;
        Ok(outbound)
    }

    /// 主动离开与断开连接共用；断开时未加入不算错误
    async fn leave(
        &self,
        connection_id: ConnectionId,
        explicit: bool,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        let Some(entry) = self.presence.entry(connection_id).await? else {
            if explicit {
                return Err(DomainError::NotJoined.into());
            }
            debug!(connection_id = %connection_id, "disconnect before join");
            return Ok(Vec::new());
        };

        let guard = self.locks.lock(&entry.room).await;
        // 重复的断开事件在这里被吸收
        let Some(entry) = self.presence.leave(connection_id).await? else {
            return Ok(Vec::new());
        };

        let users = self.room_users(&entry.room).await?;
        let room_empty = users.is_empty();
        let outbound = vec![
            Outbound::to_room(
                entry.room.clone(),
                ServerEvent::System(SystemNotice::new(
                    format!("{} has left the chat", entry.username),
                    self.clock.now(),
                )),
            ),
            Outbound::to_room(entry.room.clone(), ServerEvent::RoomUsers(users)),
        ];
        self.dispatch(&outbound).await;
        drop(guard);

        if room_empty {
            self.locks.release_if_idle(&entry.room);
        }
        Ok(outbound)
    }

    async fn send_message(
        &self,
        connection_id: ConnectionId,
        text: String,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        let entry = self.joined(connection_id).await?;
        self.check_text_length(&text)?;

        let _guard = self.lock_joined(connection_id, &entry).await?;
        let message = self
            .log
            .append(&entry.room, &entry.username, Some(text), None)
            .await?;
        debug!(message_id = %message.id, room = %entry.room, "message accepted");

        let outbound = vec![
            Outbound::to_room(entry.room.clone(), ServerEvent::Message(message.clone())),
            Outbound::to_connection(
                connection_id,
                ServerEvent::Ack(Ack::ok(AckKind::SendMessage, Some(message.id))),
            ),
            Outbound::to_room_except(
                entry.room.clone(),
                connection_id,
                ServerEvent::Notification {
                    sender: entry.username.clone(),
                    room: entry.room.clone(),
                },
            ),
        ];
        self.dispatch(&outbound).await;
        Ok(outbound)
    }

    async fn typing(
        &self,
        connection_id: ConnectionId,
        is_typing: bool,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        let entry = self.joined(connection_id).await?;
        let _guard = self.lock_joined(connection_id, &entry).await?;

        let outbound = vec![Outbound::to_room_except(
            entry.room.clone(),
            connection_id,
            ServerEvent::UserTyping {
                username: entry.username,
                is_typing,
            },
        )];
        self.dispatch(&outbound).await;
        Ok(outbound)
    }

    async fn share_file(
        &self,
        connection_id: ConnectionId,
        file_name: String,
        file_url: String,
        text: Option<String>,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        let entry = self.joined(connection_id).await?;
        let file = FileRef::new(file_url, file_name)?;
        // 附言为空时按纯文件消息处理
        let text = text.filter(|caption| !caption.trim().is_empty());
        if let Some(caption) = &text {
            self.check_text_length(caption)?;
        }

        let _guard = self.lock_joined(connection_id, &entry).await?;
        let message = self
            .log
            .append(&entry.room, &entry.username, text, Some(file))
            .await?;

        let outbound = vec![Outbound::to_room(
            entry.room.clone(),
            ServerEvent::FileShared(message),
        )];
        self.dispatch(&outbound).await;
        Ok(outbound)
    }

    async fn react(
        &self,
        connection_id: ConnectionId,
        message_id: MessageId,
        emoji: &str,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        let entry = self.joined(connection_id).await?;
        let emoji = Emoji::parse(emoji)?;

        let _guard = self.lock_joined(connection_id, &entry).await?;
        // 只能回应当前房间内的消息
        match self.log.find(message_id).await? {
            Some(message) if message.room == entry.room => {}
            _ => return Err(DomainError::MessageNotFound(message_id).into()),
        }
        let message = self
            .log
            .toggle_reaction(message_id, emoji, &entry.username)
            .await?;

        let outbound = vec![Outbound::to_room(
            entry.room.clone(),
            ServerEvent::MessageReaction(message),
        )];
        self.dispatch(&outbound).await;
        Ok(outbound)
    }

    async fn mark_as_read(
        &self,
        connection_id: ConnectionId,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        let entry = self.joined(connection_id).await?;
        let _guard = self.lock_joined(connection_id, &entry).await?;

        let message_ids = self.log.mark_room_read(&entry.room, &entry.username).await?;
        let outbound = vec![
            Outbound::to_room(
                entry.room.clone(),
                ServerEvent::ReadReceipt {
                    room: entry.room.clone(),
                    username: entry.username.clone(),
                    message_ids,
                },
            ),
            Outbound::to_connection(connection_id, ServerEvent::UnreadCount(0)),
        ];
        self.dispatch(&outbound).await;
        Ok(outbound)
    }

    async fn message_delivered(
        &self,
        connection_id: ConnectionId,
        message_id: MessageId,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        let entry = self.joined(connection_id).await?;

        // 只接受当前房间内消息的送达确认，其余一律按未知消息忽略
        match self.log.find(message_id).await? {
            Some(message) if message.room == entry.room => {
                let _guard = self.lock_joined(connection_id, &entry).await?;
                self.log.mark_delivered(message_id).await?;
            }
            _ => {
                debug!(
                    message_id = %message_id,
                    room = %entry.room,
                    "delivery ack for unknown message ignored"
                );
            }
        }
        Ok(Vec::new())
    }

    async fn load_more(
        &self,
        connection_id: ConnectionId,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        let entry = self.joined(connection_id).await?;
        let page = self
            .history
            .page_for(
                &entry.room,
                PageRequest {
                    skip: Some(skip),
                    limit,
                },
            )
            .await?;

        let outbound = vec![Outbound::to_connection(
            connection_id,
            ServerEvent::OlderMessages(page.messages),
        )];
        self.dispatch(&outbound).await;
        Ok(outbound)
    }

    async fn private_message(
        &self,
        connection_id: ConnectionId,
        recipient: &str,
        text: String,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        let entry = self.joined(connection_id).await?;
        let recipient = Username::parse(recipient)?;
        if recipient == entry.username {
            return Err(DomainError::validation("recipient", "cannot message yourself").into());
        }
        self.check_text_length(&text)?;

        let recipient_connection = self
            .presence
            .find_by_username(&entry.room, &recipient)
            .await?;
        let pm_room = RoomName::private_between(&entry.username, &recipient);

        let guard = self.locks.lock(&pm_room).await;
        let result = self
            .deliver_private(connection_id, &entry, &recipient, recipient_connection, &pm_room, text)
            .await;
        drop(guard);
        // 私聊房间没有在线成员，投递完即可释放锁
        self.locks.release_if_idle(&pm_room);
        result
    }

    /// 在私聊房间锁内写入日志并投递
    async fn deliver_private(
        &self,
        connection_id: ConnectionId,
        entry: &PresenceEntry,
        recipient: &Username,
        recipient_connection: Option<ConnectionId>,
        pm_room: &RoomName,
        text: String,
    ) -> Result<Vec<Outbound>, ApplicationError> {
        let message = self
            .log
            .append(pm_room, &entry.username, Some(text), None)
            .await?;

        let mut outbound = Vec::with_capacity(2);
        match recipient_connection {
            Some(target) => outbound.push(Outbound::to_connection(
                target,
                ServerEvent::PrivateMessage(message.clone()),
            )),
            None => debug!(
                recipient = %recipient,
                room = %entry.room,
                "private message recipient offline, stored only"
            ),
        }
        outbound.push(Outbound::to_connection(
            connection_id,
            ServerEvent::Ack(Ack::ok(AckKind::PrivateMessage, Some(message.id))),
        ));
        self.dispatch(&outbound).await;
        Ok(outbound)
    }

    async fn joined(&self, connection_id: ConnectionId) -> Result<PresenceEntry, ApplicationError> {
        self.presence
            .entry(connection_id)
            .await?
            .ok_or_else(|| DomainError::NotJoined.into())
    }

    /// 取得房间锁后重新读取在线状态，连接已离开或换了房间时按未加入处理
    async fn lock_joined(
        &self,
        connection_id: ConnectionId,
        entry: &PresenceEntry,
    ) -> Result<OwnedMutexGuard<()>, ApplicationError> {
        let guard = self.locks.lock(&entry.room).await;
        match self.presence.entry(connection_id).await? {
            Some(current) if current == *entry => Ok(guard),
            _ => Err(DomainError::NotJoined.into()),
        }
    }

    async fn room_users(&self, room: &RoomName) -> Result<Vec<Username>, ApplicationError> {
        Ok(self.presence.users_in(room).await?.into_iter().collect())
    }

    fn check_text_length(&self, text: &str) -> Result<(), ApplicationError> {
        let max = self.settings.max_text_length;
        if text.trim().chars().count() > max {
            return Err(DomainError::validation("text", format!("longer than {max} characters")).into());
        }
        Ok(())
    }

    /// 把事件交给路由器。房间目标在此刻按在线状态展开，
    /// 已关闭的连接只记录日志，不影响其他接收者。
    async fn dispatch(&self, outbound: &[Outbound]) {
        for item in outbound {
            let recipients = match &item.target {
                Target::Connection(connection_id) => vec![*connection_id],
                Target::Room { room, except } => {
                    match self.presence.connections_in(room, *except).await {
                        Ok(connections) => connections,
                        Err(err) => {
                            warn!(room = %room, error = %err, "failed to resolve room connections");
                            continue;
                        }
                    }
                }
            };

            for connection_id in recipients {
                if let Err(err) = self
                    .router
                    .route_to_connection(connection_id, item.event.clone())
                    .await
                {
                    debug!(connection_id = %connection_id, error = %err, "dropped event for closed connection");
                }
            }
        }
    }
}
