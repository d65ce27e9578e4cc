use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use domain::{
    insert_chronologically, Message, MessageId, MessageMutation, MessageRepository, NewMessage,
    RepositoryResult, RoomName, Timestamp,
};
use tokio::sync::RwLock;

#[derive(Default)]
struct MessageTable {
    /// 每个房间的消息，始终按 (timestamp, id) 升序
    rooms: HashMap<RoomName, Vec<Message>>,
    /// 消息 id 到所属房间
    index: HashMap<MessageId, RoomName>,
}

/// 内存消息仓储
pub struct InMemoryMessageRepository {
    table: RwLock<MessageTable>,
    last_id: AtomicU64,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(MessageTable::default()),
            last_id: AtomicU64::new(0),
        }
    }

    fn next_id(&self) -> MessageId {
        MessageId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, draft: NewMessage, timestamp: Timestamp) -> RepositoryResult<Message> {
        let mut table = self.table.write().await;
        let message = Message::new(self.next_id(), draft, timestamp);

        let room = table.rooms.entry(message.room.clone()).or_default();
        insert_chronologically(room, message.clone());

        table.index.insert(message.id, message.room.clone());

        tracing::debug!(message_id = %message.id, room = %message.room, "message appended");
        Ok(message)
    }

    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>> {
        let table = self.table.read().await;
        let found = table
            .index
            .get(&id)
            .and_then(|room| table.rooms.get(room))
            .and_then(|messages| messages.iter().find(|message| message.id == id))
            .cloned();
        Ok(found)
    }

    async fn mutate(
        &self,
        id: MessageId,
        mutation: MessageMutation,
    ) -> RepositoryResult<Option<Message>> {
        let mut table = self.table.write().await;
        let MessageTable { rooms, index } = &mut *table;

        let Some(room) = index.get(&id) else {
            return Ok(None);
        };
        let Some(message) = rooms
            .get_mut(room)
            .and_then(|messages| messages.iter_mut().find(|message| message.id == id))
        else {
            return Ok(None);
        };

        message.apply(mutation);
        Ok(Some(message.clone()))
    }

    async fn list_room(&self, room: &RoomName) -> RepositoryResult<Vec<Message>> {
        let table = self.table.read().await;
        Ok(table.rooms.get(room).cloned().unwrap_or_default())
    }

    async fn clear(&self) -> RepositoryResult<()> {
        let mut table = self.table.write().await;
        table.rooms.clear();
        table.index.clear();
        Ok(())
    }
}
