use std::collections::HashMap;

use async_trait::async_trait;
use domain::{
    ConnectionId, PresenceEntry, PresenceRepository, RepositoryError, RepositoryResult, RoomName,
    Username,
};
use tokio::sync::RwLock;

/// 内存在线状态仓储，每条连接至多一条记录
#[derive(Default)]
pub struct InMemoryPresenceRepository {
    entries: RwLock<HashMap<ConnectionId, PresenceEntry>>,
}

impl InMemoryPresenceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresenceRepository for InMemoryPresenceRepository {
    async fn insert_unique(&self, entry: PresenceEntry) -> RepositoryResult<()> {
        let mut entries = self.entries.write().await;

        if entries.contains_key(&entry.connection_id)
            || entries.values().any(|existing| existing.collides_with(&entry))
        {
            return Err(RepositoryError::Conflict);
        }

        entries.insert(entry.connection_id, entry);
        Ok(())
    }

    async fn remove(&self, connection_id: ConnectionId) -> RepositoryResult<Option<PresenceEntry>> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(&connection_id))
    }

    async fn find(&self, connection_id: ConnectionId) -> RepositoryResult<Option<PresenceEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&connection_id).cloned())
    }

    async fn find_by_username(
        &self,
        room: &RoomName,
        username: &Username,
    ) -> RepositoryResult<Option<PresenceEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .find(|entry| entry.online && &entry.room == room && &entry.username == username)
            .cloned())
    }

    async fn list_room(&self, room: &RoomName) -> RepositoryResult<Vec<PresenceEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .filter(|entry| entry.online && &entry.room == room)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(username: &str, room: &str) -> PresenceEntry {
        PresenceEntry::new(
            ConnectionId::new(),
            Username::parse(username).unwrap(),
            RoomName::parse(room).unwrap(),
        )
    }

    #[tokio::test]
    async fn rejects_duplicate_username_in_same_room() {
        let repo = InMemoryPresenceRepository::new();
        repo.insert_unique(entry("alice", "general")).await.unwrap();
        assert_eq!(
            repo.insert_unique(entry("alice", "general")).await,
            Err(RepositoryError::Conflict)
        );
        repo.insert_unique(entry("alice", "random")).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_second_entry_for_same_connection() {
        let repo = InMemoryPresenceRepository::new();
        let first = entry("alice", "general");
        let mut second = entry("bob", "random");
        second.connection_id = first.connection_id;

        repo.insert_unique(first).await.unwrap();
        assert_eq!(
            repo.insert_unique(second).await,
            Err(RepositoryError::Conflict)
        );
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let repo = InMemoryPresenceRepository::new();
        let alice = entry("alice", "general");
        let id = alice.connection_id;
        repo.insert_unique(alice.clone()).await.unwrap();

        assert_eq!(repo.remove(id).await.unwrap(), Some(alice));
        assert_eq!(repo.remove(id).await.unwrap(), None);
        let room = RoomName::parse("general").unwrap();
        assert!(repo.list_room(&room).await.unwrap().is_empty());
    }
}
