use std::sync::Arc;

use application::{
    CoordinatorDependencies, HistoryQueryService, RoomSessionCoordinator, SessionSettings,
    SystemClock,
};
use infrastructure::{InMemoryConnectionRouter, InMemoryMessageRepository, InMemoryPresenceRepository};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<RoomSessionCoordinator>,
    pub connections: Arc<InMemoryConnectionRouter>,
}

impl AppState {
    pub fn new(
        coordinator: Arc<RoomSessionCoordinator>,
        connections: Arc<InMemoryConnectionRouter>,
    ) -> Self {
        Self {
            coordinator,
            connections,
        }
    }

    /// 使用进程内存储组装完整的会话核心
    pub fn in_memory(settings: SessionSettings) -> Self {
        let connections = Arc::new(InMemoryConnectionRouter::new());
        let coordinator = RoomSessionCoordinator::new(CoordinatorDependencies {
            message_repository: Arc::new(InMemoryMessageRepository::new()),
            presence_repository: Arc::new(InMemoryPresenceRepository::new()),
            router: connections.clone(),
            clock: Arc::new(SystemClock),
            settings,
        });

        Self::new(Arc::new(coordinator), connections)
    }

    pub fn history(&self) -> &HistoryQueryService {
        self.coordinator.history()
    }
}
