//! 按房间划分的互斥锁表
//!
//! 同一房间的“修改 + 广播”在锁内串行执行，不同房间互不阻塞。

use std::sync::Arc;

use dashmap::DashMap;
use domain::RoomName;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct RoomLocks {
    locks: DashMap<RoomName, Arc<Mutex<()>>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取房间锁，持有返回的守卫期间该房间的其他修改会排队等待
    pub async fn lock(&self, room: &RoomName) -> OwnedMutexGuard<()> {
        // 先克隆出 Arc 再等待，避免跨 await 持有分片锁
        let lock = self
            .locks
            .entry(room.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// 没有任何持有者或等待者时移除房间的锁，下次使用时重新创建
    pub fn release_if_idle(&self, room: &RoomName) {
        // 克隆 Arc 与移除都在同一分片锁内进行，计数为 1 说明只剩表内引用
        self.locks
            .remove_if(room, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn room_count(&self) -> usize {
        self.locks.len()
    }
}
