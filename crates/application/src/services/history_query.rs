//! 历史查询服务
//!
//! 供 REST 接口和会话协调器使用的只读视图：分页、搜索、未读数与在线用户。

use serde::{Deserialize, Serialize};

use domain::{Message, RoomName, Username};

use crate::error::ApplicationError;
use crate::services::{MessageLog, PresenceRegistry};

/// 分页参数，缺省值由服务补齐
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

/// 一页历史消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub messages: Vec<Message>,
    pub skip: usize,
    pub limit: usize,
    pub has_more: bool,
}

#[derive(Clone)]
pub struct HistoryQueryService {
    log: MessageLog,
    presence: PresenceRegistry,
    default_page_size: usize,
    max_page_size: usize,
}

impl HistoryQueryService {
    pub fn new(
        log: MessageLog,
        presence: PresenceRegistry,
        default_page_size: usize,
        max_page_size: usize,
    ) -> Self {
        Self {
            log,
            presence,
            default_page_size,
            max_page_size,
        }
    }

    /// 实际生效的页大小：缺省取默认值，超过上限时截断
    pub fn effective_limit(&self, limit: Option<usize>) -> usize {
        limit
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size)
    }

    pub async fn page(
        &self,
        room: &str,
        request: PageRequest,
    ) -> Result<HistoryPage, ApplicationError> {
        let room = RoomName::parse(room)?;
        self.page_for(&room, request).await
    }

    pub async fn page_for(
        &self,
        room: &RoomName,
        request: PageRequest,
    ) -> Result<HistoryPage, ApplicationError> {
        let skip = request.skip.unwrap_or(0);
        let limit = self.effective_limit(request.limit);

        // 多取一条用于判断是否还有更多
        let mut messages = self.log.page(room, skip, limit.saturating_add(1)).await?;
        let has_more = messages.len() > limit;
        messages.truncate(limit);

        Ok(HistoryPage {
            messages,
            skip,
            limit,
            has_more,
        })
    }

    pub async fn search(&self, room: &str, query: &str) -> Result<Vec<Message>, ApplicationError> {
        let room = RoomName::parse(room)?;
        self.log.search(&room, query).await
    }

    pub async fn unread_count(&self, room: &str, username: &str) -> Result<usize, ApplicationError> {
        let room = RoomName::parse(room)?;
        let username = Username::parse(username)?;
        self.log.unread_count(&room, &username).await
    }

    /// 房间在线用户，按名称排序
    pub async fn users_in(&self, room: &str) -> Result<Vec<Username>, ApplicationError> {
        let room = RoomName::parse(room)?;
        Ok(self.presence.users_in(&room).await?.into_iter().collect())
    }
}
