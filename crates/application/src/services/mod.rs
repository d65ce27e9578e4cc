mod history_query;
mod message_log;
mod presence_registry;


pub use history_query::{HistoryPage, HistoryQueryService, PageRequest};
pub use message_log::MessageLog;
pub use presence_registry::PresenceRegistry;
