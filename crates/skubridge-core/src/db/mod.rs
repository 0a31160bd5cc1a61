//! Database layer for the sync queue and run history

mod connection;
mod migrations;
mod queue_repository;
mod sync_log_repository;

pub use connection::Database;
pub use queue_repository::LibSqlQueueRepository;
pub use sync_log_repository::LibSqlSyncLogRepository;
