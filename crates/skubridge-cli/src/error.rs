use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] skubridge_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Queue item ID cannot be empty")]
    EmptyQueueItemId,
    #[error("Queue item not found for id/prefix: {0}")]
    QueueItemNotFound(String),
    #[error("{0}")]
    AmbiguousQueueItemId(String),
    #[error("Nothing selected. Pass queue item IDs or --all")]
    NothingSelected,
    #[error("Bulk sync hit unexpected errors: {0}")]
    UnexpectedSyncErrors(String),
    #[error("Record not found on the authoritative platform: {0}")]
    RecordNotFound(String),
    #[error("Invalid field assignment '{0}': {1}")]
    InvalidAssignment(String, String),
    #[error("Failed to read records from {0}: {1}")]
    RecordsFile(String, String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Gateway is not configured. Run `skubridge config init --base-url <url>` or set SKUBRIDGE_API_BASE_URL."
    )]
    GatewayNotConfigured,
}
