//! Error types for skubridge-core

use thiserror::Error;

/// Result type alias using skubridge-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in skubridge-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record or queue item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP request to a remote collaborator could not complete
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A remote collaborator answered with a non-success status
    #[error("Remote API error: {0}")]
    Api(String),

    /// A remote collaborator answered with a payload that breaks its contract
    #[error("Malformed remote response: {0}")]
    MalformedResponse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error means the remote call itself did not complete.
    ///
    /// Transport errors are absorbed per direction group by the bulk
    /// orchestrator; everything else is reported to the caller as unexpected.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_are_transport_errors() {
        assert!(Error::Api("gateway down (503)".to_string()).is_transport());
        assert!(!Error::MalformedResponse("bad counts".to_string()).is_transport());
        assert!(!Error::NotFound("item".to_string()).is_transport());
    }
}
