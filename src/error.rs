use thiserror::Error;

#[derive(Debug, Error)]
pub enum CustodianError {
    #[error("metadata store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("failed to parse definition {path}: {reason}")]
    ParseFailure { path: String, reason: String },
    #[error("file operation failed on {path}: {reason}")]
    FileOpFailure { path: String, reason: String },
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}
