use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Media could not be opened: {uri} ({reason})")]
    MediaOpenFailed { uri: String, reason: String },

    #[error("Media engine transport failed: {0}")]
    Transport(String),

    #[error("Media engine already released")]
    Released,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
