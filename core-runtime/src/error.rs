use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// A global tracing subscriber is already installed.
    #[error("Logging already initialized: {0}")]
    LoggingInitialized(String),
}

impl Error {
    /// `true` when bootstrap can proceed with the host's existing logging.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::LoggingInitialized(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
