use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchdogError {
    #[error("Failed to connect to {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("Failed to disconnect from {address}: {reason}")]
    DisconnectFailed { address: String, reason: String },

    #[error("No coordinator registered for config entry {0}")]
    EntryNotFound(String),

    #[error("Entity with unique id {0} is already registered")]
    DuplicateUniqueId(String),

    #[error("Entity {0} is not attached to a state bus")]
    NotAttached(String),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type WatchdogResult<T> = Result<T, WatchdogError>;
