use std::io;
use std::num::ParseIntError;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Error type for cache and store operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// IO error from the network or the file system.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error.
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Error from the sled database.
    #[error("Sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Stored bytes are not valid UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// Stored value is not a decimal integer.
    #[error("Parse error: {0}")]
    ParseInt(#[from] ParseIntError),

    /// Operation against a key holding the wrong kind of value.
    #[error("Operation against a key holding the wrong kind of value")]
    WrongType,

    /// Increment of a value that is not an integer.
    #[error("Value is not an integer or out of range")]
    NotAnInteger,

    /// Error reported by a remote store server.
    #[error("Server error: {0}")]
    Server(String),

    /// Error with a plain message.
    #[error("{0}")]
    StringError(String),
}

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
