use serde::{Deserialize, Serialize};

/// Request sent from client to server, one per `StoreBackend` method.
#[derive(Debug, Serialize, Deserialize)]
pub enum Request {
    /// Set a key to a value.
    Set {
        /// The key to set.
        key: String,
        /// The value to associate with the key.
        value: Vec<u8>,
    },
    /// Get the value of a key.
    Get {
        /// The key to look up.
        key: String,
    },
    /// Increment the counter at a key.
    Incr {
        /// The counter key.
        key: String,
    },
    /// Append to the list at a key.
    Rpush {
        /// The list key.
        key: String,
        /// The element to append.
        value: Vec<u8>,
    },
    /// Read a slice of the list at a key.
    Lrange {
        /// The list key.
        key: String,
        /// First index, inclusive.
        start: i64,
        /// Last index, inclusive.
        stop: i64,
    },
    /// Check whether a key exists.
    Exists {
        /// The key to check.
        key: String,
    },
    /// Remove every key.
    FlushDb,
}

/// Payload of a successful response.
#[derive(Debug, Serialize, Deserialize)]
pub enum Reply {
    /// No payload.
    Unit,
    /// A value that may be absent.
    Value(Option<Vec<u8>>),
    /// An integer.
    Int(i64),
    /// A boolean.
    Bool(bool),
    /// A list of values.
    List(Vec<Vec<u8>>),
}

/// Response sent from server to client.
#[derive(Debug, Serialize, Deserialize)]
pub enum Response {
    /// Operation succeeded.
    Ok(Reply),
    /// Operation failed with an error message.
    Err(String),
}
