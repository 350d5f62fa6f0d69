use std::ops::Range;

use crate::{CacheError, Result};

/// The capability set a cache needs from a key-value store.
///
/// Keys name either a string value or a list of byte strings, never both.
/// Handles are cheap to clone and every clone talks to the same data, so a
/// handle can be passed to as many caches or threads as needed.
pub trait StoreBackend: Clone + Send + 'static {
    /// Sets `key` to `value`, replacing whatever the key held before.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Gets the string value of `key`.
    ///
    /// Returns `None` if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Increments the integer stored at `key` by one and returns the new value.
    ///
    /// An absent key counts as `0`.
    fn incr(&self, key: &str) -> Result<i64>;

    /// Appends `value` to the list at `key` and returns the new length.
    fn rpush(&self, key: &str, value: &[u8]) -> Result<usize>;

    /// Returns the elements of the list at `key` between `start` and `stop`,
    /// both inclusive. Negative indices count from the end of the list.
    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>>;

    /// Returns whether `key` holds a value of any kind.
    fn exists(&self, key: &str) -> Result<bool>;

    /// Removes every key.
    fn flushdb(&self) -> Result<()>;
}

mod memory;
mod sled_store;

pub use self::memory::MemoryStore;
pub use self::sled_store::SledStore;

/// Resolves inclusive, possibly negative list bounds against a list of `len`
/// elements. Out-of-range bounds are clamped.
pub(crate) fn list_range(len: usize, start: i64, stop: i64) -> Range<usize> {
    let len = len as i64;
    let start = if start < 0 { (start + len).max(0) } else { start };
    let stop = if stop < 0 { stop + len } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return 0..0;
    }
    start as usize..(stop + 1) as usize
}

/// Returns the counter value following `current`.
pub(crate) fn next_counter(current: Option<&[u8]>) -> Result<i64> {
    let current = match current {
        None => 0,
        Some(raw) => std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or(CacheError::NotAnInteger)?,
    };
    current.checked_add(1).ok_or(CacheError::NotAnInteger)
}
