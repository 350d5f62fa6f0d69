use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{list_range, next_counter, StoreBackend};
use crate::{CacheError, Result};

/// A value held under a key.
#[derive(Debug, Clone)]
enum Entry {
    Bytes(Vec<u8>),
    List(Vec<Vec<u8>>),
}

/// An in-process store.
///
/// Clones share the same map, so a clone handed to a `Cache` can be
/// inspected from the outside.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    /// Creates an empty `MemoryStore`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for MemoryStore {
    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_owned(), Entry::Bytes(value.to_vec()));
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(Entry::Bytes(value)) => Ok(Some(value.clone())),
            Some(Entry::List(_)) => Err(CacheError::WrongType),
            None => Ok(None),
        }
    }

    fn incr(&self, key: &str) -> Result<i64> {
        let mut entries = self.entries.lock().unwrap();
        let next = match entries.get(key) {
            Some(Entry::Bytes(value)) => next_counter(Some(value.as_slice()))?,
            Some(Entry::List(_)) => return Err(CacheError::WrongType),
            None => next_counter(None)?,
        };
        entries.insert(key.to_owned(), Entry::Bytes(next.to_string().into_bytes()));
        Ok(next)
    }

    fn rpush(&self, key: &str, value: &[u8]) -> Result<usize> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .entry(key.to_owned())
            .or_insert_with(|| Entry::List(Vec::new()));
        match entry {
            Entry::List(items) => {
                items.push(value.to_vec());
                Ok(items.len())
            }
            Entry::Bytes(_) => Err(CacheError::WrongType),
        }
    }

    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>> {
        let entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(Entry::List(items)) => Ok(items[list_range(items.len(), start, stop)].to_vec()),
            Some(Entry::Bytes(_)) => Err(CacheError::WrongType),
            None => Ok(Vec::new()),
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.entries.lock().unwrap().contains_key(key))
    }

    fn flushdb(&self) -> Result<()> {
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}
