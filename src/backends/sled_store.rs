use std::path::Path;

use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::{Db, Tree};

use super::{list_range, next_counter, StoreBackend};
use crate::{CacheError, Result};

const LIST_LENS_TREE: &str = "list_lens";
const LIST_ITEMS_TREE: &str = "list_items";

/// A store backed by the `sled` embedded database.
///
/// String values live in the default tree. A list keeps its length in the
/// `list_lens` tree and one entry per element in the `list_items` tree, keyed
/// `<key>\0<big-endian index>`, so appends and range reads never touch the
/// rest of the list. `sled::Db` is internally `Arc`-based, so cloning is cheap.
#[derive(Clone)]
pub struct SledStore {
    db: Db,
    lens: Tree,
    items: Tree,
}

/// Prefix shared by every element key of the list `key`.
fn item_prefix(key: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(key.len() + 1);
    prefix.extend_from_slice(key.as_bytes());
    prefix.push(0);
    prefix
}

fn item_key(key: &str, index: u64) -> Vec<u8> {
    let mut item = item_prefix(key);
    item.extend_from_slice(&index.to_be_bytes());
    item
}

fn decode_len(raw: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = raw
        .try_into()
        .map_err(|_| CacheError::StringError("Corrupt list length".to_owned()))?;
    Ok(u64::from_be_bytes(bytes))
}

impl SledStore {
    /// Creates a `SledStore` from an already-opened sled `Db`.
    pub fn new(db: Db) -> Result<Self> {
        let lens = db.open_tree(LIST_LENS_TREE)?;
        let items = db.open_tree(LIST_ITEMS_TREE)?;
        Ok(Self { db, lens, items })
    }

    /// Opens (or creates) a sled database in the given directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(sled::open(path)?)
    }

    fn list_len(&self, key: &str) -> Result<u64> {
        match self.lens.get(key)? {
            Some(raw) => decode_len(&raw),
            None => Ok(0),
        }
    }

    fn remove_list(&self, key: &str) -> Result<()> {
        if self.lens.remove(key)?.is_some() {
            for item in self.items.scan_prefix(item_prefix(key)).keys() {
                self.items.remove(item?)?;
            }
        }
        Ok(())
    }
}

impl StoreBackend for SledStore {
    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db.insert(key, value)?;
        self.remove_list(key)?;
        self.db.flush()?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.lens.contains_key(key)? {
            return Err(CacheError::WrongType);
        }
        Ok(self.db.get(key)?.map(|ivec| ivec.to_vec()))
    }

    fn incr(&self, key: &str) -> Result<i64> {
        if self.lens.contains_key(key)? {
            return Err(CacheError::WrongType);
        }
        loop {
            let current = self.db.get(key)?;
            let next = next_counter(current.as_deref())?;
            let swapped = self
                .db
                .compare_and_swap(key, current, Some(next.to_string().into_bytes()))?;
            if swapped.is_ok() {
                self.db.flush()?;
                return Ok(next);
            }
        }
    }

    fn rpush(&self, key: &str, value: &[u8]) -> Result<usize> {
        if self.db.contains_key(key)? {
            return Err(CacheError::WrongType);
        }
        // sled retries the closure on conflict
        let len = (&self.lens, &self.items)
            .transaction(|(lens, items)| {
                let len = match lens.get(key.as_bytes())? {
                    Some(raw) => decode_len(&raw).map_err(ConflictableTransactionError::Abort)?,
                    None => 0,
                };
                items.insert(item_key(key, len), value)?;
                lens.insert(key.as_bytes(), (len + 1).to_be_bytes().to_vec())?;
                Ok(len + 1)
            })
            .map_err(|e| match e {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => CacheError::Sled(e),
            })?;
        self.db.flush()?;
        Ok(len as usize)
    }

    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>> {
        if self.db.contains_key(key)? {
            return Err(CacheError::WrongType);
        }
        let range = list_range(self.list_len(key)? as usize, start, stop);
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let bounds = item_key(key, range.start as u64)..item_key(key, range.end as u64);
        self.items
            .range(bounds)
            .values()
            .map(|item| item.map(|ivec| ivec.to_vec()).map_err(CacheError::from))
            .collect()
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.db.contains_key(key)? || self.lens.contains_key(key)?)
    }

    fn flushdb(&self) -> Result<()> {
        self.db.clear()?;
        self.lens.clear()?;
        self.items.clear()?;
        self.db.flush()?;
        Ok(())
    }
}
