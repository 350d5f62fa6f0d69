use std::fmt;
use std::str::FromStr;

use log::debug;
use uuid::Uuid;

use crate::backends::StoreBackend;
use crate::instrument::{Call, CallHistory, CountCalls, Pipeline};
use crate::replay::{self, Trace};
use crate::{CacheError, Result, Value};

/// The public operations of a [`Cache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`Cache::store`]
    Store,
    /// [`Cache::get`]
    Get,
    /// [`Cache::get_str`]
    GetStr,
    /// [`Cache::get_int`]
    GetInt,
}

impl Operation {
    /// Qualified name, used as the prefix of the operation's store keys.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Store => "Cache.store",
            Operation::Get => "Cache.get",
            Operation::GetStr => "Cache.get_str",
            Operation::GetInt => "Cache.get_int",
        }
    }

    /// Whether calls to this operation are counted and recorded.
    pub fn is_instrumented(self) -> bool {
        matches!(self, Operation::Store)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = CacheError;

    /// Accepts both the qualified name (`Cache.store`) and the bare method
    /// name (`store`).
    fn from_str(s: &str) -> Result<Self> {
        match s.strip_prefix("Cache.").unwrap_or(s) {
            "store" => Ok(Operation::Store),
            "get" => Ok(Operation::Get),
            "get_str" => Ok(Operation::GetStr),
            "get_int" => Ok(Operation::GetInt),
            _ => Err(CacheError::StringError(format!("Unknown operation: {s}"))),
        }
    }
}

/// A cache that stores scalars under random keys in a key-value store.
///
/// Calls to [`Cache::store`] are counted and their inputs and outputs are
/// recorded in the same store, so they can be rendered with
/// [`Cache::replay`].
pub struct Cache<S: StoreBackend> {
    store: S,
    pipeline: Pipeline<S>,
}

impl<S: StoreBackend> Cache<S> {
    /// Creates a `Cache` over the given store handle.
    pub fn new(store: S) -> Self {
        Self {
            store,
            pipeline: Pipeline::new().with(CountCalls).with(CallHistory),
        }
    }

    /// Creates a `Cache` over the given store after removing every key in it.
    pub fn fresh(store: S) -> Result<Self> {
        store.flushdb()?;
        Ok(Self::new(store))
    }

    /// Returns the underlying store handle.
    pub fn store_handle(&self) -> &S {
        &self.store
    }

    /// Stores `value` under a freshly generated key and returns the key.
    pub fn store(&self, value: impl Into<Value>) -> Result<String> {
        let value = value.into();
        let call = Call {
            operation: Operation::Store.name(),
            input: value.to_string(),
        };
        self.pipeline.invoke(&self.store, &call, || {
            let key = Uuid::new_v4().to_string();
            let bytes = value.to_bytes();
            self.store.set(&key, &bytes)?;
            debug!("Stored {} under {}", call.input, key);
            Ok((key, bytes))
        })
    }

    /// Gets the raw bytes stored under `key`.
    ///
    /// Returns `None` if the key does not exist.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.store.get(key)
    }

    /// Gets the value under `key` and converts it with `decoder`.
    ///
    /// The decoder only runs when the key exists.
    pub fn get_with<T, F>(&self, key: &str, decoder: F) -> Result<Option<T>>
    where
        F: FnOnce(Vec<u8>) -> Result<T>,
    {
        self.get(key)?.map(decoder).transpose()
    }

    /// Gets the value under `key` as UTF-8 text.
    pub fn get_str(&self, key: &str) -> Result<Option<String>> {
        self.get_with(key, |raw| Ok(String::from_utf8(raw)?))
    }

    /// Gets the value under `key` as a decimal integer.
    pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.get_with(key, |raw| Ok(String::from_utf8(raw)?.trim().parse::<i64>()?))
    }

    /// Renders the recorded calls of `operation`, oldest first.
    ///
    /// Returns `None` if `operation` is not instrumented.
    pub fn replay(&self, operation: Operation) -> Result<Option<Trace>> {
        replay::replay(self, operation)
    }
}
