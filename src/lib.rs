#![deny(missing_docs)]

//! An instrumented cache over a pluggable key-value store.
//!
//! A [`Cache`] stores scalar values under random keys, counts its `store`
//! calls and records their inputs and outputs in the store itself, and can
//! replay that history as a trace. The store is anything implementing
//! [`StoreBackend`]: an in-memory map, a sled database, or a remote
//! [`StoreServer`] reached through a [`StoreClient`].

mod backends;
mod cache;
mod client;
mod common;
pub mod docs;
mod error;
pub mod instrument;
mod replay;
mod server;
/// Thread pool implementations for the store server.
pub mod thread_pool;
mod value;

pub use backends::{MemoryStore, SledStore, StoreBackend};
pub use cache::{Cache, Operation};
pub use client::StoreClient;
pub use common::{Reply, Request, Response};
pub use error::{CacheError, Result};
pub use replay::{replay, Trace, TraceEntry};
pub use server::StoreServer;
pub use thread_pool::{RayonThreadPool, SharedQueueThreadPool, ThreadPool};
pub use value::Value;
