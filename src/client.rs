use std::io::{BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use serde_json::de::IoRead;
use serde_json::Deserializer;

use crate::backends::StoreBackend;
use crate::common::{Reply, Request, Response};
use crate::{CacheError, Result};

struct Connection {
    reader: Deserializer<IoRead<TcpStream>>,
    writer: BufWriter<TcpStream>,
}

impl Connection {
    fn round_trip(&mut self, request: &Request) -> Result<Reply> {
        serde_json::to_writer(&mut self.writer, request)?;
        self.writer.flush()?;

        match Response::deserialize(&mut self.reader)? {
            Response::Ok(reply) => Ok(reply),
            Response::Err(msg) => Err(CacheError::Server(msg)),
        }
    }
}

/// A client of a remote store server.
///
/// Clones share one connection; requests from different clones are
/// serialized over it.
#[derive(Clone)]
pub struct StoreClient {
    conn: Arc<Mutex<Connection>>,
}

impl StoreClient {
    /// Connects to the server at the given address.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let reader_stream = TcpStream::connect(addr)?;
        let writer_stream = reader_stream.try_clone()?;
        let conn = Connection {
            reader: Deserializer::from_reader(reader_stream),
            writer: BufWriter::new(writer_stream),
        };
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn send(&self, request: Request) -> Result<Reply> {
        self.conn.lock().unwrap().round_trip(&request)
    }
}

fn unexpected(reply: Reply) -> CacheError {
    CacheError::StringError(format!("Unexpected reply: {reply:?}"))
}

impl StoreBackend for StoreClient {
    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let request = Request::Set {
            key: key.to_owned(),
            value: value.to_vec(),
        };
        match self.send(request)? {
            Reply::Unit => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.send(Request::Get { key: key.to_owned() })? {
            Reply::Value(value) => Ok(value),
            other => Err(unexpected(other)),
        }
    }

    fn incr(&self, key: &str) -> Result<i64> {
        match self.send(Request::Incr { key: key.to_owned() })? {
            Reply::Int(n) => Ok(n),
            other => Err(unexpected(other)),
        }
    }

    fn rpush(&self, key: &str, value: &[u8]) -> Result<usize> {
        let request = Request::Rpush {
            key: key.to_owned(),
            value: value.to_vec(),
        };
        match self.send(request)? {
            Reply::Int(len) => Ok(len as usize),
            other => Err(unexpected(other)),
        }
    }

    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>> {
        let request = Request::Lrange {
            key: key.to_owned(),
            start,
            stop,
        };
        match self.send(request)? {
            Reply::List(items) => Ok(items),
            other => Err(unexpected(other)),
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        match self.send(Request::Exists { key: key.to_owned() })? {
            Reply::Bool(found) => Ok(found),
            other => Err(unexpected(other)),
        }
    }

    fn flushdb(&self) -> Result<()> {
        match self.send(Request::FlushDb)? {
            Reply::Unit => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}
