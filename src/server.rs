use std::io::BufWriter;
use std::io::Write;
use std::net::{TcpListener, TcpStream, ToSocketAddrs};

use log::{debug, error, info};
use serde_json::Deserializer;

use crate::backends::StoreBackend;
use crate::common::{Reply, Request, Response};
use crate::thread_pool::ThreadPool;
use crate::Result;

/// A server exposing a store backend over TCP.
///
/// Generic over both the backend `B` and the thread pool `P`.
pub struct StoreServer<B: StoreBackend, P: ThreadPool> {
    backend: B,
    pool: P,
}

impl<B: StoreBackend, P: ThreadPool> StoreServer<B, P> {
    /// Creates a `StoreServer` with a given backend and thread pool.
    pub fn new(backend: B, pool: P) -> Self {
        Self { backend, pool }
    }

    /// Binds to the given address and serves connections on it.
    pub fn run(&self, addr: impl ToSocketAddrs) -> Result<()> {
        self.serve(TcpListener::bind(addr)?)
    }

    /// Serves connections accepted on an already bound listener.
    ///
    /// Each connection is dispatched to the thread pool for handling.
    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        info!("Serving on {}", listener.local_addr()?);

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let backend = self.backend.clone();
                    self.pool.spawn(move || {
                        if let Err(e) = handle_connection(backend, stream) {
                            error!("Error handling connection: {}", e);
                        }
                    });
                }
                Err(e) => error!("Connection failed: {}", e),
            }
        }

        Ok(())
    }
}

/// Handles a single client connection.
fn handle_connection<B: StoreBackend>(backend: B, stream: TcpStream) -> Result<()> {
    let peer_addr = stream.peer_addr()?;
    debug!("Accepted connection from {}", peer_addr);

    let reader = &stream;
    let mut writer = BufWriter::new(&stream);
    let requests = Deserializer::from_reader(reader).into_iter::<Request>();

    for request in requests {
        let request = request?;
        debug!("Received request from {}: {:?}", peer_addr, request);

        let response = match execute(&backend, request) {
            Ok(reply) => Response::Ok(reply),
            Err(e) => Response::Err(e.to_string()),
        };

        serde_json::to_writer(&mut writer, &response)?;
        writer.flush()?;
    }

    debug!("Connection from {} closed", peer_addr);
    Ok(())
}

fn execute<B: StoreBackend>(backend: &B, request: Request) -> Result<Reply> {
    Ok(match request {
        Request::Set { key, value } => {
            backend.set(&key, &value)?;
            Reply::Unit
        }
        Request::Get { key } => Reply::Value(backend.get(&key)?),
        Request::Incr { key } => Reply::Int(backend.incr(&key)?),
        Request::Rpush { key, value } => Reply::Int(backend.rpush(&key, &value)? as i64),
        Request::Lrange { key, start, stop } => Reply::List(backend.lrange(&key, start, stop)?),
        Request::Exists { key } => Reply::Bool(backend.exists(&key)?),
        Request::FlushDb => {
            backend.flushdb()?;
            Reply::Unit
        }
    })
}
