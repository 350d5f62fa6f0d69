use std::env::current_dir;
use std::fs;
use std::net::SocketAddr;
use std::process::exit;

use clap::{Parser, ValueEnum};
use log::{error, info};

use kvcache::{
    CacheError, MemoryStore, RayonThreadPool, Result, SharedQueueThreadPool, SledStore,
    StoreBackend, StoreServer, ThreadPool,
};

const DEFAULT_ADDR: &str = "127.0.0.1:4000";
const DEFAULT_ENGINE: &str = "memory";
const ENGINE_FILE: &str = "engine";

#[derive(Parser)]
#[command(name = "kvcache-server", version, about = "A key-value store server for kvcache")]
struct Cli {
    /// Server listening address
    #[arg(long, default_value = DEFAULT_ADDR, value_name = "IP-PORT")]
    addr: SocketAddr,

    /// Storage engine: "memory" or "sled"
    #[arg(long, value_name = "ENGINE-NAME")]
    engine: Option<String>,

    /// Thread pool serving connections
    #[arg(long, value_enum, default_value_t = Pool::Shared)]
    pool: Pool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Pool {
    Shared,
    Rayon,
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{}", e);
        exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let engine_name = resolve_engine(cli.engine)?;

    info!("kvcache-server {}", env!("CARGO_PKG_VERSION"));
    info!("Storage engine: {}", engine_name);
    info!("Listening on {}", cli.addr);

    match engine_name.as_str() {
        "memory" => run_with_backend(MemoryStore::new(), cli.pool, cli.addr),
        "sled" => run_with_backend(SledStore::open(current_dir()?)?, cli.pool, cli.addr),
        _ => unreachable!(),
    }
}

fn run_with_backend<B: StoreBackend>(backend: B, pool: Pool, addr: SocketAddr) -> Result<()> {
    let threads = num_cpus::get() as u32;
    match pool {
        Pool::Shared => serve(backend, SharedQueueThreadPool::new(threads)?, addr),
        Pool::Rayon => serve(backend, RayonThreadPool::new(threads)?, addr),
    }
}

fn serve<B: StoreBackend, P: ThreadPool>(backend: B, pool: P, addr: SocketAddr) -> Result<()> {
    StoreServer::new(backend, pool).run(addr)
}

/// Resolves the engine name, checking for conflicts with a previously used engine.
///
/// Only `sled` leaves data in the directory, so only `sled` is recorded.
fn resolve_engine(engine: Option<String>) -> Result<String> {
    let engine_file = current_dir()?.join(ENGINE_FILE);
    let prev_engine = fs::read_to_string(&engine_file).ok();

    let engine = match (engine, prev_engine) {
        (Some(e), Some(prev)) if e != prev => {
            return Err(CacheError::StringError(format!(
                "Wrong engine! Previously used '{}', but '{}' was requested.",
                prev, e
            )));
        }
        (Some(e), _) => e,
        (None, Some(prev)) => prev,
        (None, None) => DEFAULT_ENGINE.to_owned(),
    };

    if engine != "memory" && engine != "sled" {
        return Err(CacheError::StringError(format!(
            "Invalid engine: {}. Must be 'memory' or 'sled'.",
            engine
        )));
    }

    if engine == "sled" {
        fs::write(engine_file, &engine)?;
    }

    Ok(engine)
}
