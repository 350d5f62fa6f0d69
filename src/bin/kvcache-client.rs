use std::net::SocketAddr;
use std::process::exit;

use clap::{Parser, Subcommand, ValueEnum};

use kvcache::{Cache, CacheError, Operation, Result, StoreBackend, StoreClient, Value};

const DEFAULT_ADDR: &str = "127.0.0.1:4000";

#[derive(Parser)]
#[command(name = "kvcache-client", version, about = "Drives a kvcache Cache against a server")]
struct Cli {
    /// Server address
    #[arg(long, global = true, default_value = DEFAULT_ADDR, value_name = "IP-PORT")]
    addr: SocketAddr,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a value under a new random key and print the key
    Store {
        /// The value
        value: String,
        /// How to interpret the value
        #[arg(long, value_enum, default_value_t = Kind::Text)]
        kind: Kind,
    },
    /// Print the value stored under a key
    Get {
        /// The key
        key: String,
        /// How to decode the stored bytes
        #[arg(long, value_enum, default_value_t = Decode::Str)]
        decode: Decode,
    },
    /// Print the recorded calls of an operation
    Replay {
        /// Operation name, e.g. "store" or "Cache.store"
        #[arg(default_value = "Cache.store")]
        operation: String,
    },
    /// Remove every key from the store
    Flush,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Text,
    Int,
    Float,
}

#[derive(Clone, Copy, ValueEnum)]
enum Decode {
    Raw,
    Str,
    Int,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let client = StoreClient::connect(cli.addr)?;
    let cache = Cache::new(client);

    match cli.command {
        Commands::Store { value, kind } => {
            let key = cache.store(parse_value(&value, kind)?)?;
            println!("{}", key);
        }
        Commands::Get { key, decode } => {
            let value = match decode {
                Decode::Raw => cache
                    .get(&key)?
                    .map(|raw| String::from_utf8_lossy(&raw).into_owned()),
                Decode::Str => cache.get_str(&key)?,
                Decode::Int => cache.get_int(&key)?.map(|n| n.to_string()),
            };
            match value {
                Some(value) => println!("{}", value),
                None => println!("Key not found"),
            }
        }
        Commands::Replay { operation } => {
            let operation: Operation = operation.parse()?;
            if let Some(trace) = cache.replay(operation)? {
                print!("{}", trace);
            }
        }
        Commands::Flush => cache.store_handle().flushdb()?,
    }

    Ok(())
}

fn parse_value(raw: &str, kind: Kind) -> Result<Value> {
    Ok(match kind {
        Kind::Text => Value::from(raw),
        Kind::Int => Value::Int(raw.parse::<i64>()?),
        Kind::Float => Value::Float(
            raw.parse::<f64>()
                .map_err(|e| CacheError::StringError(format!("Invalid float '{}': {}", raw, e)))?,
        ),
    })
}
