//! tyrant-cache CLI Client
//!
//! Command-line interface for issuing single cache operations.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use tyrant_cache::{Cache, Config, Value};

/// tyrant-cache CLI
#[derive(Parser, Debug)]
#[command(name = "tyrant-cache-cli")]
#[command(about = "CLI for Tokyo Tyrant compatible caches")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:1978")]
    server: String,

    /// I/O timeout in milliseconds
    #[arg(short, long, default_value = "500")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Get several values
    Mget {
        /// The keys to get
        keys: Vec<String>,
    },

    /// Set a key to a text value
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Set a key only if it is not already cached
    Add {
        /// The key to add
        key: String,

        /// The value to add
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Increment a counter
    Incr {
        /// The counter key
        key: String,

        /// Amount to add (may be negative)
        #[arg(default_value = "1", allow_negative_numbers = true)]
        delta: i32,
    },

    /// Drop every key
    Flush,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> tyrant_cache::Result<()> {
    let config = Config::builder()
        .server(args.server)
        .timeout_ms(args.timeout_ms)
        .build();
    let mut cache = Cache::connect(&config)?;

    match args.command {
        Commands::Get { key } => match cache.get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(nil)"),
        },
        Commands::Mget { keys } => {
            let found = cache.get_many(keys.as_slice())?;
            for key in &keys {
                match found.get(key) {
                    Some(value) => println!("{}: {}", key, value),
                    None => println!("{}: (nil)", key),
                }
            }
        }
        Commands::Set { key, value } => {
            cache.set(&key, &Value::from(value))?;
            println!("OK");
        }
        Commands::Add { key, value } => {
            let added = cache.add(&key, &Value::from(value))?;
            println!("{}", if added { "OK" } else { "EXISTS" });
        }
        Commands::Del { key } => {
            cache.delete(&key)?;
            println!("OK");
        }
        Commands::Incr { key, delta } => match cache.incr(&key, delta)? {
            Some(n) => println!("{}", n),
            None => println!("(not a counter)"),
        },
        Commands::Flush => {
            cache.flush()?;
            println!("OK");
        }
    }

    Ok(())
}
