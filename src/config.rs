use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::db::default_db_path;

/// Library circulation service.
///
/// Every flag can also be supplied through the matching `LIBRARY_*`
/// environment variable.
#[derive(Debug, Parser)]
#[command(name = "library-circulation", version, about)]
pub struct Config {
    /// SQLite database file [default: ~/.library-circulation/library.sqlite]
    #[arg(long, env = "LIBRARY_DATABASE")]
    pub database: Option<PathBuf>,

    /// Address the HTTP server listens on
    #[arg(long, env = "LIBRARY_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Maximum number of open database connections
    #[arg(
        long,
        env = "LIBRARY_POOL_SIZE",
        default_value_t = 8,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub pool_size: u32,

    /// Offset from UTC, in minutes, of the timezone that defines "today"
    #[arg(
        long,
        env = "LIBRARY_UTC_OFFSET_MINUTES",
        default_value_t = 0,
        allow_hyphen_values = true
    )]
    pub utc_offset_minutes: i32,

    /// Default log filter; RUST_LOG takes precedence when set
    #[arg(long, env = "LIBRARY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LIBRARY_LOG_JSON")]
    pub log_json: bool,
}

impl Config {
    /// The configured database file, or the per-user default.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }

    /// Connection pool bound as the store expects it.
    pub fn pool_size(&self) -> usize {
        self.pool_size as usize
    }
}
