use crate::config::DEFAULT_QUEUE_CAPACITY;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dnas")]
#[command(version, about = "Passive DNS traffic recorder and search", long_about = None)]
pub struct Args {
    /// Interface to monitor
    #[arg(short, long, value_name = "eth0")]
    pub interface: Option<String>,

    /// DNS port
    #[arg(short, long, default_value_t = 53)]
    pub port: u16,

    /// Write JSON output to log file
    #[arg(short, long, value_name = "FILE")]
    pub write: Option<PathBuf>,

    /// Show hexdump of DNS packet
    #[arg(short = 'H', long)]
    pub hexdump: bool,

    /// Suppress record output
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable MySQL output
    #[arg(long)]
    pub mysql: bool,

    /// Enable Postgres output
    #[arg(long)]
    pub postgres: bool,

    /// Enable SQLite output
    #[arg(long)]
    pub sqlite3: bool,

    #[arg(long, env = "DNAS_DB_USER", default_value = "root")]
    pub db_user: String,

    /// Database password (`none` for an empty password)
    #[arg(long, env = "DNAS_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    #[arg(long, env = "DNAS_DB_DATABASE", default_value = "dnas")]
    pub db_database: String,

    #[arg(long, env = "DNAS_DB_HOST")]
    pub db_host: Option<String>,

    /// Defaults to 3306 (mysql) or 5432 (postgres)
    #[arg(long, env = "DNAS_DB_PORT")]
    pub db_port: Option<u16>,

    /// Path to database on disk (sqlite3 only)
    #[arg(long, default_value = "./dnas.db")]
    pub db_path: PathBuf,

    /// Require TLS to the database (mysql/postgres only)
    #[arg(long)]
    pub db_ssl: bool,

    /// Accept self-signed or invalid certificates (mysql/postgres only)
    #[arg(long)]
    pub db_skip_verify: bool,

    /// Drop all stored data and start fresh
    #[arg(long)]
    pub db_flush: bool,

    /// Show database statements in the log at info level
    #[arg(long)]
    pub db_verbose: bool,

    /// Records buffered between capture and the database writer
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    #[arg(long)]
    pub list_interfaces: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Offline search over stored records.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List every stored record
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Records whose question name matches a regular expression
    FindQuestion {
        pattern: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Records with an answer containing the given text
    FindAnswer {
        text: String,
        #[arg(long)]
        limit: Option<usize>,
    },
}
