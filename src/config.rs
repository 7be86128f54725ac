use crate::cli::{Args, Command};
use crate::error::ConfigError;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_QUEUE_CAPACITY: usize = 10000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    None,
    Sqlite,
    Mysql,
    Postgres,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Sqlite => "sqlite3",
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
        }
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub kind: BackendKind,
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
    pub path: PathBuf,
    pub ssl: bool,
    pub skip_verify: bool,
    pub flush: bool,
    /// Log every SQL statement at info instead of debug
    pub verbose: bool,
}

impl DatabaseConfig {
    /// SQLite database at `path`, the setup the query mode usually runs with.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: BackendKind::Sqlite,
            user: String::new(),
            password: String::new(),
            database: String::new(),
            host: String::new(),
            port: 0,
            path: path.into(),
            ssl: false,
            skip_verify: false,
            flush: false,
            verbose: false,
        }
    }

    fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let selected = [args.mysql, args.postgres, args.sqlite3]
            .iter()
            .filter(|enabled| **enabled)
            .count();
        if selected > 1 {
            return Err(ConfigError::ConflictingBackends);
        }

        let kind = if args.mysql {
            BackendKind::Mysql
        } else if args.postgres {
            BackendKind::Postgres
        } else if args.sqlite3 {
            BackendKind::Sqlite
        } else {
            BackendKind::None
        };

        let port = match (kind, args.db_port) {
            (_, Some(port)) => port,
            (BackendKind::Mysql, None) => 3306,
            (BackendKind::Postgres, None) => 5432,
            _ => 0,
        };

        let password = match (kind, args.db_password.as_deref()) {
            (BackendKind::Mysql | BackendKind::Postgres, None) => {
                return Err(ConfigError::MissingPassword(kind.name()));
            }
            (_, Some("none")) | (_, None) => String::new(),
            (_, Some(password)) => password.to_string(),
        };

        if args.db_skip_verify && !args.db_ssl {
            return Err(ConfigError::Invalid(
                "--db-skip-verify only applies together with --db-ssl".to_string(),
            ));
        }

        Ok(Self {
            kind,
            user: args.db_user.clone(),
            password,
            database: args.db_database.clone(),
            host: args
                .db_host
                .clone()
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            path: args.db_path.clone(),
            ssl: args.db_ssl,
            skip_verify: args.db_skip_verify,
            flush: args.db_flush,
            verbose: args.db_verbose,
        })
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("kind", &self.kind)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("ssl", &self.ssl)
            .field("skip_verify", &self.skip_verify)
            .field("flush", &self.flush)
            .field("verbose", &self.verbose)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// `None` selects the first usable capture device
    pub interface: Option<String>,
    pub port: u16,
    pub write: Option<PathBuf>,
    pub hexdump: bool,
    pub quiet: bool,
    pub queue_capacity: usize,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRequest {
    List,
    Question(String),
    Answer(String),
}

#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub database: DatabaseConfig,
    pub request: QueryRequest,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub enum Mode {
    ListInterfaces,
    Monitor(MonitorConfig),
    Query(QueryConfig),
}

impl Mode {
    /// Validate parsed arguments into what the process will actually run.
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        if args.list_interfaces {
            return Ok(Self::ListInterfaces);
        }

        let database = DatabaseConfig::from_args(&args)?;

        if let Some(command) = args.command {
            if database.kind == BackendKind::None {
                return Err(ConfigError::NoQueryBackend);
            }
            let (request, limit) = match command {
                Command::List { limit } => (QueryRequest::List, limit),
                Command::FindQuestion { pattern, limit } => (QueryRequest::Question(pattern), limit),
                Command::FindAnswer { text, limit } => (QueryRequest::Answer(text), limit),
            };
            return Ok(Self::Query(QueryConfig {
                database: DatabaseConfig {
                    flush: false,
                    ..database
                },
                request,
                limit,
            }));
        }

        if args.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "--queue-capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self::Monitor(MonitorConfig {
            interface: args.interface,
            port: args.port,
            write: args.write,
            hexdump: args.hexdump,
            quiet: args.quiet,
            queue_capacity: args.queue_capacity,
            database,
        }))
    }
}
