mod mysql;
mod postgres;
mod queue;
mod sqlite;

pub use mysql::MySqlStore;
pub use postgres::PostgresStore;
pub use queue::{PersistenceQueue, QueueSender, WriterReport};
pub use sqlite::SqliteStore;

use crate::config::{BackendKind, DatabaseConfig};
use crate::dns::{CapturedRecord, Client, ClientId};
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::stream::BoxStream;
use log::{LevelFilter, info};
use std::sync::Arc;

/// Durable store for captured records and the read surface the query mode
/// runs on. One implementation per SQL engine; exactly one is active per run.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Create `clients`, `questions` and `answers` if absent. With `flush`
    /// the three tables are dropped first.
    async fn ensure_schema(&self, flush: bool) -> Result<(), StorageError>;

    /// Persist the session row for this run and return its id.
    async fn create_client(&self, client: &Client) -> Result<ClientId, StorageError>;

    /// Insert a record and all of its answers in one transaction.
    async fn persist(&self, record: &CapturedRecord) -> Result<(), StorageError>;

    /// Every stored question in insertion order.
    fn questions(&self) -> BoxStream<'_, Result<StoredQuestion, StorageError>>;

    /// Questions with at least one answer whose data contains `needle`.
    fn questions_with_answer(&self, needle: String)
    -> BoxStream<'_, Result<StoredQuestion, StorageError>>;

    async fn answers(&self, question_id: i64) -> Result<Vec<StoredAnswer>, StorageError>;

    /// Release the connection pool. Calling it again is a no-op.
    async fn close(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredQuestion {
    pub id: i64,
    pub client_id: ClientId,
    pub hostname: Option<String>,
    pub client_ip: Option<String>,
    pub timestamp: String,
    pub name: String,
    pub qtype: String,
    pub class: String,
}

/// (id, client_id, hostname, ip, timestamp, name, type, class)
pub(crate) type QuestionRow = (
    i64,
    i64,
    Option<String>,
    Option<String>,
    String,
    String,
    String,
    String,
);

impl From<QuestionRow> for StoredQuestion {
    fn from(row: QuestionRow) -> Self {
        let (id, client_id, hostname, client_ip, timestamp, name, qtype, class) = row;
        Self {
            id,
            client_id,
            hostname,
            client_ip,
            timestamp,
            name,
            qtype,
            class,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAnswer {
    pub rtype: String,
    pub ttl: i64,
    pub data: String,
}

impl From<(String, i64, String)> for StoredAnswer {
    fn from((rtype, ttl, data): (String, i64, String)) -> Self {
        Self { rtype, ttl, data }
    }
}

/// Timestamps are stored as fixed-width RFC 3339 text so every engine sorts
/// and displays them the same way.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// sqlx logs each statement at debug; `--db-verbose` raises that to info.
pub(crate) fn statement_log_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Debug
    }
}

/// Open the configured backend for capture: create what is missing and run
/// the schema setup. Returns `None` when no backend was selected.
pub async fn connect(
    config: &DatabaseConfig,
) -> Result<Option<Arc<dyn StorageBackend>>, StorageError> {
    let backend = match open_backend(config, true).await? {
        Some(backend) => backend,
        None => return Ok(None),
    };

    backend.ensure_schema(config.flush).await?;
    info!("Connected to {} storage", backend.kind().name());
    Ok(Some(backend))
}

/// Open the configured backend read-only for the query mode. An SQLite file
/// that does not exist is an error rather than silently created.
pub async fn open_existing(
    config: &DatabaseConfig,
) -> Result<Option<Arc<dyn StorageBackend>>, StorageError> {
    open_backend(config, false).await
}

async fn open_backend(
    config: &DatabaseConfig,
    create: bool,
) -> Result<Option<Arc<dyn StorageBackend>>, StorageError> {
    let backend: Arc<dyn StorageBackend> = match config.kind {
        BackendKind::None => return Ok(None),
        BackendKind::Sqlite => Arc::new(SqliteStore::connect(&config.path, create, config.verbose).await?),
        BackendKind::Mysql => Arc::new(MySqlStore::connect(config).await?),
        BackendKind::Postgres => Arc::new(PostgresStore::connect(config).await?),
    };
    Ok(Some(backend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_fixed_width_utc() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2024-05-01T08:30:00.000000Z");
    }

    #[test]
    fn verbose_raises_statement_logging() {
        assert_eq!(statement_log_level(true), LevelFilter::Info);
        assert_eq!(statement_log_level(false), LevelFilter::Debug);
    }

    #[tokio::test]
    async fn no_backend_selected_means_no_storage() {
        let mut config = DatabaseConfig::sqlite("unused.db");
        config.kind = BackendKind::None;
        assert!(connect(&config).await.unwrap().is_none());
    }
}
