use super::{
    QuestionRow, StorageBackend, StoredAnswer, StoredQuestion, format_timestamp,
    statement_log_level,
};
use crate::config::BackendKind;
use crate::dns::{CapturedRecord, Client, ClientId};
use crate::error::StorageError;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use log::{debug, warn};
use sqlx::{ConnectOptions, SqlitePool};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS clients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        hostname TEXT NOT NULL,
        ip TEXT,
        interface TEXT NOT NULL,
        mac TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS questions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        client_id INTEGER NOT NULL,
        timestamp TEXT NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        class TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS answers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
        type TEXT NOT NULL,
        ttl INTEGER NOT NULL,
        data TEXT NOT NULL
    )",
];

const INDEXES: [&str; 2] = [
    "CREATE INDEX IF NOT EXISTS idx_questions_name ON questions(name)",
    "CREATE INDEX IF NOT EXISTS idx_answers_question ON answers(question_id)",
];

const DROP: [&str; 3] = [
    "DROP TABLE IF EXISTS answers",
    "DROP TABLE IF EXISTS questions",
    "DROP TABLE IF EXISTS clients",
];

const SELECT_QUESTIONS: &str = "SELECT q.id, q.client_id, c.hostname, c.ip, q.timestamp, q.name, q.type, q.class
     FROM questions q LEFT JOIN clients c ON c.id = q.client_id
     ORDER BY q.id";

const SELECT_QUESTIONS_WITH_ANSWER: &str = "SELECT q.id, q.client_id, c.hostname, c.ip, q.timestamp, q.name, q.type, q.class
     FROM questions q LEFT JOIN clients c ON c.id = q.client_id
     WHERE EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id AND instr(a.data, ?) > 0)
     ORDER BY q.id";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(path: &Path, create: bool, verbose: bool) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create)
            .log_statements(statement_log_level(verbose));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        debug!("Opened sqlite database at {}", path.display());
        Ok(Self { pool })
    }

    /// Private in-memory database. sqlx names it uniquely and opens it in
    /// shared-cache mode, so every pooled connection sees the same data while
    /// at least one of them stays open.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options =
            SqliteConnectOptions::from_str("sqlite::memory:").map_err(StorageError::Connect)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl StorageBackend for SqliteStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn ensure_schema(&self, flush: bool) -> Result<(), StorageError> {
        if flush {
            warn!("Flushing all stored DNS data (sqlite)");
            for statement in DROP {
                sqlx::query(statement)
                    .execute(&self.pool)
                    .await
                    .map_err(StorageError::Schema)?;
            }
        }

        for statement in SCHEMA.iter().chain(INDEXES.iter()) {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(StorageError::Schema)?;
        }
        Ok(())
    }

    async fn create_client(&self, client: &Client) -> Result<ClientId, StorageError> {
        let result = sqlx::query(
            "INSERT INTO clients (hostname, ip, interface, mac, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&client.hostname)
        .bind(client.ip.map(|ip| ip.to_string()))
        .bind(&client.interface)
        .bind(client.mac.as_deref())
        .bind(format_timestamp(client.created_at))
        .execute(&self.pool)
        .await
        .map_err(StorageError::Persist)?;

        Ok(result.last_insert_rowid())
    }

    async fn persist(&self, record: &CapturedRecord) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Persist)?;

        let question_id = sqlx::query(
            "INSERT INTO questions (client_id, timestamp, name, type, class) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(record.client_id)
        .bind(format_timestamp(record.timestamp))
        .bind(&record.question_name)
        .bind(record.question.qtype.name())
        .bind(record.question.class.name())
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Persist)?
        .last_insert_rowid();

        for answer in &record.answers {
            sqlx::query("INSERT INTO answers (question_id, type, ttl, data) VALUES (?, ?, ?, ?)")
                .bind(question_id)
                .bind(answer.rtype.name())
                .bind(i64::from(answer.ttl))
                .bind(&answer.data)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Persist)?;
        }

        tx.commit().await.map_err(StorageError::Persist)
    }

    fn questions(&self) -> BoxStream<'_, Result<StoredQuestion, StorageError>> {
        sqlx::query_as::<_, QuestionRow>(SELECT_QUESTIONS)
            .fetch(&self.pool)
            .map_ok(StoredQuestion::from)
            .map_err(StorageError::Query)
            .boxed()
    }

    fn questions_with_answer(
        &self,
        needle: String,
    ) -> BoxStream<'_, Result<StoredQuestion, StorageError>> {
        sqlx::query_as::<_, QuestionRow>(SELECT_QUESTIONS_WITH_ANSWER)
            .bind(needle)
            .fetch(&self.pool)
            .map_ok(StoredQuestion::from)
            .map_err(StorageError::Query)
            .boxed()
    }

    async fn answers(&self, question_id: i64) -> Result<Vec<StoredAnswer>, StorageError> {
        let rows = sqlx::query_as::<_, (String, i64, String)>(
            "SELECT type, ttl, data FROM answers WHERE question_id = ? ORDER BY id",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Query)?;

        Ok(rows.into_iter().map(StoredAnswer::from).collect())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
