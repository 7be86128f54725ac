use super::{
    QuestionRow, StorageBackend, StoredAnswer, StoredQuestion, format_timestamp,
    statement_log_level,
};
use crate::config::{BackendKind, DatabaseConfig};
use crate::dns::{CapturedRecord, Client, ClientId};
use crate::error::StorageError;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use log::{debug, warn};
use sqlx::{ConnectOptions, PgPool};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::time::Duration;

const SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS clients (
        id BIGSERIAL PRIMARY KEY,
        hostname TEXT NOT NULL,
        ip TEXT,
        interface TEXT NOT NULL,
        mac TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS questions (
        id BIGSERIAL PRIMARY KEY,
        client_id BIGINT NOT NULL,
        timestamp TEXT NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        class TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS answers (
        id BIGSERIAL PRIMARY KEY,
        question_id BIGINT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
        type TEXT NOT NULL,
        ttl BIGINT NOT NULL,
        data TEXT NOT NULL
    )",
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
     WHERE EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id AND strpos(a.data, $1) > 0)
     ORDER BY q.id";

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StorageError> {
        let ssl_mode = match (config.ssl, config.skip_verify) {
            (false, _) => PgSslMode::Disable,
            (true, true) => PgSslMode::Require,
            (true, false) => PgSslMode::VerifyFull,
        };

        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .ssl_mode(ssl_mode)
            .log_statements(statement_log_level(config.verbose));

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        debug!(
            "Connected to postgres at {}:{}/{}",
            config.host, config.port, config.database
        );
        Ok(Self { pool })
    }
}

#[async_trait]
impl StorageBackend for PostgresStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    async fn ensure_schema(&self, flush: bool) -> Result<(), StorageError> {
        if flush {
            warn!("Flushing all stored DNS data (postgres)");
            for statement in DROP {
                sqlx::query(statement)
                    .execute(&self.pool)
                    .await
                    .map_err(StorageError::Schema)?;
            }
        }

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(StorageError::Schema)?;
        }
        Ok(())
    }

    async fn create_client(&self, client: &Client) -> Result<ClientId, StorageError> {
        let (id,) = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO clients (hostname, ip, interface, mac, created_at)
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&client.hostname)
        .bind(client.ip.map(|ip| ip.to_string()))
        .bind(&client.interface)
        .bind(client.mac.as_deref())
        .bind(format_timestamp(client.created_at))
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Persist)?;

        Ok(id)
    }

    async fn persist(&self, record: &CapturedRecord) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Persist)?;

        let (question_id,) = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO questions (client_id, timestamp, name, type, class)
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(record.client_id)
        .bind(format_timestamp(record.timestamp))
        .bind(&record.question_name)
        .bind(record.question.qtype.name())
        .bind(record.question.class.name())
        .fetch_one(&mut *tx)
        .await
        .map_err(StorageError::Persist)?;

        for answer in &record.answers {
            sqlx::query("INSERT INTO answers (question_id, type, ttl, data) VALUES ($1, $2, $3, $4)")
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
            "SELECT type, ttl, data FROM answers WHERE question_id = $1 ORDER BY id",
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
