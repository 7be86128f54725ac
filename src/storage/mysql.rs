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
use sqlx::{ConnectOptions, MySqlPool};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlSslMode};
use std::time::Duration;

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS clients (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        hostname VARCHAR(255) NOT NULL,
        ip VARCHAR(64),
        interface VARCHAR(64) NOT NULL,
        mac VARCHAR(32),
        created_at VARCHAR(32) NOT NULL
    ) CHARACTER SET utf8mb4",
    "CREATE TABLE IF NOT EXISTS questions (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        client_id BIGINT NOT NULL,
        timestamp VARCHAR(32) NOT NULL,
        name VARCHAR(255) NOT NULL,
        type VARCHAR(16) NOT NULL,
        class VARCHAR(16) NOT NULL,
        INDEX idx_questions_name (name)
    ) CHARACTER SET utf8mb4",
    "CREATE TABLE IF NOT EXISTS answers (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        question_id BIGINT NOT NULL,
        type VARCHAR(16) NOT NULL,
        ttl BIGINT NOT NULL,
        data TEXT COLLATE utf8mb4_bin NOT NULL,
        INDEX idx_answers_question (question_id),
        FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
    ) CHARACTER SET utf8mb4",
];

const DROP: [&str; 3] = [
    "DROP TABLE IF EXISTS answers",
    "DROP TABLE IF EXISTS questions",
    "DROP TABLE IF EXISTS clients",
];

const SELECT_QUESTIONS: &str = "SELECT q.id, q.client_id, c.hostname, c.ip, q.timestamp, q.name, q.type, q.class
     FROM questions q LEFT JOIN clients c ON c.id = q.client_id
     ORDER BY q.id";

/// Containment is byte exact: the collation is forced to binary so tables
/// created with a case-insensitive default still match exactly.
const SELECT_QUESTIONS_WITH_ANSWER: &str = "SELECT q.id, q.client_id, c.hostname, c.ip, q.timestamp, q.name, q.type, q.class
     FROM questions q LEFT JOIN clients c ON c.id = q.client_id
     WHERE EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id AND INSTR(a.data COLLATE utf8mb4_bin, ?) > 0)
     ORDER BY q.id";

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StorageError> {
        let ssl_mode = match (config.ssl, config.skip_verify) {
            (false, _) => MySqlSslMode::Disabled,
            (true, true) => MySqlSslMode::Required,
            (true, false) => MySqlSslMode::VerifyIdentity,
        };

        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .ssl_mode(ssl_mode)
            .log_statements(statement_log_level(config.verbose));

        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        debug!(
            "Connected to mysql at {}:{}/{}",
            config.host, config.port, config.database
        );
        Ok(Self { pool })
    }
}

#[async_trait]
impl StorageBackend for MySqlStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Mysql
    }

    async fn ensure_schema(&self, flush: bool) -> Result<(), StorageError> {
        if flush {
            warn!("Flushing all stored DNS data (mysql)");
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

        Ok(result.last_insert_id() as ClientId)
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
        .last_insert_id() as i64;

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
