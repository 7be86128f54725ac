use crate::config::QueryRequest;
use crate::dns::write_answers;
use crate::error::QueryError;
use crate::storage::{StorageBackend, StoredAnswer, StoredQuestion};
use fancy_regex::Regex;
use futures::future;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use log::warn;
use std::fmt;
use std::sync::Arc;

/// A persisted question with its answers, as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub question: StoredQuestion,
    pub answers: Vec<StoredAnswer>,
}

impl fmt::Display for StoredRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let q = &self.question;
        write!(
            f,
            "{} {} ({}) {} {}",
            q.timestamp,
            q.hostname.as_deref().unwrap_or("-"),
            q.client_ip.as_deref().unwrap_or("-"),
            q.qtype,
            q.name
        )?;

        if !self.answers.is_empty() {
            f.write_str(" =>")?;
            write_answers(
                f,
                self.answers
                    .iter()
                    .map(|a| (a.rtype.clone(), u32::try_from(a.ttl).unwrap_or(u32::MAX), a.data.as_str())),
            )?;
        }
        Ok(())
    }
}

pub type RecordStream<'a> = BoxStream<'a, Result<StoredRecord, QueryError>>;

/// Read path over already persisted records. Results are lazy single-pass
/// streams in insertion order; nothing here formats output.
pub struct QueryEngine {
    backend: Arc<dyn StorageBackend>,
}

impl QueryEngine {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn run(&self, request: &QueryRequest) -> Result<RecordStream<'_>, QueryError> {
        match request {
            QueryRequest::List => Ok(self.list_all()),
            QueryRequest::Question(pattern) => self.find_by_question(pattern),
            QueryRequest::Answer(needle) => Ok(self.find_by_answer(needle)),
        }
    }

    pub fn list_all(&self) -> RecordStream<'_> {
        self.backend
            .questions()
            .map_err(QueryError::from)
            .and_then(move |question| self.hydrate(question))
            .boxed()
    }

    /// Records whose question name matches `pattern`. The pattern is
    /// compiled up front so a bad one fails before any row is read.
    pub fn find_by_question(&self, pattern: &str) -> Result<RecordStream<'_>, QueryError> {
        let regex = Regex::new(pattern).map_err(|e| QueryError::InvalidPattern {
            pattern: pattern.to_string(),
            source: Box::new(e),
        })?;

        let stream = self
            .backend
            .questions()
            .map_err(QueryError::from)
            .try_filter(move |question| future::ready(matches(&regex, &question.name)))
            .and_then(move |question| self.hydrate(question))
            .boxed();
        Ok(stream)
    }

    /// Records with at least one answer whose data contains `needle` exactly.
    pub fn find_by_answer(&self, needle: &str) -> RecordStream<'_> {
        self.backend
            .questions_with_answer(needle.to_string())
            .map_err(QueryError::from)
            .and_then(move |question| self.hydrate(question))
            .boxed()
    }

    async fn hydrate(&self, question: StoredQuestion) -> Result<StoredRecord, QueryError> {
        let answers = self.backend.answers(question.id).await?;
        Ok(StoredRecord { question, answers })
    }
}

fn matches(regex: &Regex, name: &str) -> bool {
    match regex.is_match(name) {
        Ok(matched) => matched,
        Err(e) => {
            warn!("Pattern evaluation failed on {name}: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_record_line() {
        let record = StoredRecord {
            question: StoredQuestion {
                id: 1,
                client_id: 1,
                hostname: Some("gw".to_string()),
                client_ip: Some("10.0.0.2".to_string()),
                timestamp: "2024-05-01T08:30:00.000000Z".to_string(),
                name: "example.com".to_string(),
                qtype: "A".to_string(),
                class: "IN".to_string(),
            },
            answers: vec![StoredAnswer {
                rtype: "A".to_string(),
                ttl: 60,
                data: "93.184.216.34".to_string(),
            }],
        };
        assert_eq!(
            record.to_string(),
            "2024-05-01T08:30:00.000000Z gw (10.0.0.2) A example.com => A 93.184.216.34 (60s)"
        );
    }
}
