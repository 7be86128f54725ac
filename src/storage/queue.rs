use super::StorageBackend;
use crate::dns::CapturedRecord;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

/// Counts reported by the storage writer once it has drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterReport {
    pub persisted: u64,
    pub dropped: u64,
}

/// Producer end handed to the capture loop. Records are moved in; the writer
/// owns them from then on.
#[derive(Clone)]
pub struct QueueSender {
    tx: mpsc::Sender<CapturedRecord>,
}

impl QueueSender {
    /// Enqueue from a blocking thread. Waits only while the queue is full.
    /// Gives the record back if the writer is gone.
    pub fn enqueue_blocking(&self, record: CapturedRecord) -> Result<(), CapturedRecord> {
        self.tx.blocking_send(record).map_err(|e| e.0)
    }

    pub async fn enqueue(&self, record: CapturedRecord) -> Result<(), CapturedRecord> {
        self.tx.send(record).await.map_err(|e| e.0)
    }
}

/// Bounded FIFO between capture and a single background writer bound to the
/// active storage backend.
pub struct PersistenceQueue {
    sender: Option<QueueSender>,
    writer: JoinHandle<WriterReport>,
}

impl PersistenceQueue {
    pub fn start(backend: Arc<dyn StorageBackend>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let writer = tokio::spawn(writer_loop(backend, rx));

        Self {
            sender: Some(QueueSender { tx }),
            writer,
        }
    }

    pub fn sender(&self) -> Option<QueueSender> {
        self.sender.clone()
    }

    /// Stop accepting records and wait for the writer to persist everything
    /// still queued. Producers obtained from `sender()` must be dropped first
    /// or this waits for them.
    pub async fn close(mut self) -> Result<WriterReport, JoinError> {
        self.sender.take();
        self.writer.await
    }
}

async fn writer_loop(
    backend: Arc<dyn StorageBackend>,
    mut rx: mpsc::Receiver<CapturedRecord>,
) -> WriterReport {
    let mut report = WriterReport::default();

    while let Some(record) = rx.recv().await {
        match backend.persist(&record).await {
            Ok(()) => {
                report.persisted += 1;
                debug!("Persisted {} {}", record.question.qtype, record.question_name);
            }
            Err(e) => {
                // At-most-once: a failed record is dropped, never retried
                report.dropped += 1;
                warn!("Dropping record for {}: {e}", record.question_name);
            }
        }
    }

    info!(
        "Storage writer drained: {} persisted, {} dropped",
        report.persisted, report.dropped
    );
    report
}
