use crate::output::JsonLog;
use crate::pcap::{CaptureReport, CaptureStats};
use crate::storage::{PersistenceQueue, StorageBackend, WriterReport};
use log::{error, info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Why the monitor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    Interrupted,
    CaptureEnded,
}

#[derive(Debug, Default)]
pub struct ShutdownReport {
    pub cause: Option<ShutdownCause>,
    pub capture: Option<CaptureStats>,
    /// Set when the capture loop stopped on an error or panicked
    pub capture_error: Option<String>,
    pub json_lines: Option<u64>,
    pub writer: Option<WriterReport>,
    /// Steps that failed or panicked while closing
    pub failed_steps: Vec<&'static str>,
}

impl ShutdownReport {
    pub fn exit_code(&self) -> i32 {
        if self.capture_error.is_some() { 1 } else { 0 }
    }
}

/// Owns every resource the monitor opened and releases them in order: stop
/// capture, then the JSON log, then the persistence queue, then storage.
pub struct ShutdownCoordinator {
    cancel: CancellationToken,
    capture: Option<JoinHandle<CaptureReport>>,
    json: Option<JsonLog>,
    queue: Option<PersistenceQueue>,
    storage: Option<Arc<dyn StorageBackend>>,
}

impl ShutdownCoordinator {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            capture: None,
            json: None,
            queue: None,
            storage: None,
        }
    }

    pub fn with_capture(mut self, capture: JoinHandle<CaptureReport>) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn with_json_log(mut self, json: Option<JsonLog>) -> Self {
        self.json = json;
        self
    }

    pub fn with_queue(mut self, queue: Option<PersistenceQueue>) -> Self {
        self.queue = queue;
        self
    }

    pub fn with_storage(mut self, storage: Option<Arc<dyn StorageBackend>>) -> Self {
        self.storage = storage;
        self
    }

    /// Wait for Ctrl-C or for capture to end on its own, then shut down.
    pub async fn run(self) -> ShutdownReport {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Cannot listen for interrupt: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Same as [`run`](Self::run) with an arbitrary interrupt future.
    pub async fn run_until<F>(mut self, interrupt: F) -> ShutdownReport
    where
        F: Future<Output = ()>,
    {
        let mut report = ShutdownReport::default();

        let capture = match self.capture.take() {
            Some(mut handle) => {
                let (cause, joined) = tokio::select! {
                    _ = interrupt => {
                        info!("Interrupt received, stopping capture...");
                        self.cancel.cancel();
                        (ShutdownCause::Interrupted, (&mut handle).await)
                    }
                    joined = &mut handle => (ShutdownCause::CaptureEnded, joined),
                };
                report.cause = Some(cause);
                Some(joined)
            }
            None => {
                interrupt.await;
                report.cause = Some(ShutdownCause::Interrupted);
                None
            }
        };
        self.cancel.cancel();

        match capture {
            Some(Ok(capture)) => {
                if let Err(e) = &capture.result {
                    error!("Packet capture failed: {e}");
                    report.capture_error = Some(e.to_string());
                }
                report.capture = Some(capture.stats);
            }
            Some(Err(e)) => {
                error!("Capture thread did not finish cleanly: {e}. Please report this issue.");
                report.capture_error = Some(e.to_string());
            }
            None => {}
        }

        self.close_resources(&mut report).await;
        report
    }

    async fn close_resources(&mut self, report: &mut ShutdownReport) {
        if let Some(json) = self.json.take() {
            match json.close().await {
                Ok(Ok(lines)) => {
                    info!("JSON log closed after {lines} lines");
                    report.json_lines = Some(lines);
                }
                Ok(Err(e)) => {
                    warn!("JSON log did not close cleanly: {e}");
                    report.failed_steps.push("json log");
                }
                Err(e) => {
                    error!("JSON log writer panicked: {e}. Please report this issue.");
                    report.failed_steps.push("json log");
                }
            }
        }

        if let Some(queue) = self.queue.take() {
            info!("Draining persistence queue...");
            match queue.close().await {
                Ok(writer) => report.writer = Some(writer),
                Err(e) => {
                    error!("Storage writer panicked: {e}. Please report this issue.");
                    report.failed_steps.push("persistence queue");
                }
            }
        }

        if let Some(storage) = self.storage.take() {
            let kind = storage.kind();
            // Run on its own task so a panicking driver is contained
            match tokio::spawn(async move { storage.close().await }).await {
                Ok(()) => info!("Closed {} storage", kind.name()),
                Err(e) => {
                    error!("Closing {} storage panicked: {e}", kind.name());
                    report.failed_steps.push("storage");
                }
            }
        }
    }
}
